//! Cubemap Module
//!
//! CPU-side cubemap storage and the seam fixup filter:
//!
//! - [`CubeImage`]: six faces with mip chains in one buffer, addressed through [`PixelBox`]es
//! - [`topology`]: face orientation and the derived edge/corner adjacency
//! - [`fixup_cube_edges`]: corner/edge averaging with feathered falloff

pub mod fixup;
pub mod image;
pub mod topology;

pub use fixup::{FixupType, fixup_cube_edges};
pub use image::{Channel, CubeImage, PixelBox, PixelFormat, full_mip_count};
pub use topology::{CubeCorner, CubeEdge, CubeFace, CubeTopology, FaceCorner, FaceEdge};
