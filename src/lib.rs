#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod cubemap;
pub mod device;
pub mod errors;
pub mod ibl;
pub mod property;
pub mod scene;
pub mod settings;
pub mod utils;

pub use cubemap::{CubeFace, CubeImage, FixupType, PixelFormat, fixup_cube_edges};
pub use device::{CpuDevice, RenderDevice, TextureKey, TextureParameters};
pub use errors::{BakerError, Result};
pub use ibl::{Brdf, CpuConvolver, IblProbe, ProbeConvolver};
pub use property::{Property, TransformProperty};
pub use scene::{Camera, CameraTransformCache, Entity, Material, Mesh, Scene};
pub use settings::BakerSettings;
pub use utils::interner;
