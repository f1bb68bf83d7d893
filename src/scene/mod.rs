//! Scene Module
//!
//! - [`Scene`]: pools of entities, meshes, materials and probes, the camera,
//!   the BRDF cache and the per-pass mesh buckets
//! - [`Camera`] / [`CameraTransformCache`]: property-driven camera matrices
//!   and their frozen snapshot
//! - [`Entity`] / [`Mesh`]: placed mesh groups
//! - [`Material`]: pass membership and bound textures

pub mod camera;
pub mod entity;
pub mod material;
pub mod scene;

pub use camera::{Camera, CameraTransformCache, SharedTransformCache};
pub use entity::{Entity, Mesh};
pub use material::{Material, MaterialDesc, TextureBinding};
pub use scene::Scene;

use slotmap::new_key_type;

new_key_type! {
    pub struct EntityKey;
    pub struct MeshKey;
    pub struct MaterialKey;
    pub struct ProbeKey;
}
