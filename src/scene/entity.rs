//! Scene entities and the meshes attached to them.

use glam::{Mat4, Vec3};

use super::{EntityKey, MaterialKey, MeshKey};
use crate::property::{TransformProperty, Vector3Property};

/// A placed group of meshes.
pub struct Entity {
    pub name: String,
    translation: Vector3Property,
    rotation: Vector3Property,
    scale: Vector3Property,
    transform: TransformProperty,
    pub(crate) meshes: Vec<MeshKey>,
}

impl Entity {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let translation = Vector3Property::new("translation", Vec3::ZERO);
        let rotation = Vector3Property::new("rotation", Vec3::ZERO);
        let scale = Vector3Property::new("scale", Vec3::ONE);
        let transform = TransformProperty::with_trs(&translation, &rotation, &scale);
        Self {
            name: name.into(),
            translation,
            rotation,
            scale,
            transform,
            meshes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_translation(self, translation: Vec3) -> Self {
        self.translation.set(translation);
        self
    }

    #[must_use]
    pub fn translation_property(&self) -> &Vector3Property {
        &self.translation
    }

    #[must_use]
    pub fn rotation_property(&self) -> &Vector3Property {
        &self.rotation
    }

    #[must_use]
    pub fn scale_property(&self) -> &Vector3Property {
        &self.scale
    }

    #[must_use]
    pub fn transform(&self) -> &TransformProperty {
        &self.transform
    }

    #[must_use]
    pub fn world(&self) -> Mat4 {
        self.transform.world()
    }

    #[must_use]
    pub fn meshes(&self) -> &[MeshKey] {
        &self.meshes
    }
}

/// A drawable owned by an entity and shaded by one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub entity: EntityKey,
    pub material: Option<MaterialKey>,
}

impl Mesh {
    #[must_use]
    pub fn new(name: impl Into<String>, entity: EntityKey, material: Option<MaterialKey>) -> Self {
        Self {
            name: name.into(),
            entity,
            material,
        }
    }
}
