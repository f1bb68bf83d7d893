//! Materials
//!
//! A material is described by a JSON manifest naming the render passes it
//! takes part in and the textures it binds:
//!
//! ```json
//! {
//!   "name": "floor",
//!   "passes": ["opaque", "shadow"],
//!   "textures": [
//!     { "slot": "albedo", "path": "floor_albedo.png", "required": true },
//!     { "slot": "normal", "path": "floor_normal.png" }
//!   ]
//! }
//! ```
//!
//! A missing required texture fails the load with
//! [`BakerError::AssetNotFound`] and releases every texture the load had
//! already created; a missing optional one is logged and left unbound.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::device::{RenderDevice, TextureKey};
use crate::errors::{BakerError, Result};
use crate::utils::interner::{self, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureBinding {
    pub slot: String,
    pub path: PathBuf,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDesc {
    pub name: String,
    pub passes: Vec<String>,
    pub textures: Vec<TextureBinding>,
}

impl MaterialDesc {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a manifest and resolves relative texture paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => BakerError::AssetNotFound(path.display().to_string()),
            _ => BakerError::Io(err),
        })?;
        let mut desc = Self::from_json_str(&text)?;
        if let Some(dir) = path.parent() {
            for binding in &mut desc.textures {
                if binding.path.is_relative() {
                    binding.path = dir.join(&binding.path);
                }
            }
        }
        Ok(desc)
    }
}

/// Pass membership and bound textures of a loaded material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    passes: SmallVec<[Symbol; 4]>,
    textures: FxHashMap<Symbol, TextureKey>,
}

impl Material {
    /// Material with no textures.
    pub fn new<'a>(name: impl Into<String>, passes: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            name: name.into(),
            passes: passes.into_iter().map(interner::intern).collect(),
            textures: FxHashMap::default(),
        }
    }

    pub fn load(desc: &MaterialDesc, device: &mut dyn RenderDevice) -> Result<Self> {
        let mut material = Self::new(desc.name.clone(), desc.passes.iter().map(String::as_str));

        for binding in &desc.textures {
            match device.load_texture(&binding.path) {
                Ok(key) => {
                    material.textures.insert(interner::intern(&binding.slot), key);
                }
                Err(err) if binding.required => {
                    log::error!("Material '{}': required texture '{}' failed: {err}", desc.name, binding.slot);
                    material.free(device);
                    return Err(err);
                }
                Err(err) => {
                    log::warn!("Material '{}': optional texture '{}' skipped: {err}", desc.name, binding.slot);
                }
            }
        }

        log::debug!(
            "Loaded material '{}' ({} passes, {} textures)",
            material.name,
            material.passes.len(),
            material.textures.len()
        );
        Ok(material)
    }

    #[must_use]
    pub fn passes(&self) -> &[Symbol] {
        &self.passes
    }

    #[must_use]
    pub fn texture(&self, slot: &str) -> Option<TextureKey> {
        self.textures.get(&interner::get(slot)?).copied()
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Destroys every bound texture.
    pub fn free(&mut self, device: &mut dyn RenderDevice) {
        for (_, key) in self.textures.drain() {
            device.destroy_resource(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuDevice;

    fn desc(required: bool) -> MaterialDesc {
        MaterialDesc {
            name: "floor".into(),
            passes: vec!["opaque".into()],
            textures: vec![TextureBinding {
                slot: "albedo".into(),
                path: PathBuf::from("missing/floor_albedo.png"),
                required,
            }],
        }
    }

    #[test]
    fn test_missing_required_texture_fails() {
        let mut device = CpuDevice::new();
        let err = Material::load(&desc(true), &mut device).unwrap_err();
        assert!(matches!(err, BakerError::AssetNotFound(_)));
    }

    #[test]
    fn test_missing_optional_texture_degrades() {
        let mut device = CpuDevice::new();
        let material = Material::load(&desc(false), &mut device).unwrap();
        assert_eq!(material.texture_count(), 0);
        assert!(material.texture("albedo").is_none());
        assert_eq!(material.passes(), &[interner::intern("opaque")]);
    }

    #[test]
    fn test_failed_load_releases_loaded_textures() {
        let dir = std::env::temp_dir().join(format!("ibl_baker_material_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let present = dir.join("roughness.png");
        image::RgbaImage::new(2, 2).save(&present).unwrap();

        let desc = MaterialDesc {
            name: "floor".into(),
            passes: vec!["opaque".into()],
            textures: vec![
                TextureBinding {
                    slot: "roughness".into(),
                    path: present,
                    required: false,
                },
                TextureBinding {
                    slot: "albedo".into(),
                    path: dir.join("missing.png"),
                    required: true,
                },
            ],
        };

        let mut device = CpuDevice::new();
        assert!(Material::load(&desc, &mut device).is_err());
        assert_eq!(device.texture_count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_free_destroys_bound_textures() {
        let dir = std::env::temp_dir().join(format!("ibl_baker_material_free_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("albedo.png");
        image::RgbaImage::new(2, 2).save(&path).unwrap();

        let desc = MaterialDesc {
            name: "wall".into(),
            passes: Vec::new(),
            textures: vec![TextureBinding {
                slot: "albedo".into(),
                path,
                required: true,
            }],
        };

        let mut device = CpuDevice::new();
        let mut material = Material::load(&desc, &mut device).unwrap();
        let key = material.texture("albedo").unwrap();
        assert!(device.contains(key));

        material.free(&mut device);
        assert!(!device.contains(key));
        assert_eq!(material.texture_count(), 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_manifest_defaults() {
        let desc = MaterialDesc::from_json_str(r#"{ "name": "bare" }"#).unwrap();
        assert!(desc.passes.is_empty());
        assert!(desc.textures.is_empty());
    }
}
