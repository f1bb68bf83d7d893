//! Baker Settings
//!
//! Configuration for probes, the seam fixup pass and the BRDF lookup table.
//! Every struct deserializes with `#[serde(default)]`, so a JSON file only
//! needs to name the values it overrides.
//!
//! # Example
//!
//! ```rust,ignore
//! use ibl_baker::settings::BakerSettings;
//!
//! let settings = BakerSettings::from_json_str(r#"{ "probe": { "sample_count": 2048 } }"#)?;
//! assert_eq!(settings.probe.samples_per_frame, 64);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cubemap::{FixupType, PixelFormat};
use crate::errors::Result;

// ---------------------------------------------------------------------------
// ProbeSettings
// ---------------------------------------------------------------------------

/// Initial values of an [`IblProbe`](crate::ibl::IblProbe)'s tunables.
///
/// | Field                 | Description                                  | Default        |
/// |-----------------------|----------------------------------------------|----------------|
/// | `source_resolution`   | Face size of the captured environment        | 512            |
/// | `specular_resolution` | Face size of the specular mip 0              | 256            |
/// | `diffuse_resolution`  | Face size of the diffuse probe               | 32             |
/// | `mip_drop`            | Smallest specular mips left out              | 2              |
/// | `sample_count`        | Total samples per texel                      | 1024           |
/// | `samples_per_frame`   | Samples accumulated per iteration            | 64             |
/// | `environment_scale`   | Radiance multiplier                          | 1.0            |
/// | `hue`                 | Hue rotation in degrees                      | 0.0            |
/// | `saturation`          | Saturation multiplier                        | 1.0            |
/// | `contrast`            | Contrast multiplier around mid grey          | 1.0            |
/// | `format`              | Render target pixel format                   | `Rgba16Float`  |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub source_resolution: u32,
    pub specular_resolution: u32,
    pub diffuse_resolution: u32,
    pub mip_drop: u32,
    pub sample_count: u32,
    pub samples_per_frame: u32,
    pub environment_scale: f32,
    pub hue: f32,
    pub saturation: f32,
    pub contrast: f32,
    pub format: PixelFormat,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            source_resolution: 512,
            specular_resolution: 256,
            diffuse_resolution: 32,
            mip_drop: 2,
            sample_count: 1024,
            samples_per_frame: 64,
            environment_scale: 1.0,
            hue: 0.0,
            saturation: 1.0,
            contrast: 1.0,
            format: PixelFormat::Rgba16Float,
        }
    }
}

// ---------------------------------------------------------------------------
// FixupSettings
// ---------------------------------------------------------------------------

/// Seam fixup applied to convolved probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixupSettings {
    pub kind: FixupType,
    /// Interior texels behind each edge the correction is feathered over.
    pub width: u32,
}

impl Default for FixupSettings {
    fn default() -> Self {
        Self {
            kind: FixupType::PullHermite,
            width: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// BrdfSettings
// ---------------------------------------------------------------------------

/// Split-sum BRDF lookup table parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrdfSettings {
    pub lut_size: u32,
    pub sample_count: u32,
}

impl Default for BrdfSettings {
    fn default() -> Self {
        Self {
            lut_size: 128,
            sample_count: 512,
        }
    }
}

// ---------------------------------------------------------------------------
// BakerSettings
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BakerSettings {
    pub probe: ProbeSettings,
    pub fixup: FixupSettings,
    pub brdf: BrdfSettings,
    /// Directory watched for shader/material changes, if any.
    pub watch_dir: Option<PathBuf>,
}

impl BakerSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&text)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
