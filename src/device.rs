//! Render Device Boundary
//!
//! The GPU device is an external collaborator. The baker only needs to
//! create, fill and destroy textures, so that is all [`RenderDevice`] asks
//! for. [`CpuDevice`] is a software implementation keeping every texture in
//! host memory; it backs the headless [`CpuConvolver`](crate::ibl::CpuConvolver)
//! and the tests.

use std::borrow::Cow;
use std::path::Path;

use slotmap::{SlotMap, new_key_type};

use crate::cubemap::{CubeFace, CubeImage, PixelFormat};
use crate::errors::{BakerError, Result};

new_key_type! {
    /// Opaque handle to a device texture.
    pub struct TextureKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Flat,
    Cube,
}

/// Description of a texture to create.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureParameters {
    pub name: Cow<'static, str>,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: PixelFormat,
    pub render_target: bool,
}

impl TextureParameters {
    /// Square cube render target.
    pub fn cube_target(
        name: impl Into<Cow<'static, str>>,
        size: u32,
        mip_levels: u32,
        format: PixelFormat,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TextureKind::Cube,
            width: size,
            height: size,
            mip_levels,
            format,
            render_target: true,
        }
    }

    /// Single-mip 2D texture.
    pub fn flat(name: impl Into<Cow<'static, str>>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            name: name.into(),
            kind: TextureKind::Flat,
            width,
            height,
            mip_levels: 1,
            format,
            render_target: false,
        }
    }
}

/// Texture lifetime operations the baker drives on a graphics device.
pub trait RenderDevice {
    fn create_texture(&mut self, params: &TextureParameters) -> Result<TextureKey>;

    /// Releases a texture. Returns `false` if the key was already gone.
    fn destroy_resource(&mut self, key: TextureKey) -> bool;

    /// Replaces the texels of one `(face, mip)` surface. Flat textures use face 0.
    fn upload(&mut self, key: TextureKey, face: u32, mip: u32, texels: &[f32]) -> Result<()>;

    /// Loads a texture from an image file.
    fn load_texture(&mut self, path: &Path) -> Result<TextureKey>;
}

/// Host-memory texture storage.
#[derive(Debug, Clone)]
pub enum CpuTexture {
    Cube(CubeImage<f32>),
    Flat {
        width: u32,
        height: u32,
        channels: u32,
        data: Vec<f32>,
    },
}

/// Software [`RenderDevice`] storing texels as `f32`.
#[derive(Debug, Default)]
pub struct CpuDevice {
    textures: SlotMap<TextureKey, (TextureParameters, CpuTexture)>,
}

impl CpuDevice {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn contains(&self, key: TextureKey) -> bool {
        self.textures.contains_key(key)
    }

    #[must_use]
    pub fn parameters(&self, key: TextureKey) -> Option<&TextureParameters> {
        self.textures.get(key).map(|(params, _)| params)
    }

    #[must_use]
    pub fn texture(&self, key: TextureKey) -> Option<&CpuTexture> {
        self.textures.get(key).map(|(_, texture)| texture)
    }

    #[must_use]
    pub fn cube(&self, key: TextureKey) -> Option<&CubeImage<f32>> {
        match self.texture(key)? {
            CpuTexture::Cube(image) => Some(image),
            CpuTexture::Flat { .. } => None,
        }
    }

    pub fn cube_mut(&mut self, key: TextureKey) -> Option<&mut CubeImage<f32>> {
        match self.textures.get_mut(key).map(|(_, texture)| texture)? {
            CpuTexture::Cube(image) => Some(image),
            CpuTexture::Flat { .. } => None,
        }
    }

    /// Replaces a whole cube texture. Size, mip count and channels must match.
    pub fn write_cube(&mut self, key: TextureKey, image: CubeImage<f32>) -> Result<()> {
        let target = self
            .cube_mut(key)
            .ok_or_else(|| BakerError::UnknownTexture(format!("{key:?}")))?;
        if target.size() != image.size()
            || target.mip_levels() != image.mip_levels()
            || target.channels() != image.channels()
        {
            return Err(BakerError::CubeMap(format!(
                "layout mismatch writing {key:?}: {}x{} mips vs {}x{} mips",
                image.size(),
                image.mip_levels(),
                target.size(),
                target.mip_levels()
            )));
        }
        *target = image;
        Ok(())
    }

    /// Copies a cube texture out of the device.
    #[must_use]
    pub fn read_cube(&self, key: TextureKey) -> Option<CubeImage<f32>> {
        self.cube(key).cloned()
    }
}

impl RenderDevice for CpuDevice {
    fn create_texture(&mut self, params: &TextureParameters) -> Result<TextureKey> {
        if params.width == 0 || params.height == 0 {
            return Err(BakerError::ResourceCreation {
                name: params.name.to_string(),
                reason: "zero-sized texture".into(),
            });
        }
        let channels = params.format.channels();
        let texture = match params.kind {
            TextureKind::Cube => {
                if params.width != params.height {
                    return Err(BakerError::ResourceCreation {
                        name: params.name.to_string(),
                        reason: format!("cube faces must be square, got {}x{}", params.width, params.height),
                    });
                }
                CpuTexture::Cube(CubeImage::new(params.width, params.mip_levels, channels)?)
            }
            TextureKind::Flat => CpuTexture::Flat {
                width: params.width,
                height: params.height,
                channels,
                data: vec![0.0; (params.width * params.height * channels) as usize],
            },
        };

        log::debug!(
            "Created texture '{}' ({}x{}, {} mips, {:?})",
            params.name,
            params.width,
            params.height,
            params.mip_levels,
            params.format
        );
        Ok(self.textures.insert((params.clone(), texture)))
    }

    fn destroy_resource(&mut self, key: TextureKey) -> bool {
        self.textures.remove(key).is_some()
    }

    fn upload(&mut self, key: TextureKey, face: u32, mip: u32, texels: &[f32]) -> Result<()> {
        let (_, texture) = self
            .textures
            .get_mut(key)
            .ok_or_else(|| BakerError::UnknownTexture(format!("{key:?}")))?;

        let target: &mut [f32] = match texture {
            CpuTexture::Cube(image) => {
                let face = CubeFace::ALL
                    .get(face as usize)
                    .copied()
                    .ok_or_else(|| BakerError::CubeMap(format!("face index {face} out of range")))?;
                if mip >= image.mip_levels() {
                    return Err(BakerError::CubeMap(format!("mip {mip} out of range")));
                }
                image.surface_mut(face, mip)
            }
            CpuTexture::Flat { data, .. } => data.as_mut_slice(),
        };

        if target.len() != texels.len() {
            return Err(BakerError::CubeMap(format!(
                "upload size mismatch: expected {} texels, got {}",
                target.len(),
                texels.len()
            )));
        }
        target.copy_from_slice(texels);
        Ok(())
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureKey> {
        if !path.exists() {
            return Err(BakerError::AssetNotFound(path.display().to_string()));
        }
        let image = image::open(path)?.into_rgba32f();
        let (width, height) = image.dimensions();
        let params = TextureParameters::flat(path.display().to_string(), width, height, PixelFormat::Rgba32Float);

        log::info!("Loaded texture {} ({width}x{height})", path.display());
        Ok(self.textures.insert((
            params,
            CpuTexture::Flat {
                width,
                height,
                channels: 4,
                data: image.into_raw(),
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy() {
        let mut device = CpuDevice::new();
        let key = device
            .create_texture(&TextureParameters::cube_target("cube", 8, 4, PixelFormat::Rgba16Float))
            .unwrap();
        assert_eq!(device.cube(key).unwrap().mip_levels(), 4);
        assert!(device.destroy_resource(key));
        assert!(!device.destroy_resource(key));
    }

    #[test]
    fn test_upload_checks_size() {
        let mut device = CpuDevice::new();
        let key = device
            .create_texture(&TextureParameters::flat("lut", 2, 2, PixelFormat::Rgba32Float))
            .unwrap();
        assert!(device.upload(key, 0, 0, &[0.0; 3]).is_err());
        assert!(device.upload(key, 0, 0, &[1.0; 16]).is_ok());
    }

    #[test]
    fn test_missing_file_is_asset_not_found() {
        let mut device = CpuDevice::new();
        let err = device.load_texture(Path::new("does/not/exist.hdr")).unwrap_err();
        assert!(matches!(err, BakerError::AssetNotFound(_)));
    }
}
