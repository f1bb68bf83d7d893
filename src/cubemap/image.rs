//! CPU-side cubemap storage.
//!
//! A [`CubeImage`] owns the texels of all six faces and every mip level in a
//! single buffer, face-major (face 0 mip 0, face 0 mip 1, …, face 1 mip 0, …).
//! Each `(face, mip)` surface is described by a [`PixelBox`] carrying its
//! offset, size, row pitch and slice pitch, measured in channel elements.

use serde::{Deserialize, Serialize};

use super::topology::CubeFace;
use crate::errors::{BakerError, Result};

/// Scalar channel type a cubemap can be stored in.
pub trait Channel: Copy + Default + PartialEq + Send + Sync + 'static {
    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;
}

impl Channel for f32 {
    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        value
    }
}

impl Channel for half::f16 {
    #[inline]
    fn to_f32(self) -> f32 {
        half::f16::to_f32(self)
    }

    #[inline]
    fn from_f32(value: f32) -> Self {
        half::f16::from_f32(value)
    }
}

/// Texel formats understood by probe render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 16-bit float RGBA.
    #[default]
    Rgba16Float,
    /// 32-bit float RGBA.
    Rgba32Float,
    /// 8-bit normalized RGBA.
    Rgba8Unorm,
}

impl PixelFormat {
    #[must_use]
    pub fn channels(self) -> u32 {
        4
    }

    #[must_use]
    pub fn bytes_per_channel(self) -> u32 {
        match self {
            Self::Rgba16Float => 2,
            Self::Rgba32Float => 4,
            Self::Rgba8Unorm => 1,
        }
    }

    #[must_use]
    pub fn is_hdr(self) -> bool {
        !matches!(self, Self::Rgba8Unorm)
    }

    /// Stable tag mixed into content hashes.
    #[must_use]
    pub fn tag(self) -> u32 {
        match self {
            Self::Rgba16Float => 1,
            Self::Rgba32Float => 2,
            Self::Rgba8Unorm => 3,
        }
    }
}

/// Location of one `(face, mip)` surface inside a [`CubeImage`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub offset: usize,
    pub width: u32,
    pub height: u32,
    /// Elements between the starts of two consecutive rows.
    pub row_pitch: usize,
    /// Elements in the whole surface.
    pub slice_pitch: usize,
}

impl PixelBox {
    /// Element index of channel `c` of texel `(x, y)`.
    #[inline]
    #[must_use]
    pub fn index(&self, x: u32, y: u32, channels: u32, c: u32) -> usize {
        self.offset + y as usize * self.row_pitch + (x * channels + c) as usize
    }
}

/// Six-face, mip-mapped cubemap held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct CubeImage<T: Channel> {
    size: u32,
    mip_levels: u32,
    channels: u32,
    boxes: Vec<PixelBox>,
    data: Vec<T>,
}

/// Number of mips in a full chain for a face of `size` texels.
#[must_use]
pub fn full_mip_count(size: u32) -> u32 {
    32 - size.max(1).leading_zeros()
}

impl<T: Channel> CubeImage<T> {
    /// Allocates a zeroed cubemap.
    ///
    /// `mip_levels` is clamped to the length of the full chain.
    pub fn new(size: u32, mip_levels: u32, channels: u32) -> Result<Self> {
        if size == 0 {
            return Err(BakerError::CubeMap("face size must be non-zero".into()));
        }
        if channels == 0 {
            return Err(BakerError::CubeMap("channel count must be non-zero".into()));
        }
        let mip_levels = mip_levels.clamp(1, full_mip_count(size));

        let mut boxes = Vec::with_capacity(6 * mip_levels as usize);
        let mut offset = 0;
        for _face in 0..6 {
            for mip in 0..mip_levels {
                let extent = (size >> mip).max(1);
                let row_pitch = (extent * channels) as usize;
                let slice_pitch = row_pitch * extent as usize;
                boxes.push(PixelBox {
                    offset,
                    width: extent,
                    height: extent,
                    row_pitch,
                    slice_pitch,
                });
                offset += slice_pitch;
            }
        }

        Ok(Self {
            size,
            mip_levels,
            channels,
            boxes,
            data: vec![T::default(); offset],
        })
    }

    /// Allocates a cubemap and fills every texel through `f(face, mip, x, y, channel)`.
    pub fn from_fn(
        size: u32,
        mip_levels: u32,
        channels: u32,
        mut f: impl FnMut(CubeFace, u32, u32, u32, u32) -> f32,
    ) -> Result<Self> {
        let mut image = Self::new(size, mip_levels, channels)?;
        for face in CubeFace::ALL {
            for mip in 0..image.mip_levels {
                let pixel_box = image.pixel_box(face, mip);
                for y in 0..pixel_box.height {
                    for x in 0..pixel_box.width {
                        for c in 0..channels {
                            let idx = pixel_box.index(x, y, channels, c);
                            image.data[idx] = T::from_f32(f(face, mip, x, y, c));
                        }
                    }
                }
            }
        }
        Ok(image)
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[inline]
    #[must_use]
    pub fn mip_size(&self, mip: u32) -> u32 {
        (self.size >> mip).max(1)
    }

    #[inline]
    #[must_use]
    pub fn pixel_box(&self, face: CubeFace, mip: u32) -> PixelBox {
        self.boxes[face.index() * self.mip_levels as usize + mip as usize]
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Raw channel data of one surface.
    #[must_use]
    pub fn surface(&self, face: CubeFace, mip: u32) -> &[T] {
        let pixel_box = self.pixel_box(face, mip);
        &self.data[pixel_box.offset..pixel_box.offset + pixel_box.slice_pitch]
    }

    pub fn surface_mut(&mut self, face: CubeFace, mip: u32) -> &mut [T] {
        let pixel_box = self.pixel_box(face, mip);
        &mut self.data[pixel_box.offset..pixel_box.offset + pixel_box.slice_pitch]
    }

    #[inline]
    #[must_use]
    pub fn texel(&self, face: CubeFace, mip: u32, x: u32, y: u32, c: u32) -> T {
        self.data[self.pixel_box(face, mip).index(x, y, self.channels, c)]
    }

    #[inline]
    pub fn set_texel(&mut self, face: CubeFace, mip: u32, x: u32, y: u32, c: u32, value: T) {
        let idx = self.pixel_box(face, mip).index(x, y, self.channels, c);
        self.data[idx] = value;
    }

    /// Nearest-texel lookup of the first three channels along `direction`.
    #[must_use]
    pub fn sample_nearest(&self, direction: glam::Vec3, mip: u32) -> glam::Vec3 {
        let (face, s, t) = CubeFace::from_direction(direction);
        let extent = self.mip_size(mip);
        let to_texel = |coord: f32| {
            let texel = ((coord + 1.0) * 0.5 * extent as f32).floor();
            (texel.max(0.0) as u32).min(extent - 1)
        };
        let (x, y) = (to_texel(s), to_texel(t));

        let mut rgb = [0.0; 3];
        for (c, value) in rgb.iter_mut().enumerate().take(self.channels as usize) {
            *value = self.texel(face, mip, x, y, c as u32).to_f32();
        }
        glam::Vec3::from_array(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_face_major() {
        let image = CubeImage::<f32>::new(4, 3, 4).unwrap();
        let first = image.pixel_box(CubeFace::PositiveX, 0);
        let second_face = image.pixel_box(CubeFace::NegativeX, 0);

        assert_eq!(first.row_pitch, 16);
        assert_eq!(first.slice_pitch, 64);
        // 4x4 + 2x2 + 1x1 texels of four channels precede the next face.
        assert_eq!(second_face.offset, (16 + 4 + 1) * 4);
        assert_eq!(image.data().len(), 6 * (16 + 4 + 1) * 4);
    }

    #[test]
    fn test_mip_levels_are_clamped() {
        let image = CubeImage::<f32>::new(8, 10, 1).unwrap();
        assert_eq!(image.mip_levels(), 4);
        assert_eq!(image.mip_size(3), 1);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        assert!(CubeImage::<f32>::new(0, 1, 4).is_err());
    }

    #[test]
    fn test_sample_nearest_hits_face_center() {
        let image = CubeImage::<f32>::from_fn(2, 1, 3, |face, _, _, _, _| face.index() as f32).unwrap();
        assert_eq!(image.sample_nearest(glam::Vec3::NEG_Z, 0), glam::Vec3::splat(5.0));
        assert_eq!(image.sample_nearest(glam::Vec3::Y, 0), glam::Vec3::splat(2.0));
    }
}
