//! Probe convolution.
//!
//! A [`ProbeConvolver`] performs one accumulation step for a probe: it reads
//! the probe's previous diffuse/specular buffers, integrates the next window
//! of samples, and writes the running mean into the current buffers. The
//! probe's own bookkeeping ([`IblProbe::update_samples`]) is driven by the
//! scene after the step succeeds.
//!
//! [`CpuConvolver`] is the reference implementation over [`CpuDevice`].

use std::ops::Range;

use glam::{Mat3, Vec3};

use super::probe::IblProbe;
use super::sampling::{cosine_sample_hemisphere, halton, importance_sample_ggx, sample_window};
use crate::cubemap::{CubeFace, CubeImage, fixup_cube_edges};
use crate::device::{CpuDevice, RenderDevice, TextureKey};
use crate::errors::{BakerError, Result};
use crate::settings::FixupSettings;

const LUMA: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

// ============================================================================
// ConvolveRequest
// ============================================================================

/// Sampling parameters of one accumulation step, snapshotted from a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveRequest {
    pub sample_offset: u32,
    pub samples_per_frame: u32,
    pub sample_count: u32,
    /// Buffer of each pair written by this step.
    pub render_id: usize,
}

impl ConvolveRequest {
    #[must_use]
    pub fn from_probe(probe: &IblProbe) -> Self {
        Self {
            sample_offset: probe.sample_offset(),
            samples_per_frame: probe.samples_per_frame(),
            sample_count: probe.sample_count_property().get(),
            render_id: probe.render_id(),
        }
    }

    /// Sequence indices integrated by this step.
    #[must_use]
    pub fn window(&self) -> Range<u32> {
        sample_window(self.sample_offset, self.samples_per_frame, self.sample_count)
    }

    /// Weight of this step's mean in the running average.
    ///
    /// 1 on the first step, then `window / samples_so_far`.
    #[must_use]
    pub fn blend_weight(&self) -> f32 {
        let window = self.window();
        if window.end == 0 {
            return 1.0;
        }
        window.len() as f32 / window.end as f32
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.sample_offset == 0
    }
}

// ============================================================================
// ColorGrade
// ============================================================================

/// Colour adjustments applied to the environment when it is captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorGrade {
    pub scale: f32,
    /// Degrees around the grey axis.
    pub hue: f32,
    pub saturation: f32,
    pub contrast: f32,
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self {
            scale: 1.0,
            hue: 0.0,
            saturation: 1.0,
            contrast: 1.0,
        }
    }
}

impl ColorGrade {
    #[must_use]
    pub fn from_probe(probe: &IblProbe) -> Self {
        Self {
            scale: probe.environment_scale_property().get(),
            hue: probe.hue_property().get(),
            saturation: probe.saturation_property().get(),
            contrast: probe.contrast_property().get(),
        }
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    #[must_use]
    pub fn apply(&self, rgb: Vec3) -> Vec3 {
        let mut color = rgb * self.scale;

        if self.hue != 0.0 {
            let axis = Vec3::ONE.normalize();
            color = Mat3::from_axis_angle(axis, self.hue.to_radians()) * color;
        }

        let luma = color.dot(LUMA);
        color = Vec3::splat(luma) + (color - luma) * self.saturation;
        color = (color - 0.5) * self.contrast + 0.5;
        color.max(Vec3::ZERO)
    }
}

// ============================================================================
// ProbeConvolver
// ============================================================================

/// One accumulation step for a probe on device `D`.
pub trait ProbeConvolver<D: RenderDevice + ?Sized> {
    /// Writes the probe's current diffuse and specular buffers.
    ///
    /// The probe must be cached. The first step (`sample_offset == 0`) also
    /// captures the environment into the probe's source cubemaps.
    fn convolve(&mut self, device: &mut D, probe: &IblProbe) -> Result<()>;
}

// ============================================================================
// CpuConvolver
// ============================================================================

/// Monte Carlo convolution of an in-memory environment on the CPU.
pub struct CpuConvolver {
    environment: CubeImage<f32>,
    fixup: FixupSettings,
}

impl CpuConvolver {
    #[must_use]
    pub fn new(environment: CubeImage<f32>, fixup: FixupSettings) -> Self {
        Self { environment, fixup }
    }

    #[must_use]
    pub fn environment(&self) -> &CubeImage<f32> {
        &self.environment
    }

    /// Replaces the environment. Probes must be uncached to pick it up.
    pub fn set_environment(&mut self, environment: CubeImage<f32>) {
        self.environment = environment;
    }

    fn capture(&self, device: &mut CpuDevice, probe: &IblProbe) -> Result<()> {
        let grade = ColorGrade::from_probe(probe);
        let hdr_key = required(probe.environment_cube_map(), "environment")?;
        let mdr_key = required(probe.environment_cube_map_mdr(), "environmentMDR")?;

        let mut hdr = empty_like(device, hdr_key)?;
        let mut mdr = empty_like(device, mdr_key)?;
        let size = hdr.size();

        for face in CubeFace::ALL {
            for y in 0..size {
                for x in 0..size {
                    let rgb = grade.apply(self.environment.sample_nearest(face.texel_direction(x, y, size), 0));
                    for c in 0..hdr.channels() {
                        let value = if c < 3 { rgb[c as usize] } else { 1.0 };
                        hdr.set_texel(face, 0, x, y, c, value);
                        mdr.set_texel(face, 0, x, y, c, value.clamp(0.0, 1.0));
                    }
                }
            }
        }

        device.write_cube(hdr_key, hdr)?;
        device.write_cube(mdr_key, mdr)?;
        log::debug!("Probe '{}' captured environment at {size}x{size}", probe.name);
        Ok(())
    }
}

impl ProbeConvolver<CpuDevice> for CpuConvolver {
    fn convolve(&mut self, device: &mut CpuDevice, probe: &IblProbe) -> Result<()> {
        let request = ConvolveRequest::from_probe(probe);
        if request.is_first() {
            self.capture(device, probe)?;
        }

        let source_key = required(probe.environment_cube_map(), "environment")?;
        let source = device
            .read_cube(source_key)
            .ok_or_else(|| BakerError::UnknownTexture(format!("{source_key:?}")))?;

        let window = request.window();
        if window.is_empty() {
            return Ok(());
        }
        let weight = request.blend_weight();

        // Diffuse
        let diffuse_key = required(probe.diffuse_cube_map(), "diffuse")?;
        let last_diffuse = previous(device, probe.last_diffuse_cube_map(), diffuse_key, request)?;
        let mut diffuse = empty_like(device, diffuse_key)?;
        accumulate(&mut diffuse, &last_diffuse, weight, |dir, _| {
            let sum: Vec3 = window
                .clone()
                .map(|i| source.sample_nearest(cosine_sample_hemisphere(halton(i), dir), 0))
                .sum();
            sum / window.len() as f32
        });
        fixup_cube_edges(&mut diffuse, self.fixup.kind, self.fixup.width);
        device.write_cube(diffuse_key, diffuse)?;

        // Specular
        let specular_key = required(probe.specular_cube_map(), "specular")?;
        let last_specular = previous(device, probe.last_specular_cube_map(), specular_key, request)?;
        let mut specular = empty_like(device, specular_key)?;
        let mips = specular.mip_levels();
        accumulate(&mut specular, &last_specular, weight, |dir, mip| {
            let roughness = if mips > 1 { mip as f32 / (mips - 1) as f32 } else { 0.0 };
            prefilter_ggx(&source, dir, roughness, window.clone())
        });
        fixup_cube_edges(&mut specular, self.fixup.kind, self.fixup.width);
        device.write_cube(specular_key, specular)?;

        log::trace!(
            "Probe '{}' step {} samples {:?} into buffer {}",
            probe.name,
            request.sample_offset,
            window,
            request.render_id
        );
        Ok(())
    }
}

/// Mean GGX-filtered radiance around `n` for the sample `window`.
fn prefilter_ggx(source: &CubeImage<f32>, n: Vec3, roughness: f32, window: Range<u32>) -> Vec3 {
    if roughness <= 0.0 {
        return source.sample_nearest(n, 0);
    }
    let mut sum = Vec3::ZERO;
    let mut weight = 0.0;
    for i in window {
        let h = importance_sample_ggx(halton(i), n, roughness);
        let l = 2.0 * n.dot(h) * h - n;
        let n_dot_l = n.dot(l);
        if n_dot_l > 0.0 {
            sum += source.sample_nearest(l, 0) * n_dot_l;
            weight += n_dot_l;
        }
    }
    if weight > 0.0 { sum / weight } else { source.sample_nearest(n, 0) }
}

/// Fills `target` with `last * (1 - weight) + estimate * weight`, alpha 1.
fn accumulate(
    target: &mut CubeImage<f32>,
    last: &CubeImage<f32>,
    weight: f32,
    estimate: impl Fn(Vec3, u32) -> Vec3,
) {
    let channels = target.channels();
    for face in CubeFace::ALL {
        for mip in 0..target.mip_levels() {
            let extent = target.mip_size(mip);
            for y in 0..extent {
                for x in 0..extent {
                    let value = estimate(face.texel_direction(x, y, extent), mip);
                    for c in 0..channels {
                        let blended = if c < 3 {
                            let old = last.texel(face, mip, x, y, c);
                            old + (value[c as usize] - old) * weight
                        } else {
                            1.0
                        };
                        target.set_texel(face, mip, x, y, c, blended);
                    }
                }
            }
        }
    }
}

fn required(key: Option<TextureKey>, what: &str) -> Result<TextureKey> {
    key.ok_or_else(|| BakerError::UnknownTexture(format!("probe {what} target is not cached")))
}

fn empty_like(device: &CpuDevice, key: TextureKey) -> Result<CubeImage<f32>> {
    let image = device
        .cube(key)
        .ok_or_else(|| BakerError::UnknownTexture(format!("{key:?}")))?;
    CubeImage::new(image.size(), image.mip_levels(), image.channels())
}

/// Previous buffer of a pair, or zeros on the first step.
fn previous(
    device: &CpuDevice,
    last: Option<TextureKey>,
    current: TextureKey,
    request: ConvolveRequest,
) -> Result<CubeImage<f32>> {
    match last {
        Some(key) if !request.is_first() => device
            .read_cube(key)
            .ok_or_else(|| BakerError::UnknownTexture(format!("{key:?}"))),
        _ => empty_like(device, current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weight_is_running_mean() {
        let mut request = ConvolveRequest {
            sample_offset: 0,
            samples_per_frame: 64,
            sample_count: 256,
            render_id: 0,
        };
        assert_eq!(request.blend_weight(), 1.0);
        request.sample_offset = 1;
        assert_eq!(request.blend_weight(), 0.5);
        request.sample_offset = 3;
        assert_eq!(request.blend_weight(), 0.25);
    }

    #[test]
    fn test_identity_grade_keeps_color() {
        let color = Vec3::new(0.2, 1.5, 3.0);
        assert!(ColorGrade::default().apply(color).abs_diff_eq(color, 1e-5));
    }

    #[test]
    fn test_zero_saturation_is_grey() {
        let grade = ColorGrade {
            saturation: 0.0,
            ..ColorGrade::default()
        };
        let out = grade.apply(Vec3::new(1.0, 0.0, 0.0));
        assert!((out.x - out.y).abs() < 1e-6 && (out.y - out.z).abs() < 1e-6);
        assert!((out.x - LUMA.x).abs() < 1e-6);
    }
}
