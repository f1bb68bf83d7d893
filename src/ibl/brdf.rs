//! Environment BRDF lookup table.
//!
//! Split-sum approximation of the GGX specular BRDF: for each
//! `(NdotV, roughness)` cell the table stores the `(scale, bias)` applied to F0.
//! The table is integrated once on the CPU and uploaded as a flat RGBA texture
//! (`r = scale`, `g = bias`); later [`Brdf::compute`] calls are no-ops.

use glam::{Vec2, Vec3};

use super::sampling::{hammersley, importance_sample_ggx};
use crate::cubemap::PixelFormat;
use crate::device::{RenderDevice, TextureKey, TextureParameters};
use crate::errors::Result;
use crate::property::{Property, TextureProperty};
use crate::settings::BrdfSettings;

fn smith_ggx_correlated(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    // IBL remapping of k.
    let k = roughness * roughness / 2.0;
    let g_v = n_dot_v / (n_dot_v * (1.0 - k) + k);
    let g_l = n_dot_l / (n_dot_l * (1.0 - k) + k);
    g_v * g_l
}

/// Integrates one table cell.
#[must_use]
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, sample_count: u32) -> Vec2 {
    let n_dot_v = n_dot_v.max(1e-4);
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).max(0.0).sqrt(), 0.0, n_dot_v);
    let n = Vec3::Z;

    let mut scale = 0.0;
    let mut bias = 0.0;
    for i in 0..sample_count {
        let h = importance_sample_ggx(hammersley(i, sample_count), n, roughness);
        let v_dot_h = v.dot(h);
        let l = 2.0 * v_dot_h * h - v;

        let n_dot_l = l.z.max(0.0);
        let n_dot_h = h.z.max(0.0);
        if n_dot_l > 0.0 && n_dot_h > 0.0 {
            let g = smith_ggx_correlated(n_dot_v, n_dot_l, roughness);
            let g_vis = g * v_dot_h.max(0.0) / (n_dot_h * n_dot_v);
            let fc = (1.0 - v_dot_h.max(0.0)).powi(5);
            scale += (1.0 - fc) * g_vis;
            bias += fc * g_vis;
        }
    }
    Vec2::new(scale, bias) / sample_count.max(1) as f32
}

/// A BRDF whose lookup table is baked on demand.
pub struct Brdf {
    pub name: String,
    settings: BrdfSettings,
    table: Vec<Vec2>,
    lut: TextureProperty,
}

impl Brdf {
    #[must_use]
    pub fn new(name: impl Into<String>, settings: BrdfSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            table: Vec::new(),
            lut: Property::new("brdfLut", None),
        }
    }

    /// GGX split-sum BRDF with default table settings.
    #[must_use]
    pub fn ggx() -> Self {
        Self::new("ggx", BrdfSettings::default())
    }

    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.lut.get().is_some()
    }

    #[must_use]
    pub fn lut(&self) -> Option<TextureKey> {
        self.lut.get()
    }

    /// Integrates and uploads the table unless it already exists.
    pub fn compute(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        if self.is_computed() {
            return Ok(());
        }

        let size = self.settings.lut_size.max(1);
        let samples = self.settings.sample_count.max(1);
        self.table = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                let n_dot_v = (x as f32 + 0.5) / size as f32;
                let roughness = (y as f32 + 0.5) / size as f32;
                integrate_brdf(n_dot_v, roughness, samples)
            })
            .collect();

        let texels: Vec<f32> = self
            .table
            .iter()
            .flat_map(|cell| [cell.x, cell.y, 0.0, 1.0])
            .collect();

        let key = device.create_texture(&TextureParameters::flat(
            format!("{}/lut", self.name),
            size,
            size,
            PixelFormat::Rgba32Float,
        ))?;
        device.upload(key, 0, 0, &texels)?;
        self.lut.set(Some(key));

        log::info!("Computed BRDF '{}' lookup table ({size}x{size}, {samples} samples)", self.name);
        Ok(())
    }

    /// Nearest table cell for `(NdotV, roughness)`, once computed.
    #[must_use]
    pub fn lookup(&self, n_dot_v: f32, roughness: f32) -> Option<Vec2> {
        if self.table.is_empty() {
            return None;
        }
        let size = self.settings.lut_size.max(1);
        let cell = |v: f32| ((v.clamp(0.0, 1.0) * size as f32) as u32).min(size - 1);
        self.table
            .get((cell(roughness) * size + cell(n_dot_v)) as usize)
            .copied()
    }

    pub fn free(&mut self, device: &mut dyn RenderDevice) {
        if let Some(key) = self.lut.get() {
            device.destroy_resource(key);
            self.lut.set(None);
        }
        self.table.clear();
    }
}
