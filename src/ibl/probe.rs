//! IBL Probe
//!
//! One environment-lighting capture point and its progressive accumulation
//! state:
//!
//! ```text
//!            uncache()                update_samples()
//! Uncached ───────────▶ Accumulating ───────────────▶ Computed
//!    ▲                       │  (remaining > 0:           │
//!    │                       │   flip buffers, offset+1)  │
//!    └────── parameter hash changed in update() ◀─────────┘
//! ```
//!
//! A probe is computed once its sample budget is spent or it was explicitly
//! marked computed. The diffuse and specular targets are double buffered so
//! that each accumulation step reads the previous partial result while writing
//! the next one.

use glam::Vec3;
use xxhash_rust::xxh3::Xxh3;

use crate::cubemap::{PixelFormat, full_mip_count};
use crate::device::{RenderDevice, TextureKey, TextureParameters};
use crate::errors::Result;
use crate::property::{
    BoolProperty, FloatProperty, Property, TextureProperty, TransformProperty, UIntProperty,
    Vector3Property,
};
use crate::settings::ProbeSettings;

// ============================================================================
// PingPong
// ============================================================================

/// Two slots selected by a generation counter.
///
/// `current()` is the slot written by the running step, `previous()` the one
/// it reads from. `advance()` swaps their roles.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    generation: u64,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            generation: 0,
        }
    }

    /// Index of the current slot (0 or 1).
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        (self.generation & 1) as usize
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> &T {
        &self.slots[self.index()]
    }

    #[inline]
    #[must_use]
    pub fn previous(&self) -> &T {
        &self.slots[self.index() ^ 1]
    }

    #[inline]
    pub fn advance(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub fn reset(&mut self) {
        self.generation = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }
}

// ============================================================================
// Targets
// ============================================================================

/// One diffuse/specular pair of render targets.
#[derive(Debug, Clone)]
pub struct ConvolvedTargets {
    pub diffuse: TextureProperty,
    pub specular: TextureProperty,
}

impl ConvolvedTargets {
    fn new(slot: usize) -> Self {
        Self {
            diffuse: Property::new(format!("diffuseCubeMap{slot}"), None),
            specular: Property::new(format!("specularCubeMap{slot}"), None),
        }
    }
}

/// Resolution/format subset of the tunables that decides target allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TargetLayout {
    source_resolution: u32,
    diffuse_resolution: u32,
    specular_resolution: u32,
    specular_mips: u32,
    format: PixelFormat,
}

// ============================================================================
// IblProbe
// ============================================================================

pub struct IblProbe {
    pub name: String,

    translation: Vector3Property,
    transform: TransformProperty,

    // Tunables
    source_resolution: UIntProperty,
    specular_resolution: UIntProperty,
    diffuse_resolution: UIntProperty,
    mip_drop: UIntProperty,
    sample_count: UIntProperty,
    samples_per_frame: UIntProperty,
    environment_scale: FloatProperty,
    hue: FloatProperty,
    saturation: FloatProperty,
    contrast: FloatProperty,
    format: Property<PixelFormat>,
    marked_computed: BoolProperty,

    // Accumulation state
    samples_remaining: i64,
    sample_offset: u32,
    probe_hash: Option<u64>,

    // Render targets
    environment_hdr: TextureProperty,
    environment_mdr: TextureProperty,
    targets: PingPong<ConvolvedTargets>,
    layout: Option<TargetLayout>,
}

impl IblProbe {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_settings(name, &ProbeSettings::default())
    }

    #[must_use]
    pub fn from_settings(name: impl Into<String>, settings: &ProbeSettings) -> Self {
        let translation = Vector3Property::new("translation", Vec3::ZERO);
        let transform = TransformProperty::new();
        transform.set_translation(Some(&translation));

        let mut probe = Self {
            name: name.into(),
            translation,
            transform,
            source_resolution: Property::new("sourceResolution", settings.source_resolution),
            specular_resolution: Property::new("specularResolution", settings.specular_resolution),
            diffuse_resolution: Property::new("diffuseResolution", settings.diffuse_resolution),
            mip_drop: Property::new("mipDrop", settings.mip_drop),
            sample_count: Property::new("sampleCount", settings.sample_count),
            samples_per_frame: Property::new("samplesPerFrame", settings.samples_per_frame),
            environment_scale: Property::new("environmentScale", settings.environment_scale),
            hue: Property::new("iblHue", settings.hue),
            saturation: Property::new("iblSaturation", settings.saturation),
            contrast: Property::new("iblContrast", settings.contrast),
            format: Property::new("hdrPixelFormat", settings.format),
            marked_computed: Property::new("markedComputed", false),
            samples_remaining: 0,
            sample_offset: 0,
            probe_hash: None,
            environment_hdr: Property::new("environmentCubeMap", None),
            environment_mdr: Property::new("environmentCubeMapMDR", None),
            targets: PingPong::new(ConvolvedTargets::new(0), ConvolvedTargets::new(1)),
            layout: None,
        };
        probe.probe_hash = Some(probe.compute_hash());
        probe.uncache();
        probe
    }

    // ========================================================================
    // Frame protocol
    // ========================================================================

    /// Rehashes the tunables and restarts accumulation if any changed.
    pub fn update(&mut self) {
        let hash = self.compute_hash();
        if self.probe_hash != Some(hash) {
            log::debug!("Probe '{}' parameters changed, restarting accumulation", self.name);
            self.probe_hash = Some(hash);
            self.uncache();
        }
    }

    /// Restarts accumulation from scratch.
    pub fn uncache(&mut self) {
        self.samples_remaining = i64::from(self.sample_count.get());
        self.sample_offset = 0;
        self.targets.reset();
        self.marked_computed.set(false);
    }

    /// Accounts for one accumulation step.
    ///
    /// Once computed, further calls change nothing until [`uncache`](Self::uncache).
    pub fn update_samples(&mut self) {
        if self.computed() {
            return;
        }
        self.samples_remaining -= i64::from(self.samples_per_frame());
        if self.samples_remaining > 0 {
            self.targets.advance();
            self.sample_offset += 1;
        } else {
            log::debug!("Probe '{}' converged after {} steps", self.name, self.sample_offset + 1);
        }
    }

    #[must_use]
    pub fn computed(&self) -> bool {
        self.samples_remaining <= 0 || self.marked_computed.get()
    }

    pub fn mark_computed(&mut self, computed: bool) {
        self.marked_computed.set(computed);
    }

    /// Accumulated fraction of the sample budget in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.computed() {
            return 1.0;
        }
        let total = self.sample_count.get().max(1) as f32;
        (1.0 - self.samples_remaining as f32 / total).clamp(0.0, 1.0)
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Creates the render targets, recreating them if the layout changed.
    pub fn cache(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        let layout = self.target_layout();
        if self.layout == Some(layout) {
            return Ok(());
        }
        self.free(device);

        let format = layout.format;
        self.environment_hdr.set(Some(device.create_texture(&TextureParameters::cube_target(
            format!("{}/environment", self.name),
            layout.source_resolution,
            1,
            format,
        ))?));
        self.environment_mdr.set(Some(device.create_texture(&TextureParameters::cube_target(
            format!("{}/environmentMDR", self.name),
            layout.source_resolution,
            1,
            PixelFormat::Rgba8Unorm,
        ))?));

        for (slot, targets) in self.targets.iter().enumerate() {
            targets.diffuse.set(Some(device.create_texture(&TextureParameters::cube_target(
                format!("{}/diffuse{slot}", self.name),
                layout.diffuse_resolution,
                1,
                format,
            ))?));
            targets.specular.set(Some(device.create_texture(&TextureParameters::cube_target(
                format!("{}/specular{slot}", self.name),
                layout.specular_resolution,
                layout.specular_mips,
                format,
            ))?));
        }

        log::info!(
            "Cached probe '{}': source {}, diffuse {}, specular {} ({} mips), {:?}",
            self.name,
            layout.source_resolution,
            layout.diffuse_resolution,
            layout.specular_resolution,
            layout.specular_mips,
            format
        );
        self.layout = Some(layout);
        self.uncache();
        Ok(())
    }

    /// Destroys every render target owned by the probe.
    pub fn free(&mut self, device: &mut dyn RenderDevice) {
        let mut owned = vec![&self.environment_hdr, &self.environment_mdr];
        for targets in self.targets.iter() {
            owned.push(&targets.diffuse);
            owned.push(&targets.specular);
        }
        for property in owned {
            if let Some(key) = property.get() {
                device.destroy_resource(key);
                property.set(None);
            }
        }
        self.layout = None;
    }

    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.layout.is_some()
    }

    /// Number of mips in each specular target.
    #[must_use]
    pub fn specular_mip_levels(&self) -> u32 {
        let full = full_mip_count(self.specular_resolution.get());
        full.saturating_sub(self.mip_drop.get()).max(1)
    }

    fn target_layout(&self) -> TargetLayout {
        TargetLayout {
            source_resolution: self.source_resolution.get(),
            diffuse_resolution: self.diffuse_resolution.get(),
            specular_resolution: self.specular_resolution.get(),
            specular_mips: self.specular_mip_levels(),
            format: self.format.get(),
        }
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for value in [
            self.source_resolution.get(),
            self.specular_resolution.get(),
            self.diffuse_resolution.get(),
            self.mip_drop.get(),
            self.sample_count.get(),
            self.samples_per_frame.get(),
            self.format.get().tag(),
        ] {
            hasher.update(&value.to_le_bytes());
        }
        for value in [
            self.environment_scale.get(),
            self.hue.get(),
            self.saturation.get(),
            self.contrast.get(),
        ] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        hasher.digest()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn samples_remaining(&self) -> i64 {
        self.samples_remaining
    }

    #[inline]
    #[must_use]
    pub fn sample_offset(&self) -> u32 {
        self.sample_offset
    }

    /// Which buffer of each pair the running step writes (0 or 1).
    #[inline]
    #[must_use]
    pub fn render_id(&self) -> usize {
        self.targets.index()
    }

    /// Hash of the tunables as of the last [`update`](Self::update).
    #[inline]
    #[must_use]
    pub fn probe_hash(&self) -> Option<u64> {
        self.probe_hash
    }

    #[must_use]
    pub fn diffuse_cube_map(&self) -> Option<TextureKey> {
        self.targets.current().diffuse.get()
    }

    #[must_use]
    pub fn specular_cube_map(&self) -> Option<TextureKey> {
        self.targets.current().specular.get()
    }

    #[must_use]
    pub fn last_diffuse_cube_map(&self) -> Option<TextureKey> {
        self.targets.previous().diffuse.get()
    }

    #[must_use]
    pub fn last_specular_cube_map(&self) -> Option<TextureKey> {
        self.targets.previous().specular.get()
    }

    #[must_use]
    pub fn environment_cube_map(&self) -> Option<TextureKey> {
        self.environment_hdr.get()
    }

    #[must_use]
    pub fn environment_cube_map_mdr(&self) -> Option<TextureKey> {
        self.environment_mdr.get()
    }

    #[must_use]
    pub fn translation_property(&self) -> &Vector3Property {
        &self.translation
    }

    #[must_use]
    pub fn transform(&self) -> &TransformProperty {
        &self.transform
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.transform.world().w_axis.truncate()
    }

    #[must_use]
    pub fn source_resolution_property(&self) -> &UIntProperty {
        &self.source_resolution
    }

    #[must_use]
    pub fn specular_resolution_property(&self) -> &UIntProperty {
        &self.specular_resolution
    }

    #[must_use]
    pub fn diffuse_resolution_property(&self) -> &UIntProperty {
        &self.diffuse_resolution
    }

    #[must_use]
    pub fn mip_drop_property(&self) -> &UIntProperty {
        &self.mip_drop
    }

    #[must_use]
    pub fn sample_count_property(&self) -> &UIntProperty {
        &self.sample_count
    }

    /// Samples integrated per step. A zero setting still takes one sample.
    #[must_use]
    pub fn samples_per_frame(&self) -> u32 {
        self.samples_per_frame.get().max(1)
    }

    #[must_use]
    pub fn samples_per_frame_property(&self) -> &UIntProperty {
        &self.samples_per_frame
    }

    #[must_use]
    pub fn environment_scale_property(&self) -> &FloatProperty {
        &self.environment_scale
    }

    #[must_use]
    pub fn hue_property(&self) -> &FloatProperty {
        &self.hue
    }

    #[must_use]
    pub fn saturation_property(&self) -> &FloatProperty {
        &self.saturation
    }

    #[must_use]
    pub fn contrast_property(&self) -> &FloatProperty {
        &self.contrast
    }

    #[must_use]
    pub fn format_property(&self) -> &Property<PixelFormat> {
        &self.format
    }

    #[must_use]
    pub fn marked_computed_property(&self) -> &BoolProperty {
        &self.marked_computed
    }
}
