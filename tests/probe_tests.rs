//! IblProbe tests
//!
//! Tests for:
//! - uncache / update_samples / computed state machine
//! - Hash-driven invalidation in update()
//! - Render target caching on a CpuDevice

use ibl_baker::cubemap::PixelFormat;
use ibl_baker::device::CpuDevice;
use ibl_baker::ibl::IblProbe;
use ibl_baker::settings::ProbeSettings;

fn small_settings() -> ProbeSettings {
    ProbeSettings {
        source_resolution: 8,
        specular_resolution: 8,
        diffuse_resolution: 4,
        mip_drop: 1,
        sample_count: 256,
        samples_per_frame: 64,
        ..ProbeSettings::default()
    }
}

fn probe() -> IblProbe {
    IblProbe::from_settings("probe", &small_settings())
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn fresh_probe_is_uncached() {
    let probe = probe();
    assert_eq!(probe.samples_remaining(), 256);
    assert_eq!(probe.sample_offset(), 0);
    assert_eq!(probe.render_id(), 0);
    assert!(!probe.computed());
    assert_eq!(probe.progress(), 0.0);
}

#[test]
fn update_samples_counts_down_and_flips() {
    let mut probe = probe();
    let mut expected_remaining = 256;
    for step in 1..=3u32 {
        probe.update_samples();
        expected_remaining -= 64;
        assert_eq!(probe.samples_remaining(), expected_remaining);
        assert_eq!(probe.sample_offset(), step);
        assert_eq!(probe.render_id(), (step % 2) as usize);
        assert!(!probe.computed());
    }

    // Last step spends the budget without flipping.
    probe.update_samples();
    assert_eq!(probe.samples_remaining(), 0);
    assert_eq!(probe.sample_offset(), 3);
    assert_eq!(probe.render_id(), 1);
    assert!(probe.computed());
    assert_eq!(probe.progress(), 1.0);

    // Further calls change nothing.
    for _ in 0..5 {
        probe.update_samples();
    }
    assert_eq!(probe.samples_remaining(), 0);
    assert_eq!(probe.sample_offset(), 3);
    assert_eq!(probe.render_id(), 1);
}

#[test]
fn uneven_budget_overshoots_below_zero() {
    let mut probe = probe();
    probe.samples_per_frame_property().set(100);
    probe.uncache();
    for _ in 0..3 {
        probe.update_samples();
    }
    assert_eq!(probe.samples_remaining(), -44);
    assert_eq!(probe.sample_offset(), 2);
    assert!(probe.computed());
}

#[test]
fn zero_samples_per_frame_still_converges() {
    let mut probe = IblProbe::from_settings(
        "probe",
        &ProbeSettings {
            sample_count: 4,
            samples_per_frame: 0,
            ..small_settings()
        },
    );
    assert_eq!(probe.samples_per_frame(), 1);

    let mut steps = 0;
    while !probe.computed() && steps < 100 {
        probe.update_samples();
        steps += 1;
    }
    assert_eq!(steps, 4);
    assert_eq!(probe.sample_offset(), 3);
}

#[test]
fn uncache_resets_everything() {
    let mut probe = probe();
    probe.update_samples();
    probe.update_samples();
    probe.update_samples();
    probe.mark_computed(true);

    probe.uncache();
    assert_eq!(probe.samples_remaining(), 256);
    assert_eq!(probe.sample_offset(), 0);
    assert_eq!(probe.render_id(), 0);
    assert!(!probe.computed());
    assert!(!probe.marked_computed_property().get());
}

#[test]
fn zero_sample_count_is_computed_after_uncache() {
    let mut probe = probe();
    probe.sample_count_property().set(0);
    probe.uncache();
    assert!(probe.computed());
}

#[test]
fn mark_computed_overrides_remaining() {
    let mut probe = probe();
    probe.mark_computed(true);
    assert!(probe.computed());
    assert_eq!(probe.samples_remaining(), 256);

    // Marked probes do not advance.
    probe.update_samples();
    assert_eq!(probe.sample_offset(), 0);

    probe.mark_computed(false);
    assert!(!probe.computed());
}

// ============================================================================
// Hash invalidation
// ============================================================================

#[test]
fn update_without_changes_keeps_progress() {
    let mut probe = probe();
    probe.update_samples();
    probe.update_samples();
    let hash = probe.probe_hash();

    probe.update();
    assert_eq!(probe.sample_offset(), 2);
    assert_eq!(probe.probe_hash(), hash);
}

#[test]
fn changed_tunable_uncaches_exactly_once() {
    let mut probe = probe();
    probe.update_samples();
    probe.update_samples();
    let before = probe.probe_hash();

    probe.specular_resolution_property().set(16);
    probe.update();
    assert_eq!(probe.sample_offset(), 0);
    assert_eq!(probe.samples_remaining(), 256);
    assert_ne!(probe.probe_hash(), before);

    // A second update with nothing changed does not reset again.
    probe.update_samples();
    probe.update();
    assert_eq!(probe.sample_offset(), 1);
    assert_eq!(probe.samples_remaining(), 192);
}

#[test]
fn every_hashed_tunable_invalidates() {
    let edits: Vec<Box<dyn Fn(&IblProbe)>> = vec![
        Box::new(|p: &IblProbe| p.source_resolution_property().set(16)),
        Box::new(|p: &IblProbe| p.diffuse_resolution_property().set(8)),
        Box::new(|p: &IblProbe| p.mip_drop_property().set(0)),
        Box::new(|p: &IblProbe| p.sample_count_property().set(512)),
        Box::new(|p: &IblProbe| p.samples_per_frame_property().set(32)),
        Box::new(|p: &IblProbe| p.environment_scale_property().set(2.0)),
        Box::new(|p: &IblProbe| p.hue_property().set(30.0)),
        Box::new(|p: &IblProbe| p.saturation_property().set(0.5)),
        Box::new(|p: &IblProbe| p.contrast_property().set(1.5)),
        Box::new(|p: &IblProbe| p.format_property().set(PixelFormat::Rgba32Float)),
    ];

    for (i, edit) in edits.iter().enumerate() {
        let mut probe = probe();
        probe.update_samples();
        edit(&probe);
        probe.update();
        assert_eq!(probe.sample_offset(), 0, "edit {i} did not invalidate");
    }
}

// ============================================================================
// Render targets
// ============================================================================

#[test]
fn cache_creates_six_targets() {
    let mut device = CpuDevice::new();
    let mut probe = probe();
    probe.cache(&mut device).unwrap();

    assert!(probe.is_cached());
    assert_eq!(device.texture_count(), 6);

    let source = device.cube(probe.environment_cube_map().unwrap()).unwrap();
    assert_eq!(source.size(), 8);
    let mdr = device.parameters(probe.environment_cube_map_mdr().unwrap()).unwrap();
    assert_eq!(mdr.format, PixelFormat::Rgba8Unorm);

    let diffuse = device.cube(probe.diffuse_cube_map().unwrap()).unwrap();
    assert_eq!((diffuse.size(), diffuse.mip_levels()), (4, 1));
    let specular = device.cube(probe.specular_cube_map().unwrap()).unwrap();
    // 8 -> 4 mips, minus one dropped.
    assert_eq!((specular.size(), specular.mip_levels()), (8, 3));

    assert_ne!(probe.diffuse_cube_map(), probe.last_diffuse_cube_map());
    assert_ne!(probe.specular_cube_map(), probe.last_specular_cube_map());
}

#[test]
fn cache_is_idempotent_until_layout_changes() {
    let mut device = CpuDevice::new();
    let mut probe = probe();
    probe.cache(&mut device).unwrap();
    let old_diffuse = probe.diffuse_cube_map().unwrap();

    probe.update_samples();
    probe.cache(&mut device).unwrap();
    assert!(device.contains(old_diffuse));
    assert_eq!(probe.sample_offset(), 1);
    assert_eq!(device.texture_count(), 6);

    probe.diffuse_resolution_property().set(2);
    probe.cache(&mut device).unwrap();
    assert_eq!(device.texture_count(), 6);
    assert!(!device.contains(old_diffuse));
    assert_eq!(device.cube(probe.diffuse_cube_map().unwrap()).unwrap().size(), 2);
    assert_eq!(probe.sample_offset(), 0);
}

#[test]
fn current_and_previous_swap_with_render_id() {
    let mut device = CpuDevice::new();
    let mut probe = probe();
    probe.cache(&mut device).unwrap();
    let first = probe.diffuse_cube_map();
    let second = probe.last_diffuse_cube_map();

    probe.update_samples();
    assert_eq!(probe.diffuse_cube_map(), second);
    assert_eq!(probe.last_diffuse_cube_map(), first);
}

#[test]
fn free_releases_targets() {
    let mut device = CpuDevice::new();
    let mut probe = probe();
    probe.cache(&mut device).unwrap();
    probe.free(&mut device);

    assert_eq!(device.texture_count(), 0);
    assert!(!probe.is_cached());
    assert!(probe.diffuse_cube_map().is_none());
    assert!(probe.environment_cube_map().is_none());
}

#[test]
fn zero_resolution_fails_to_cache() {
    let mut device = CpuDevice::new();
    let mut probe = probe();
    probe.diffuse_resolution_property().set(0);
    assert!(probe.cache(&mut device).is_err());
}
