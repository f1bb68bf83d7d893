//! Bakes one probe of a procedural sky on the CPU.
//!
//! ```text
//! cargo run --example bake_probe -- [settings.json]
//! ```

use glam::Vec3;
use ibl_baker::cubemap::{CubeFace, CubeImage};
use ibl_baker::device::CpuDevice;
use ibl_baker::ibl::{Brdf, CpuConvolver, IblProbe};
use ibl_baker::scene::Scene;
use ibl_baker::settings::BakerSettings;
use ibl_baker::utils::{ChangeSet, FileWatcher};

fn sky(size: u32) -> ibl_baker::Result<CubeImage<f32>> {
    let zenith = Vec3::new(0.2, 0.4, 1.0);
    let horizon = Vec3::new(1.0, 0.9, 0.8);
    let ground = Vec3::new(0.15, 0.12, 0.1);
    CubeImage::from_fn(size, 1, 4, |face: CubeFace, _, x, y, c| {
        let dir = face.texel_direction(x, y, size);
        let rgb = if dir.y >= 0.0 {
            horizon.lerp(zenith, dir.y)
        } else {
            ground
        };
        if c < 3 { rgb[c as usize] * 2.0 } else { 1.0 }
    })
}

fn main() -> ibl_baker::Result<()> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => BakerSettings::from_path(path)?,
        None => {
            let mut settings = BakerSettings::default();
            settings.probe.source_resolution = 32;
            settings.probe.specular_resolution = 32;
            settings.probe.diffuse_resolution = 8;
            settings.probe.sample_count = 256;
            settings.probe.samples_per_frame = 32;
            settings.brdf.lut_size = 32;
            settings
        }
    };

    let changes = ChangeSet::new();
    let _watcher = match &settings.watch_dir {
        Some(dir) => Some(FileWatcher::watch(dir, changes.clone())?),
        None => None,
    };

    let mut device = CpuDevice::new();
    let mut convolver = CpuConvolver::new(sky(64)?, settings.fixup);
    let mut scene = Scene::new();
    scene.add_brdf(Brdf::new("ggx", settings.brdf));
    let key = scene.add_probe(IblProbe::from_settings("sky", &settings.probe));

    let mut frame = 0;
    loop {
        for path in changes.drain() {
            log::info!("Changed: {}", path.display());
        }

        scene.update(&mut device)?;
        if scene.probes_converged() {
            break;
        }
        scene.accumulate_probes(&mut device, &mut convolver)?;
        frame += 1;

        if let Some(probe) = scene.probe(key) {
            log::info!("frame {frame}: {:.0}%", probe.progress() * 100.0);
        }
    }

    if let Some(probe) = scene.probe(key)
        && let Some(diffuse) = probe.diffuse_cube_map().and_then(|key| device.cube(key))
    {
        let up = diffuse.sample_nearest(Vec3::Y, 0);
        let down = diffuse.sample_nearest(Vec3::NEG_Y, 0);
        println!("Baked '{}' in {frame} frames", probe.name);
        println!("  irradiance up:   {up}");
        println!("  irradiance down: {down}");
    }
    Ok(())
}
