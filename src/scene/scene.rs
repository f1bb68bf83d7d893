//! Scene container and per-frame orchestration.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::device::RenderDevice;
use crate::errors::{BakerError, Result};
use crate::ibl::{Brdf, IblProbe, ProbeConvolver};
use crate::scene::camera::Camera;
use crate::scene::entity::{Entity, Mesh};
use crate::scene::material::Material;
use crate::scene::{EntityKey, MaterialKey, MeshKey, ProbeKey};
use crate::utils::interner::{self, ALL_PASS, Symbol};

/// Scene container
///
/// Owns every entity, mesh, material and probe, one camera, and a cache of
/// BRDFs of which one is active. Meshes are additionally bucketed by render
/// pass so pass drivers can iterate their draw list directly.
///
/// # Frame protocol
///
/// ```rust,ignore
/// scene.update(&mut device)?;                        // rehash, (re)cache, BRDF
/// scene.accumulate_probes(&mut device, &mut conv)?;  // one step per probe
/// ```
pub struct Scene {
    pub camera: Camera,

    entities: SlotMap<EntityKey, Entity>,
    meshes: SlotMap<MeshKey, Mesh>,
    materials: SlotMap<MaterialKey, Material>,
    probes: SlotMap<ProbeKey, IblProbe>,

    brdfs: Vec<Brdf>,
    active_brdf: usize,

    passes: FxHashMap<Symbol, Vec<MeshKey>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::with_camera(Camera::default())
    }

    #[must_use]
    pub fn with_camera(camera: Camera) -> Self {
        Self {
            camera,
            entities: SlotMap::with_key(),
            meshes: SlotMap::with_key(),
            materials: SlotMap::with_key(),
            probes: SlotMap::with_key(),
            brdfs: Vec::new(),
            active_brdf: 0,
            passes: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Per-frame bookkeeping: every probe rehashes its tunables and makes sure
    /// its targets exist, then the active BRDF is computed if it is not yet.
    pub fn update(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        for probe in self.probes.values_mut() {
            probe.update();
            probe.cache(device)?;
        }
        if let Some(brdf) = self.brdfs.get_mut(self.active_brdf) {
            brdf.compute(device)?;
        }
        Ok(())
    }

    /// Runs one accumulation step for every cached probe that is not yet
    /// computed. Returns how many probes advanced.
    pub fn accumulate_probes<D, C>(&mut self, device: &mut D, convolver: &mut C) -> Result<usize>
    where
        D: RenderDevice + ?Sized,
        C: ProbeConvolver<D> + ?Sized,
    {
        let mut advanced = 0;
        for probe in self.probes.values_mut() {
            if probe.computed() {
                continue;
            }
            if !probe.is_cached() {
                log::debug!("Probe '{}' skipped: targets not cached", probe.name);
                continue;
            }
            convolver.convolve(device, probe)?;
            probe.update_samples();
            advanced += 1;
        }
        Ok(advanced)
    }

    /// True once every probe is computed.
    #[must_use]
    pub fn probes_converged(&self) -> bool {
        self.probes.values().all(IblProbe::computed)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn add_entity(&mut self, entity: Entity) -> EntityKey {
        self.entities.insert(entity)
    }

    #[must_use]
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.entities.iter()
    }

    /// Composes `child`'s world matrix under `parent`'s.
    ///
    /// Returns `false` if either key is unknown or `child == parent`.
    pub fn attach(&mut self, child: EntityKey, parent: EntityKey) -> bool {
        if child == parent {
            return false;
        }
        let Some(parent_world) = self.entities.get(parent).map(|p| p.transform().world_property().clone())
        else {
            return false;
        };
        match self.entities.get(child) {
            Some(child) => {
                child.transform().set_parent(Some(&parent_world));
                true
            }
            None => false,
        }
    }

    /// Detaches `child` from its parent, if any.
    pub fn detach(&mut self, child: EntityKey) -> bool {
        match self.entities.get(child) {
            Some(child) if child.transform().has_parent() => {
                child.transform().set_parent(None);
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Materials & Meshes
    // ========================================================================

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    /// Removes a material and destroys its textures.
    ///
    /// Meshes still referring to it keep their draw-list entries.
    pub fn remove_material(&mut self, key: MaterialKey, device: &mut dyn RenderDevice) -> Option<Material> {
        let mut material = self.materials.remove(key)?;
        material.free(device);
        Some(material)
    }

    /// Adds a mesh and buckets it into `"all"` plus every pass of its material.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshKey {
        let mut passes: Vec<Symbol> = vec![interner::intern(ALL_PASS)];
        if let Some(material) = mesh.material.and_then(|key| self.materials.get(key)) {
            for &pass in material.passes() {
                if !passes.contains(&pass) {
                    passes.push(pass);
                }
            }
        }

        let entity = mesh.entity;
        let key = self.meshes.insert(mesh);
        for pass in passes {
            self.passes.entry(pass).or_default().push(key);
        }
        if let Some(entity) = self.entities.get_mut(entity) {
            entity.meshes.push(key);
        }
        key
    }

    /// Removes a mesh from the scene and from every pass bucket.
    pub fn remove_mesh(&mut self, key: MeshKey) -> Option<Mesh> {
        let mesh = self.meshes.remove(key)?;
        self.passes.retain(|_, bucket| {
            bucket.retain(|&k| k != key);
            !bucket.is_empty()
        });
        if let Some(entity) = self.entities.get_mut(mesh.entity) {
            entity.meshes.retain(|&k| k != key);
        }
        Some(mesh)
    }

    #[must_use]
    pub fn mesh(&self, key: MeshKey) -> Option<&Mesh> {
        self.meshes.get(key)
    }

    #[must_use]
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Draw list of a render pass. Unknown passes yield an empty list.
    #[must_use]
    pub fn meshes_for_pass(&self, pass: &str) -> &[MeshKey] {
        interner::get(pass)
            .and_then(|sym| self.passes.get(&sym))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.keys().map(|&sym| interner::resolve(sym))
    }

    // ========================================================================
    // Probes
    // ========================================================================

    pub fn add_probe(&mut self, probe: IblProbe) -> ProbeKey {
        self.probes.insert(probe)
    }

    /// Removes a probe and releases its targets.
    pub fn remove_probe(&mut self, key: ProbeKey, device: &mut dyn RenderDevice) -> Option<IblProbe> {
        let mut probe = self.probes.remove(key)?;
        probe.free(device);
        Some(probe)
    }

    #[must_use]
    pub fn probe(&self, key: ProbeKey) -> Option<&IblProbe> {
        self.probes.get(key)
    }

    pub fn probe_mut(&mut self, key: ProbeKey) -> Option<&mut IblProbe> {
        self.probes.get_mut(key)
    }

    pub fn probes(&self) -> impl Iterator<Item = (ProbeKey, &IblProbe)> {
        self.probes.iter()
    }

    // ========================================================================
    // BRDFs
    // ========================================================================

    /// Adds a BRDF to the cache and returns its index.
    pub fn add_brdf(&mut self, brdf: Brdf) -> usize {
        self.brdfs.push(brdf);
        self.brdfs.len() - 1
    }

    pub fn set_active_brdf(&mut self, index: usize) -> Result<()> {
        if index >= self.brdfs.len() {
            return Err(BakerError::InvalidBrdfIndex {
                index,
                count: self.brdfs.len(),
            });
        }
        self.active_brdf = index;
        Ok(())
    }

    #[must_use]
    pub fn active_brdf(&self) -> Option<&Brdf> {
        self.brdfs.get(self.active_brdf)
    }

    #[must_use]
    pub fn active_brdf_index(&self) -> usize {
        self.active_brdf
    }

    #[must_use]
    pub fn brdfs(&self) -> &[Brdf] {
        &self.brdfs
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Destroys every device resource owned by the scene's probes,
    /// materials and BRDFs. The scene stays usable; probes and BRDFs
    /// recreate their targets on the next [`update`](Self::update).
    pub fn free(&mut self, device: &mut dyn RenderDevice) {
        for probe in self.probes.values_mut() {
            probe.free(device);
        }
        for material in self.materials.values_mut() {
            material.free(device);
        }
        for brdf in &mut self.brdfs {
            brdf.free(device);
        }
        log::debug!("Scene resources released");
    }
}
