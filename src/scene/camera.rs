//! Perspective camera driven by the property graph, with a shareable
//! transform snapshot.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::property::{
    FloatProperty, MatrixProperty, Property, TransformProperty, Vector3Property,
};

/// Frozen copy of a camera's transforms.
///
/// Renderers read this instead of the live properties, so one camera can be
/// made to render with another camera's matrices (see
/// [`Camera::set_transform_cache`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransformCache {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub location: Vec3,
    pub z_near: f32,
    pub z_far: f32,
    /// Hemisphere selector for dual-paraboloid captures (+1 or -1).
    pub dp_direction: f32,
}

impl Default for CameraTransformCache {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            location: Vec3::ZERO,
            z_near: 0.1,
            z_far: 1000.0,
            dp_direction: 1.0,
        }
    }
}

pub type SharedTransformCache = Rc<RefCell<CameraTransformCache>>;

/// Perspective camera whose matrices are derived through the property graph.
///
/// The camera looks along its local +Z (left handed, depth in `[0, 1]`).
/// Rotation is Euler degrees: `x` pitch, `y` yaw, `z` roll.
pub struct Camera {
    pub name: String,

    translation: Vector3Property,
    rotation: Vector3Property,
    fov: FloatProperty,
    aspect: FloatProperty,
    z_near: FloatProperty,
    z_far: FloatProperty,
    dp_direction: FloatProperty,

    transform: TransformProperty,
    view: MatrixProperty,
    projection: MatrixProperty,
    view_projection: MatrixProperty,

    own_cache: SharedTransformCache,
    substitute: Option<SharedTransformCache>,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(name: impl Into<String>, fov: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        let translation = Vector3Property::new("translation", Vec3::ZERO);
        let rotation = Vector3Property::new("rotation", Vec3::ZERO);
        let fov = FloatProperty::new("fov", fov);
        let aspect = FloatProperty::new("aspect", aspect);
        let z_near = FloatProperty::new("zNear", z_near);
        let z_far = FloatProperty::new("zFar", z_far);

        let transform = TransformProperty::new();
        transform.set_translation(Some(&translation));
        transform.set_rotation(Some(&rotation));

        let view = {
            let world = transform.world_property().clone();
            Property::computed("view", Mat4::IDENTITY, move || world.get().inverse())
        };
        view.add_dependency(transform.world_property(), 0);

        let projection = {
            let (fov, aspect, z_near, z_far) = (fov.clone(), aspect.clone(), z_near.clone(), z_far.clone());
            Property::computed("projection", Mat4::IDENTITY, move || {
                Mat4::perspective_lh(fov.get().to_radians(), aspect.get(), z_near.get(), z_far.get())
            })
        };
        projection.add_dependency(&fov, 0);
        projection.add_dependency(&aspect, 1);
        projection.add_dependency(&z_near, 2);
        projection.add_dependency(&z_far, 3);

        let view_projection = {
            let (view, projection) = (view.clone(), projection.clone());
            Property::computed("viewProjection", Mat4::IDENTITY, move || projection.get() * view.get())
        };
        view_projection.add_dependency(&view, 0);
        view_projection.add_dependency(&projection, 1);

        let camera = Self {
            name: name.into(),
            translation,
            rotation,
            fov,
            aspect,
            z_near,
            z_far,
            dp_direction: FloatProperty::new("dpDirection", 1.0),
            transform,
            view,
            projection,
            view_projection,
            own_cache: Rc::new(RefCell::new(CameraTransformCache::default())),
            substitute: None,
        };
        camera.cache_transforms();
        camera
    }

    /// Points the camera at `target` from its current location, clearing roll.
    pub fn look_at(&self, target: Vec3) {
        let Some(direction) = (target - self.location()).try_normalize() else {
            return;
        };
        let yaw = direction.x.atan2(direction.z).to_degrees();
        let pitch = (-direction.y.clamp(-1.0, 1.0)).asin().to_degrees();
        self.rotation.set(Vec3::new(pitch, yaw, 0.0));
    }

    /// Snapshots the live matrices into the camera's own cache.
    pub fn cache_transforms(&self) {
        *self.own_cache.borrow_mut() = self.live_transforms();
    }

    /// Current live values, bypassing every cache.
    #[must_use]
    pub fn live_transforms(&self) -> CameraTransformCache {
        CameraTransformCache {
            view: self.view.get(),
            projection: self.projection.get(),
            view_projection: self.view_projection.get(),
            location: self.location(),
            z_near: self.z_near.get(),
            z_far: self.z_far.get(),
            dp_direction: self.dp_direction.get(),
        }
    }

    /// Transforms renderers should use: the substitute if one is set,
    /// otherwise the last [`cache_transforms`](Self::cache_transforms) snapshot.
    #[must_use]
    pub fn transform_cache(&self) -> CameraTransformCache {
        *self.substitute.as_ref().unwrap_or(&self.own_cache).borrow()
    }

    /// Handle to this camera's own cache, for sharing with other cameras.
    #[must_use]
    pub fn shared_transform_cache(&self) -> SharedTransformCache {
        Rc::clone(&self.own_cache)
    }

    /// Substitutes another cache (`None` restores the camera's own).
    pub fn set_transform_cache(&mut self, cache: Option<SharedTransformCache>) {
        self.substitute = cache;
    }

    #[must_use]
    pub fn has_substitute_cache(&self) -> bool {
        self.substitute.is_some()
    }

    #[must_use]
    pub fn location(&self) -> Vec3 {
        self.transform.world().w_axis.truncate()
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        self.view.get()
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection.get()
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection.get()
    }

    #[must_use]
    pub fn translation_property(&self) -> &Vector3Property {
        &self.translation
    }

    #[must_use]
    pub fn rotation_property(&self) -> &Vector3Property {
        &self.rotation
    }

    #[must_use]
    pub fn fov_property(&self) -> &FloatProperty {
        &self.fov
    }

    #[must_use]
    pub fn aspect_property(&self) -> &FloatProperty {
        &self.aspect
    }

    #[must_use]
    pub fn z_near_property(&self) -> &FloatProperty {
        &self.z_near
    }

    #[must_use]
    pub fn z_far_property(&self) -> &FloatProperty {
        &self.z_far
    }

    #[must_use]
    pub fn dp_direction_property(&self) -> &FloatProperty {
        &self.dp_direction
    }

    #[must_use]
    pub fn transform(&self) -> &TransformProperty {
        &self.transform
    }

    #[must_use]
    pub fn view_property(&self) -> &MatrixProperty {
        &self.view
    }

    #[must_use]
    pub fn projection_property(&self) -> &MatrixProperty {
        &self.projection
    }

    #[must_use]
    pub fn view_projection_property(&self) -> &MatrixProperty {
        &self.view_projection
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective("Camera", 45.0, 1.0, 0.1, 1000.0)
    }
}
