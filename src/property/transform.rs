//! Transform Property
//!
//! Derives a pre-world and a world matrix from typed dependency slots:
//!
//! ```text
//! pre_world = T * R * S
//! world     = parent * driven * pre_world
//! ```
//!
//! Matrices follow glam's column-vector convention. Rotation is given in
//! Euler degrees and applied roll (Z), pitch (X), then yaw (Y).
//!
//! Each slot is optional. Missing translation, rotation and scale fall back to
//! zero, zero and one; missing `driven`/`parent` matrices are skipped.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::{DependencyId, MatrixProperty, Property, Vector3Property};

/// Role of a dependency wired into a [`TransformProperty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TransformSlot {
    Translation = 0,
    Rotation = 1,
    Scale = 2,
    Parent = 3,
    Driven = 4,
    PreWorld = 5,
}

impl TransformSlot {
    #[inline]
    #[must_use]
    pub fn id(self) -> DependencyId {
        self as DependencyId
    }
}

#[derive(Default)]
struct TransformInputs {
    translation: Option<Vector3Property>,
    rotation: Option<Vector3Property>,
    scale: Option<Vector3Property>,
    parent: Option<MatrixProperty>,
    driven: Option<MatrixProperty>,
}

/// Builds a rotation from Euler angles in degrees (x = pitch, y = yaw, z = roll).
#[must_use]
pub fn rotation_from_euler_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Composite property producing pre-world and world matrices.
pub struct TransformProperty {
    inputs: Rc<RefCell<TransformInputs>>,
    pre_world: MatrixProperty,
    world: MatrixProperty,
}

impl TransformProperty {
    #[must_use]
    pub fn new() -> Self {
        let inputs = Rc::new(RefCell::new(TransformInputs::default()));

        let pre_world = {
            let inputs = Rc::clone(&inputs);
            Property::computed("preWorld", Mat4::IDENTITY, move || {
                let (translation, rotation, scale) = {
                    let inputs = inputs.borrow();
                    (
                        inputs.translation.clone(),
                        inputs.rotation.clone(),
                        inputs.scale.clone(),
                    )
                };
                let translation = translation.map_or(Vec3::ZERO, |p| p.get());
                let rotation = rotation.map_or(Vec3::ZERO, |p| p.get());
                let scale = scale.map_or(Vec3::ONE, |p| p.get());

                Mat4::from_scale_rotation_translation(
                    scale,
                    rotation_from_euler_degrees(rotation),
                    translation,
                )
            })
        };

        let world = {
            let inputs = Rc::clone(&inputs);
            let pre_world = pre_world.clone();
            Property::computed("world", Mat4::IDENTITY, move || {
                let (driven, parent) = {
                    let inputs = inputs.borrow();
                    (inputs.driven.clone(), inputs.parent.clone())
                };
                let mut world = pre_world.get();
                if let Some(driven) = driven {
                    world = driven.get() * world;
                }
                if let Some(parent) = parent {
                    world = parent.get() * world;
                }
                world
            })
        };
        world.add_dependency(&pre_world, TransformSlot::PreWorld.id());

        Self {
            inputs,
            pre_world,
            world,
        }
    }

    /// Convenience constructor wiring translation, rotation and scale.
    #[must_use]
    pub fn with_trs(
        translation: &Vector3Property,
        rotation: &Vector3Property,
        scale: &Vector3Property,
    ) -> Self {
        let transform = Self::new();
        transform.set_translation(Some(translation));
        transform.set_rotation(Some(rotation));
        transform.set_scale(Some(scale));
        transform
    }

    #[inline]
    #[must_use]
    pub fn pre_world_property(&self) -> &MatrixProperty {
        &self.pre_world
    }

    #[inline]
    #[must_use]
    pub fn world_property(&self) -> &MatrixProperty {
        &self.world
    }

    #[inline]
    #[must_use]
    pub fn world(&self) -> Mat4 {
        self.world.get()
    }

    pub fn set_translation(&self, translation: Option<&Vector3Property>) {
        self.rewire(&self.pre_world, TransformSlot::Translation, translation, |i| {
            &mut i.translation
        });
    }

    pub fn set_rotation(&self, rotation: Option<&Vector3Property>) {
        self.rewire(&self.pre_world, TransformSlot::Rotation, rotation, |i| {
            &mut i.rotation
        });
    }

    pub fn set_scale(&self, scale: Option<&Vector3Property>) {
        self.rewire(&self.pre_world, TransformSlot::Scale, scale, |i| &mut i.scale);
    }

    pub fn set_parent(&self, parent: Option<&MatrixProperty>) {
        self.rewire(&self.world, TransformSlot::Parent, parent, |i| &mut i.parent);
    }

    pub fn set_driven(&self, driven: Option<&MatrixProperty>) {
        self.rewire(&self.world, TransformSlot::Driven, driven, |i| &mut i.driven);
    }

    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.inputs.borrow().parent.is_some()
    }

    #[must_use]
    pub fn has_driven(&self) -> bool {
        self.inputs.borrow().driven.is_some()
    }

    fn rewire<T: Clone + 'static>(
        &self,
        target: &MatrixProperty,
        slot: TransformSlot,
        next: Option<&Property<T>>,
        field: impl Fn(&mut TransformInputs) -> &mut Option<Property<T>>,
    ) {
        let previous = {
            let mut inputs = self.inputs.borrow_mut();
            std::mem::replace(field(&mut *inputs), next.cloned())
        };
        if let Some(previous) = previous {
            target.remove_dependency(&previous, slot.id());
        }
        match next {
            Some(next) => target.add_dependency(next, slot.id()),
            None => target.mark_dirty(),
        }
    }
}

impl Default for TransformProperty {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_change_rewires_edges() {
        let transform = TransformProperty::new();
        let a = Vector3Property::new("a", Vec3::X);
        let b = Vector3Property::new("b", Vec3::Y);

        transform.set_translation(Some(&a));
        assert_eq!(transform.world().w_axis.truncate(), Vec3::X);

        transform.set_translation(Some(&b));
        assert_eq!(a.dependent_count(), 0);
        assert_eq!(transform.world().w_axis.truncate(), Vec3::Y);

        transform.set_translation(None);
        assert_eq!(transform.world().w_axis.truncate(), Vec3::ZERO);
    }
}
