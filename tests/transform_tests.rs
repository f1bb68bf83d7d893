//! TransformProperty tests
//!
//! Tests for:
//! - Pure translation scenario
//! - TRS composition order and Euler degrees
//! - Driven and parent composition
//! - Lazy world updates through the graph

use glam::{Mat4, Quat, Vec3, Vec4};
use ibl_baker::property::transform::rotation_from_euler_degrees;
use ibl_baker::property::{MatrixProperty, TransformProperty, Vector3Property};
use std::f32::consts::FRAC_PI_2;

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn trs(t: Vec3, r: Vec3, s: Vec3) -> (Vector3Property, Vector3Property, Vector3Property, TransformProperty) {
    let t = Vector3Property::new("translation", t);
    let r = Vector3Property::new("rotation", r);
    let s = Vector3Property::new("scale", s);
    let transform = TransformProperty::with_trs(&t, &r, &s);
    (t, r, s, transform)
}

// ============================================================================
// Composition
// ============================================================================

#[test]
fn pure_translation_world_matrix() {
    let (_t, _r, _s, transform) = trs(Vec3::X, Vec3::ZERO, Vec3::ONE);
    let world = transform.world_property().get();

    assert_eq!(world, Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0)));
    assert_eq!(world.w_axis, Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(world.x_axis, Vec4::X);
    assert_eq!(world.y_axis, Vec4::Y);
    assert_eq!(world.z_axis, Vec4::Z);
}

#[test]
fn empty_transform_is_identity() {
    let transform = TransformProperty::new();
    assert_eq!(transform.world(), Mat4::IDENTITY);
    assert_eq!(transform.pre_world_property().get(), Mat4::IDENTITY);
}

#[test]
fn scale_then_rotate_then_translate() {
    let (_t, _r, _s, transform) = trs(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::new(0.0, 90.0, 0.0),
        Vec3::splat(2.0),
    );
    // +X scaled to 2, yawed 90 degrees onto -Z, then moved to z = 5.
    let p = transform.world().transform_point3(Vec3::X);
    assert!(vec3_approx(p, Vec3::new(0.0, 0.0, 3.0)), "{p:?}");
}

#[test]
fn euler_degrees_apply_roll_pitch_yaw() {
    let q = rotation_from_euler_degrees(Vec3::new(30.0, 45.0, 60.0));
    let expected = Quat::from_rotation_y(45f32.to_radians())
        * Quat::from_rotation_x(30f32.to_radians())
        * Quat::from_rotation_z(60f32.to_radians());
    assert!(q.abs_diff_eq(expected, EPSILON));

    let yaw = rotation_from_euler_degrees(Vec3::new(0.0, 90.0, 0.0));
    assert!(yaw.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), EPSILON));
}

// ============================================================================
// Driven / Parent
// ============================================================================

#[test]
fn driven_overrides_local_composition() {
    let (_t, _r, _s, transform) = trs(Vec3::X, Vec3::ZERO, Vec3::ONE);
    let driven = MatrixProperty::new("driven", Mat4::from_scale(Vec3::splat(3.0)));
    transform.set_driven(Some(&driven));

    assert!(transform.has_driven());
    let p = transform.world().transform_point3(Vec3::ZERO);
    assert!(vec3_approx(p, Vec3::new(3.0, 0.0, 0.0)));

    transform.set_driven(None);
    assert!(vec3_approx(transform.world().transform_point3(Vec3::ZERO), Vec3::X));
}

#[test]
fn parent_composes_hierarchically() {
    let (parent_t, _pr, _ps, parent) = trs(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::ONE);
    let (_t, _r, _s, child) = trs(Vec3::X, Vec3::ZERO, Vec3::ONE);
    child.set_parent(Some(parent.world_property()));

    assert!(child.has_parent());
    assert!(vec3_approx(child.world().w_axis.truncate(), Vec3::new(1.0, 10.0, 0.0)));

    // Moving the parent dirties the child through the graph.
    parent_t.set(Vec3::new(0.0, -2.0, 0.0));
    assert!(child.world_property().is_dirty());
    assert!(vec3_approx(child.world().w_axis.truncate(), Vec3::new(1.0, -2.0, 0.0)));
}

#[test]
fn parent_applies_after_driven() {
    let (_t, _r, _s, transform) = trs(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
    let driven = MatrixProperty::new("driven", Mat4::from_translation(Vec3::X));
    let parent = MatrixProperty::new("parent", Mat4::from_scale(Vec3::splat(2.0)));
    transform.set_driven(Some(&driven));
    transform.set_parent(Some(&parent));

    // parent * driven: translate by 1, then scale by 2.
    assert!(vec3_approx(transform.world().w_axis.truncate(), Vec3::new(2.0, 0.0, 0.0)));
}

#[test]
fn world_recomputes_lazily_on_input_change() {
    let (t, _r, s, transform) = trs(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
    let _ = transform.world();
    assert!(!transform.world_property().is_dirty());

    t.set(Vec3::new(4.0, 5.0, 6.0));
    s.set(Vec3::splat(0.5));
    assert!(transform.pre_world_property().is_dirty());
    assert!(transform.world_property().is_dirty());

    let world = transform.world();
    assert!(vec3_approx(world.w_axis.truncate(), Vec3::new(4.0, 5.0, 6.0)));
    assert!(vec3_approx(world.transform_vector3(Vec3::ONE), Vec3::splat(0.5)));
}
