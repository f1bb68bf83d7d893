//! Camera tests
//!
//! Tests for:
//! - View / projection derivation through the property graph
//! - CameraTransformCache snapshots
//! - Substituting another camera's cache

use glam::{Mat4, Vec3};
use ibl_baker::scene::{Camera, CameraTransformCache};

const EPSILON: f32 = 1e-4;

#[test]
fn view_is_inverse_of_world() {
    let camera = Camera::default();
    camera.translation_property().set(Vec3::new(3.0, -1.0, 2.0));
    camera.rotation_property().set(Vec3::new(10.0, 35.0, 0.0));

    let product = camera.view() * camera.transform().world();
    assert!(product.abs_diff_eq(Mat4::IDENTITY, EPSILON));
}

#[test]
fn projection_tracks_its_properties() {
    let camera = Camera::new_perspective("cam", 60.0, 16.0 / 9.0, 0.5, 200.0);
    let expected = Mat4::perspective_lh(60f32.to_radians(), 16.0 / 9.0, 0.5, 200.0);
    assert!(camera.projection().abs_diff_eq(expected, EPSILON));

    camera.fov_property().set(90.0);
    assert!(camera.projection_property().is_dirty());
    assert!(camera.view_projection_property().is_dirty());
    let expected = Mat4::perspective_lh(90f32.to_radians(), 16.0 / 9.0, 0.5, 200.0);
    assert!(camera.projection().abs_diff_eq(expected, EPSILON));
}

#[test]
fn view_projection_is_projection_times_view() {
    let camera = Camera::default();
    camera.translation_property().set(Vec3::new(0.0, 1.0, -4.0));
    let expected = camera.projection() * camera.view();
    assert!(camera.view_projection().abs_diff_eq(expected, EPSILON));
}

#[test]
fn cache_is_a_snapshot() {
    let camera = Camera::default();
    camera.translation_property().set(Vec3::new(1.0, 2.0, 3.0));
    camera.cache_transforms();
    let frozen = camera.transform_cache();
    assert!(frozen.location.abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), EPSILON));

    // Moving the live camera leaves the snapshot alone until re-cached.
    camera.translation_property().set(Vec3::ZERO);
    assert_eq!(camera.transform_cache(), frozen);
    assert_ne!(camera.live_transforms(), frozen);

    camera.cache_transforms();
    assert!(camera.transform_cache().location.abs_diff_eq(Vec3::ZERO, EPSILON));
}

#[test]
fn substituted_cache_is_shared_not_copied() {
    let capture = Camera::default();
    capture.translation_property().set(Vec3::new(0.0, 5.0, 0.0));
    capture.z_far_property().set(50.0);
    capture.cache_transforms();

    let mut viewer = Camera::default();
    viewer.set_transform_cache(Some(capture.shared_transform_cache()));
    assert!(viewer.has_substitute_cache());
    assert_eq!(viewer.transform_cache(), capture.transform_cache());
    assert_eq!(viewer.transform_cache().z_far, 50.0);

    // Re-caching the capture camera is visible through the viewer.
    capture.translation_property().set(Vec3::new(0.0, 7.0, 0.0));
    capture.cache_transforms();
    assert!(viewer.transform_cache().location.abs_diff_eq(Vec3::new(0.0, 7.0, 0.0), EPSILON));

    // The viewer's own live state never changed.
    assert!(viewer.live_transforms().location.abs_diff_eq(Vec3::ZERO, EPSILON));

    viewer.set_transform_cache(None);
    viewer.cache_transforms();
    assert!(viewer.transform_cache().location.abs_diff_eq(Vec3::ZERO, EPSILON));
}

#[test]
fn default_cache_values() {
    let cache = CameraTransformCache::default();
    assert_eq!(cache.view, Mat4::IDENTITY);
    assert_eq!(cache.dp_direction, 1.0);
}

#[test]
fn dp_direction_is_captured() {
    let camera = Camera::default();
    camera.dp_direction_property().set(-1.0);
    camera.cache_transforms();
    assert_eq!(camera.transform_cache().dp_direction, -1.0);
}
