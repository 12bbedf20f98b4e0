#![allow(dead_code)]

use nalgebra::{UnitQuaternion, Vector3};
use vizij_motion_core::{AffineTransform, MemoryPoseLibrary};

pub const TICK: f32 = 1.0 / 30.0;

/// Load and validate a pose library fixture by manifest key.
pub fn library(name: &str) -> MemoryPoseLibrary {
    let json = vizij_test_fixtures::pose_libraries::json(name).expect("fixture json");
    MemoryPoseLibrary::from_json(&json).expect("fixture library")
}

pub fn translation(x: f32, y: f32, z: f32) -> AffineTransform {
    AffineTransform::from_translation(Vector3::new(x, y, z))
}

pub fn yaw(angle: f32) -> AffineTransform {
    AffineTransform::from_rotation(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle))
}

/// Signed angle of a rotation about +x.
pub fn pitch_of(transform: &AffineTransform) -> f32 {
    transform.q.scaled_axis().x
}

pub fn assert_transform_eq(actual: &AffineTransform, expected: &AffineTransform, eps: f32) {
    approx::assert_relative_eq!(actual.t, expected.t, epsilon = eps);
    // q and -q are the same rotation.
    let a = actual.q.coords;
    let b = expected.q.coords;
    let diff = (a - b).norm().min((a + b).norm());
    assert!(
        diff <= eps,
        "rotation differs by {diff}: {:?} vs {:?}",
        actual.q,
        expected.q
    );
}
