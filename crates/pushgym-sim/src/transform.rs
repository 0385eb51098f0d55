//! Rigid transform helpers shared by the observation pipeline.
//!
//! Poses cross the collaborator boundary as position + XYZ Euler angles;
//! composition and inversion go through nalgebra isometries.

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use pushgym_math::Point3;

/// Build an isometry from a position and XYZ (roll, pitch, yaw) Euler angles.
pub fn pose_to_isometry(position: &Point3, euler: &[f64; 3]) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::from_euler_angles(euler[0], euler[1], euler[2]),
    )
}

/// Decompose an isometry back into position + XYZ Euler angles.
pub fn isometry_to_pose(iso: &Isometry3<f64>) -> (Point3, [f64; 3]) {
    let (roll, pitch, yaw) = iso.rotation.euler_angles();
    (
        Point3::new(iso.translation.x, iso.translation.y, iso.translation.z),
        [roll, pitch, yaw],
    )
}

/// Invert a rigid transform.
pub fn invert_transform(iso: &Isometry3<f64>) -> Isometry3<f64> {
    iso.inverse()
}

/// Compose two rigid transforms (`a` applied after `b`).
pub fn multiply_transforms(a: &Isometry3<f64>, b: &Isometry3<f64>) -> Isometry3<f64> {
    a * b
}

/// Convert a unit quaternion to XYZ Euler angles.
pub fn quat_to_euler(q: &UnitQuaternion<f64>) -> [f64; 3] {
    let (roll, pitch, yaw) = q.euler_angles();
    [roll, pitch, yaw]
}
