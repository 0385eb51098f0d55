//! Observation assembly.
//!
//! The observation vector is an ordered concatenation consumers index into
//! at fixed offsets: robot state, world/object state, the object pose
//! expressed in the hand frame, then the target pose. Each element carries
//! a declared `[low, high]` bound; vector and bound list always have the
//! same length.

use std::f64::consts::PI;

use pushgym_math::Point3;
use pushgym_sim::{invert_transform, isometry_to_pose, multiply_transforms, pose_to_isometry};

/// Declared bound on each axis of the object-in-hand-frame position.
const IN_HAND_POS_BOUND: f64 = 0.5;

/// Assemble the full observation and its bounds.
///
/// `robot_obs` and `world_obs` both start with a pose: position (3) then
/// XYZ Euler angles (3); anything after that is appended untouched with its
/// own bounds.
pub fn build_observation(
    robot_obs: &[f64],
    robot_bounds: &[[f64; 2]],
    world_obs: &[f64],
    world_bounds: &[[f64; 2]],
    target_pose: &Point3,
) -> (Vec<f64>, Vec<[f64; 2]>) {
    debug_assert!(robot_obs.len() >= 6 && robot_obs.len() == robot_bounds.len());
    debug_assert!(world_obs.len() >= 6 && world_obs.len() == world_bounds.len());

    let mut observation = Vec::with_capacity(robot_obs.len() + world_obs.len() + 9);
    let mut bounds = Vec::with_capacity(observation.capacity());

    // Robot and world state, with their declared limits.
    observation.extend_from_slice(robot_obs);
    bounds.extend_from_slice(robot_bounds);
    observation.extend_from_slice(world_obs);
    bounds.extend_from_slice(world_bounds);

    // Object pose expressed in the hand frame.
    let hand = pose_to_isometry(
        &Point3::new(robot_obs[0], robot_obs[1], robot_obs[2]),
        &[robot_obs[3], robot_obs[4], robot_obs[5]],
    );
    let object = pose_to_isometry(
        &Point3::new(world_obs[0], world_obs[1], world_obs[2]),
        &[world_obs[3], world_obs[4], world_obs[5]],
    );
    let object_in_hand = multiply_transforms(&invert_transform(&hand), &object);
    let (pos_in_hand, euler_in_hand) = isometry_to_pose(&object_in_hand);

    observation.extend_from_slice(&[pos_in_hand.x, pos_in_hand.y, pos_in_hand.z]);
    bounds.extend([[-IN_HAND_POS_BOUND, IN_HAND_POS_BOUND]; 3]);
    observation.extend_from_slice(&euler_in_hand);
    bounds.extend([[0.0, 2.0 * PI]; 3]);

    // Target pose, reusing the world position bounds.
    observation.extend_from_slice(&[target_pose.x, target_pose.y, target_pose.z]);
    bounds.extend_from_slice(&world_bounds[..3]);

    (observation, bounds)
}
