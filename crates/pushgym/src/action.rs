//! Action shaping: normalized agent actions become robot commands.

use pushgym_math::BoxLimits;

/// Position delta per unit action under IK control without orientation.
pub const IK_POSITION_GAIN: f64 = 0.005;
/// Position delta per unit action under IK control with orientation.
pub const IK_POSE_POSITION_GAIN: f64 = 0.01;
/// Orientation delta per unit action under IK control with orientation.
pub const IK_POSE_ORIENTATION_GAIN: f64 = 0.02;
/// Joint delta per unit action under direct joint control.
pub const JOINT_GAIN: f64 = 0.05;

/// The persistent hand pose integrated across steps.
///
/// This is explicit episode state owned by the controller: it is passed by
/// value into the shaper and returned updated, never mutated behind the
/// caller's back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandPose {
    /// Hand position in meters.
    pub position: [f64; 3],
    /// Hand orientation as XYZ Euler angles in radians.
    pub orientation: [f64; 3],
}

impl HandPose {
    /// Start from the robot's home pose.
    pub fn from_home(home: [f64; 6]) -> Self {
        Self {
            position: [home[0], home[1], home[2]],
            orientation: [home[3], home[4], home[5]],
        }
    }
}

/// Integrate one physical-space IK action onto the hand pose.
///
/// Without orientation control only the position moves; with it, both parts
/// move and the orientation is clipped into the rotation limits. The
/// position is always clipped into the workspace. The clipped pose is the
/// integrator state carried to the next call.
pub fn integrate_ik_action(
    mut hand: HandPose,
    physical_action: &[f64],
    control_orientation: bool,
    workspace: &BoxLimits,
    rotation_limits: &BoxLimits,
) -> HandPose {
    if control_orientation {
        for i in 0..3 {
            hand.position[i] += IK_POSE_POSITION_GAIN * physical_action[i];
            hand.orientation[i] += IK_POSE_ORIENTATION_GAIN * physical_action[3 + i];
        }
        rotation_limits.clamp_slice(&mut hand.orientation);
    } else {
        for i in 0..3 {
            hand.position[i] += IK_POSITION_GAIN * physical_action[i];
        }
    }
    workspace.clamp_slice(&mut hand.position);
    hand
}

/// The pose vector dispatched to the robot for the current hand pose.
pub fn ik_command(hand: &HandPose, control_orientation: bool) -> Vec<f64> {
    if control_orientation {
        vec![
            hand.position[0],
            hand.position[1],
            hand.position[2],
            hand.orientation[0],
            hand.orientation[1],
            hand.orientation[2],
        ]
    } else {
        hand.position.to_vec()
    }
}

/// Joint targets from fresh joint readings plus the scaled action.
///
/// Unlike the IK path there is no integrator: the current values are read
/// from the robot on every repeat.
pub fn joint_command(current_joints: &[f64], physical_action: &[f64]) -> Vec<f64> {
    current_joints
        .iter()
        .zip(physical_action)
        .map(|(&j, &a)| j + JOINT_GAIN * a)
        .collect()
}
