//! A simulated humanoid arm collaborator.
//!
//! Under inverse-kinematics control the arm is reduced to its end effector:
//! a kinematic hand body driven straight to commanded poses, with the IK
//! solver abstracted away. Under direct joint control a small motorized
//! link chain is built instead and joint position targets are dispatched to
//! the motors.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use pushgym_math::{BoxLimits, Point3};
use pushgym_sim::{quat_to_euler, BodyKind, ShapeDesc, SimSession};

use crate::error::SceneError;
use crate::traits::{BoundedObservation, Robot};

/// Which arm is controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arm {
    /// Left arm (positive y side).
    #[default]
    Left,
    /// Right arm (negative y side).
    Right,
}

impl Arm {
    /// +1 for left, -1 for right; mirrors poses across the x-z plane.
    fn y_sign(&self) -> f64 {
        match self {
            Arm::Left => 1.0,
            Arm::Right => -1.0,
        }
    }
}

const HAND_BODY: &str = "hand";
const HAND_RADIUS: f64 = 0.025;

const NUM_ARM_JOINTS: usize = 4;
const LINK_HALF_LENGTH: f64 = 0.06;
const LINK_HALF_WIDTH: f64 = 0.02;
const LINK_MASS: f64 = 0.3;
const JOINT_LIMIT: f64 = FRAC_PI_2;
const SHOULDER_HEIGHT: f64 = 1.05;
const SHOULDER_Y: f64 = 0.35;

/// Rapier-backed arm collaborator.
pub struct ArmRobot {
    arm: Arm,
    use_inverse_kinematics: bool,
    control_orientation: bool,
    workspace: BoxLimits,
    rotation_limits: BoxLimits,
    home_hand_pose: [f64; 6],
    controlled_joints: Vec<usize>,
    seed: u64,
}

impl ArmRobot {
    /// Build an arm collaborator for the given control mode.
    pub fn new(arm: Arm, use_inverse_kinematics: bool, control_orientation: bool) -> Self {
        let s = arm.y_sign();
        // The y span is mirrored for the right arm.
        let y_far = s * 0.45;
        let workspace = BoxLimits::new(
            [-0.05, y_far.min(0.0), 0.55],
            [0.45, y_far.max(0.0), 1.05],
        );
        let rotation_limits = BoxLimits::new([-FRAC_PI_2; 3], [FRAC_PI_2; 3]);
        let home_hand_pose = [0.25, s * 0.2, 0.85, 0.0, -FRAC_PI_4, s * FRAC_PI_4];
        let controlled_joints = if use_inverse_kinematics {
            Vec::new()
        } else {
            (0..NUM_ARM_JOINTS).collect()
        };

        Self {
            arm,
            use_inverse_kinematics,
            control_orientation,
            workspace,
            rotation_limits,
            home_hand_pose,
            controlled_joints,
            seed: 0,
        }
    }

    fn joint_name(index: usize) -> String {
        format!("arm_joint_{index}")
    }

    fn link_name(index: usize) -> String {
        // The last link carries the hand body name so pose queries are
        // uniform across control modes.
        if index + 1 == NUM_ARM_JOINTS {
            HAND_BODY.to_string()
        } else {
            format!("arm_link_{index}")
        }
    }

    fn build_joint_chain(&self, sim: &mut SimSession) -> Result<(), SceneError> {
        let s = self.arm.y_sign();
        sim.insert_body(
            "arm_base",
            BodyKind::Fixed,
            ShapeDesc::Cuboid {
                half_extents: [0.04, 0.04, 0.04],
            },
            &Point3::new(0.0, s * SHOULDER_Y, SHOULDER_HEIGHT),
            &[0.0; 3],
            0.0,
            0.5,
        )?;

        for i in 0..NUM_ARM_JOINTS {
            let center_z = SHOULDER_HEIGHT - (2 * i + 1) as f64 * LINK_HALF_LENGTH;
            sim.insert_body(
                &Self::link_name(i),
                BodyKind::Dynamic,
                ShapeDesc::Cuboid {
                    half_extents: [LINK_HALF_WIDTH, LINK_HALF_WIDTH, LINK_HALF_LENGTH],
                },
                &Point3::new(0.0, s * SHOULDER_Y, center_z),
                &[0.0; 3],
                LINK_MASS,
                0.5,
            )?;

            let parent = if i == 0 {
                "arm_base".to_string()
            } else {
                Self::link_name(i - 1)
            };
            let parent_anchor_z = if i == 0 { -0.04 } else { -LINK_HALF_LENGTH };
            // Alternate pitch/roll axes down the chain.
            let axis = if i % 2 == 0 {
                [0.0, 1.0, 0.0]
            } else {
                [1.0, 0.0, 0.0]
            };
            sim.insert_revolute_joint(
                &Self::joint_name(i),
                &parent,
                &Self::link_name(i),
                [0.0, 0.0, parent_anchor_z],
                [0.0, 0.0, LINK_HALF_LENGTH],
                axis,
                Some((-JOINT_LIMIT, JOINT_LIMIT)),
            )?;
        }
        Ok(())
    }
}

impl Robot for ArmRobot {
    fn reset(&mut self, sim: &mut SimSession) -> Result<(), SceneError> {
        if self.use_inverse_kinematics {
            let home = self.home_hand_pose;
            sim.insert_body(
                HAND_BODY,
                BodyKind::Kinematic,
                ShapeDesc::Ball {
                    radius: HAND_RADIUS,
                },
                &Point3::new(home[0], home[1], home[2]),
                &[home[3], home[4], home[5]],
                0.0,
                0.8,
            )?;
        } else {
            self.build_joint_chain(sim)?;
        }
        Ok(())
    }

    fn observation(&self, sim: &SimSession) -> Result<BoundedObservation, SceneError> {
        let (pos, orn) = sim.body_pose(HAND_BODY)?;
        let euler = quat_to_euler(&orn);

        let mut obs = vec![pos.x, pos.y, pos.z, euler[0], euler[1], euler[2]];
        let mut bounds: Vec<[f64; 2]> = self.workspace.bound_pairs().to_vec();
        let two_pi = 2.0 * std::f64::consts::PI;
        bounds.extend([[-two_pi, two_pi]; 3]);

        if !self.use_inverse_kinematics {
            for &j in &self.controlled_joints {
                obs.push(sim.joint_motor_target(&Self::joint_name(j))?);
                bounds.push([-JOINT_LIMIT, JOINT_LIMIT]);
            }
        }
        Ok((obs, bounds))
    }

    fn apply_action(&mut self, sim: &mut SimSession, target: &[f64]) -> Result<(), SceneError> {
        if self.use_inverse_kinematics {
            let position = Point3::new(target[0], target[1], target[2]);
            let euler = if target.len() >= 6 {
                [target[3], target[4], target[5]]
            } else {
                // Orientation is not controlled: hold the home orientation.
                [
                    self.home_hand_pose[3],
                    self.home_hand_pose[4],
                    self.home_hand_pose[5],
                ]
            };
            sim.set_kinematic_target(HAND_BODY, &position, &euler)?;
        } else {
            for (i, &j) in self.controlled_joints.iter().enumerate() {
                sim.set_joint_motor_position(&Self::joint_name(j), target[i])?;
            }
        }
        Ok(())
    }

    fn workspace(&self) -> BoxLimits {
        self.workspace
    }

    fn set_workspace(&mut self, workspace: BoxLimits) {
        self.workspace = workspace;
    }

    fn rotation_limits(&self) -> BoxLimits {
        self.rotation_limits
    }

    fn action_dim(&self) -> usize {
        if self.use_inverse_kinematics {
            if self.control_orientation {
                6
            } else {
                3
            }
        } else {
            self.controlled_joints.len()
        }
    }

    fn home_hand_pose(&self) -> [f64; 6] {
        self.home_hand_pose
    }

    fn controlled_joints(&self) -> &[usize] {
        &self.controlled_joints
    }

    fn seed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushgym_sim::SessionMode;

    #[test]
    fn test_action_dims() {
        assert_eq!(ArmRobot::new(Arm::Left, true, false).action_dim(), 3);
        assert_eq!(ArmRobot::new(Arm::Left, true, true).action_dim(), 6);
        assert_eq!(
            ArmRobot::new(Arm::Left, false, false).action_dim(),
            NUM_ARM_JOINTS
        );
    }

    #[test]
    fn test_right_arm_mirrors_home_pose() {
        let left = ArmRobot::new(Arm::Left, true, false);
        let right = ArmRobot::new(Arm::Right, true, false);
        assert_eq!(left.home_hand_pose()[1], -right.home_hand_pose()[1]);
        assert!(left.workspace().high[1] > 0.0);
        assert!(right.workspace().low[1] < 0.0);
    }

    #[test]
    fn test_ik_reset_and_observe() {
        let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
        let mut robot = ArmRobot::new(Arm::Left, true, false);
        robot.reset(&mut sim).unwrap();

        let (obs, bounds) = robot.observation(&sim).unwrap();
        assert_eq!(obs.len(), 6);
        assert_eq!(obs.len(), bounds.len());
        let home = robot.home_hand_pose();
        for i in 0..3 {
            assert!((obs[i] - home[i]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ik_apply_action_moves_hand() {
        let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
        let mut robot = ArmRobot::new(Arm::Left, true, false);
        robot.reset(&mut sim).unwrap();

        let mut target = robot.home_hand_pose();
        target[0] += 0.05;
        robot.apply_action(&mut sim, &target[..3]).unwrap();
        sim.step();

        let (obs, _) = robot.observation(&sim).unwrap();
        assert!((obs[0] - target[0]).abs() < 1e-4);
    }

    #[test]
    fn test_joint_chain_reset_and_observe() {
        let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
        let mut robot = ArmRobot::new(Arm::Left, false, false);
        robot.reset(&mut sim).unwrap();

        let (obs, bounds) = robot.observation(&sim).unwrap();
        assert_eq!(obs.len(), 6 + NUM_ARM_JOINTS);
        assert_eq!(obs.len(), bounds.len());
        assert_eq!(robot.controlled_joints().len(), NUM_ARM_JOINTS);
    }

    #[test]
    fn test_joint_targets_read_back() {
        let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
        let mut robot = ArmRobot::new(Arm::Left, false, false);
        robot.reset(&mut sim).unwrap();

        robot
            .apply_action(&mut sim, &[0.1, -0.2, 0.3, 0.0])
            .unwrap();
        let (obs, _) = robot.observation(&sim).unwrap();
        let joints = &obs[6..];
        assert!((joints[0] - 0.1).abs() < 1e-6);
        assert!((joints[1] + 0.2).abs() < 1e-6);
        assert!((joints[2] - 0.3).abs() < 1e-6);
    }
}
