//! Environment configuration.

use serde::{Deserialize, Serialize};

use pushgym_scene::Arm;

use crate::error::{EnvError, Result};
use crate::reward::RewardPolicy;

/// Construction-time configuration of the push environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvConfig {
    /// Physics sub-steps per agent action.
    pub action_repeat: u32,
    /// Task-space pose deltas under IK control, joint deltas otherwise.
    pub use_inverse_kinematics: bool,
    /// Which arm is controlled.
    pub control_arm: Arm,
    /// Whether the agent also commands hand orientation (IK control only).
    pub control_orientation: bool,
    /// Catalog key of the object to push.
    pub object_name: String,
    /// Gaussian noise on the object spawn position (0 disables it).
    pub object_pose_noise_std: f64,
    /// Gaussian noise on the sampled target pose (0 disables it).
    pub target_pose_noise_std: f64,
    /// Pace stepping against the wall clock for human viewing.
    pub render: bool,
    /// Step budget after which the episode times out.
    pub max_steps: u32,
    /// Reward shaping policy.
    pub reward_policy: RewardPolicy,
}

impl Default for PushEnvConfig {
    fn default() -> Self {
        Self {
            action_repeat: 1,
            use_inverse_kinematics: true,
            control_arm: Arm::Left,
            control_orientation: false,
            object_name: "cube".to_string(),
            object_pose_noise_std: 0.0,
            target_pose_noise_std: 0.2,
            render: false,
            max_steps: 2000,
            reward_policy: RewardPolicy::NormalizedStaged,
        }
    }
}

impl PushEnvConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.action_repeat == 0 {
            return Err(EnvError::Config("action_repeat must be at least 1".into()));
        }
        if self.max_steps == 0 {
            return Err(EnvError::Config("max_steps must be at least 1".into()));
        }
        if !(self.object_pose_noise_std.is_finite() && self.object_pose_noise_std >= 0.0) {
            return Err(EnvError::Config(format!(
                "object_pose_noise_std must be finite and non-negative, got {}",
                self.object_pose_noise_std
            )));
        }
        if !(self.target_pose_noise_std.is_finite() && self.target_pose_noise_std >= 0.0) {
            return Err(EnvError::Config(format!(
                "target_pose_noise_std must be finite and non-negative, got {}",
                self.target_pose_noise_std
            )));
        }
        if self.control_orientation && !self.use_inverse_kinematics {
            return Err(EnvError::Config(
                "control_orientation requires inverse-kinematics control".into(),
            ));
        }
        Ok(())
    }
}
