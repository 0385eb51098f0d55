//! Capability interfaces for the environment's collaborators.
//!
//! The episode controller only sees these traits; the physics session is
//! injected into every call so a single exclusively-owned handle serves the
//! whole environment, and tests can substitute doubles.

use pushgym_math::BoxLimits;
use pushgym_sim::SimSession;

use crate::error::SceneError;

/// An observation vector paired with its per-element `[low, high]` bounds.
pub type BoundedObservation = (Vec<f64>, Vec<[f64; 2]>);

/// The arm controller boundary.
pub trait Robot {
    /// Rebuild the robot bodies in a freshly reset scene.
    fn reset(&mut self, sim: &mut SimSession) -> Result<(), SceneError>;

    /// Current robot observation: hand pose (position 3 + Euler 3),
    /// followed by controlled joint values under direct joint control.
    fn observation(&self, sim: &SimSession) -> Result<BoundedObservation, SceneError>;

    /// Dispatch a physical-space pose (IK control: 3 or 6 values) or joint
    /// target vector (joint control) to the robot.
    fn apply_action(&mut self, sim: &mut SimSession, target: &[f64]) -> Result<(), SceneError>;

    /// The Cartesian workspace the hand must stay inside.
    fn workspace(&self) -> BoxLimits;

    /// Override the workspace (used once to narrow it to the table plane).
    fn set_workspace(&mut self, workspace: BoxLimits);

    /// Per-axis hand orientation limits in radians.
    fn rotation_limits(&self) -> BoxLimits;

    /// Number of controllable degrees of freedom.
    fn action_dim(&self) -> usize;

    /// The home hand pose: position followed by XYZ Euler angles.
    fn home_hand_pose(&self) -> [f64; 6];

    /// Indices of the controlled joints (empty under IK control).
    fn controlled_joints(&self) -> &[usize];

    /// Reseed any internal randomness.
    fn seed(&mut self, seed: u64);
}

/// The scene/object boundary.
pub trait World {
    /// Rebuild the table and object in a freshly reset scene.
    fn reset(&mut self, sim: &mut SimSession) -> Result<(), SceneError>;

    /// Current object observation: position 3 + Euler 3 with bounds.
    fn observation(&self, sim: &SimSession) -> Result<BoundedObservation, SceneError>;

    /// The workspace the object and targets are confined to.
    fn workspace(&self) -> BoxLimits;

    /// Height of the table's top surface.
    fn table_height(&self) -> f64;

    /// Reseed the object spawn randomness.
    fn seed(&mut self, seed: u64);
}
