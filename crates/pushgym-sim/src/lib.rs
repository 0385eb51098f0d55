#![warn(missing_docs)]

//! Physics simulation session for the pushgym environment, built on Rapier3d.
//!
//! This crate wraps a single Rapier pipeline behind an exclusively-owned
//! session handle: connect headless or with a viewer, populate named bodies,
//! step a fixed time step, query poses, and optionally render a software
//! RGB frame. Rigid-transform helpers used by the observation pipeline live
//! here as well.
//!
//! # Example
//!
//! ```
//! use pushgym_sim::{BodyKind, SessionMode, ShapeDesc, SimSession};
//! use pushgym_math::Point3;
//!
//! let mut sim = SimSession::connect(SessionMode::Headless).unwrap();
//! sim.insert_body(
//!     "object",
//!     BodyKind::Dynamic,
//!     ShapeDesc::Cuboid { half_extents: [0.03; 3] },
//!     &Point3::new(0.0, 0.0, 0.9),
//!     &[0.0; 3],
//!     0.5,
//!     0.5,
//! ).unwrap();
//! sim.step();
//! let (pos, _orn) = sim.body_pose("object").unwrap();
//! assert!(pos.z <= 0.9);
//! ```

mod error;
mod render;
mod session;
mod transform;

pub use error::SimError;
pub use session::{
    BodyKind, DebugMarker, SessionMode, ShapeDesc, SimSession, DEFAULT_MAX_FORCE,
    DEFAULT_MOTOR_DAMPING, DEFAULT_MOTOR_STIFFNESS, DEFAULT_TIME_STEP,
};
pub use transform::{
    invert_transform, isometry_to_pose, multiply_transforms, pose_to_isometry, quat_to_euler,
};
