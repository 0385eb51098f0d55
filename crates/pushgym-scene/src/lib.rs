#![warn(missing_docs)]

//! Robot and world collaborators for the pushgym environment.
//!
//! The environment talks to its scene through two narrow capability
//! interfaces: [`Robot`] (arm controller boundary) and [`World`] (table and
//! object boundary). This crate defines those traits and provides
//! Rapier-backed implementations, [`ArmRobot`] and [`TableWorld`], that
//! share the environment's single simulation session.

mod arm;
mod error;
mod table;
mod traits;

pub use arm::{Arm, ArmRobot};
pub use error::SceneError;
pub use table::{object_catalog, TableWorld, TABLE_HEIGHT};
pub use traits::{BoundedObservation, Robot, World};
