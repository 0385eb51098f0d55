//! Error types for the simulation session.

use thiserror::Error;

/// Errors that can occur in the simulation session.
#[derive(Error, Debug)]
pub enum SimError {
    /// Could not establish a simulation session.
    #[error("cannot establish simulation session: {0}")]
    Connection(String),

    /// A named body does not exist in the scene.
    #[error("body not found: {0}")]
    MissingBody(String),

    /// A body with this name already exists in the scene.
    #[error("body already exists: {0}")]
    DuplicateBody(String),

    /// A named joint does not exist in the scene.
    #[error("joint not found: {0}")]
    MissingJoint(String),
}
