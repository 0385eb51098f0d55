//! Error types for the environment.

use thiserror::Error;

use pushgym_math::SpaceError;
use pushgym_scene::SceneError;
use pushgym_sim::SimError;

/// Errors that can occur while constructing or running the environment.
///
/// Nothing is retried internally: physics stepping is deterministic given a
/// seed and action sequence, so failures surface to the caller instead of
/// being masked into the learning signal.
#[derive(Error, Debug)]
pub enum EnvError {
    /// The environment configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A vector did not match its declared space dimensionality.
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// A scene collaborator failed.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The simulation session failed.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// The episode was reset into a state where a reward reference distance
    /// is zero. A fatal precondition violation, never silently handled.
    #[error("degenerate episode: {0}")]
    DegenerateEpisode(&'static str),
}

/// Result type for environment operations.
pub type Result<T> = std::result::Result<T, EnvError>;
