//! Error types for scene collaborators.

use thiserror::Error;

use pushgym_sim::SimError;

/// Errors that can occur while building or querying the scene.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The requested object is not in the catalog.
    #[error("unknown object '{0}', not in catalog")]
    UnknownObject(String),

    /// The object spawn noise standard deviation is not usable.
    #[error("invalid spawn noise standard deviation: {0}")]
    InvalidSpawnNoise(f64),

    /// An underlying simulation failure.
    #[error(transparent)]
    Sim(#[from] SimError),
}
