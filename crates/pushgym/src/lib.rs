#![warn(missing_docs)]

//! A tabletop push-task environment for reinforcement learning.
//!
//! A simulated humanoid arm stands at a table and has to push an object to
//! a sampled target pose. The environment exposes the usual episodic
//! surface: `reset()` starts an episode and returns a normalized
//! observation, `step()` applies a normalized action and returns the next
//! observation with a shaped reward, `seed()` makes episode streams
//! reproducible, and `render()` produces an RGB frame.
//!
//! The physics lives behind the [`pushgym_scene::Robot`] and
//! [`pushgym_scene::World`] interfaces; [`PushEnv::new`] wires in the
//! Rapier-backed arm and table, while tests inject doubles through
//! [`PushEnv::with_collaborators`].
//!
//! # Example
//!
//! ```no_run
//! use pushgym::{PushEnv, PushEnvConfig};
//!
//! let mut env = PushEnv::new(PushEnvConfig::default())?;
//! env.seed(Some(7));
//! let mut observation = env.reset()?;
//! loop {
//!     let action = vec![0.0; env.action_space().len()];
//!     let step = env.step(&action)?;
//!     observation = step.observation;
//!     if step.done {
//!         break;
//!     }
//! }
//! assert_eq!(observation.len(), env.observation_space().len());
//! # Ok::<(), pushgym::EnvError>(())
//! ```

pub mod action;
pub mod config;
pub mod env;
pub mod error;
pub mod observation;
pub mod reward;
pub mod target;

pub use action::HandPose;
pub use config::PushEnvConfig;
pub use env::{PushEnv, Step};
pub use error::{EnvError, Result};
pub use reward::{RewardPolicy, SUCCESS_BONUS, TARGET_DIST_MIN};

pub use pushgym_scene::{object_catalog, Arm};
