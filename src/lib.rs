//! marlsim - multi-agent robotics game simulators
//!
//! Turn-based environments for multi-agent reinforcement learning: the
//! Powerplay cone-scoring match between two alliances of two robots, and a
//! mecanum-drive motion task. Both speak the dictionary-style protocol in
//! [`env`], with per-agent observations, action masks and policy-sharing
//! metadata.

pub mod env;
pub mod field;
pub mod mecanum;
pub mod metrics;
pub mod policy;
pub mod powerplay;

pub use env::{MultiAgentEnv, Observation, StepResult};
pub use mecanum::{Mecanum, MecanumEnv, MecanumEnvConfig};
pub use powerplay::{MovementPowerplay, Powerplay, PowerplayConfig};

/// Identifier type used for episodes.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}
