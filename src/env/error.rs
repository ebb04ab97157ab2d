use thiserror::Error;

use super::policy_mapping::SharePolicy;
use super::AgentId;
use crate::powerplay::Phase;

/// Errors raised while validating environment or experiment configuration.
///
/// These surface at setup time, never in the middle of an episode.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive, finite number of seconds (got {value})")]
    InvalidDuration { name: &'static str, value: f64 },

    #[error("{name} ({value}s) is not a whole number of {tick}s ticks")]
    NotTickAligned {
        name: &'static str,
        value: f64,
        tick: f64,
    },

    #[error("cycle time range {min}..={max}s is empty or starts below 1s")]
    InvalidCycleRange { min: u32, max: u32 },

    #[error("unknown share_policy '{0}'; expected all, group or individual")]
    UnknownSharePolicy(String),

    #[error("in {scenario}, policy can not be shared as '{mode}'; change it to {allowed}")]
    SharePolicyNotAllowed {
        scenario: String,
        mode: SharePolicy,
        allowed: String,
    },

    #[error("{0} defines no team prefixes, so agents cannot be grouped")]
    MissingTeamPrefix(String),

    #[error("agent {agent} matches none of the team prefixes of {scenario}")]
    UngroupedAgent { agent: AgentId, scenario: String },

    #[error("invalid bounds on the {axis} axis: min {min} must be below max {max}")]
    InvalidBounds { axis: char, min: f64, max: f64 },

    #[error("drivetrain constant {name} must be {requirement} (got {value})")]
    InvalidDrivetrain {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },

    #[error("roadblock {index} needs at least 3 finite vertices (got {vertices})")]
    InvalidRoadblock { index: usize, vertices: usize },

    #[error("max_time must be at least one step")]
    ZeroMaxTime,

    #[error("timestep must be positive and finite (got {0})")]
    InvalidTimestep(f64),

    #[error("invalid config json: {0}")]
    Json(String),
}

/// Errors returned by environment operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("unknown agent id: {0}")]
    UnknownAgent(AgentId),

    #[error("action {action} for {agent} is outside the action space of size {size}")]
    ActionOutOfRange {
        agent: AgentId,
        action: usize,
        size: usize,
    },

    #[error("action {action} is masked out for {agent} in the {phase} phase")]
    MaskedAction {
        agent: AgentId,
        action: usize,
        phase: Phase,
    },

    #[error("control value for {agent} must be finite (got {value})")]
    NonFiniteControl { agent: AgentId, value: f64 },

    #[error("episode is over; call reset() before stepping again")]
    EpisodeOver,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_action_display() {
        let e = EnvError::MaskedAction {
            agent: "red_1".into(),
            action: 7,
            phase: Phase::Cone,
        };
        assert_eq!(
            e.to_string(),
            "action 7 is masked out for red_1 in the cone phase"
        );
    }

    #[test]
    fn config_error_wraps_transparently() {
        let inner = ConfigError::InvalidCycleRange { min: 3, max: 1 };
        let e: EnvError = inner.clone().into();
        assert_eq!(e.to_string(), inner.to_string());
    }

    #[test]
    fn share_policy_error_mentions_scenario() {
        let e = ConfigError::SharePolicyNotAllowed {
            scenario: "powerplay".into(),
            mode: SharePolicy::All,
            allowed: "group".into(),
        };
        let s = e.to_string();
        assert!(s.contains("powerplay"));
        assert!(s.contains("'all'"));
    }
}
