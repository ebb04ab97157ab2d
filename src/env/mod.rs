//! Common multi-agent environment interface.
//!
//! Every simulator in this crate speaks the same dictionary-style protocol:
//! observations, rewards and done flags are keyed by agent id, and the done
//! map always carries the reserved [`ALL_DONE`] key.

pub mod error;
pub mod policy_mapping;
pub mod spaces;

use std::collections::BTreeMap;

pub use error::{ConfigError, EnvError};
pub use policy_mapping::{PolicyMapping, PolicyMappingInfo, SharePolicy};
pub use spaces::{ActionSpace, BoxSpace, EnvInfo, ObservationSpace};

/// Agent identifier, e.g. `red_1`.
pub type AgentId = String;

/// Reserved key in the done map that flags the end of the episode.
pub const ALL_DONE: &str = "__all__";

/// What one agent sees after a tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Flat feature vector.
    pub obs: Vec<f64>,
    /// 1.0 (or any positive weight) for legal actions, 0.0 otherwise.
    pub action_mask: Option<Vec<f64>>,
}

impl Observation {
    /// Indices of the actions with a positive mask entry.
    ///
    /// Without a mask there is nothing to enumerate and the result is empty.
    pub fn legal_actions(&self) -> Vec<usize> {
        match &self.action_mask {
            Some(mask) => mask
                .iter()
                .enumerate()
                .filter(|(_, m)| **m > 0.0)
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Output of one environment step.
#[derive(Debug, Clone)]
pub struct StepResult<I> {
    /// Observations for the agents that must act next.
    pub observations: BTreeMap<AgentId, Observation>,
    pub rewards: BTreeMap<AgentId, f64>,
    /// Per-agent done flags plus [`ALL_DONE`].
    pub dones: BTreeMap<String, bool>,
    pub info: I,
}

impl<I> StepResult<I> {
    /// Whether the episode ended on this step.
    pub fn is_done(&self) -> bool {
        self.dones.get(ALL_DONE).copied().unwrap_or(false)
    }
}

/// A synchronous multi-agent environment.
pub trait MultiAgentEnv {
    /// Action submitted by one agent.
    type Action;
    /// Extra diagnostics returned with each step.
    type Info;

    /// Agent ids in their fixed processing order.
    fn agents(&self) -> &[AgentId];

    /// Starts a new episode and returns the initial observations.
    fn reset(&mut self) -> BTreeMap<AgentId, Observation>;

    /// Advances the simulation by one tick.
    fn step(
        &mut self,
        actions: &BTreeMap<AgentId, Self::Action>,
    ) -> Result<StepResult<Self::Info>, EnvError>;

    fn env_info(&self) -> EnvInfo;

    /// Human-readable snapshot of the current state.
    fn render(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_actions_follow_positive_mask() {
        let o = Observation {
            obs: vec![],
            action_mask: Some(vec![0.05, 0.0, 1.0, 0.0]),
        };
        assert_eq!(o.legal_actions(), vec![0, 2]);

        let unmasked = Observation {
            obs: vec![1.0],
            action_mask: None,
        };
        assert!(unmasked.legal_actions().is_empty());
    }

    #[test]
    fn step_result_done_reads_reserved_key() {
        let mut dones = BTreeMap::new();
        dones.insert("red_1".to_string(), true);
        let r = StepResult {
            observations: BTreeMap::new(),
            rewards: BTreeMap::new(),
            dones,
            info: (),
        };
        assert!(!r.is_done());
    }
}
