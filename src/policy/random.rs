//! Random policy for testing and baselines.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::trait_::Policy;
use crate::env::{AgentId, Observation};

/// Uniformly random choice among each agent's legal actions.
///
/// Agents whose mask allows nothing are skipped. Used for sanity checks and
/// as a lower-bound baseline.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    /// Creates a new random policy drawing from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_actions(
        &mut self,
        observations: &BTreeMap<AgentId, Observation>,
    ) -> BTreeMap<AgentId, usize> {
        let mut actions = BTreeMap::new();
        for (agent, obs) in observations {
            if let Some(&action) = obs.legal_actions().choose(&mut self.rng) {
                actions.insert(agent.clone(), action);
            }
        }
        actions
    }

    fn name(&self) -> &str {
        "random"
    }
}
