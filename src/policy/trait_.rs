//! Policy trait for the discrete-action environments.

use std::collections::BTreeMap;

use crate::env::{AgentId, Observation};

/// A policy that selects actions for agents based on observations.
///
/// Only agents present in `observations` may act. An agent left out of the
/// returned map submits nothing this tick.
pub trait Policy: Send + Sync {
    /// Selects at most one action per observed agent.
    fn select_actions(
        &mut self,
        observations: &BTreeMap<AgentId, Observation>,
    ) -> BTreeMap<AgentId, usize>;

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
