//! Observation and action space descriptions.

use super::policy_mapping::PolicyMappingInfo;

/// A box of real-valued vectors, bounded element-wise by `low` and `high`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxSpace {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl BoxSpace {
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        debug_assert_eq!(low.len(), high.len(), "box bounds must have equal length");
        Self { low, high }
    }

    /// A box of `dim` elements sharing the same bounds.
    pub fn uniform(dim: usize, low: f64, high: f64) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Returns true if `x` has the right length and lies within the bounds.
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.dim()
            && x
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }
}

/// Action space of a single agent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionSpace {
    /// `n` discrete choices, `0..n`.
    Discrete(usize),
    /// Continuous control vector.
    Box(BoxSpace),
}

impl ActionSpace {
    /// Number of discrete actions, or the control dimension for boxes.
    pub fn size(&self) -> usize {
        match self {
            ActionSpace::Discrete(n) => *n,
            ActionSpace::Box(b) => b.dim(),
        }
    }
}

/// Observation space of a single agent: features plus an optional action mask.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObservationSpace {
    pub obs: BoxSpace,
    pub action_mask: Option<BoxSpace>,
}

/// Static description of an environment, as handed to a trainer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvInfo {
    pub observation_space: ObservationSpace,
    pub action_space: ActionSpace,
    pub num_agents: usize,
    /// Maximum number of steps in one episode.
    pub episode_limit: u32,
    pub policy_mapping: PolicyMappingInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_contains_checks_bounds_and_length() {
        let b = BoxSpace::new(vec![0.0, -1.0], vec![2.0, 1.0]);
        assert!(b.contains(&[1.0, 0.0]));
        assert!(b.contains(&[2.0, -1.0]));
        assert!(!b.contains(&[2.5, 0.0]));
        assert!(!b.contains(&[1.0]));
    }

    #[test]
    fn action_space_size() {
        assert_eq!(ActionSpace::Discrete(29).size(), 29);
        assert_eq!(ActionSpace::Box(BoxSpace::uniform(1, -1.0, 1.0)).size(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn env_info_round_trips_through_json() {
        let info = EnvInfo {
            observation_space: ObservationSpace {
                obs: BoxSpace::new(vec![0.0, 0.0], vec![2.0, 241.0]),
                action_mask: Some(BoxSpace::uniform(3, 0.0, 1.0)),
            },
            action_space: ActionSpace::Box(BoxSpace::uniform(1, -1.0, 1.0)),
            num_agents: 3,
            episode_limit: 1001,
            policy_mapping: PolicyMappingInfo {
                description: "mecanum_movement".to_string(),
                team_prefix: Vec::new(),
                all_agents_one_policy: true,
                one_agent_one_policy: true,
            },
        };
        let json = serde_json::to_string(&info).unwrap();
        let back: EnvInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
