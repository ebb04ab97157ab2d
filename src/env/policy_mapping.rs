//! Policy-sharing strategies: which trainer policy drives which agent.
//!
//! Each scenario publishes a [`PolicyMappingInfo`] saying which sharing
//! modes it supports. [`PolicyMapping::resolve`] turns a requested mode into
//! a concrete agent → policy assignment, failing fast when the scenario does
//! not allow it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::ConfigError;
use super::AgentId;

/// Algorithms whose updates assume one policy per agent.
const INDIVIDUAL_ONLY_ALGORITHMS: [&str; 2] = ["happo", "hatrpo"];

/// How agents share trainer policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SharePolicy {
    /// One policy for every agent.
    All,
    /// One policy per team prefix.
    Group,
    /// One policy per agent.
    Individual,
}

impl fmt::Display for SharePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharePolicy::All => write!(f, "all"),
            SharePolicy::Group => write!(f, "group"),
            SharePolicy::Individual => write!(f, "individual"),
        }
    }
}

impl FromStr for SharePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(SharePolicy::All),
            "group" => Ok(SharePolicy::Group),
            "individual" => Ok(SharePolicy::Individual),
            _ => Err(ConfigError::UnknownSharePolicy(s.to_string())),
        }
    }
}

/// Sharing capabilities advertised by a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyMappingInfo {
    pub description: String,
    /// Agent-name prefixes that define teams, e.g. `["red_", "blue_"]`.
    pub team_prefix: Vec<String>,
    pub all_agents_one_policy: bool,
    pub one_agent_one_policy: bool,
}

impl PolicyMappingInfo {
    /// Sharing modes this scenario accepts.
    pub fn allowed_modes(&self) -> Vec<SharePolicy> {
        let mut modes = Vec::new();
        if self.all_agents_one_policy {
            modes.push(SharePolicy::All);
        }
        if self.team_prefix.len() > 1
            || (self.team_prefix.len() == 1 && self.all_agents_one_policy)
        {
            modes.push(SharePolicy::Group);
        }
        if self.one_agent_one_policy {
            modes.push(SharePolicy::Individual);
        }
        modes
    }

    fn not_allowed(&self, mode: SharePolicy) -> ConfigError {
        let allowed: Vec<String> = self.allowed_modes().iter().map(|m| m.to_string()).collect();
        ConfigError::SharePolicyNotAllowed {
            scenario: self.description.clone(),
            mode,
            allowed: if allowed.is_empty() {
                "nothing".to_string()
            } else {
                allowed.join(" or ")
            },
        }
    }
}

/// Concrete agent → policy assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyMapping {
    pub share: SharePolicy,
    policies: Vec<String>,
    assignments: BTreeMap<AgentId, String>,
}

impl PolicyMapping {
    /// Resolves `share` for the given agents.
    ///
    /// `algorithm` is the trainer's algorithm name; heterogeneous-agent
    /// algorithms (`happo`, `hatrpo`) always get individual policies.
    pub fn resolve(
        info: &PolicyMappingInfo,
        agents: &[AgentId],
        share: SharePolicy,
        algorithm: &str,
    ) -> Result<Self, ConfigError> {
        let share = if INDIVIDUAL_ONLY_ALGORITHMS.contains(&algorithm.to_ascii_lowercase().as_str())
        {
            SharePolicy::Individual
        } else {
            share
        };

        let mut assignments = BTreeMap::new();
        match share {
            SharePolicy::All => {
                if !info.all_agents_one_policy {
                    return Err(info.not_allowed(share));
                }
                for agent in agents {
                    assignments.insert(agent.clone(), "av".to_string());
                }
            }
            SharePolicy::Group => match info.team_prefix.len() {
                0 => return Err(ConfigError::MissingTeamPrefix(info.description.clone())),
                1 => {
                    if !info.all_agents_one_policy {
                        return Err(info.not_allowed(share));
                    }
                    for agent in agents {
                        assignments.insert(agent.clone(), "shared_policy".to_string());
                    }
                }
                _ => {
                    for agent in agents {
                        let prefix = info
                            .team_prefix
                            .iter()
                            .find(|p| agent.starts_with(p.as_str()))
                            .ok_or_else(|| ConfigError::UngroupedAgent {
                                agent: agent.clone(),
                                scenario: info.description.clone(),
                            })?;
                        assignments.insert(agent.clone(), format!("policy_{}", prefix));
                    }
                }
            },
            SharePolicy::Individual => {
                if !info.one_agent_one_policy {
                    return Err(info.not_allowed(share));
                }
                for (i, agent) in agents.iter().enumerate() {
                    assignments.insert(agent.clone(), format!("policy_{}", i));
                }
            }
        }

        let mut policies: Vec<String> = assignments.values().cloned().collect();
        policies.sort();
        policies.dedup();

        Ok(Self {
            share,
            policies,
            assignments,
        })
    }

    /// Policy id for an agent.
    pub fn policy_for(&self, agent: &str) -> Option<&str> {
        self.assignments.get(agent).map(String::as_str)
    }

    /// Distinct policy ids, sorted.
    pub fn policies(&self) -> &[String] {
        &self.policies
    }
}
