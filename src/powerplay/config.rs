//! Configuration for the Powerplay match simulator.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::env::ConfigError;

/// Simulated seconds per environment step.
pub const TICK_SECS: f64 = 0.5;

/// How a masked-out or out-of-range action is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InvalidActionPolicy {
    /// Fail the step with an error before any state changes.
    #[default]
    Reject,
    /// Treat the action as absent for that agent.
    Ignore,
}

/// Which check decides whether the blue alliance completed a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CircuitRule {
    /// Both alliances need a chain of junctions they own.
    #[default]
    Ownership,
    /// Blue never completes a circuit, as in early releases of the game.
    LegacyBlueSentinel,
}

/// Per-tick reward shaping constants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RewardConfig {
    /// Added for every tick spent driving toward a scoring target.
    pub travel_penalty: f64,
    /// Added when a robot picks up its beacon.
    pub beacon_pickup: f64,
    /// Added when a terminal placement scores.
    pub terminal_reward: f64,
    /// Added when a junction changes hands, including its first claim.
    pub steal_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            travel_penalty: -0.05,
            beacon_pickup: 1.0,
            terminal_reward: 1.0,
            steal_bonus: 1.0,
        }
    }
}

/// Reward constants of the direct-control variant,
/// [`MovementPowerplay`](super::MovementPowerplay).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementRewardConfig {
    /// Added for every one-cell move.
    pub move_cost: f64,
    /// Added when a robot captures one of its terminals for the first time.
    pub first_capture: f64,
    /// Added when a robot places on an already captured terminal.
    pub repeat_capture: f64,
    /// Added when a cone lands on a beaconed junction.
    pub beaconed_junction: f64,
    /// Added on top of the junction value when a beacon is placed.
    pub beacon_placement: f64,
}

impl Default for MovementRewardConfig {
    fn default() -> Self {
        Self {
            move_cost: -1.0,
            first_capture: 3.0,
            repeat_capture: -1.0,
            beaconed_junction: -5.0,
            beacon_placement: 6.0,
        }
    }
}

/// Configuration for [`Powerplay`](super::Powerplay) and
/// [`MovementPowerplay`](super::MovementPowerplay).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PowerplayConfig {
    /// Seed of the first episode; later resets use seed + 1, + 2, ...
    pub seed: u64,

    // --- Clock ---
    /// Match length in seconds.
    pub horizon_secs: f64,
    /// From this time on, robots arriving at a source may take the beacon.
    pub late_game_secs: f64,
    /// Before this time, idle automated robots are left out of observations.
    pub observe_all_after_secs: f64,

    // --- Robots ---
    /// Inclusive range of lift cycle times drawn per robot at reset.
    pub min_cycle_secs: u32,
    pub max_cycle_secs: u32,

    // --- Rules ---
    pub invalid_actions: InvalidActionPolicy,
    pub circuit_rule: CircuitRule,
    pub rewards: RewardConfig,
    pub movement_rewards: MovementRewardConfig,
}

impl Default for PowerplayConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            horizon_secs: 120.0,
            late_game_secs: 90.0,
            observe_all_after_secs: 120.0,
            min_cycle_secs: 1,
            max_cycle_secs: 3,
            invalid_actions: InvalidActionPolicy::Reject,
            circuit_rule: CircuitRule::Ownership,
            rewards: RewardConfig::default(),
            movement_rewards: MovementRewardConfig::default(),
        }
    }
}

impl PowerplayConfig {
    /// Number of steps in one episode.
    pub fn horizon_ticks(&self) -> u32 {
        secs_to_ticks(self.horizon_secs)
    }

    pub fn late_game_ticks(&self) -> u32 {
        secs_to_ticks(self.late_game_secs)
    }

    pub fn observe_all_after_ticks(&self) -> u32 {
        secs_to_ticks(self.observe_all_after_secs)
    }

    /// Checks the configuration, failing on the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.horizon_secs.is_finite() || self.horizon_secs <= 0.0 {
            return Err(ConfigError::InvalidDuration {
                name: "horizon_secs",
                value: self.horizon_secs,
            });
        }
        for (name, value) in [
            ("late_game_secs", self.late_game_secs),
            ("observe_all_after_secs", self.observe_all_after_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        for (name, value) in [
            ("horizon_secs", self.horizon_secs),
            ("late_game_secs", self.late_game_secs),
            ("observe_all_after_secs", self.observe_all_after_secs),
        ] {
            if (value / TICK_SECS).fract() != 0.0 {
                return Err(ConfigError::NotTickAligned {
                    name,
                    value,
                    tick: TICK_SECS,
                });
            }
        }
        if self.min_cycle_secs < 1 || self.min_cycle_secs > self.max_cycle_secs {
            return Err(ConfigError::InvalidCycleRange {
                min: self.min_cycle_secs,
                max: self.max_cycle_secs,
            });
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON. Missing fields
    /// take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn secs_to_ticks(secs: f64) -> u32 {
    (secs / TICK_SECS).round() as u32
}
