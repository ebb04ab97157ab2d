//! Greedy junction policy for Powerplay.
//!
//! Reads the flat observation layout of
//! [`ObservationBuilder`](crate::powerplay::ObservationBuilder): ownership
//! codes, the own-team flag, the current target and the robot blocks.

use std::collections::BTreeMap;

use super::trait_::Policy;
use crate::env::{AgentId, Observation};
use crate::field::{manhattan_distance, Cell};
use crate::powerplay::observation::{IS_RED, OBS_DIM, ROBOTS, ROBOT_FEATURES, TARGET};
use crate::powerplay::station::{standard_layout, FIRST_JUNCTION};
use crate::powerplay::{ConeStation, Team, AGENT_NAMES, SCORING_STATIONS};

/// Greedy scoring baseline.
///
/// While a robot already drives to a target, it keeps it. Otherwise each
/// junction not owned by the robot's alliance is scored as
/// ```text
/// score(j) = value(j) / (1 + manhattan(robot, j))
/// ```
/// and the best one wins; a junction a teammate picked in the same call has
/// its score halved. At a source in the late game the robot takes the
/// beacon. Observations that do not have the Powerplay layout are skipped.
pub struct GreedyJunctionPolicy {
    stations: Vec<ConeStation>,
}

impl GreedyJunctionPolicy {
    pub fn new() -> Self {
        Self {
            stations: standard_layout(),
        }
    }

    fn pick_junction(&self, obs: &[f64], cell: Cell, claimed: &[usize]) -> Option<usize> {
        let own = if obs[IS_RED] > 0.5 {
            Team::Red
        } else {
            Team::Blue
        };
        let mut best: Option<(usize, f64)> = None;
        for station in &self.stations[FIRST_JUNCTION..SCORING_STATIONS] {
            if obs[station.id] == own.ownership_code() {
                continue;
            }
            let (Some(tier), Some(near)) = (station.tier(), station.nearest_cell(cell)) else {
                continue;
            };
            let mut score = tier.value() as f64 / (1.0 + manhattan_distance(cell, near) as f64);
            if claimed.contains(&station.id) {
                score /= 2.0;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((station.id, score));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl Default for GreedyJunctionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for GreedyJunctionPolicy {
    fn select_actions(
        &mut self,
        observations: &BTreeMap<AgentId, Observation>,
    ) -> BTreeMap<AgentId, usize> {
        let mut actions = BTreeMap::new();
        let mut claimed = Vec::new();

        for (agent, observation) in observations {
            let Some(mask) = &observation.action_mask else {
                continue;
            };
            let obs = &observation.obs;
            if obs.len() != OBS_DIM || mask.len() != SCORING_STATIONS {
                continue;
            }
            let legal = |a: usize| mask.get(a).is_some_and(|m| *m > 0.0);

            if !legal(0) {
                // Not deciding this tick.
                continue;
            }
            if !legal(2) {
                // At a source: cone or beacon.
                actions.insert(agent.clone(), 1);
                continue;
            }

            let target = obs[TARGET] as usize;
            if target > 0 {
                actions.insert(agent.clone(), target - 1);
                claimed.push(target - 1);
                continue;
            }

            let Some(idx) = AGENT_NAMES.iter().position(|n| *n == agent.as_str()) else {
                continue;
            };
            let cell = obs[ROBOTS + idx * ROBOT_FEATURES] as Cell;
            if let Some(junction) = self.pick_junction(obs, cell, &claimed) {
                actions.insert(agent.clone(), junction);
                claimed.push(junction);
            }
        }
        actions
    }

    fn name(&self) -> &str {
        "greedy_junction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MultiAgentEnv;
    use crate::powerplay::{Phase, Powerplay, PowerplayConfig, StationKind};

    fn deciding(game: &mut Powerplay, i: usize, cell: Cell) {
        let robot = &mut game.robots[i];
        robot.cell = cell;
        robot.path.clear();
        robot.holding_cone = true;
        robot.set_phase(Phase::Junction);
    }

    fn observe(game: &Powerplay, agents: &[usize]) -> BTreeMap<AgentId, Observation> {
        agents
            .iter()
            .map(|&i| {
                (
                    AGENT_NAMES[i].to_string(),
                    crate::powerplay::ObservationBuilder::build(game, i),
                )
            })
            .collect()
    }

    #[test]
    fn prefers_close_high_junction() {
        let mut game = Powerplay::new(PowerplayConfig::default()).unwrap();
        // Cell 8 is a corner of the high junction 11.
        deciding(&mut game, 0, 8);
        let actions = GreedyJunctionPolicy::new().select_actions(&observe(&game, &[0]));
        assert_eq!(actions.get("red_1"), Some(&11));
    }

    #[test]
    fn skips_own_junctions_and_spreads_teammates() {
        let mut game = Powerplay::new(PowerplayConfig::default()).unwrap();
        if let StationKind::Junction { owner, .. } = &mut game.stations[11].kind {
            *owner = Some(Team::Red);
        }
        deciding(&mut game, 0, 8);
        let actions = GreedyJunctionPolicy::new().select_actions(&observe(&game, &[0]));
        assert_ne!(actions.get("red_1"), Some(&11));

        // Two red robots on the same cell do not chase the same junction.
        let mut game = Powerplay::new(PowerplayConfig::default()).unwrap();
        deciding(&mut game, 0, 8);
        deciding(&mut game, 1, 8);
        let actions = GreedyJunctionPolicy::new().select_actions(&observe(&game, &[0, 1]));
        assert_ne!(actions.get("red_1"), actions.get("red_2"));
    }

    #[test]
    fn keeps_target_and_takes_beacon() {
        let mut game = Powerplay::new(PowerplayConfig::default()).unwrap();
        deciding(&mut game, 2, 20);
        game.robots[2].target = Some(24);
        game.robots[3].set_phase(Phase::Cone);
        let actions = GreedyJunctionPolicy::new().select_actions(&observe(&game, &[0, 2, 3]));
        assert_eq!(actions.get("red_1"), None);
        assert_eq!(actions.get("blue_1"), Some(&24));
        assert_eq!(actions.get("blue_2"), Some(&1));
    }

    #[test]
    fn skips_malformed_observations() {
        let mut observations = BTreeMap::new();
        observations.insert(
            "red_1".to_string(),
            Observation {
                obs: vec![0.0; 3],
                action_mask: Some(vec![1.0; SCORING_STATIONS]),
            },
        );
        let actions = GreedyJunctionPolicy::new().select_actions(&observations);
        assert!(actions.is_empty());
    }

    #[test]
    fn plays_a_full_match() {
        let mut game = Powerplay::new(PowerplayConfig::default()).unwrap();
        let mut policy = GreedyJunctionPolicy::new();
        let mut obs = game.reset();
        loop {
            let result = game.step(&policy.select_actions(&obs)).unwrap();
            if result.is_done() {
                break;
            }
            obs = result.observations;
        }
        let outcome = game.outcome();
        assert!(outcome.red.score + outcome.blue.score > 0);
    }
}
