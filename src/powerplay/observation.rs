//! Observation encoding for the Powerplay environment.
//!
//! Every agent sees the whole match; only the "own team" flag and the
//! current target differ between agents.

use crate::env::{BoxSpace, Observation, ObservationSpace};

use super::robot::Phase;
use super::station::{Slot, StationKind, SCORING_STATIONS};
use super::team::Team;
use super::Powerplay;

/// Length of the feature vector.
pub const OBS_DIM: usize = 64;

/// Features per robot: cell, heading / 90°, holding cone, holding beacon, cycle ticks.
pub const ROBOT_FEATURES: usize = 5;

/// Offset of the elapsed tick count.
pub const ELAPSED: usize = SCORING_STATIONS;
/// Offset of the "own team is red" flag.
pub const IS_RED: usize = ELAPSED + 1;
/// Offset of the target station id + 1 (0 when none).
pub const TARGET: usize = IS_RED + 1;
/// Offset of the first robot block.
pub const ROBOTS: usize = TARGET + 1;
pub const BLUE_SCORE: usize = ROBOTS + 4 * ROBOT_FEATURES;
pub const RED_SCORE: usize = BLUE_SCORE + 1;
/// Beacon flags + 1: red one, red two, blue one, blue two.
pub const BEACONS: usize = RED_SCORE + 1;
pub const BLUE_CONES: usize = BEACONS + 4;
pub const RED_CONES: usize = BLUE_CONES + 1;
/// Terminal captures: red one, blue one, red two, blue two.
pub const CAPTURES: usize = RED_CONES + 1;

/// Mask weight for a legal station that is not the current target.
pub const OTHER_STATION_WEIGHT: f64 = 0.05;

/// Upper bounds of the non-ownership features, in layout order.
const FEATURE_HIGH: [f64; OBS_DIM - SCORING_STATIONS] = [
    241.0, 2.0, 30.0, //
    36.0, 4.0, 2.0, 2.0, 20.0, //
    36.0, 4.0, 2.0, 2.0, 20.0, //
    36.0, 4.0, 2.0, 2.0, 20.0, //
    36.0, 4.0, 2.0, 2.0, 20.0, //
    40.0, 40.0, 2.0, 2.0, 2.0, 2.0, 30.0, 30.0, 2.0, 2.0, 2.0, 2.0,
];

/// Builds observations and action masks for Powerplay agents.
pub struct ObservationBuilder;

impl ObservationBuilder {
    /// Bounds of the feature vector and the action mask.
    pub fn space() -> ObservationSpace {
        let mut high = vec![2.0; SCORING_STATIONS];
        high.extend_from_slice(&FEATURE_HIGH);
        ObservationSpace {
            obs: BoxSpace::new(vec![0.0; OBS_DIM], high),
            action_mask: Some(BoxSpace::uniform(SCORING_STATIONS, 0.0, 1.0)),
        }
    }

    /// Builds the observation of robot `agent_idx`.
    pub fn build(game: &Powerplay, agent_idx: usize) -> Observation {
        Observation {
            obs: Self::features(game, agent_idx),
            action_mask: Some(Self::action_mask(game, agent_idx)),
        }
    }

    /// Flat feature vector for robot `agent_idx`.
    pub fn features(game: &Powerplay, agent_idx: usize) -> Vec<f64> {
        let me = &game.robots[agent_idx];
        let [red, blue] = &game.teams;
        let mut obs = Vec::with_capacity(OBS_DIM);

        for station in &game.stations[..SCORING_STATIONS] {
            let code = match station.kind {
                StationKind::Terminal { team, slot } => {
                    if game.teams[team.index()].terminals_captured[slot.index()] {
                        team.ownership_code()
                    } else {
                        0.0
                    }
                }
                _ => station.owner().map_or(0.0, Team::ownership_code),
            };
            obs.push(code);
        }

        obs.push(game.elapsed_ticks as f64);
        obs.push(flag(me.team == Team::Red));
        obs.push(me.target.map_or(0.0, |t| (t + 1) as f64));

        for robot in &game.robots {
            obs.push(robot.cell as f64);
            obs.push(robot.heading.quarter_turns() as f64);
            obs.push(flag(robot.holding_cone));
            obs.push(flag(robot.holding_beacon));
            obs.push(robot.cycle_ticks() as f64);
        }

        obs.push((blue.score / 10) as f64);
        obs.push((red.score / 10) as f64);

        for state in [red, blue] {
            obs.push(flag(state.beacons_placed[Slot::One.index()]) + 1.0);
            obs.push(flag(state.beacons_placed[Slot::Two.index()]) + 1.0);
        }

        obs.push(game.cones_left(Team::Blue) as f64);
        obs.push(game.cones_left(Team::Red) as f64);

        for slot in [Slot::One, Slot::Two] {
            obs.push(flag(red.terminals_captured[slot.index()]));
            obs.push(flag(blue.terminals_captured[slot.index()]));
        }

        debug_assert_eq!(obs.len(), OBS_DIM);
        obs
    }

    /// Which stations (or cone/beacon choices) robot `agent_idx` may pick.
    pub fn action_mask(game: &Powerplay, agent_idx: usize) -> Vec<f64> {
        let robot = &game.robots[agent_idx];
        let mut mask = vec![0.0; SCORING_STATIONS];
        match robot.phase() {
            Phase::Junction => {
                mask.fill(OTHER_STATION_WEIGHT);
                if let Some(target) = robot.target.filter(|t| *t < SCORING_STATIONS) {
                    mask[target] = 1.0;
                }
            }
            Phase::Cone => {
                mask[0] = 1.0;
                mask[1] = 1.0;
            }
            Phase::Loading | Phase::Automated => {}
        }
        mask
    }
}

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
