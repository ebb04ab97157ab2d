//! Direct-control Powerplay: agents drive their robots one cell at a time.
//!
//! Field, stations, scoring, collisions and circuits are those of
//! [`Powerplay`]. Nothing is automated except lining up over a junction
//! and crash recovery: an agent moves its robot, picks cones up, and places
//! them on a junction at one of the four corners of its cell or on one of
//! its own terminals.
//!
//! A robot whose agent may act is in [`Phase::Junction`]; a robot lining up
//! over a junction or recovering from a crash is in [`Phase::Automated`] and
//! has an all-zero action mask.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::env::{
    ActionSpace, AgentId, BoxSpace, ConfigError, EnvError, EnvInfo, MultiAgentEnv, Observation,
    ObservationSpace, PolicyMappingInfo, StepResult,
};
use crate::field::{row_col, Cell, Heading, FIELD_SIZE};

use super::station::{sources_of, Slot, StationId, StationKind, FIRST_JUNCTION};
use super::{
    ObservationBuilder, Phase, Powerplay, PowerplayConfig, RewardComputer, StepInfo,
    BEACON_POINTS,
};

/// Number of discrete actions.
pub const MOVEMENT_ACTIONS: usize = 11;

const JUNCTION_GRID: usize = FIELD_SIZE - 1;

/// Corner of a cell, naming the junction that sits there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Junction at this corner of `cell`; `None` on the field border.
    pub fn junction(self, cell: Cell) -> Option<StationId> {
        let (r, c) = row_col(cell);
        let (jr, jc) = match self {
            Corner::TopLeft => (r.checked_sub(1)?, c.checked_sub(1)?),
            Corner::TopRight => (r.checked_sub(1)?, c),
            Corner::BottomLeft => (r, c.checked_sub(1)?),
            Corner::BottomRight => (r, c),
        };
        (jr < JUNCTION_GRID && jc < JUNCTION_GRID)
            .then(|| FIRST_JUNCTION + jr * JUNCTION_GRID + jc)
    }
}

/// One direct-control decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Drive(Heading),
    /// Start placing the held cone on the junction at a corner.
    Junction(Corner),
    /// Place the held cone on the own terminal under the robot.
    Terminal,
    Cone,
    /// Take a cone together with the alliance beacon.
    Beacon,
}

impl Move {
    /// Decodes an action index: 0..=3 drive west, east, north, south;
    /// 4..=7 junction top-left, top-right, bottom-left, bottom-right;
    /// 8 terminal; 9 cone; 10 beacon.
    pub fn from_action(action: usize) -> Option<Move> {
        Some(match action {
            0 => Move::Drive(Heading::West),
            1 => Move::Drive(Heading::East),
            2 => Move::Drive(Heading::North),
            3 => Move::Drive(Heading::South),
            4 => Move::Junction(Corner::TopLeft),
            5 => Move::Junction(Corner::TopRight),
            6 => Move::Junction(Corner::BottomLeft),
            7 => Move::Junction(Corner::BottomRight),
            8 => Move::Terminal,
            9 => Move::Cone,
            10 => Move::Beacon,
            _ => return None,
        })
    }
}

/// The Powerplay match under direct control.
#[derive(Debug, Clone)]
pub struct MovementPowerplay {
    /// Shared match state: stations, robots, alliance scores and the clock.
    pub game: Powerplay,
}

impl MovementPowerplay {
    /// Validates `config` and lays out an episode seeded with `config.seed`.
    pub fn new(config: PowerplayConfig) -> Result<Self, ConfigError> {
        let mut env = Self {
            game: Powerplay::new(config)?,
        };
        env.take_control();
        Ok(env)
    }

    /// Starts a new episode from an explicit seed.
    pub fn reset_with_seed(&mut self, seed: u64) -> BTreeMap<AgentId, Observation> {
        self.game.populate(seed);
        self.take_control();
        (0..self.game.robots.len())
            .map(|i| (self.game.agents[i].clone(), observe(&self.game, i)))
            .collect()
    }

    pub fn policy_mapping_info() -> PolicyMappingInfo {
        Powerplay::policy_mapping_info()
    }

    /// Which of the [`MOVEMENT_ACTIONS`] robot `agent_idx` may take.
    pub fn action_mask(&self, agent_idx: usize) -> Vec<f64> {
        action_mask(&self.game, agent_idx)
    }

    /// Hands every robot to its agent: no routes, deciding from tick 0.
    fn take_control(&mut self) {
        for robot in &mut self.game.robots {
            robot.source = None;
            robot.path.clear();
            robot.set_phase(Phase::Junction);
        }
    }

    fn act(&mut self, i: usize, decision: Option<usize>) -> f64 {
        if self.game.robots[i].phase() == Phase::Automated {
            return self.automate(i);
        }
        match decision.and_then(Move::from_action) {
            Some(mv) => self.apply(i, mv),
            None => 0.0,
        }
    }

    fn apply(&mut self, i: usize, mv: Move) -> f64 {
        let rewards = &self.game.config.movement_rewards;
        match mv {
            Move::Drive(heading) => {
                let robot = &mut self.game.robots[i];
                let Some(next) = heading.next_cell(robot.cell) else {
                    return 0.0;
                };
                robot.cell = next;
                robot.heading = heading;
                rewards.move_cost
            }
            Move::Junction(corner) => {
                let Some(junction) = corner.junction(self.game.robots[i].cell) else {
                    return 0.0;
                };
                let Some(tier) = self.game.stations[junction].tier() else {
                    return 0.0;
                };
                let robot = &mut self.game.robots[i];
                robot.target = Some(junction);
                robot.adjusting = true;
                robot.timer = (2 * tier.adjust_secs(robot.cycle_secs)).saturating_sub(1);
                robot.set_phase(Phase::Automated);
                0.0
            }
            Move::Terminal => {
                let Some(slot) = own_terminal_at(&self.game, i) else {
                    return 0.0;
                };
                let robot = &mut self.game.robots[i];
                robot.holding_cone = false;
                robot.crashed = false;
                let state = &mut self.game.teams[robot.team.index()];
                let first = !state.terminals_captured[slot.index()];
                state.terminals_captured[slot.index()] = true;
                state.score += 1;
                if first {
                    debug!(agent = %robot.id, ?slot, "terminal captured");
                    rewards.first_capture
                } else {
                    rewards.repeat_capture
                }
            }
            Move::Cone => self.pick_up(i, false),
            Move::Beacon => self.pick_up(i, true),
        }
    }

    fn pick_up(&mut self, i: usize, with_beacon: bool) -> f64 {
        let Some(source) = source_at(&self.game, i) else {
            return 0.0;
        };
        if !self.game.stations[source].take_cone() {
            return 0.0;
        }
        let robot = &mut self.game.robots[i];
        robot.holding_cone = true;
        robot.crashed = false;
        if with_beacon {
            robot.holding_beacon = true;
            debug!(agent = %robot.id, "beacon picked up");
        }
        0.0
    }

    fn automate(&mut self, i: usize) -> f64 {
        let robot = &mut self.game.robots[i];
        if robot.timer > 0 {
            robot.timer -= 1;
            if robot.timer == 0 && !robot.adjusting {
                robot.set_phase(Phase::Junction);
            }
            return 0.0;
        }
        if robot.adjusting {
            return self.finish_placement(i);
        }
        robot.set_phase(Phase::Junction);
        0.0
    }

    /// Drops the cone once adjustment is over and scores the junction.
    fn finish_placement(&mut self, i: usize) -> f64 {
        let rewards = &self.game.config.movement_rewards;
        let robot = &mut self.game.robots[i];
        robot.adjusting = false;
        let mut reward = 0.0;

        if let Some(id) = robot.target.take() {
            if let StationKind::Junction {
                tier,
                owner,
                beaconed,
            } = &mut self.game.stations[id].kind
            {
                if *beaconed {
                    trace!(agent = %robot.id, junction = id, "junction already beaconed");
                    reward = rewards.beaconed_junction;
                } else {
                    let state = &mut self.game.teams[robot.team.index()];
                    let mut points = tier.value();
                    reward = points as f64;
                    if robot.holding_beacon {
                        *beaconed = true;
                        points += BEACON_POINTS;
                        reward += rewards.beacon_placement;
                        robot.placed_beacon = true;
                        state.beacons_placed[robot.slot.index()] = true;
                    }
                    state.score += points;
                    *owner = Some(robot.team);
                    debug!(agent = %robot.id, junction = id, points, "cone scored");
                }
            }
        }

        robot.holding_cone = false;
        robot.holding_beacon = false;
        robot.crashed = false;
        robot.set_phase(Phase::Junction);
        reward
    }
}

/// Cone source of the robot's alliance under robot `i`.
fn source_at(game: &Powerplay, i: usize) -> Option<StationId> {
    let robot = &game.robots[i];
    sources_of(robot.team)
        .into_iter()
        .find(|&id| game.stations[id].cells.contains(&robot.cell))
}

/// Slot of the robot's own terminal under robot `i`.
fn own_terminal_at(game: &Powerplay, i: usize) -> Option<Slot> {
    let robot = &game.robots[i];
    game.stations.iter().find_map(|station| match station.kind {
        StationKind::Terminal { team, slot }
            if team == robot.team && station.cells.contains(&robot.cell) =>
        {
            Some(slot)
        }
        _ => None,
    })
}

fn is_legal(game: &Powerplay, i: usize, mv: Move) -> bool {
    let robot = &game.robots[i];
    if robot.phase() != Phase::Junction {
        return false;
    }
    let can_load = !robot.holding_cone
        && source_at(game, i).is_some_and(|id| game.stations[id].resource_count() > 0);
    match mv {
        Move::Drive(heading) => heading.next_cell(robot.cell).is_some(),
        Move::Junction(corner) => robot.holding_cone && corner.junction(robot.cell).is_some(),
        Move::Terminal => robot.holding_cone && own_terminal_at(game, i).is_some(),
        Move::Cone => can_load,
        Move::Beacon => {
            can_load
                && !robot.placed_beacon
                && game.elapsed_ticks >= game.config.late_game_ticks()
        }
    }
}

fn action_mask(game: &Powerplay, i: usize) -> Vec<f64> {
    (0..MOVEMENT_ACTIONS)
        .map(|a| match Move::from_action(a) {
            Some(mv) if is_legal(game, i, mv) => 1.0,
            _ => 0.0,
        })
        .collect()
}

fn observe(game: &Powerplay, i: usize) -> Observation {
    Observation {
        obs: ObservationBuilder::features(game, i),
        action_mask: Some(action_mask(game, i)),
    }
}

impl MultiAgentEnv for MovementPowerplay {
    /// Action index, see [`Move::from_action`].
    type Action = usize;
    type Info = StepInfo;

    fn agents(&self) -> &[AgentId] {
        self.game.agents()
    }

    /// Starts the next episode. The first call uses `config.seed`, each
    /// later call the following seed.
    fn reset(&mut self) -> BTreeMap<AgentId, Observation> {
        let seed = self.game.next_seed;
        self.game.next_seed = seed.wrapping_add(1);
        self.reset_with_seed(seed)
    }

    fn step(
        &mut self,
        actions: &BTreeMap<AgentId, usize>,
    ) -> Result<StepResult<StepInfo>, EnvError> {
        if self.game.finished {
            return Err(EnvError::EpisodeOver);
        }
        let decisions = self.game.resolve_actions(actions, action_mask)?;

        let mut rewards = vec![0.0; self.game.robots.len()];
        for (i, decision) in decisions.into_iter().enumerate() {
            rewards[i] += self.act(i, decision);
        }

        Ok(self
            .game
            .conclude_step(rewards, observe, RewardComputer::movement_match_end))
    }

    fn env_info(&self) -> EnvInfo {
        EnvInfo {
            observation_space: ObservationSpace {
                obs: ObservationBuilder::space().obs,
                action_mask: Some(BoxSpace::uniform(MOVEMENT_ACTIONS, 0.0, 1.0)),
            },
            action_space: ActionSpace::Discrete(MOVEMENT_ACTIONS),
            num_agents: self.game.agents().len(),
            episode_limit: self.game.config.horizon_ticks(),
            policy_mapping: Self::policy_mapping_info(),
        }
    }

    fn render(&self) -> String {
        self.game.render_board()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Policy, RandomPolicy};
    use crate::powerplay::{Team, AGENT_NAMES};

    fn env() -> MovementPowerplay {
        MovementPowerplay::new(PowerplayConfig::default()).unwrap()
    }

    fn act(agent: &str, action: usize) -> BTreeMap<AgentId, usize> {
        BTreeMap::from([(agent.to_string(), action)])
    }

    /// Runs the two waiting ticks and the drop of a one-second placement.
    fn settle(env: &mut MovementPowerplay) -> StepResult<StepInfo> {
        env.step(&BTreeMap::new()).unwrap();
        env.step(&BTreeMap::new()).unwrap()
    }

    #[test]
    fn corners_name_adjacent_junctions() {
        assert_eq!(Corner::BottomRight.junction(0), Some(4));
        assert_eq!(Corner::TopLeft.junction(0), None);
        assert_eq!(Corner::TopLeft.junction(35), Some(28));
        assert_eq!(Corner::BottomRight.junction(35), None);
        assert_eq!(Corner::TopLeft.junction(14), Some(10));
        assert_eq!(Corner::TopRight.junction(14), Some(11));
        assert_eq!(Corner::BottomLeft.junction(14), Some(15));
        assert_eq!(Corner::BottomRight.junction(14), Some(16));

        let game = env().game;
        for cell in 0..FIELD_SIZE * FIELD_SIZE {
            for corner in [
                Corner::TopLeft,
                Corner::TopRight,
                Corner::BottomLeft,
                Corner::BottomRight,
            ] {
                if let Some(j) = corner.junction(cell) {
                    assert!(game.stations[j].cells.contains(&cell), "{:?} of {}", corner, cell);
                }
            }
        }
    }

    #[test]
    fn initial_masks() {
        let env = env();
        // red_1 on cell 11, the east edge, empty-handed.
        assert_eq!(
            env.action_mask(0),
            vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        // red_2 starts on its substation; the beacon waits for the late game.
        assert_eq!(
            env.action_mask(1),
            vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
    }

    #[test]
    fn driving_moves_one_cell() {
        let mut env = env();
        let result = env.step(&act("red_1", 0)).unwrap();
        assert_eq!(result.rewards["red_1"], -1.0);
        assert_eq!((env.game.robots[0].cell, env.game.robots[0].heading), (10, Heading::West));

        env.step(&act("red_1", 2)).unwrap();
        assert_eq!((env.game.robots[0].cell, env.game.robots[0].heading), (4, Heading::North));
    }

    #[test]
    fn missing_actions_change_nothing() {
        let mut env = env();
        let before: Vec<Cell> = env.game.robots.iter().map(|r| r.cell).collect();
        let result = env.step(&BTreeMap::new()).unwrap();
        assert!(result.rewards.values().all(|r| *r == 0.0));
        let after: Vec<Cell> = env.game.robots.iter().map(|r| r.cell).collect();
        assert_eq!(before, after);
        assert_eq!(result.observations.len(), 4);
    }

    #[test]
    fn invalid_moves_are_rejected() {
        let mut env = env();
        let err = env.step(&act("red_1", 1)).unwrap_err();
        assert_eq!(
            err,
            EnvError::MaskedAction {
                agent: "red_1".into(),
                action: 1,
                phase: Phase::Junction
            }
        );
        let err = env.step(&act("red_1", 11)).unwrap_err();
        assert!(matches!(err, EnvError::ActionOutOfRange { size: 11, .. }));
        assert_eq!(env.game.elapsed_ticks, 0);
    }

    #[test]
    fn cone_then_junction_scores() {
        let mut env = env();
        env.game.robots[1].cycle_secs = 1;
        env.step(&act("red_2", 9)).unwrap();
        assert!(env.game.robots[1].holding_cone);
        assert_eq!(env.game.stations[31].resource_count(), 19);

        // Cell 23 touches junction 18 (top-left) and junction 23 (bottom-left).
        let mask = env.action_mask(1);
        assert_eq!(&mask[4..=10], &[1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

        let result = env.step(&act("red_2", 6)).unwrap();
        assert_eq!(result.rewards["red_2"], 0.0);
        assert_eq!(env.game.robots[1].phase(), Phase::Automated);
        assert!(env.action_mask(1).iter().all(|m| *m == 0.0));

        let drop = settle(&mut env);
        // Low junction.
        assert_eq!(drop.rewards["red_2"], 3.0);
        assert_eq!(env.game.teams[Team::Red.index()].score, 3);
        assert_eq!(env.game.stations[23].owner(), Some(Team::Red));
        assert!(!env.game.robots[1].holding_cone);
        assert_eq!(env.game.robots[1].phase(), Phase::Junction);
    }

    #[test]
    fn beacon_in_late_game() {
        let mut env = env();
        env.game.robots[1].cycle_secs = 1;
        env.game.elapsed_ticks = 180;
        assert_eq!(env.action_mask(1)[10], 1.0);

        env.step(&act("red_2", 10)).unwrap();
        let robot = &env.game.robots[1];
        assert!(robot.holding_cone && robot.holding_beacon);

        env.step(&act("red_2", 6)).unwrap();
        let drop = settle(&mut env);
        assert_eq!(drop.rewards["red_2"], 9.0);
        assert_eq!(env.game.teams[Team::Red.index()].score, 13);
        assert!(env.game.stations[23].is_beaconed());
        assert!(env.game.teams[Team::Red.index()].beacons_placed[Slot::Two.index()]);
        assert!(env.game.robots[1].placed_beacon);
        assert_eq!(env.action_mask(1)[10], 0.0);
    }

    #[test]
    fn beaconed_junction_costs_the_cone() {
        let mut env = env();
        env.game.robots[1].cycle_secs = 1;
        if let StationKind::Junction { beaconed, .. } = &mut env.game.stations[23].kind {
            *beaconed = true;
        }
        env.step(&act("red_2", 9)).unwrap();
        env.step(&act("red_2", 6)).unwrap();
        let drop = settle(&mut env);
        assert_eq!(drop.rewards["red_2"], -5.0);
        assert_eq!(env.game.teams[Team::Red.index()].score, 0);
        assert!(!env.game.robots[1].holding_cone);
    }

    #[test]
    fn terminal_capture_then_repeat() {
        let mut env = env();
        let robot = &mut env.game.robots[0];
        robot.cell = 0;
        robot.holding_cone = true;
        assert_eq!(env.action_mask(0)[8], 1.0);

        let result = env.step(&act("red_1", 8)).unwrap();
        assert_eq!(result.rewards["red_1"], 3.0);
        assert!(env.game.teams[Team::Red.index()].terminals_captured[Slot::One.index()]);
        assert!(!env.game.robots[0].holding_cone);

        env.game.robots[0].holding_cone = true;
        let result = env.step(&act("red_1", 8)).unwrap();
        assert_eq!(result.rewards["red_1"], -1.0);
        assert_eq!(env.game.teams[Team::Red.index()].score, 2);
    }

    #[test]
    fn opponent_terminal_is_masked() {
        let mut env = env();
        let robot = &mut env.game.robots[0];
        robot.cell = 5;
        robot.holding_cone = true;
        assert_eq!(env.action_mask(0)[8], 0.0);
    }

    #[test]
    fn crash_hands_control_back_after_recovery() {
        let mut env = env();
        // blue_2 starts on cell 24.
        env.game.robots[0].cell = 25;
        let result = env.step(&act("red_1", 0)).unwrap();
        assert_eq!(result.info.crashes, 1);
        assert_eq!(result.rewards["red_1"], -1.0);
        assert!(env.action_mask(0).iter().all(|m| *m == 0.0));
        assert!(env.action_mask(3).iter().all(|m| *m == 0.0));

        env.step(&BTreeMap::new()).unwrap();
        assert_eq!(env.game.robots[0].phase(), Phase::Automated);
        env.step(&BTreeMap::new()).unwrap();
        assert_eq!(env.game.robots[0].phase(), Phase::Junction);
        assert_eq!(env.game.robots[3].phase(), Phase::Junction);
    }

    #[test]
    fn env_info_and_match_end() {
        let mut env = MovementPowerplay::new(PowerplayConfig {
            horizon_secs: 1.0,
            ..Default::default()
        })
        .unwrap();
        let info = env.env_info();
        assert_eq!(info.action_space, ActionSpace::Discrete(MOVEMENT_ACTIONS));
        assert_eq!(info.observation_space.obs.dim(), 64);
        assert_eq!(
            info.observation_space.action_mask.as_ref().map(BoxSpace::dim),
            Some(MOVEMENT_ACTIONS)
        );
        assert_eq!(info.episode_limit, 2);

        env.game.teams[Team::Red.index()].score = 20;
        assert!(!env.step(&BTreeMap::new()).unwrap().is_done());
        let last = env.step(&BTreeMap::new()).unwrap();
        assert!(last.is_done());
        let outcome = last.info.outcome.unwrap();
        let (red, blue) = RewardComputer::movement_match_end(&outcome);
        assert_eq!(last.rewards["red_1"], red);
        assert_eq!(last.rewards["blue_1"], blue);
        assert_eq!(env.step(&BTreeMap::new()).unwrap_err(), EnvError::EpisodeOver);
    }

    #[test]
    fn reset_is_reproducible() {
        let mut a = env();
        let mut b = env();
        assert_eq!(a.reset(), b.reset());
        assert_eq!(a.reset_with_seed(9), b.reset_with_seed(9));
        assert_eq!(a.game.seed(), 9);
        assert!(a.game.robots.iter().all(|r| r.phase() == Phase::Junction));
    }

    #[test]
    fn random_play_stays_legal() {
        let mut env = env();
        let mut policy = RandomPolicy::new(11);
        let mut obs = env.reset();
        loop {
            let result = env.step(&policy.select_actions(&obs)).unwrap();
            for id in sources_of(Team::Red).into_iter().chain(sources_of(Team::Blue)) {
                assert!(env.game.stations[id].resource_count() <= 20);
            }
            if result.is_done() {
                assert_eq!(result.observations.len(), AGENT_NAMES.len());
                break;
            }
            obs = result.observations;
        }
    }
}
