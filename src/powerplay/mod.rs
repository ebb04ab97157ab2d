//! Powerplay: a two-versus-two cone-scoring match on a 6×6 field.
//!
//! Each step advances the match clock by half a second (one tick):
//! act → collide → observe → (score the match end) → tick.
//!
//! Agents only decide at two points. While holding a cone they pick the
//! scoring station to drive to ([`Phase::Junction`]); at a cone source in the
//! late game they pick between a cone and the beacon ([`Phase::Cone`]).
//! Everything else (driving to sources, lining up over a junction, crash
//! recovery) runs automatically.

pub mod circuit;
pub mod config;
pub mod movement;
pub mod observation;
pub mod reward;
pub mod robot;
pub mod station;
pub mod team;

mod render;


use std::collections::BTreeMap;

use qtty::{Quantity, Second};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::env::{
    ActionSpace, AgentId, ConfigError, EnvError, EnvInfo, MultiAgentEnv, Observation,
    PolicyMappingInfo, StepResult, ALL_DONE,
};
use crate::field::{Cell, FieldGraph, Heading};
use crate::{generate_id, Id};

pub use circuit::has_circuit;
pub use config::{
    CircuitRule, InvalidActionPolicy, MovementRewardConfig, PowerplayConfig, RewardConfig,
    TICK_SECS,
};
pub use movement::MovementPowerplay;
pub use observation::ObservationBuilder;
pub use reward::RewardComputer;
pub use robot::{Phase, Robot};
pub use station::{ConeStation, JunctionTier, Slot, StationId, StationKind, SCORING_STATIONS};
pub use team::Team;

use station::{sources_of, standard_layout, FIRST_JUNCTION};

/// Agent ids in processing order.
pub const AGENT_NAMES: [&str; 4] = ["red_1", "red_2", "blue_1", "blue_2"];

/// Number of discrete actions (one per scoring station).
pub const ACTION_COUNT: usize = SCORING_STATIONS;

/// Extra score for placing a beacon.
pub const BEACON_POINTS: u32 = 10;

/// End-of-match score per owned junction without a beacon.
pub const OWNERSHIP_POINTS: u32 = 3;

/// End-of-match score for a completed circuit.
pub const CIRCUIT_POINTS: u32 = 20;

const START: [(Team, Slot, Cell, Heading); 4] = [
    (Team::Red, Slot::One, 11, Heading::West),
    (Team::Red, Slot::Two, 23, Heading::West),
    (Team::Blue, Slot::One, 6, Heading::East),
    (Team::Blue, Slot::Two, 24, Heading::East),
];

/// Running match state of one alliance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamState {
    pub score: u32,
    /// Terminal captures, indexed by [`Slot`].
    pub terminals_captured: [bool; 2],
    /// Beacon placements, indexed by the placing robot's [`Slot`].
    pub beacons_placed: [bool; 2],
}

/// Final tally of one alliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamOutcome {
    /// Score including ownership and circuit bonuses.
    pub score: u32,
    pub circuit: bool,
    /// Sum of the alliance's robot cycle times in seconds.
    pub cycle_sum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub red: TeamOutcome,
    pub blue: TeamOutcome,
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<Team> {
        match self.red.score.cmp(&self.blue.score) {
            std::cmp::Ordering::Greater => Some(Team::Red),
            std::cmp::Ordering::Less => Some(Team::Blue),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Diagnostics returned with every step.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub episode_id: Id,
    /// Match time after this step.
    pub elapsed: Quantity<Second>,
    pub red_score: u32,
    pub blue_score: u32,
    /// Collisions detected on this step.
    pub crashes: u32,
    /// Set on the final step.
    pub outcome: Option<MatchOutcome>,
}

/// The Powerplay match simulator.
///
/// # Lifecycle
///
/// 1. Call [`Powerplay::new`]; the configuration is validated and the first
///    episode is laid out from `config.seed`.
/// 2. Call [`MultiAgentEnv::reset`] (or [`Powerplay::reset_with_seed`]) to
///    start an episode and get every agent's first observation.
/// 3. Call [`MultiAgentEnv::step`] with the agents' decisions until the done
///    map reports [`ALL_DONE`].
#[derive(Debug, Clone)]
pub struct Powerplay {
    pub config: PowerplayConfig,
    pub field: FieldGraph,
    /// Terminals, junctions and cone sources, indexed by [`StationId`].
    pub stations: Vec<ConeStation>,
    /// One robot per agent, in [`AGENT_NAMES`] order.
    pub robots: Vec<Robot>,
    /// Per-alliance state, indexed by [`Team::index`].
    pub teams: [TeamState; 2],
    /// Ticks elapsed in the current episode.
    pub elapsed_ticks: u32,
    agents: Vec<AgentId>,
    episode_id: Id,
    seed: u64,
    next_seed: u64,
    finished: bool,
}

impl Powerplay {
    /// Validates `config` and lays out an episode seeded with `config.seed`.
    pub fn new(config: PowerplayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed;
        let mut game = Self {
            config,
            field: FieldGraph::grid(),
            stations: Vec::new(),
            robots: Vec::new(),
            teams: Default::default(),
            elapsed_ticks: 0,
            agents: AGENT_NAMES.iter().map(|s| s.to_string()).collect(),
            episode_id: Id::new(),
            seed,
            next_seed: seed,
            finished: false,
        };
        game.populate(seed);
        Ok(game)
    }

    /// Starts a new episode from an explicit seed.
    pub fn reset_with_seed(&mut self, seed: u64) -> BTreeMap<AgentId, Observation> {
        self.populate(seed);
        self.observe_all()
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    /// Seed of the current episode.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cones left across all of a team's sources.
    pub fn cones_left(&self, team: Team) -> u32 {
        sources_of(team)
            .iter()
            .map(|&id| self.stations[id].resource_count())
            .sum()
    }

    pub fn agent_index(&self, agent: &str) -> Option<usize> {
        self.agents.iter().position(|a| a == agent)
    }

    /// Sharing modes the match supports: one policy per alliance.
    pub fn policy_mapping_info() -> PolicyMappingInfo {
        PolicyMappingInfo {
            description: "powerplay".to_string(),
            team_prefix: vec![Team::Red.prefix().to_string(), Team::Blue.prefix().to_string()],
            all_agents_one_policy: false,
            one_agent_one_policy: false,
        }
    }

    /// Final tally of both alliances for the current state.
    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            red: self.team_outcome(Team::Red),
            blue: self.team_outcome(Team::Blue),
        }
    }

    fn team_outcome(&self, team: Team) -> TeamOutcome {
        let state = &self.teams[team.index()];
        let circuit = has_circuit(
            &self.stations,
            state.terminals_captured,
            team,
            self.config.circuit_rule,
        );
        let owned = self.stations[FIRST_JUNCTION..SCORING_STATIONS]
            .iter()
            .filter(|s| s.owner() == Some(team) && !s.is_beaconed())
            .count() as u32;
        let cycle_sum = self
            .robots
            .iter()
            .filter(|r| r.team == team)
            .map(|r| r.cycle_secs)
            .sum();
        TeamOutcome {
            score: state.score
                + OWNERSHIP_POINTS * owned
                + if circuit { CIRCUIT_POINTS } else { 0 },
            circuit,
            cycle_sum,
        }
    }

    fn populate(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (min_cycle, max_cycle) = (self.config.min_cycle_secs, self.config.max_cycle_secs);

        self.stations = standard_layout();
        self.robots = AGENT_NAMES
            .iter()
            .zip(START)
            .map(|(name, (team, slot, cell, heading))| {
                let mut robot = Robot::new(*name, team, slot, cell, heading);
                robot.cycle_secs = rng.gen_range(min_cycle..=max_cycle);
                robot
            })
            .collect();
        self.teams = Default::default();
        self.elapsed_ticks = 0;
        self.finished = false;
        self.seed = seed;
        self.episode_id = generate_id();

        for i in 0..self.robots.len() {
            self.route_to_cones(i);
        }

        let cycles: Vec<u32> = self.robots.iter().map(|r| r.cycle_secs).collect();
        debug!(episode = %self.episode_id, seed, ?cycles, "episode reset");
    }

    fn observe_all(&self) -> BTreeMap<AgentId, Observation> {
        (0..self.robots.len())
            .map(|i| (self.agents[i].clone(), ObservationBuilder::build(self, i)))
            .collect()
    }

    /// Checks every submitted action before anything changes.
    ///
    /// Agents that are not deciding this tick (all-zero mask) have their
    /// action dropped.
    fn resolve_actions(
        &self,
        actions: &BTreeMap<AgentId, usize>,
        mask_of: impl Fn(&Self, usize) -> Vec<f64>,
    ) -> Result<Vec<Option<usize>>, EnvError> {
        let mut resolved = vec![None; self.robots.len()];
        for (agent, &action) in actions {
            let idx = self
                .agent_index(agent)
                .ok_or_else(|| EnvError::UnknownAgent(agent.clone()))?;
            let mask = mask_of(self, idx);
            if mask.iter().all(|m| *m == 0.0) {
                trace!(agent = %agent, action, "agent is not deciding; action dropped");
                continue;
            }
            if mask.get(action).is_some_and(|m| *m > 0.0) {
                resolved[idx] = Some(action);
                continue;
            }
            match self.config.invalid_actions {
                InvalidActionPolicy::Reject if action >= mask.len() => {
                    return Err(EnvError::ActionOutOfRange {
                        agent: agent.clone(),
                        action,
                        size: mask.len(),
                    });
                }
                InvalidActionPolicy::Reject => {
                    return Err(EnvError::MaskedAction {
                        agent: agent.clone(),
                        action,
                        phase: self.robots[idx].phase(),
                    });
                }
                InvalidActionPolicy::Ignore => {
                    debug!(agent = %agent, action, "invalid action ignored");
                }
            }
        }
        Ok(resolved)
    }

    fn act(&mut self, i: usize, decision: Option<usize>) -> f64 {
        match self.robots[i].phase() {
            Phase::Junction => match decision {
                Some(station) => self.drive_to_target(i, station),
                None => 0.0,
            },
            Phase::Loading => self.load_cone(i, false),
            Phase::Automated => self.automate(i),
            Phase::Cone => match decision {
                Some(choice) => self.load_cone(i, choice == 1),
                None => 0.0,
            },
        }
    }

    /// Spends one tick driving toward `station`, re-planning when it is a
    /// new target.
    fn drive_to_target(&mut self, i: usize, station: StationId) -> f64 {
        if self.robots[i].target != Some(station) {
            let robot = &self.robots[i];
            let path = self.stations[station]
                .closest_path_to(robot.cell, robot.heading, &self.field)
                .map(|p| p.cells)
                .unwrap_or_default();
            let robot = &mut self.robots[i];
            robot.path = path.into();
            robot.target = Some(station);
        }

        let mut reward = self.config.rewards.travel_penalty;
        if self.robots[i].advance() {
            reward += self.begin_placement(i);
        }
        reward
    }

    /// The robot has reached its target station.
    fn begin_placement(&mut self, i: usize) -> f64 {
        let Some(target) = self.robots[i].target else {
            return 0.0;
        };
        match self.stations[target].kind {
            StationKind::Terminal { team, slot } => {
                let robot = &mut self.robots[i];
                robot.holding_cone = false;
                robot.crashed = false;
                robot.target = None;
                robot.set_phase(Phase::Automated);
                let scored = robot.team == team;
                if scored {
                    let state = &mut self.teams[team.index()];
                    state.terminals_captured[slot.index()] = true;
                    state.score += 1;
                    debug!(agent = %robot.id, terminal = target, "terminal captured");
                }
                self.route_to_cones(i);
                if scored {
                    self.config.rewards.terminal_reward
                } else {
                    0.0
                }
            }
            StationKind::Junction { tier, .. } => {
                let robot = &mut self.robots[i];
                robot.adjusting = true;
                robot.timer = (2 * tier.adjust_secs(robot.cycle_secs)).saturating_sub(1);
                robot.set_phase(Phase::Automated);
                0.0
            }
            StationKind::Stack { .. } | StationKind::Substation { .. } => {
                let robot = &mut self.robots[i];
                robot.target = None;
                robot.set_phase(Phase::Automated);
                self.route_to_cones(i);
                0.0
            }
        }
    }

    fn automate(&mut self, i: usize) -> f64 {
        let robot = &mut self.robots[i];
        if robot.adjusting {
            if robot.timer > 0 {
                robot.timer -= 1;
                return 0.0;
            }
            return self.finish_placement(i);
        }
        if robot.timer > 0 {
            robot.timer -= 1;
            if robot.timer == 0 && robot.holding_cone {
                robot.set_phase(Phase::Junction);
            }
            return 0.0;
        }
        if robot.source.is_none() {
            return 0.0;
        }
        if robot.advance() {
            let late = self.elapsed_ticks >= self.config.late_game_ticks();
            if late && !robot.placed_beacon && !robot.holding_beacon {
                robot.set_phase(Phase::Cone);
            } else {
                robot.set_phase(Phase::Loading);
            }
        }
        0.0
    }

    /// Drops the cone once adjustment is over and scores the junction.
    fn finish_placement(&mut self, i: usize) -> f64 {
        let robot = &mut self.robots[i];
        robot.adjusting = false;
        robot.timer = 0;
        let team = robot.team;
        let mut reward = 0.0;

        if let Some(id) = robot.target.take() {
            if let StationKind::Junction {
                tier,
                owner,
                beaconed,
            } = &mut self.stations[id].kind
            {
                if !*beaconed {
                    let state = &mut self.teams[team.index()];
                    let mut points = tier.value();
                    if robot.holding_beacon {
                        *beaconed = true;
                        points += BEACON_POINTS;
                        robot.placed_beacon = true;
                        state.beacons_placed[robot.slot.index()] = true;
                    }
                    state.score += points;
                    reward = points as f64;
                    if *owner != Some(team) {
                        reward += self.config.rewards.steal_bonus;
                    }
                    *owner = Some(team);
                    debug!(agent = %robot.id, junction = id, points, "cone scored");
                } else {
                    trace!(agent = %robot.id, junction = id, "junction already beaconed");
                }
            }
        }

        robot.holding_cone = false;
        robot.holding_beacon = false;
        robot.crashed = false;
        self.route_to_cones(i);
        reward
    }

    /// Takes a cone (and the beacon when asked) from the current source.
    fn load_cone(&mut self, i: usize, with_beacon: bool) -> f64 {
        let taken = match self.robots[i].source {
            Some(source) => self.stations[source].take_cone(),
            None => false,
        };
        if !taken {
            debug!(agent = %self.robots[i].id, "cone source exhausted; rerouting");
            self.robots[i].set_phase(Phase::Automated);
            self.route_to_cones(i);
            return 0.0;
        }

        let robot = &mut self.robots[i];
        robot.holding_cone = true;
        robot.crashed = false;
        robot.source = None;
        robot.set_phase(Phase::Junction);
        if with_beacon {
            robot.holding_beacon = true;
            debug!(agent = %robot.id, "beacon picked up");
            self.config.rewards.beacon_pickup
        } else {
            0.0
        }
    }

    /// Routes robot `i` to the fastest non-empty source of its alliance.
    fn route_to_cones(&mut self, i: usize) {
        let robot = &self.robots[i];
        let mut best: Option<(StationId, Vec<Cell>, f64)> = None;
        for id in sources_of(robot.team) {
            let station = &self.stations[id];
            if station.resource_count() == 0 {
                continue;
            }
            if let Some(path) = station.closest_path_to(robot.cell, robot.heading, &self.field) {
                if best.as_ref().map_or(true, |(_, _, time)| path.time < *time) {
                    best = Some((id, path.cells, path.time));
                }
            }
        }

        let robot = &mut self.robots[i];
        match best {
            Some((id, cells, _)) => {
                robot.source = Some(id);
                robot.path = cells.into();
            }
            None => {
                robot.source = None;
                robot.path.clear();
                debug!(agent = %robot.id, "no cones left to fetch");
            }
        }
    }

    /// Finishes a step once every robot has acted: collisions, observations,
    /// the match-end settlement on the final tick, then the clock.
    ///
    /// `rewards` holds what each robot earned by acting this tick.
    fn conclude_step(
        &mut self,
        mut rewards: Vec<f64>,
        observe: impl Fn(&Self, usize) -> Observation,
        match_end: fn(&MatchOutcome) -> (f64, f64),
    ) -> StepResult<StepInfo> {
        let crashes = self.detect_collisions();

        let final_tick = self.elapsed_ticks + 1 >= self.config.horizon_ticks();
        let observe_all =
            final_tick || self.elapsed_ticks >= self.config.observe_all_after_ticks();
        let mut observations = BTreeMap::new();
        for (i, robot) in self.robots.iter().enumerate() {
            if observe_all || robot.phase() != Phase::Automated || rewards[i] != 0.0 {
                observations.insert(self.agents[i].clone(), observe(self, i));
            }
        }

        let outcome = if final_tick {
            let outcome = self.outcome();
            let (red, blue) = match_end(&outcome);
            for (reward, robot) in rewards.iter_mut().zip(&self.robots) {
                *reward += match robot.team {
                    Team::Red => red,
                    Team::Blue => blue,
                };
            }
            self.finished = true;
            info!(
                episode = %self.episode_id,
                red = outcome.red.score,
                blue = outcome.blue.score,
                red_circuit = outcome.red.circuit,
                blue_circuit = outcome.blue.circuit,
                "match over"
            );
            Some(outcome)
        } else {
            None
        };

        self.elapsed_ticks += 1;

        let mut dones: BTreeMap<String, bool> =
            self.agents.iter().map(|a| (a.clone(), final_tick)).collect();
        dones.insert(ALL_DONE.to_string(), final_tick);

        StepResult {
            observations,
            rewards: self.agents.iter().cloned().zip(rewards).collect(),
            dones,
            info: StepInfo {
                episode_id: self.episode_id.clone(),
                elapsed: Quantity::<Second>::new(self.elapsed_ticks as f64 * TICK_SECS),
                red_score: self.teams[Team::Red.index()].score,
                blue_score: self.teams[Team::Blue.index()].score,
                crashes,
                outcome,
            },
        }
    }

    /// Crashes every pair of mobile robots sharing a cell. Returns the
    /// number of collisions.
    fn detect_collisions(&mut self) -> u32 {
        let mut crashes = 0;
        for a in 0..self.robots.len() {
            for b in a + 1..self.robots.len() {
                let (ra, rb) = (&self.robots[a], &self.robots[b]);
                if ra.crashed || rb.crashed || ra.adjusting || rb.adjusting || ra.cell != rb.cell {
                    continue;
                }
                debug!(a = %ra.id, b = %rb.id, cell = ra.cell, "robots collided");
                self.robots[a].crash();
                self.robots[b].crash();
                crashes += 1;
            }
        }
        crashes
    }
}

impl MultiAgentEnv for Powerplay {
    /// Station id to score on, or 0 = cone / 1 = beacon at a source.
    type Action = usize;
    type Info = StepInfo;

    fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Starts the next episode. The first call uses `config.seed`, each
    /// later call the following seed.
    fn reset(&mut self) -> BTreeMap<AgentId, Observation> {
        let seed = self.next_seed;
        self.next_seed = seed.wrapping_add(1);
        self.reset_with_seed(seed)
    }

    fn step(
        &mut self,
        actions: &BTreeMap<AgentId, usize>,
    ) -> Result<StepResult<StepInfo>, EnvError> {
        if self.finished {
            return Err(EnvError::EpisodeOver);
        }
        let decisions = self.resolve_actions(actions, ObservationBuilder::action_mask)?;

        let mut rewards = vec![0.0; self.robots.len()];
        for (i, decision) in decisions.into_iter().enumerate() {
            rewards[i] += self.act(i, decision);
        }

        Ok(self.conclude_step(rewards, ObservationBuilder::build, RewardComputer::match_end))
    }

    fn env_info(&self) -> EnvInfo {
        EnvInfo {
            observation_space: ObservationBuilder::space(),
            action_space: ActionSpace::Discrete(ACTION_COUNT),
            num_agents: self.agents.len(),
            episode_limit: self.config.horizon_ticks(),
            policy_mapping: Self::policy_mapping_info(),
        }
    }

    fn render(&self) -> String {
        self.render_board()
    }
}
