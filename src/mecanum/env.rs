//! Motion environment: three agents share one mecanum robot and drive it to
//! a goal point.
//!
//! Each agent owns one controller axis (`power`, `strafe` or `turn`). All
//! three receive the same observation `[x, y, θ, goal_x, goal_y, t]` and the
//! same reward.

use std::collections::BTreeMap;
use std::f64::consts::TAU;
use std::fmt;

use qtty::{Quantity, Second};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::env::{
    ActionSpace, AgentId, BoxSpace, ConfigError, EnvError, EnvInfo, MultiAgentEnv, Observation,
    ObservationSpace, PolicyMappingInfo, StepResult, ALL_DONE,
};
use crate::{generate_id, Id};

use super::config::MecanumEnvConfig;
use super::geometry::{Point, Polygon};
use super::{Mecanum, Pose};

/// Agent ids, one per controller axis.
pub const AXES: [&str; 3] = ["power", "strafe", "turn"];

const OBS_LIMIT: f64 = 10_000.0;

/// What happened to the robot on one step, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    TimedOut,
    /// Hit a roadblock; the move was undone.
    Blocked,
    /// Left the field; the move was undone.
    OutOfBounds,
    ReachedGoal,
    Moving,
}

impl MotionOutcome {
    /// Reward paid to every agent.
    pub fn reward(self) -> f64 {
        match self {
            MotionOutcome::TimedOut => -100.0,
            MotionOutcome::Blocked => -10.0,
            MotionOutcome::OutOfBounds => -1.0,
            MotionOutcome::ReachedGoal => 50.0,
            MotionOutcome::Moving => -0.5,
        }
    }

    pub fn ends_episode(self) -> bool {
        matches!(self, MotionOutcome::TimedOut | MotionOutcome::ReachedGoal)
    }
}

impl fmt::Display for MotionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MotionOutcome::TimedOut => "timed out",
            MotionOutcome::Blocked => "blocked",
            MotionOutcome::OutOfBounds => "out of bounds",
            MotionOutcome::ReachedGoal => "reached goal",
            MotionOutcome::Moving => "moving",
        };
        write!(f, "{}", s)
    }
}

/// Diagnostics returned with every step.
#[derive(Debug, Clone)]
pub struct MecanumStepInfo {
    pub episode_id: Id,
    pub outcome: MotionOutcome,
    /// Simulated time after this step.
    pub elapsed: Quantity<Second>,
}

/// The mecanum motion environment.
#[derive(Debug, Clone)]
pub struct MecanumEnv {
    pub config: MecanumEnvConfig,
    pub robot: Mecanum,
    pub goal: Point,
    /// Steps taken in the current episode.
    pub t: u32,
    bounds: Polygon,
    roadblocks: Vec<Polygon>,
    agents: Vec<AgentId>,
    episode_id: Id,
    seed: u64,
    next_seed: u64,
    finished: bool,
}

impl MecanumEnv {
    /// Validates `config` and samples an episode from `config.seed`.
    pub fn new(config: MecanumEnvConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed;
        let mut env = Self {
            robot: Mecanum::new(config.drivetrain, Pose::default()),
            goal: Point::origin(),
            t: 0,
            bounds: config.bounds(),
            roadblocks: config.roadblock_polygons(),
            agents: AXES.iter().map(|s| s.to_string()).collect(),
            episode_id: Id::new(),
            seed,
            next_seed: seed,
            finished: false,
            config,
        };
        env.populate(seed);
        Ok(env)
    }

    /// Starts a new episode from an explicit seed.
    pub fn reset_with_seed(&mut self, seed: u64) -> BTreeMap<AgentId, Observation> {
        self.populate(seed);
        self.observe()
    }

    pub fn episode_id(&self) -> &str {
        &self.episode_id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Both sharing modes are open: one policy for all axes, or one each.
    pub fn policy_mapping_info() -> PolicyMappingInfo {
        PolicyMappingInfo {
            description: "mecanum_movement".to_string(),
            team_prefix: Vec::new(),
            all_agents_one_policy: true,
            one_agent_one_policy: true,
        }
    }

    fn populate(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let c = &self.config;
        let pose = Pose::new(
            rng.gen_range(c.min_x..c.max_x),
            rng.gen_range(c.min_y..c.max_y),
            rng.gen_range(0.0..TAU),
        );
        self.goal = Point::new(rng.gen_range(c.min_x..c.max_x), rng.gen_range(c.min_y..c.max_y));
        self.robot = Mecanum::new(c.drivetrain, pose);
        self.t = 0;
        self.finished = false;
        self.seed = seed;
        self.episode_id = generate_id();
        debug!(
            episode = %self.episode_id,
            seed,
            x = pose.x,
            y = pose.y,
            goal_x = self.goal.x,
            goal_y = self.goal.y,
            "episode reset"
        );
    }

    fn features(&self) -> Vec<f64> {
        let pose = self.robot.pose();
        vec![pose.x, pose.y, pose.theta, self.goal.x, self.goal.y, self.t as f64]
    }

    fn observe(&self) -> BTreeMap<AgentId, Observation> {
        let obs = Observation {
            obs: self.features(),
            action_mask: None,
        };
        self.agents
            .iter()
            .map(|a| (a.clone(), obs.clone()))
            .collect()
    }

    /// Stick values in axis order; missing axes are zero.
    fn controls(&self, actions: &BTreeMap<AgentId, f64>) -> Result<[f64; 3], EnvError> {
        let mut controls = [0.0; 3];
        for (agent, &value) in actions {
            let idx = self
                .agents
                .iter()
                .position(|a| a == agent)
                .ok_or_else(|| EnvError::UnknownAgent(agent.clone()))?;
            if !value.is_finite() {
                return Err(EnvError::NonFiniteControl {
                    agent: agent.clone(),
                    value,
                });
            }
            controls[idx] = value;
        }
        Ok(controls)
    }
}

impl MultiAgentEnv for MecanumEnv {
    /// Stick value of the agent's axis, nominally in [-1, 1].
    type Action = f64;
    type Info = MecanumStepInfo;

    fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    fn reset(&mut self) -> BTreeMap<AgentId, Observation> {
        let seed = self.next_seed;
        self.next_seed = seed.wrapping_add(1);
        self.reset_with_seed(seed)
    }

    fn step(
        &mut self,
        actions: &BTreeMap<AgentId, f64>,
    ) -> Result<StepResult<MecanumStepInfo>, EnvError> {
        if self.finished {
            return Err(EnvError::EpisodeOver);
        }
        let [power, strafe, turn] = self.controls(actions)?;
        self.robot.drive(power, strafe, turn, self.config.timestep);

        let outcome = if self.t >= self.config.max_time {
            MotionOutcome::TimedOut
        } else if self.robot.clips(&self.roadblocks) {
            self.robot.revert();
            MotionOutcome::Blocked
        } else if self.robot.out_of_bounds(&self.bounds) {
            self.robot.revert();
            MotionOutcome::OutOfBounds
        } else if self.robot.contains_point(&self.goal) {
            MotionOutcome::ReachedGoal
        } else {
            MotionOutcome::Moving
        };
        match outcome {
            MotionOutcome::Blocked | MotionOutcome::OutOfBounds => {
                trace!(t = self.t, %outcome, "move undone")
            }
            MotionOutcome::TimedOut | MotionOutcome::ReachedGoal => {
                info!(episode = %self.episode_id, t = self.t, %outcome, "episode over")
            }
            MotionOutcome::Moving => {}
        }

        let observations = self.observe();
        self.t += 1;
        let done = outcome.ends_episode();
        self.finished = done;

        let reward = outcome.reward();
        let mut dones: BTreeMap<String, bool> =
            self.agents.iter().map(|a| (a.clone(), done)).collect();
        dones.insert(ALL_DONE.to_string(), done);

        Ok(StepResult {
            observations,
            rewards: self.agents.iter().map(|a| (a.clone(), reward)).collect(),
            dones,
            info: MecanumStepInfo {
                episode_id: self.episode_id.clone(),
                outcome,
                elapsed: Quantity::<Second>::new(self.t as f64 * self.config.timestep),
            },
        })
    }

    fn env_info(&self) -> EnvInfo {
        let mut low = vec![-OBS_LIMIT; 5];
        low.push(0.0);
        let mut high = vec![OBS_LIMIT; 5];
        high.push(self.config.max_time as f64);
        EnvInfo {
            observation_space: ObservationSpace {
                obs: BoxSpace::new(low, high),
                action_mask: None,
            },
            action_space: ActionSpace::Box(BoxSpace::uniform(1, -1.0, 1.0)),
            num_agents: self.agents.len(),
            episode_limit: self.config.max_time + 1,
            policy_mapping: Self::policy_mapping_info(),
        }
    }

    fn render(&self) -> String {
        let pose = self.robot.pose();
        format!(
            "t={} pose ({:.2}, {:.2}) θ={:.3} rad  goal ({:.2}, {:.2})",
            self.t, pose.x, pose.y, pose.theta, self.goal.x, self.goal.y
        )
    }
}
