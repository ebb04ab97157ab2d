//! Evaluation metrics for Powerplay policies.
//!
//! Runs whole matches with a fixed policy and aggregates the final tallies.

use std::fmt;

use crate::env::{EnvError, MultiAgentEnv};
use crate::policy::Policy;
use crate::powerplay::{StepInfo, Team};

/// Aggregated evaluation metrics over multiple matches.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationMetrics {
    /// Mean final red score (ownership and circuit bonuses included).
    pub mean_red_score: f64,
    pub mean_blue_score: f64,
    /// Fraction of matches red won outright.
    pub red_win_rate: f64,
    /// Fraction of matches that ended in a tie.
    pub draw_rate: f64,
    pub red_circuit_rate: f64,
    pub blue_circuit_rate: f64,
    /// Mean number of collisions per match.
    pub mean_crashes: f64,
    /// Mean summed reward of one red robot per match.
    pub mean_red_reward: f64,
    pub mean_blue_reward: f64,
    /// Number of matches evaluated.
    pub n_episodes: usize,
}

/// Per-match statistics collected during evaluation.
#[derive(Debug, Default)]
struct EpisodeStats {
    red_score: u32,
    blue_score: u32,
    winner: Option<Team>,
    red_circuit: bool,
    blue_circuit: bool,
    crashes: u32,
    red_reward: f64,
    blue_reward: f64,
}

impl EvaluationMetrics {
    /// Plays `n_episodes` matches with `policy` controlling all four robots.
    ///
    /// Works with either Powerplay variant. Fails on the first step the
    /// environment rejects.
    pub fn evaluate<E>(
        env: &mut E,
        policy: &mut dyn Policy,
        n_episodes: usize,
    ) -> Result<Self, EnvError>
    where
        E: MultiAgentEnv<Action = usize, Info = StepInfo>,
    {
        let mut all_stats = Vec::with_capacity(n_episodes);

        for _ in 0..n_episodes {
            let mut obs = env.reset();
            let mut stats = EpisodeStats::default();

            loop {
                let actions = policy.select_actions(&obs);
                let result = env.step(&actions)?;

                stats.crashes += result.info.crashes;
                for (agent, reward) in &result.rewards {
                    if agent.starts_with(Team::Red.prefix()) {
                        stats.red_reward += reward;
                    } else {
                        stats.blue_reward += reward;
                    }
                }

                if let Some(outcome) = result.info.outcome {
                    stats.red_score = outcome.red.score;
                    stats.blue_score = outcome.blue.score;
                    stats.winner = outcome.winner();
                    stats.red_circuit = outcome.red.circuit;
                    stats.blue_circuit = outcome.blue.circuit;
                }
                if result.is_done() {
                    break;
                }
                obs = result.observations;
            }

            // Two robots per alliance.
            stats.red_reward /= 2.0;
            stats.blue_reward /= 2.0;
            all_stats.push(stats);
        }

        let n = n_episodes.max(1) as f64;
        let share = |pred: fn(&EpisodeStats) -> bool| {
            all_stats.iter().filter(|s| pred(s)).count() as f64 / n
        };

        Ok(Self {
            mean_red_score: all_stats.iter().map(|s| s.red_score as f64).sum::<f64>() / n,
            mean_blue_score: all_stats.iter().map(|s| s.blue_score as f64).sum::<f64>() / n,
            red_win_rate: share(|s| s.winner == Some(Team::Red)),
            draw_rate: share(|s| s.winner.is_none()),
            red_circuit_rate: share(|s| s.red_circuit),
            blue_circuit_rate: share(|s| s.blue_circuit),
            mean_crashes: all_stats.iter().map(|s| s.crashes as f64).sum::<f64>() / n,
            mean_red_reward: all_stats.iter().map(|s| s.red_reward).sum::<f64>() / n,
            mean_blue_reward: all_stats.iter().map(|s| s.blue_reward).sum::<f64>() / n,
            n_episodes,
        })
    }
}

impl fmt::Display for EvaluationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== Evaluation Metrics ({} matches) ===",
            self.n_episodes
        )?;
        writeln!(
            f,
            "  Mean score:          red {:.1}  blue {:.1}",
            self.mean_red_score, self.mean_blue_score
        )?;
        writeln!(
            f,
            "  Red win rate:        {:.1}%  (draws {:.1}%)",
            self.red_win_rate * 100.0,
            self.draw_rate * 100.0
        )?;
        writeln!(
            f,
            "  Circuit rate:        red {:.1}%  blue {:.1}%",
            self.red_circuit_rate * 100.0,
            self.blue_circuit_rate * 100.0
        )?;
        writeln!(f, "  Mean crashes:        {:.2}", self.mean_crashes)?;
        writeln!(
            f,
            "  Mean robot reward:   red {:.2}  blue {:.2}",
            self.mean_red_reward, self.mean_blue_reward
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{GreedyJunctionPolicy, RandomPolicy};
    use crate::powerplay::{MovementPowerplay, Powerplay, PowerplayConfig};

    fn short_match() -> Powerplay {
        Powerplay::new(PowerplayConfig {
            horizon_secs: 30.0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn evaluate_completes() {
        let mut env = short_match();
        let mut policy = RandomPolicy::new(42);
        let metrics = EvaluationMetrics::evaluate(&mut env, &mut policy, 3).unwrap();
        assert_eq!(metrics.n_episodes, 3);
        assert!((0.0..=1.0).contains(&metrics.red_win_rate));
        assert!(metrics.red_win_rate + metrics.draw_rate <= 1.0);
        assert_eq!(env.seed(), 2);
    }

    #[test]
    fn evaluation_is_reproducible() {
        let run = || {
            let mut env = short_match();
            let mut policy = GreedyJunctionPolicy::new();
            EvaluationMetrics::evaluate(&mut env, &mut policy, 2).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn evaluates_direct_control_matches() {
        let mut env = MovementPowerplay::new(PowerplayConfig {
            horizon_secs: 30.0,
            ..Default::default()
        })
        .unwrap();
        let metrics =
            EvaluationMetrics::evaluate(&mut env, &mut RandomPolicy::new(5), 2).unwrap();
        assert_eq!(metrics.n_episodes, 2);
        assert_eq!(env.game.seed(), 1);
    }

    #[test]
    fn display_mentions_matches() {
        let mut env = short_match();
        let metrics =
            EvaluationMetrics::evaluate(&mut env, &mut GreedyJunctionPolicy::new(), 1).unwrap();
        assert!(metrics.to_string().starts_with("=== Evaluation Metrics (1 matches) ==="));
    }
}
