//! End-of-match reward adjustment.
//!
//! The alliance with the lower summed cycle time is expected to outscore
//! the other and to complete a circuit; the slower alliance is expected to
//! defend. Rewards are paid per robot, identically to both teammates.

use super::MatchOutcome;

/// Computes match-end rewards.
pub struct RewardComputer;

impl RewardComputer {
    /// Reward paid to each red and each blue robot when the match ends.
    pub fn match_end(outcome: &MatchOutcome) -> (f64, f64) {
        let red_score = outcome.red.score as f64;
        let blue_score = outcome.blue.score as f64;
        let mut red = red_score * 3.0 / 5.0;
        let mut blue = blue_score * 3.0 / 5.0;

        if Self::red_is_faster(outcome) {
            red -= if red_score < blue_score {
                blue_score / 5.0
            } else {
                blue_score / 20.0
            };
            blue -= red_score / 20.0;
        } else {
            blue -= if blue_score < red_score {
                red_score / 5.0
            } else {
                red_score / 20.0
            };
            red -= blue_score / 20.0;
        }

        let (red_circuit, blue_circuit) = Self::circuit_terms(outcome);
        (red + red_circuit, blue + blue_circuit)
    }

    /// Match-end rewards of the direct-control variant.
    ///
    /// A fifth of the final score is paid out. The faster alliance loses a
    /// fifth of the opponent's score when it is outscored, otherwise both
    /// sides lose a tenth of each other's score.
    pub fn movement_match_end(outcome: &MatchOutcome) -> (f64, f64) {
        let red_score = outcome.red.score as f64;
        let blue_score = outcome.blue.score as f64;
        let mut red = red_score / 5.0;
        let mut blue = blue_score / 5.0;

        if Self::red_is_faster(outcome) {
            if red_score < blue_score {
                red -= blue_score / 5.0;
            } else {
                red -= blue_score / 10.0;
                blue -= red_score / 10.0;
            }
        } else {
            blue -= if blue_score < red_score {
                red_score / 5.0
            } else {
                red_score / 10.0
            };
            red -= blue_score / 10.0;
        }

        let (red_circuit, blue_circuit) = Self::circuit_terms(outcome);
        (red + red_circuit, blue + blue_circuit)
    }

    fn red_is_faster(outcome: &MatchOutcome) -> bool {
        outcome.red.cycle_sum < outcome.blue.cycle_sum
    }

    /// Circuit bonuses and penalties. The faster alliance is expected to
    /// circuit, the slower one to defend.
    fn circuit_terms(outcome: &MatchOutcome) -> (f64, f64) {
        let (mut red, mut blue) = (0.0, 0.0);
        if Self::red_is_faster(outcome) {
            if outcome.red.circuit {
                red += 15.0;
                blue -= 8.0;
            } else {
                red -= 13.0;
                blue += 10.0;
            }
            if outcome.blue.circuit {
                red -= 7.0;
                blue += 15.0;
            } else {
                red += 8.0;
                blue -= 7.0;
            }
        } else {
            if outcome.blue.circuit {
                blue += 5.0;
                red -= 5.0;
            } else {
                blue -= 15.0;
                red += 10.0;
            }
            if outcome.red.circuit {
                blue -= 7.0;
                red += 15.0;
            } else {
                blue += 7.0;
                red -= 5.0;
            }
        }
        (red, blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerplay::TeamOutcome;

    fn outcome(red: (u32, bool, u32), blue: (u32, bool, u32)) -> MatchOutcome {
        MatchOutcome {
            red: TeamOutcome {
                score: red.0,
                circuit: red.1,
                cycle_sum: red.2,
            },
            blue: TeamOutcome {
                score: blue.0,
                circuit: blue.1,
                cycle_sum: blue.2,
            },
        }
    }

    #[test]
    fn faster_red_that_loses_is_penalised() {
        let (red, blue) = RewardComputer::match_end(&outcome((20, false, 2), (40, false, 6)));
        // red: 12 - 8 - 13 + 8; blue: 24 - 1 + 10 - 7
        assert!((red - -1.0).abs() < 1e-12);
        assert!((blue - 26.0).abs() < 1e-12);
    }

    #[test]
    fn faster_red_that_circuits() {
        let (red, blue) = RewardComputer::match_end(&outcome((60, true, 2), (20, false, 4)));
        // red: 36 - 1 + 15 + 8; blue: 12 - 3 - 8 - 7
        assert!((red - 58.0).abs() < 1e-12);
        assert!((blue - -6.0).abs() < 1e-12);
    }

    #[test]
    fn movement_table_pays_a_fifth() {
        let (red, blue) =
            RewardComputer::movement_match_end(&outcome((20, false, 2), (40, false, 6)));
        // red: 4 - 8 - 13 + 8; blue: 8 + 10 - 7
        assert!((red - -9.0).abs() < 1e-12);
        assert!((blue - 11.0).abs() < 1e-12);

        let (red, blue) =
            RewardComputer::movement_match_end(&outcome((10, false, 4), (30, true, 4)));
        // blue: 6 - 1 + 5 + 7; red: 2 - 3 - 5 - 5
        assert!((blue - 17.0).abs() < 1e-12);
        assert!((red - -11.0).abs() < 1e-12);
    }

    #[test]
    fn equal_cycles_take_the_blue_branch() {
        let (red, blue) = RewardComputer::match_end(&outcome((10, false, 4), (30, true, 4)));
        // blue: 18 - 0.5 + 5 + 7; red: 6 - 1.5 - 5 - 5
        assert!((blue - 29.5).abs() < 1e-12);
        assert!((red - -5.5).abs() < 1e-12);
    }
}
