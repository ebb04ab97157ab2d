//! Text rendering of a match.
//!
//! The board is an 11×11 character grid: even rows and columns hold the 36
//! field cells, odd rows and columns the 25 junctions between them.

use std::fmt::Write as _;

use crate::field::{row_col, FIELD_SIZE};

use super::config::TICK_SECS;
use super::station::{StationKind, FIRST_JUNCTION, SCORING_STATIONS};
use super::team::Team;
use super::Powerplay;

const BOARD: usize = 2 * FIELD_SIZE - 1;

impl Powerplay {
    /// Renders the scoreboard and the board as text.
    pub fn render_board(&self) -> String {
        let mut grid = vec![vec![' '; BOARD]; BOARD];

        for station in &self.stations {
            let symbol = match station.kind {
                StationKind::Junction { tier, owner, beaconed } => {
                    let j = station.id - FIRST_JUNCTION;
                    grid[2 * (j / 5) + 1][2 * (j % 5) + 1] = if beaconed {
                        '*'
                    } else {
                        owner.map_or(tier.letter(), Team::symbol)
                    };
                    continue;
                }
                StationKind::Terminal { .. } => 'T',
                StationKind::Stack { .. } | StationKind::Substation { .. } => 'S',
            };
            for &cell in &station.cells {
                let (r, c) = row_col(cell);
                grid[2 * r][2 * c] = symbol;
            }
        }
        for r in 0..FIELD_SIZE {
            for c in 0..FIELD_SIZE {
                if grid[2 * r][2 * c] == ' ' {
                    grid[2 * r][2 * c] = '.';
                }
            }
        }
        for robot in &self.robots {
            let (r, c) = row_col(robot.cell);
            let here = &mut grid[2 * r][2 * c];
            *here = match *here {
                'R' | 'B' | 'x' => 'x',
                _ => match robot.team {
                    Team::Red => 'R',
                    Team::Blue => 'B',
                },
            };
        }

        let [red, blue] = &self.teams;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "t={:.1}s  red {}  blue {}",
            self.elapsed_ticks as f64 * TICK_SECS,
            red.score,
            blue.score
        );
        let _ = writeln!(
            out,
            "cones left: red {}  blue {}",
            self.cones_left(Team::Red),
            self.cones_left(Team::Blue)
        );
        for row in &grid {
            let line: String = row.iter().collect();
            let _ = writeln!(out, "{}", line.trim_end());
        }
        for robot in &self.robots {
            let _ = writeln!(
                out,
                "{:<6} cell {:>2} {:>4} {:<9} cone={} beacon={}{}",
                robot.id,
                robot.cell,
                robot.heading,
                robot.phase(),
                u8::from(robot.holding_cone),
                u8::from(robot.holding_beacon),
                if robot.crashed { " crashed" } else { "" }
            );
        }
        let captured: usize = self
            .teams
            .iter()
            .map(|t| t.terminals_captured.iter().filter(|c| **c).count())
            .sum();
        let _ = write!(
            out,
            "R/B robot  x crash  T terminal  S cones  G/L/M/H junction  r/b owned  * beacon  junctions claimed {}/{}  terminals captured {}",
            self.stations[FIRST_JUNCTION..SCORING_STATIONS]
                .iter()
                .filter(|s| s.owner().is_some())
                .count(),
            SCORING_STATIONS - FIRST_JUNCTION,
            captured
        );
        out
    }
}
