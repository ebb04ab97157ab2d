//! Cone stations: terminals, junctions and the cone sources.

use crate::field::{
    euclidean_distance, k_shortest_simple_paths, traversal_time, Cell, FieldGraph, Heading,
    PlannedPath, FIELD_SIZE,
};

use super::team::Team;

/// Index into the station table. Ids `0..SCORING_STATIONS` are valid actions.
pub type StationId = usize;

/// Number of stations a robot can be sent to score on (4 terminals, 25 junctions).
pub const SCORING_STATIONS: usize = 29;

/// First junction id.
pub const FIRST_JUNCTION: StationId = 4;

/// Candidate routes considered per path query.
pub const PATH_CANDIDATES: usize = 5;

/// Cones on a stack at the start of a match.
pub const STACK_CONES: u32 = 5;

/// Cones in a substation at the start of a match.
pub const SUBSTATION_CONES: u32 = 20;

/// Red cone sources in route tie-break order.
pub const RED_SOURCES: [StationId; 3] = [31, 29, 30];

/// Blue cone sources in route tie-break order.
pub const BLUE_SOURCES: [StationId; 3] = [34, 32, 33];

/// Cone sources of a team, substation first.
pub fn sources_of(team: Team) -> [StationId; 3] {
    match team {
        Team::Red => RED_SOURCES,
        Team::Blue => BLUE_SOURCES,
    }
}

/// Junction height class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JunctionTier {
    Ground,
    Low,
    Medium,
    High,
}

impl JunctionTier {
    /// Points scored by placing a cone.
    pub fn value(self) -> u32 {
        match self {
            JunctionTier::Ground => 2,
            JunctionTier::Low => 3,
            JunctionTier::Medium => 4,
            JunctionTier::High => 5,
        }
    }

    /// Seconds of adjustment needed before a cone lands, for a robot
    /// with the given cycle time.
    pub fn adjust_secs(self, cycle_secs: u32) -> u32 {
        match self {
            JunctionTier::Ground => cycle_secs / 2,
            _ => cycle_secs,
        }
    }

    pub fn letter(self) -> char {
        match self {
            JunctionTier::Ground => 'G',
            JunctionTier::Low => 'L',
            JunctionTier::Medium => 'M',
            JunctionTier::High => 'H',
        }
    }
}

/// Which of a team's two terminals (or stacks) a station is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }
}

/// What a station is and its kind-specific state.
#[derive(Debug, Clone, PartialEq)]
pub enum StationKind {
    Terminal { team: Team, slot: Slot },
    Junction {
        tier: JunctionTier,
        owner: Option<Team>,
        beaconed: bool,
    },
    Stack { team: Team, cones: u32 },
    Substation { team: Team, cones: u32 },
}

/// A location robots drive to, to place or pick up cones.
#[derive(Debug, Clone, PartialEq)]
pub struct ConeStation {
    pub id: StationId,
    /// Cells from which the station can be reached, in preference order.
    pub cells: Vec<Cell>,
    pub kind: StationKind,
}

impl ConeStation {
    pub fn is_junction(&self) -> bool {
        matches!(self.kind, StationKind::Junction { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StationKind::Terminal { .. })
    }

    pub fn is_source(&self) -> bool {
        matches!(
            self.kind,
            StationKind::Stack { .. } | StationKind::Substation { .. }
        )
    }

    /// Cones left at a source. Always zero for terminals and junctions.
    pub fn resource_count(&self) -> u32 {
        match self.kind {
            StationKind::Stack { cones, .. } | StationKind::Substation { cones, .. } => cones,
            _ => 0,
        }
    }

    /// Removes one cone from a source. Returns false if there was none.
    pub fn take_cone(&mut self) -> bool {
        match &mut self.kind {
            StationKind::Stack { cones, .. } | StationKind::Substation { cones, .. }
                if *cones > 0 =>
            {
                *cones -= 1;
                true
            }
            _ => false,
        }
    }

    /// Owning team of a junction.
    pub fn owner(&self) -> Option<Team> {
        match self.kind {
            StationKind::Junction { owner, .. } => owner,
            _ => None,
        }
    }

    pub fn is_beaconed(&self) -> bool {
        matches!(self.kind, StationKind::Junction { beaconed: true, .. })
    }

    pub fn tier(&self) -> Option<JunctionTier> {
        match self.kind {
            StationKind::Junction { tier, .. } => Some(tier),
            _ => None,
        }
    }

    /// The station cell closest to `from`; the first listed wins ties.
    pub fn nearest_cell(&self, from: Cell) -> Option<Cell> {
        let mut best: Option<(Cell, f64)> = None;
        for &cell in &self.cells {
            let d = euclidean_distance(from, cell);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((cell, d)),
            }
        }
        best.map(|(cell, _)| cell)
    }

    /// Fastest route to this station from `start` facing `heading`.
    ///
    /// The nearest station cell is the target. Only the
    /// [`PATH_CANDIDATES`] hop-shortest routes are timed, so a slightly
    /// longer route with fewer turns can be missed. Returns `None` when the
    /// station is unreachable.
    #[tracing::instrument(level = "trace", skip(self, field), fields(station = self.id))]
    pub fn closest_path_to(
        &self,
        start: Cell,
        heading: Heading,
        field: &FieldGraph,
    ) -> Option<PlannedPath> {
        let target = self.nearest_cell(start)?;
        if target == start {
            return Some(PlannedPath::empty());
        }

        let mut best: Option<PlannedPath> = None;
        for path in k_shortest_simple_paths(field, start, target, PATH_CANDIDATES) {
            let cells = path[1..].to_vec();
            let time = traversal_time(start, heading, &cells);
            if best.as_ref().map_or(true, |b| time < b.time) {
                best = Some(PlannedPath { cells, time });
            }
        }
        best
    }
}

fn junction_tier(index: usize) -> JunctionTier {
    use JunctionTier::*;
    const TIERS: [JunctionTier; 25] = [
        Ground, Low, Ground, Low, Ground, //
        Low, Medium, High, Medium, Low, //
        Ground, High, Ground, High, Ground, //
        Low, Medium, High, Medium, Low, //
        Ground, Low, Ground, Low, Ground,
    ];
    TIERS[index]
}

/// Builds the 35-station table of a fresh match.
///
/// Ids 0..=3 are terminals, 4..=28 junctions (row-major over the 5×5 grid
/// of cell corners), 29..=34 the red and blue cone sources.
pub fn standard_layout() -> Vec<ConeStation> {
    let mut stations = Vec::with_capacity(35);

    let terminals = [
        (0, Team::Red, Slot::One),
        (5, Team::Blue, Slot::One),
        (30, Team::Blue, Slot::Two),
        (35, Team::Red, Slot::Two),
    ];
    for (cell, team, slot) in terminals {
        stations.push(ConeStation {
            id: stations.len(),
            cells: vec![cell],
            kind: StationKind::Terminal { team, slot },
        });
    }

    for j in 0..25 {
        let corner = (j / 5) * FIELD_SIZE + j % 5;
        stations.push(ConeStation {
            id: FIRST_JUNCTION + j,
            cells: vec![corner, corner + 1, corner + FIELD_SIZE, corner + FIELD_SIZE + 1],
            kind: StationKind::Junction {
                tier: junction_tier(j),
                owner: None,
                beaconed: false,
            },
        });
    }

    let sources = [
        (vec![3], StationKind::Stack { team: Team::Red, cones: STACK_CONES }),
        (vec![33], StationKind::Stack { team: Team::Red, cones: STACK_CONES }),
        (vec![17, 23], StationKind::Substation { team: Team::Red, cones: SUBSTATION_CONES }),
        (vec![2], StationKind::Stack { team: Team::Blue, cones: STACK_CONES }),
        (vec![32], StationKind::Stack { team: Team::Blue, cones: STACK_CONES }),
        (vec![12, 18], StationKind::Substation { team: Team::Blue, cones: SUBSTATION_CONES }),
    ];
    for (cells, kind) in sources {
        stations.push(ConeStation {
            id: stations.len(),
            cells,
            kind,
        });
    }

    stations
}
