//! Circuit detection: a chain of owned junctions linking a team's terminals.

use std::collections::{HashSet, VecDeque};

use super::config::CircuitRule;
use super::station::{ConeStation, StationId, FIRST_JUNCTION};
use super::team::Team;

const JUNCTION_GRID: i32 = 5;

/// Junctions next to the team's first terminal, where the chain starts.
fn seeds(team: Team) -> [StationId; 3] {
    match team {
        Team::Red => [4, 5, 9],
        Team::Blue => [7, 8, 13],
    }
}

/// Junctions next to the team's second terminal, where the chain ends.
fn goals(team: Team) -> [StationId; 3] {
    match team {
        Team::Red => [23, 27, 28],
        Team::Blue => [19, 24, 25],
    }
}

/// The eight junctions surrounding `id` on the 5×5 junction grid.
fn junction_neighbors(id: StationId) -> impl Iterator<Item = StationId> {
    let index = (id - FIRST_JUNCTION) as i32;
    let (row, col) = (index / JUNCTION_GRID, index % JUNCTION_GRID);
    (-1..=1)
        .flat_map(move |dr| (-1..=1).map(move |dc| (row + dr, col + dc)))
        .filter(move |&(r, c)| {
            (r, c) != (row, col) && (0..JUNCTION_GRID).contains(&r) && (0..JUNCTION_GRID).contains(&c)
        })
        .map(|(r, c)| FIRST_JUNCTION + (r * JUNCTION_GRID + c) as usize)
}

/// Whether `team` has completed a circuit.
///
/// Both of the team's terminals must be captured, and a chain of junctions
/// owned by the team (8-connected) must join a seed junction to a goal
/// junction. Beacons do not matter.
pub fn has_circuit(
    stations: &[ConeStation],
    captured: [bool; 2],
    team: Team,
    rule: CircuitRule,
) -> bool {
    if !(captured[0] && captured[1]) {
        return false;
    }
    if team == Team::Blue && rule == CircuitRule::LegacyBlueSentinel {
        return false;
    }

    let owned = |id: StationId| stations.get(id).and_then(ConeStation::owner) == Some(team);
    let goals = goals(team);
    let mut worklist: VecDeque<StationId> = seeds(team).into_iter().collect();
    let mut visited = HashSet::new();

    while let Some(id) = worklist.pop_front() {
        if !visited.insert(id) || !owned(id) {
            continue;
        }
        if goals.contains(&id) {
            return true;
        }
        worklist.extend(junction_neighbors(id).filter(|n| !visited.contains(n)));
    }
    false
}
