//! Hop-shortest simple path enumeration and turn-aware traversal costing.
//!
//! Candidate routes come from Yen's algorithm over the unit-weight grid;
//! each spur search is an A* run on an edge-filtered view of the field.
//! Routes are then re-ranked by [`traversal_time`], which charges extra for
//! every change of heading.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use petgraph::algo::astar;
use petgraph::graph::{EdgeReference, NodeIndex};
use petgraph::visit::{EdgeFiltered, EdgeRef};

use super::{manhattan_distance, Cell, FieldGraph, Heading};

/// Seconds to drive one cell straight ahead.
pub const MOVE_COST: f64 = 0.5;

/// Seconds to turn toward a new direction and drive one cell.
pub const TURN_AND_MOVE_COST: f64 = 1.0;

/// A route a robot can follow, with its simulated driving time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPath {
    /// Cells to visit in order, excluding the start cell.
    pub cells: Vec<Cell>,
    /// Simulated traversal time in seconds.
    pub time: f64,
}

impl PlannedPath {
    pub fn empty() -> Self {
        Self {
            cells: Vec::new(),
            time: 0.0,
        }
    }
}

/// Simulated time to drive `path` (excluding `start`) from `start` facing `heading`.
///
/// A step in the current heading costs [`MOVE_COST`]; any other step costs
/// [`TURN_AND_MOVE_COST`] and the heading becomes the direction of travel.
pub fn traversal_time(start: Cell, heading: Heading, path: &[Cell]) -> f64 {
    let mut time = 0.0;
    let mut heading = heading;
    let mut last = start;
    for &next in path {
        match Heading::between(last, next) {
            Some(dir) if dir == heading => time += MOVE_COST,
            Some(dir) => {
                time += TURN_AND_MOVE_COST;
                heading = dir;
            }
            None => time += TURN_AND_MOVE_COST,
        }
        last = next;
    }
    time
}

/// Up to `k` loopless paths from `source` to `target`, shortest hop count first.
///
/// Each path includes both endpoints. Equal-length candidates keep the order
/// in which they were discovered. `source == target` yields the single
/// one-cell path.
pub fn k_shortest_simple_paths(
    field: &FieldGraph,
    source: Cell,
    target: Cell,
    k: usize,
) -> Vec<Vec<Cell>> {
    if k == 0 || !field.contains(source) || !field.contains(target) {
        return Vec::new();
    }
    if source == target {
        return vec![vec![source]];
    }

    let no_nodes = HashSet::new();
    let no_edges = HashSet::new();
    let Some(first) = shortest_path_avoiding(field, source, target, &no_nodes, &no_edges) else {
        return Vec::new();
    };

    let mut accepted = vec![first.clone()];
    let mut seen: HashSet<Vec<Cell>> = HashSet::from([first]);
    let mut candidates: BinaryHeap<Reverse<(usize, u64, Vec<Cell>)>> = BinaryHeap::new();
    let mut discovered = 0u64;

    while accepted.len() < k {
        let last = accepted[accepted.len() - 1].clone();
        for i in 0..last.len() - 1 {
            let spur = last[i];
            let root = &last[..=i];

            let mut blocked_edges = HashSet::new();
            for path in &accepted {
                if path.len() > i + 1 && &path[..=i] == root {
                    blocked_edges.insert(edge_key(path[i], path[i + 1]));
                }
            }
            let blocked_nodes: HashSet<Cell> = root[..i].iter().copied().collect();

            if let Some(spur_path) =
                shortest_path_avoiding(field, spur, target, &blocked_nodes, &blocked_edges)
            {
                let mut candidate = root[..i].to_vec();
                candidate.extend(spur_path);
                if seen.insert(candidate.clone()) {
                    candidates.push(Reverse((candidate.len(), discovered, candidate)));
                    discovered += 1;
                }
            }
        }

        match candidates.pop() {
            Some(Reverse((_, _, path))) => accepted.push(path),
            None => break,
        }
    }

    accepted
}

fn edge_key(a: Cell, b: Cell) -> (Cell, Cell) {
    (a.min(b), a.max(b))
}

fn shortest_path_avoiding(
    field: &FieldGraph,
    from: Cell,
    to: Cell,
    blocked_nodes: &HashSet<Cell>,
    blocked_edges: &HashSet<(Cell, Cell)>,
) -> Option<Vec<Cell>> {
    let filtered = EdgeFiltered::from_fn(field.inner(), |edge: EdgeReference<'_, ()>| {
        let (a, b) = (edge.source().index(), edge.target().index());
        !blocked_nodes.contains(&a)
            && !blocked_nodes.contains(&b)
            && !blocked_edges.contains(&edge_key(a, b))
    });
    let goal = NodeIndex::new(to);
    let (_, nodes) = astar(
        &filtered,
        NodeIndex::new(from),
        |n| n == goal,
        |_| 1u32,
        |n| manhattan_distance(n.index(), to) as u32,
    )?;
    Some(nodes.into_iter().map(|n| n.index()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_simple_walk(field: &FieldGraph, path: &[Cell]) -> bool {
        let unique: HashSet<_> = path.iter().collect();
        unique.len() == path.len() && path.windows(2).all(|w| field.are_adjacent(w[0], w[1]))
    }

    #[test]
    fn same_cell_yields_single_trivial_path() {
        let field = FieldGraph::grid();
        assert_eq!(k_shortest_simple_paths(&field, 14, 14, 5), vec![vec![14]]);
    }

    #[test]
    fn straight_line_has_unique_shortest_path() {
        let field = FieldGraph::grid();
        let paths = k_shortest_simple_paths(&field, 0, 3, 5);
        assert_eq!(paths[0], vec![0, 1, 2, 3]);
        // Bipartite grid: the detours are two hops longer.
        assert!(paths[1..].iter().all(|p| p.len() == 6));
    }

    #[test]
    fn paths_are_simple_distinct_and_sorted() {
        let field = FieldGraph::grid();
        let paths = k_shortest_simple_paths(&field, 0, 35, 5);
        assert_eq!(paths.len(), 5);
        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 5);
        for path in &paths {
            assert_eq!(path.first(), Some(&0));
            assert_eq!(path.last(), Some(&35));
            assert!(is_simple_walk(&field, path));
        }
        assert!(paths.windows(2).all(|w| w[0].len() <= w[1].len()));
        assert_eq!(paths[0].len(), 11);
    }

    #[test]
    fn enumeration_is_deterministic() {
        let field = FieldGraph::grid();
        let a = k_shortest_simple_paths(&field, 7, 28, 5);
        let b = k_shortest_simple_paths(&field, 7, 28, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn k_zero_and_out_of_field() {
        let field = FieldGraph::grid();
        assert!(k_shortest_simple_paths(&field, 0, 5, 0).is_empty());
        assert!(k_shortest_simple_paths(&field, 0, 99, 5).is_empty());
    }

    #[test]
    fn traversal_time_charges_turns() {
        // Facing east: two straight moves.
        assert_eq!(traversal_time(0, Heading::East, &[1, 2]), 1.0);
        // Facing north: turn east, then straight.
        assert_eq!(traversal_time(0, Heading::North, &[1, 2]), 1.5);
        // East, then turn south.
        assert_eq!(traversal_time(0, Heading::East, &[1, 7]), 1.5);
        assert_eq!(traversal_time(0, Heading::East, &[]), 0.0);
    }
}
