//! The playing field: a fixed 6×6 grid of cells robots drive across.
//!
//! Cells are numbered row-major from the top-left corner. Moving east adds
//! one, moving south adds [`FIELD_SIZE`]. The 4-connected adjacency graph is
//! stored in a petgraph [`UnGraph`] whose node indices equal cell numbers.

pub mod paths;

use std::fmt;

use petgraph::graph::{NodeIndex, UnGraph};

pub use paths::{k_shortest_simple_paths, traversal_time, PlannedPath};

/// Number of cells along each side of the field.
pub const FIELD_SIZE: usize = 6;

/// Total number of cells on the field.
pub const CELL_COUNT: usize = FIELD_SIZE * FIELD_SIZE;

/// Index of a field cell (row-major).
pub type Cell = usize;

/// Returns `(row, col)` of a cell.
pub fn row_col(cell: Cell) -> (usize, usize) {
    (cell / FIELD_SIZE, cell % FIELD_SIZE)
}

/// Euclidean distance between two cells in grid units.
pub fn euclidean_distance(a: Cell, b: Cell) -> f64 {
    let (ar, ac) = row_col(a);
    let (br, bc) = row_col(b);
    let dr = ar as f64 - br as f64;
    let dc = ac as f64 - bc as f64;
    (dr * dr + dc * dc).sqrt()
}

/// Manhattan distance between two cells in grid units.
pub fn manhattan_distance(a: Cell, b: Cell) -> usize {
    let (ar, ac) = row_col(a);
    let (br, bc) = row_col(b);
    ar.abs_diff(br) + ac.abs_diff(bc)
}

/// Direction a robot faces, in the field's 90° compass.
///
/// Degrees follow the field convention: 0 = east (+1 cell), 90 = north
/// (−6), 180 = west (−1), 270 = south (+6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Heading {
    East,
    North,
    West,
    South,
}

impl Heading {
    /// All headings in increasing degree order.
    pub fn all() -> [Heading; 4] {
        [Heading::East, Heading::North, Heading::West, Heading::South]
    }

    pub fn degrees(self) -> u16 {
        match self {
            Heading::East => 0,
            Heading::North => 90,
            Heading::West => 180,
            Heading::South => 270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Heading::East),
            90 => Some(Heading::North),
            180 => Some(Heading::West),
            270 => Some(Heading::South),
            _ => None,
        }
    }

    /// Number of quarter turns counter-clockwise from east (0..=3).
    pub fn quarter_turns(self) -> u8 {
        (self.degrees() / 90) as u8
    }

    /// The neighbouring cell one step this way, if it is on the field.
    pub fn next_cell(self, cell: Cell) -> Option<Cell> {
        let (r, c) = row_col(cell);
        match self {
            Heading::East if c + 1 < FIELD_SIZE => Some(cell + 1),
            Heading::North if r > 0 => Some(cell - FIELD_SIZE),
            Heading::West if c > 0 => Some(cell - 1),
            Heading::South if r + 1 < FIELD_SIZE => Some(cell + FIELD_SIZE),
            _ => None,
        }
    }

    /// Direction of travel from `from` to an adjacent cell `to`.
    ///
    /// Returns `None` when the cells are not 4-neighbours.
    pub fn between(from: Cell, to: Cell) -> Option<Heading> {
        let (fr, fc) = row_col(from);
        let (tr, tc) = row_col(to);
        match (tr as isize - fr as isize, tc as isize - fc as isize) {
            (0, 1) => Some(Heading::East),
            (-1, 0) => Some(Heading::North),
            (0, -1) => Some(Heading::West),
            (1, 0) => Some(Heading::South),
            _ => None,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Static 4-connected adjacency graph over the field cells.
#[derive(Debug, Clone)]
pub struct FieldGraph {
    graph: UnGraph<Cell, ()>,
}

impl Default for FieldGraph {
    fn default() -> Self {
        Self::grid()
    }
}

impl FieldGraph {
    /// Builds the standard 6×6 grid.
    pub fn grid() -> Self {
        let mut graph = UnGraph::with_capacity(CELL_COUNT, 2 * FIELD_SIZE * (FIELD_SIZE - 1));
        for cell in 0..CELL_COUNT {
            graph.add_node(cell);
        }
        for cell in 0..CELL_COUNT {
            let (row, col) = row_col(cell);
            if row + 1 < FIELD_SIZE {
                graph.add_edge(NodeIndex::new(cell), NodeIndex::new(cell + FIELD_SIZE), ());
            }
            if col + 1 < FIELD_SIZE {
                graph.add_edge(NodeIndex::new(cell), NodeIndex::new(cell + 1), ());
            }
        }
        Self { graph }
    }

    pub fn cell_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell < self.graph.node_count()
    }

    pub fn are_adjacent(&self, a: Cell, b: Cell) -> bool {
        self.contains(a)
            && self.contains(b)
            && self
                .graph
                .find_edge(NodeIndex::new(a), NodeIndex::new(b))
                .is_some()
    }

    /// Neighbouring cells in ascending order.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        if !self.contains(cell) {
            return Vec::new();
        }
        let mut out: Vec<Cell> = self
            .graph
            .neighbors(NodeIndex::new(cell))
            .map(|n| n.index())
            .collect();
        out.sort_unstable();
        out
    }

    pub(crate) fn inner(&self) -> &UnGraph<Cell, ()> {
        &self.graph
    }
}
