//! Policy trait and baseline implementations for Powerplay.

pub mod heuristic;
pub mod random;
pub mod trait_;

pub use heuristic::GreedyJunctionPolicy;
pub use random::RandomPolicy;
pub use trait_::Policy;
