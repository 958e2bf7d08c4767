//! Cartesian abstractions refined by counterexample-guided abstraction refinement
//! (CEGAR): the mutable, splittable abstraction type, its incremental shortest-path
//! maintenance, and the flaw search / split selection that drives refinement.
//!
//! Grounded on the Cartesian-abstraction machinery of CEGAR-based classical-planning
//! heuristics.

pub mod abstract_state;
pub mod abstraction;
pub mod cartesian_set;
pub mod cegar;
pub mod config;
pub mod dot;
pub mod flaw_search;
pub mod ids;
pub mod match_tree;
pub mod operator_var_index;
pub mod refinement_hierarchy;
pub mod resource;
pub mod shortest_paths;
pub mod split_selector;
pub mod transition;
pub mod transition_system;

pub use abstraction::{Abstraction, OracleStrategy};
pub use cegar::Cegar;
pub use config::CegarConfig;
pub use dot::to_dot;
pub use resource::StopReason;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AbstractionError {
    #[error("projection or abstraction size exceeds 32-bit range")]
    Overflow,
}
