//! Saturated and optimal cost partitioning over a collection of abstractions
//! (Cartesian abstractions or pattern-database projections): the admissible-heuristic
//! combination layer sitting above `cartesian_abstractions` and `task`.
//!
//! Grounded on the cost-saturation machinery of classical-planning heuristic
//! frameworks built on abstraction collections.

pub mod abstraction_collection;
pub mod abstraction_like;
pub mod cartesian_view;
pub mod cost_partitioning_heuristic;
pub mod diversifier;
pub mod error;
pub mod lp;
pub mod optimal;
pub mod order_generator;
pub mod post_hoc;
pub mod projection;
pub mod saturated;
pub mod unsolvability;
pub mod zero_one;

pub use abstraction_collection::AbstractionCollection;
pub use abstraction_like::AbstractionLike;
pub use cartesian_view::CartesianAbstractionView;
pub use cost_partitioning_heuristic::CostPartitioningHeuristic;
pub use error::CostSaturationError;
pub use projection::{Pattern, Projection, ProjectionRepresentation};
