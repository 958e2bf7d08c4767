//! Top-level admissible heuristic: wires `task`, `cartesian_abstractions`, and
//! `cost_saturation` into one pipeline -- build one abstraction per subtask (or one
//! projection per pattern), compute one or more cost partitionings over the resulting
//! collection, and evaluate concrete states as the max over cost partitionings of the
//! sum of per-abstraction values.
//!
//! Grounded on the wiring performed by a Cartesian-abstraction heuristic constructor
//! in a Fast Downward-family classical planner.

pub mod config;
pub mod evaluator;

pub use config::{AbstractionsConfig, Config, CostPartitioningKind, OrderGeneratorKind, SubtaskKind};
pub use evaluator::{build, Heuristic, OptimalHeuristic, PostHocHeuristic, TableHeuristic};
