//! `Config`: the knobs a driver sets for the whole heuristic pipeline.
//! `CegarConfig` (per-abstraction refinement knobs) is reused verbatim from
//! `cartesian_abstractions` rather than duplicated here.

use cartesian_abstractions::CegarConfig;
use cost_saturation::Pattern;

/// Which `SubtaskGenerator` drives `AbstractionCollection::build_cartesian`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtaskKind {
    /// One subtask per goal fact, the default.
    GoalFacts,
    /// One landmark subtask per goal fact, used for the landmark pre-pass.
    Landmark,
}

/// Which abstraction family the collection is built from.
#[derive(Debug, Clone)]
pub enum AbstractionsConfig {
    /// One Cartesian abstraction per subtask, refined by CEGAR.
    Cartesian { subtask_generator: SubtaskKind },
    /// One pattern-database projection per listed pattern. No CEGAR refinement; the
    /// representation choice trades memory (`Explicit`) for recomputation (`Ranked`).
    Projections {
        patterns: Vec<Pattern>,
        representation: cost_saturation::ProjectionRepresentation,
    },
}

/// Which cost-partitioning engine combines the collection's per-abstraction goal
/// distances into a single heuristic per order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostPartitioningKind {
    Saturated,
    ZeroOne,
    /// Post-hoc optimization: one LP solved per query state against a
    /// state-independent saturated-cost profile.
    PostHoc,
    /// Optimal cost partitioning: one LP per query state over the full transition
    /// structure of every abstraction.
    Optimal,
}

/// How orders of abstractions are generated for (saturated/zero-one) cost
/// partitioning. Unused for `PostHoc`/`Optimal`, which do not consume an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderGeneratorKind {
    Random,
    Greedy,
    DynamicGreedy,
    Systematic,
}

/// The full pipeline configuration: abstraction family, cost-partitioning engine,
/// order generator, and the handful of additional knobs needed to drive them.
#[derive(Debug, Clone)]
pub struct Config {
    pub cegar: CegarConfig,
    pub abstractions: AbstractionsConfig,
    pub cost_partitioning: CostPartitioningKind,
    pub order_generator: OrderGeneratorKind,
    /// Upper bound on the number of orders evaluated (and, for `Systematic`, the
    /// number of permutations enumerated at all).
    pub max_orders: usize,
    /// Allow `-inf` saturated costs so unconstrained operators lift the remaining
    /// budget to `INF` rather than flooring at `0`.
    pub use_general_costs: bool,
    /// Take the max over a single order's per-abstraction values instead of summing
    /// them.
    pub use_max: bool,
    /// Keep only orders that improve on sampled states.
    pub diversify: bool,
    pub diversify_num_samples: usize,
    pub random_seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cegar: CegarConfig::default(),
            abstractions: AbstractionsConfig::Cartesian {
                subtask_generator: SubtaskKind::GoalFacts,
            },
            cost_partitioning: CostPartitioningKind::Saturated,
            order_generator: OrderGeneratorKind::Greedy,
            max_orders: 1,
            use_general_costs: false,
            use_max: false,
            diversify: false,
            diversify_num_samples: 100,
            random_seed: 2024,
        }
    }
}
