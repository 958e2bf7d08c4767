//! Task model and external interfaces consumed by the abstraction/heuristic core.
//!
//! This crate defines the immutable `PlanningTask` the rest of the workspace builds
//! heuristics for, the `SubtaskGenerator` interface used to derive per-abstraction
//! subtasks, and a small in-memory `ExplicitTask` used by tests and examples in place
//! of a real PDDL/SAS frontend.

pub mod explicit;
pub mod relaxed;
pub mod subtask;

pub use explicit::{ExplicitOperator, ExplicitTask};

use std::fmt;

/// Dense index of a task variable. Variables are numbered `0..num_variables()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub u32);

impl From<usize> for Var {
    fn from(v: usize) -> Self {
        Var(v as u32)
    }
}
impl From<Var> for usize {
    fn from(v: Var) -> Self {
        v.0 as usize
    }
}

/// Dense index of an operator. Operators are numbered `0..num_operators()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId(pub u32);

impl From<usize> for OpId {
    fn from(v: usize) -> Self {
        OpId(v as u32)
    }
}
impl From<OpId> for usize {
    fn from(v: OpId) -> Self {
        v.0 as usize
    }
}

/// A fact `(v, x)`: variable `v` takes value `x` in its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fact {
    pub var: Var,
    pub value: i32,
}

impl Fact {
    pub fn new(var: Var, value: i32) -> Self {
        Fact { var, value }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v{}={})", self.var.0, self.value)
    }
}

/// A partial assignment: facts sorted by variable, with at most one fact per variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialState {
    facts: Vec<Fact>,
}

impl PartialState {
    pub fn new(mut facts: Vec<Fact>) -> Self {
        facts.sort_by_key(|f| f.var);
        debug_assert!(
            facts.windows(2).all(|w| w[0].var != w[1].var),
            "partial state has duplicate variables"
        );
        PartialState { facts }
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn value_of(&self, var: Var) -> Option<i32> {
        self.facts
            .binary_search_by_key(&var, |f| f.var)
            .ok()
            .map(|idx| self.facts[idx].value)
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Sentinel returned by a heuristic when a state is dead (provably unreachable from
/// the goal, or the goal is unreachable from it).
pub const DEAD_END: i64 = i64::MAX;

/// Upper bound used internally wherever an "unreachable" 32-bit cost is needed.
pub const INF: i32 = i32::MAX;

/// Immutable view of a fixed-domain classical planning task, as consumed by the
/// abstraction/heuristic core.
///
/// Implementations must guarantee: no conditional effects, no axioms, non-negative
/// operator costs, and that `preconditions`/`effects` return fact lists sorted by
/// variable with unique variables (same invariant as `PartialState`).
pub trait PlanningTask {
    fn num_variables(&self) -> usize;
    fn domain_size(&self, var: Var) -> usize;

    fn num_operators(&self) -> usize;
    fn operator_cost(&self, op: OpId) -> i32;
    fn operator_name(&self, op: OpId) -> &str;
    fn preconditions(&self, op: OpId) -> &[Fact];
    fn effects(&self, op: OpId) -> &[Fact];

    fn initial_state(&self) -> &[i32];
    fn goal(&self) -> &[Fact];

    fn has_zero_cost_operators(&self) -> bool {
        (0..self.num_operators()).any(|o| self.operator_cost(OpId::from(o)) == 0)
    }

    /// True for tasks produced by a `SubtaskGenerator::landmark` step: a single goal
    /// fact whose achievement is being decomposed.
    fn is_landmark_subtask(&self) -> bool {
        false
    }

    /// Maps a state of an ancestor task (e.g. the original task) down into this task's
    /// variables/values. Identity for tasks that don't rename or drop variables.
    fn convert_ancestor_state(&self, ancestor_values: &[i32]) -> Vec<i32> {
        ancestor_values.to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    SearchInputError,
    SearchUnsupported,
    SearchCriticalError,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<&TaskError> for ExitCode {
    fn from(e: &TaskError) -> Self {
        match e {
            TaskError::UnsupportedFeature(_) => ExitCode::SearchUnsupported,
            TaskError::InvalidConfiguration(_) => ExitCode::SearchInputError,
        }
    }
}

/// Applies `op`'s effects to `state` (a full assignment indexed by variable).
/// Panics if `op` is not applicable; callers must check `is_applicable` first.
pub fn apply_effects(task: &dyn PlanningTask, state: &[i32], op: OpId) -> Vec<i32> {
    let mut successor = state.to_vec();
    for fact in task.effects(op) {
        successor[usize::from(fact.var)] = fact.value;
    }
    successor
}

pub fn is_applicable(task: &dyn PlanningTask, state: &[i32], op: OpId) -> bool {
    task.preconditions(op)
        .iter()
        .all(|fact| state[usize::from(fact.var)] == fact.value)
}

pub fn is_goal_state(task: &dyn PlanningTask, state: &[i32]) -> bool {
    task.goal()
        .iter()
        .all(|fact| state[usize::from(fact.var)] == fact.value)
}
