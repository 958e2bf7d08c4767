//! A small in-memory `PlanningTask` used by tests, examples, and the subtask
//! generators. Stands in for a real PDDL/SAS frontend, which is out of scope.

use crate::{Fact, OpId, PlanningTask, TaskError, Var};

#[derive(Debug, Clone)]
pub struct ExplicitOperator {
    pub name: String,
    pub cost: i32,
    pub preconditions: Vec<Fact>,
    pub effects: Vec<Fact>,
}

impl ExplicitOperator {
    pub fn new(name: impl Into<String>, cost: i32, mut pre: Vec<Fact>, mut eff: Vec<Fact>) -> Self {
        pre.sort_by_key(|f| f.var);
        eff.sort_by_key(|f| f.var);
        ExplicitOperator {
            name: name.into(),
            cost,
            preconditions: pre,
            effects: eff,
        }
    }
}

/// A fully materialized classical planning task.
#[derive(Debug, Clone)]
pub struct ExplicitTask {
    domain_sizes: Vec<usize>,
    operators: Vec<ExplicitOperator>,
    initial_state: Vec<i32>,
    goal: Vec<Fact>,
    is_landmark_subtask: bool,
}

impl ExplicitTask {
    pub fn new(
        domain_sizes: Vec<usize>,
        initial_state: Vec<i32>,
        mut goal: Vec<Fact>,
        operators: Vec<ExplicitOperator>,
    ) -> Result<Self, TaskError> {
        if domain_sizes.len() != initial_state.len() {
            return Err(TaskError::InvalidConfiguration(
                "initial state length does not match number of variables".into(),
            ));
        }
        for (var, &value) in initial_state.iter().enumerate() {
            if value < 0 || value as usize >= domain_sizes[var] {
                return Err(TaskError::InvalidConfiguration(format!(
                    "initial value of variable {var} out of domain"
                )));
            }
        }
        for op in &operators {
            if op.cost < 0 {
                return Err(TaskError::InvalidConfiguration(format!(
                    "operator {} has negative cost",
                    op.name
                )));
            }
        }
        goal.sort_by_key(|f| f.var);
        Ok(ExplicitTask {
            domain_sizes,
            operators,
            initial_state,
            goal,
            is_landmark_subtask: false,
        })
    }

    /// Builds a landmark subtask isolating the achievement of a single goal fact,
    /// same variables and operators, cost function
    /// untouched, goal replaced by the single fact.
    pub fn as_landmark_subtask(&self, landmark: Fact) -> ExplicitTask {
        let mut t = self.clone();
        t.goal = vec![landmark];
        t.is_landmark_subtask = true;
        t
    }

    /// Builds a goal-facts subtask: same task with the goal restricted to a subset of
    /// the original goal's facts (the common case driving per-abstraction CEGAR runs).
    pub fn with_goal(&self, goal: Vec<Fact>) -> ExplicitTask {
        let mut t = self.clone();
        let mut goal = goal;
        goal.sort_by_key(|f| f.var);
        t.goal = goal;
        t.is_landmark_subtask = false;
        t
    }

    pub fn operator(&self, op: OpId) -> &ExplicitOperator {
        &self.operators[usize::from(op)]
    }
}

impl PlanningTask for ExplicitTask {
    fn num_variables(&self) -> usize {
        self.domain_sizes.len()
    }

    fn domain_size(&self, var: Var) -> usize {
        self.domain_sizes[usize::from(var)]
    }

    fn num_operators(&self) -> usize {
        self.operators.len()
    }

    fn operator_cost(&self, op: OpId) -> i32 {
        self.operators[usize::from(op)].cost
    }

    fn operator_name(&self, op: OpId) -> &str {
        &self.operators[usize::from(op)].name
    }

    fn preconditions(&self, op: OpId) -> &[Fact] {
        &self.operators[usize::from(op)].preconditions
    }

    fn effects(&self, op: OpId) -> &[Fact] {
        &self.operators[usize::from(op)].effects
    }

    fn initial_state(&self) -> &[i32] {
        &self.initial_state
    }

    fn goal(&self) -> &[Fact] {
        &self.goal
    }

    fn is_landmark_subtask(&self) -> bool {
        self.is_landmark_subtask
    }
}
