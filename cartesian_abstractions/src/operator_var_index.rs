//! Per-operator, per-variable precondition/postcondition lookup table, built once from
//! the task and consulted on every split.
//!
//! Grounded on the `get_preconditions_by_operator`/`get_postconditions_by_operator`
//! tables a transition rewirer builds once and reuses across every split.

use crate::transition_system::VarProjection;
use cegar_task::{ExplicitTask, OpId, PlanningTask};
use std::collections::HashMap;

pub struct OperatorVarIndex {
    preconditions: Vec<HashMap<usize, i32>>,
    postconditions: Vec<HashMap<usize, i32>>,
}

impl OperatorVarIndex {
    pub fn build(task: &ExplicitTask) -> Self {
        let mut preconditions = vec![HashMap::new(); task.num_operators()];
        let mut postconditions = vec![HashMap::new(); task.num_operators()];
        for idx in 0..task.num_operators() {
            let op = OpId::from(idx);
            for fact in task.preconditions(op) {
                preconditions[idx].insert(usize::from(fact.var), fact.value);
                postconditions[idx].entry(usize::from(fact.var)).or_insert(fact.value);
            }
            for fact in task.effects(op) {
                postconditions[idx].insert(usize::from(fact.var), fact.value);
            }
        }
        OperatorVarIndex { preconditions, postconditions }
    }
}

impl VarProjection for OperatorVarIndex {
    fn precondition_value(&self, op: OpId, var: usize) -> Option<i32> {
        self.preconditions[usize::from(op)].get(&var).copied()
    }

    fn postcondition_value(&self, op: OpId, var: usize) -> Option<i32> {
        self.postconditions[usize::from(op)].get(&var).copied()
    }
}
