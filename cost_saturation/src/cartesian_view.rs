//! Adapts a built Cartesian `Abstraction` (from `cartesian_abstractions`) to the
//! `AbstractionLike` capability surface cost partitioning operates on.

use crate::abstraction_like::{AbstractionLike, Transition};
use cartesian_abstractions::Abstraction;
use cegar_task::PlanningTask;
use fixedbitset::FixedBitSet;

/// A finished Cartesian abstraction plus everything cost partitioning needs that isn't
/// already on `Abstraction` itself: the list of goal state ids and the looping-operator
/// bitset, both computed once after CEGAR hands the abstraction over.
pub struct CartesianAbstractionView {
    abstraction: Abstraction,
    goal_states: Vec<usize>,
    looping_operators: FixedBitSet,
    /// The task the abstraction was built for, needed to resolve a concrete state of
    /// that subtask down to an abstract state id. Evaluating heuristics against the
    /// *original* task first goes through `PlanningTask::convert_ancestor_state`.
    num_operators: usize,
}

impl CartesianAbstractionView {
    pub fn new(abstraction: Abstraction, task: &dyn PlanningTask) -> Self {
        let goal_states: Vec<usize> = abstraction
            .state_ids()
            .iter()
            .map(|&s| usize::from(s))
            .filter(|&s| abstraction.is_goal(s.into()))
            .collect();
        let looping_operators = abstraction.looping_operators();
        let num_operators = task.num_operators();
        CartesianAbstractionView {
            abstraction,
            goal_states,
            looping_operators,
            num_operators,
        }
    }
}

impl AbstractionLike for CartesianAbstractionView {
    fn num_states(&self) -> usize {
        self.abstraction.num_states()
    }

    fn num_operators(&self) -> usize {
        self.num_operators
    }

    fn goal_states(&self) -> &[usize] {
        &self.goal_states
    }

    fn abstract_state_id(&self, state: &[i32]) -> usize {
        usize::from(self.abstraction.resolve_state(state))
    }

    fn for_each_transition(&self, callback: &mut dyn FnMut(Transition)) {
        for &state in self.abstraction.state_ids() {
            for t in self.abstraction.outgoing(state) {
                callback(Transition {
                    src: usize::from(state),
                    op: t.op,
                    target: usize::from(t.target),
                });
            }
        }
    }

    fn looping_operators(&self) -> &FixedBitSet {
        &self.looping_operators
    }
}
