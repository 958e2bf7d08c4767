//! A `Transition` is an edge `(op_id, target_state_id)` in the abstract transition
//! graph. Self-loops are tracked separately from non-loop transitions.

use crate::ids::StateId;
use cegar_task::OpId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub op: OpId,
    pub target: StateId,
}

impl Transition {
    pub fn new(op: OpId, target: StateId) -> Self {
        Transition { op, target }
    }
}
