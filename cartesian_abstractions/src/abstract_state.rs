//! `AbstractState`: a handle pairing a state id with a node id in the refinement
//! hierarchy and the Cartesian set it denotes.

use crate::cartesian_set::CartesianSet;
use crate::ids::{NodeId, StateId};
use cegar_task::Fact;

/// A current abstract state. The Cartesian set itself is owned by the `Abstraction`
/// (indexed by `node_id`) rather than duplicated here; use
/// `Abstraction::state_view` to get a bundled `(id, node_id, &CartesianSet)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbstractState {
    pub id: StateId,
    pub node_id: NodeId,
}

/// A borrowed bundle pairing a state's id, node id, and Cartesian set.
#[derive(Debug, Clone, Copy)]
pub struct AbstractStateView<'a> {
    pub id: StateId,
    pub node_id: NodeId,
    pub cset: &'a CartesianSet,
}

impl<'a> AbstractStateView<'a> {
    pub fn includes_facts(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|f| self.cset.test(usize::from(f.var), f.value))
    }

    pub fn includes_state(&self, values: &[i32]) -> bool {
        (0..self.cset.num_variables()).all(|v| self.cset.test(v, values[v]))
    }

    pub fn domain_subsets_intersect(&self, other: &AbstractStateView, var: usize) -> bool {
        self.cset.intersects_domain(other.cset, var)
    }
}
