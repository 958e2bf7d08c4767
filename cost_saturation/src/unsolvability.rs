//! `UnsolvabilityHeuristic`: a per-abstraction bitset of abstract states with no path
//! to any goal state, checked before summing any cost-partitioning table.
//!
//! Grounded on the unsolvability short-circuit a max-cost-partitioning heuristic runs
//! ahead of its per-order max-over-sums loop.

use crate::abstraction_collection::AbstractionCollection;
use cegar_task::INF;
use fixedbitset::FixedBitSet;

pub struct UnsolvabilityHeuristic {
    unsolvable: Vec<FixedBitSet>,
}

impl UnsolvabilityHeuristic {
    /// Computes goal distances under the original (unpartitioned) operator costs for
    /// every abstraction in `collection` and records which states are unreachable.
    pub fn build(collection: &AbstractionCollection) -> Self {
        let costs = collection.operator_costs();
        let unsolvable = collection
            .iter()
            .map(|abstraction| {
                let distances = abstraction.compute_goal_distances(costs);
                let mut bits = FixedBitSet::with_capacity(abstraction.num_states());
                for (state, &d) in distances.iter().enumerate() {
                    if d == INF {
                        bits.insert(state);
                    }
                }
                bits
            })
            .collect();
        UnsolvabilityHeuristic { unsolvable }
    }

    /// True if any abstraction's bitset flags the state (given as per-abstraction local
    /// ids, in collection order) as unsolvable.
    pub fn is_unsolvable(&self, local_state_ids: &[usize]) -> bool {
        self.unsolvable
            .iter()
            .zip(local_state_ids)
            .any(|(bits, &local_id)| bits.contains(local_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Pattern, Projection, ProjectionRepresentation};
    use cegar_task::explicit::ExplicitTask;
    use cegar_task::{Fact, Var};

    #[test]
    fn unreachable_goal_value_is_flagged_unsolvable() {
        let task = ExplicitTask::new(
            vec![2],
            vec![0],
            vec![Fact::new(Var(0), 1)],
            vec![], // no operators: value 1 is never reachable from 0
        )
        .unwrap();
        let proj = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(proj)], vec![]);
        let unsolvability = UnsolvabilityHeuristic::build(&collection);
        assert!(unsolvability.is_unsolvable(&[0]));
        assert!(!unsolvability.is_unsolvable(&[1]));
    }
}
