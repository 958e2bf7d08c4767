//! Zero-one cost partitioning: a coarser, non-saturated alternative to SCP. Each
//! abstraction in the order gets the *full* remaining cost of every operator it uses,
//! then those operators' remaining cost drops to zero for the rest of the order.
//!
//! Grounded on the zero-one cost-partitioning generator of cost-saturation heuristic
//! frameworks.

use crate::abstraction_collection::AbstractionCollection;
use crate::cost_partitioning_heuristic::CostPartitioningHeuristic;
use fixedbitset::FixedBitSet;

pub fn zero_one_cost_partitioning(collection: &AbstractionCollection, order: &[usize]) -> CostPartitioningHeuristic {
    let mut remaining = collection.operator_costs().to_vec();
    let mut cp = CostPartitioningHeuristic::new();
    for &index in order {
        let abstraction = collection.get(index);
        let h = abstraction.compute_goal_distances(&remaining);
        let mut used = FixedBitSet::with_capacity(remaining.len());
        abstraction.for_each_transition(&mut |t| {
            used.insert(usize::from(t.op));
        });
        for op in used.ones() {
            remaining[op] = 0;
        }
        cp.add_h_values(index, h);
    }
    cp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Pattern, Projection, ProjectionRepresentation};
    use cegar_task::explicit::{ExplicitOperator, ExplicitTask};
    use cegar_task::{Fact, Var};

    #[test]
    fn operator_shared_by_two_abstractions_is_only_paid_for_once() {
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![ExplicitOperator::new(
                "both",
                3,
                vec![],
                vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            )],
        )
        .unwrap();
        let p0 = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let p1 = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(p0), Box::new(p1)], vec![3]);
        let cp = zero_one_cost_partitioning(&collection, &[0, 1]);
        // the first abstraction in the order consumes the shared operator's full cost;
        // the second abstraction sees it at cost 0 and so contributes nothing further.
        assert_eq!(cp.compute_heuristic(&[0, 0]), 3);
    }
}
