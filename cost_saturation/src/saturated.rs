//! Saturated cost partitioning (SCP): consumes cost "just enough" from a shared
//! operator-cost budget, one abstraction at a time, in a caller-supplied order.
//!
//! Grounded on the `reduce_costs` remaining-cost update rule common to saturated
//! cost-partitioning generators (including the `-inf`-lifts-to-`INF` and floor-at-0
//! cases) and the per-order loop that drives it.

use crate::abstraction_collection::AbstractionCollection;
use crate::abstraction_like::SATURATED_NEG_INF;
use crate::cost_partitioning_heuristic::CostPartitioningHeuristic;
use cegar_task::INF;

/// `remaining[op] -= saturated[op]`, saturating at 0; `INF` stays `INF`; an operator
/// whose saturated cost is `−∞` (the abstraction uses none of it, not even 0) lifts
/// `remaining[op]` to `INF` so later abstractions in the order see it as unconstrained.
pub(crate) fn reduce_costs(remaining: &mut [i32], saturated: &[i64]) {
    for (r, &s) in remaining.iter_mut().zip(saturated.iter()) {
        if *r == INF {
            continue;
        }
        if s <= SATURATED_NEG_INF {
            *r = INF;
            continue;
        }
        let updated = *r as i64 - s;
        *r = if updated <= 0 {
            0
        } else if updated >= INF as i64 {
            INF
        } else {
            updated as i32
        };
    }
}

/// Runs one saturated cost partitioning over `collection`'s abstractions in `order`
/// (indices into the collection), starting from the collection's original operator
/// costs. `use_general_costs` allows abstractions to report `−∞` saturated costs for
/// operators they never need (otherwise saturated costs are floored at `0`).
pub fn saturated_cost_partitioning(
    collection: &AbstractionCollection,
    order: &[usize],
    use_general_costs: bool,
) -> CostPartitioningHeuristic {
    let mut remaining = collection.operator_costs().to_vec();
    let mut cp = CostPartitioningHeuristic::new();
    for &index in order {
        let abstraction = collection.get(index);
        let h = abstraction.compute_goal_distances(&remaining);
        let saturated = abstraction.compute_saturated_costs(&h, use_general_costs);
        reduce_costs(&mut remaining, &saturated);
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

    fn two_var_task() -> ExplicitTask {
        ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![
                ExplicitOperator::new("a", 1, vec![], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("b", 1, vec![], vec![Fact::new(Var(1), 1)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn scp_over_orthogonal_projections_sums_to_optimal() {
        let task = two_var_task();
        let p0 = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let p1 = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(p0), Box::new(p1)], vec![1, 1]);
        let cp = saturated_cost_partitioning(&collection, &[0, 1], false);
        // each projection needs exactly one of the two unit-cost operators; SCP must
        // not double count, so the initial state's heuristic equals the true optimal
        // plan cost of 2.
        assert_eq!(cp.compute_heuristic(&[0, 0]), 2);
    }

    #[test]
    fn scp_is_never_less_informative_than_a_single_abstraction() {
        let task = two_var_task();
        let p0 = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let p1 = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(p0), Box::new(p1)], vec![1, 1]);
        let cp = saturated_cost_partitioning(&collection, &[0], false);
        assert_eq!(cp.compute_heuristic(&[0, 0]), 1);
    }
}
