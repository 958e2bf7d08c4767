//! Optimal cost partitioning: one LP per query state, with a cost-sharing variable per
//! `(abstraction, operator)` and a distance variable per `(abstraction, abstract
//! state)`. This is the theoretical ceiling saturated/zero-one/post-hoc cost
//! partitioning only approximate.
//!
//! Grounded on the optimal-cost-partitioning LP formulation: distance variables obey
//! the usual admissible-heuristic triangle inequality along every transition
//! (`h[src] <= h[target] + cost[op]`), are pinned to `0` at goal states, and the
//! per-operator cost shares are non-negative and sum to at most the original cost.

use crate::abstraction_collection::AbstractionCollection;
use crate::lp::{ConstraintKind, LpConstraint, LpProblem, LpResult, LpSolver};
use cegar_task::INF;

pub struct OptimalCostPartitioning<'a> {
    collection: &'a AbstractionCollection,
}

impl<'a> OptimalCostPartitioning<'a> {
    pub fn new(collection: &'a AbstractionCollection) -> Self {
        OptimalCostPartitioning { collection }
    }

    pub fn compute_heuristic(&self, local_state_ids: &[usize], solver: &dyn LpSolver) -> i32 {
        let num_abstractions = self.collection.len();
        let num_operators = self.collection.num_operators();

        let mut cost_var_offset = vec![0usize; num_abstractions];
        let mut h_var_offset = vec![0usize; num_abstractions];
        let mut offset = 0;
        for i in 0..num_abstractions {
            cost_var_offset[i] = offset;
            offset += num_operators;
        }
        for i in 0..num_abstractions {
            h_var_offset[i] = offset;
            offset += self.collection.get(i).num_states();
        }
        let num_vars = offset;

        let mut objective = vec![0.0; num_vars];
        for i in 0..num_abstractions {
            objective[h_var_offset[i] + local_state_ids[i]] += 1.0;
        }

        let mut constraints = Vec::new();
        for (op, &cost) in self.collection.operator_costs().iter().enumerate() {
            if cost == INF {
                continue;
            }
            let mut coefficients = vec![0.0; num_vars];
            for i in 0..num_abstractions {
                coefficients[cost_var_offset[i] + op] = 1.0;
            }
            constraints.push(LpConstraint { coefficients, kind: ConstraintKind::LessEqual, rhs: cost as f64 });
        }

        for i in 0..num_abstractions {
            let abstraction = self.collection.get(i);
            for &goal in abstraction.goal_states() {
                let mut coefficients = vec![0.0; num_vars];
                coefficients[h_var_offset[i] + goal] = 1.0;
                constraints.push(LpConstraint { coefficients, kind: ConstraintKind::Equal, rhs: 0.0 });
            }
            let mut add_transition_constraint = |src: usize, op: usize, target: usize| {
                let mut coefficients = vec![0.0; num_vars];
                coefficients[h_var_offset[i] + src] += 1.0;
                coefficients[h_var_offset[i] + target] -= 1.0;
                coefficients[cost_var_offset[i] + op] -= 1.0;
                constraints.push(LpConstraint { coefficients, kind: ConstraintKind::LessEqual, rhs: 0.0 });
            };
            abstraction.for_each_transition(&mut |t| add_transition_constraint(t.src, usize::from(t.op), t.target));
        }

        let problem = LpProblem { num_vars, objective, constraints };
        match solver.solve(&problem) {
            LpResult::Optimal { value, .. } => value.round() as i32,
            LpResult::Unbounded => INF,
            LpResult::Infeasible => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::SimplexSolver;
    use crate::projection::{Pattern, Projection, ProjectionRepresentation};
    use cegar_task::explicit::{ExplicitOperator, ExplicitTask};
    use cegar_task::{Fact, Var};

    #[test]
    fn optimal_cp_reaches_true_optimum_on_shared_operator() {
        // a single operator achieves both goal facts at once; an optimal cost
        // partitioning must recognise that only one abstraction needs to claim its
        // cost, since optimal CP -- unlike zero-one -- is free to split fractionally
        // and will still land on the same value here since claiming it whole is optimal.
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![ExplicitOperator::new(
                "both",
                4,
                vec![],
                vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            )],
        )
        .unwrap();
        let p0 = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let p1 = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(p0), Box::new(p1)], vec![4]);
        let optimal = OptimalCostPartitioning::new(&collection);
        let h = optimal.compute_heuristic(&[0, 0], &SimplexSolver);
        assert_eq!(h, 4);
    }
}
