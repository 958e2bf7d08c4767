//! Post-hoc optimization (PhO): an LP that distributes each operator's cost across
//! the abstractions that use it to maximize the heuristic value of one query state,
//! given each abstraction's (state-independent) saturated-cost profile.
//!
//! Grounded on the post-hoc-optimization LP formulation: `maximize sum_i w_i * h_i(s)`
//! subject to `sum_i w_i * sat_i[op] <= cost[op]` for every operator, `w_i >= 0`.

use crate::abstraction_collection::AbstractionCollection;
use crate::lp::{ConstraintKind, LpConstraint, LpProblem, LpResult, LpSolver};
use cegar_task::INF;

pub struct PostHocOptimization {
    h_tables: Vec<Vec<i32>>,
    saturated: Vec<Vec<i64>>,
    costs: Vec<i32>,
}

impl PostHocOptimization {
    /// Precomputes every abstraction's goal distances and saturated costs under the
    /// collection's original (unpartitioned) operator costs -- state-independent, so
    /// this is done once and reused across queries.
    pub fn build(collection: &AbstractionCollection) -> Self {
        let costs = collection.operator_costs().to_vec();
        let mut h_tables = Vec::with_capacity(collection.len());
        let mut saturated = Vec::with_capacity(collection.len());
        for abstraction in collection.iter() {
            let h = abstraction.compute_goal_distances(&costs);
            saturated.push(abstraction.compute_saturated_costs(&h, false));
            h_tables.push(h);
        }
        PostHocOptimization { h_tables, saturated, costs }
    }

    pub fn compute_heuristic(&self, local_state_ids: &[usize], solver: &dyn LpSolver) -> i32 {
        let num_abstractions = self.h_tables.len();
        // Any component abstraction proving the state a dead end proves it dead overall.
        if (0..num_abstractions).any(|i| self.h_tables[i][local_state_ids[i]] == INF) {
            return INF;
        }
        let objective: Vec<f64> = (0..num_abstractions).map(|i| self.h_tables[i][local_state_ids[i]] as f64).collect();
        let mut constraints = Vec::with_capacity(self.costs.len());
        for (op, &cost) in self.costs.iter().enumerate() {
            if cost == INF {
                continue;
            }
            let coefficients: Vec<f64> = (0..num_abstractions).map(|i| self.saturated[i][op] as f64).collect();
            constraints.push(LpConstraint { coefficients, kind: ConstraintKind::LessEqual, rhs: cost as f64 });
        }
        let problem = LpProblem { num_vars: num_abstractions, objective, constraints };
        match solver.solve(&problem) {
            LpResult::Optimal { value, .. } => value.round() as i32,
            LpResult::Unbounded => INF,
            LpResult::Infeasible => 0, // all-zero weights are always feasible; unreachable in practice.
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
    fn pho_matches_scp_on_two_orthogonal_projections() {
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![
                ExplicitOperator::new("a", 1, vec![], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("b", 1, vec![], vec![Fact::new(Var(1), 1)]),
            ],
        )
        .unwrap();
        let p0 = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let p1 = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(p0), Box::new(p1)], vec![1, 1]);
        let pho = PostHocOptimization::build(&collection);
        let h = pho.compute_heuristic(&[0, 0], &SimplexSolver);
        assert_eq!(h, 2);
    }
}
