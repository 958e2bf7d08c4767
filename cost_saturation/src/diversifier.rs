//! `Diversifier`: samples concrete states once, then keeps only cost-partitioning
//! orders that strictly improve the heuristic value of at least one sample beyond
//! every previously accepted order.
//!
//! Grounded on the sample-and-accept diversification scheme used by cost-saturation
//! order generators to avoid redundant orders.

use crate::abstraction_collection::AbstractionCollection;
use crate::cost_partitioning_heuristic::CostPartitioningHeuristic;
use cegar_task::{apply_effects, is_applicable, OpId, PlanningTask};
use rand::seq::SliceRandom;
use rand::Rng;

pub struct Diversifier {
    samples: Vec<Vec<i32>>,
    best_values: Vec<i32>,
}

impl Diversifier {
    /// Draws `num_samples` states by random walks from `task`'s initial state, each of
    /// a length drawn uniformly from `0..=2 * expected_plan_length` (a simple stand-in
    /// for the original's geometric-ish length distribution centered on the default
    /// order's estimated plan length).
    pub fn sample(task: &dyn PlanningTask, num_samples: usize, expected_plan_length: usize, rng: &mut impl Rng) -> Self {
        let samples = (0..num_samples).map(|_| random_walk(task, expected_plan_length, rng)).collect();
        Diversifier {
            samples,
            best_values: vec![-1; num_samples],
        }
    }

    /// Evaluates `cp` against every sample; if at least one sample's value strictly
    /// exceeds the best value recorded for it so far, the order is accepted (and the
    /// per-sample best values are updated) and `true` is returned.
    pub fn is_diverse(&mut self, collection: &AbstractionCollection, cp: &CostPartitioningHeuristic) -> bool {
        let new_values: Vec<i32> = self
            .samples
            .iter()
            .map(|state| {
                let local_ids = collection.local_state_ids(state);
                cp.compute_heuristic(&local_ids)
            })
            .collect();
        let improves = self.best_values.iter().zip(&new_values).any(|(&best, &new)| new > best);
        if improves {
            for (best, &new) in self.best_values.iter_mut().zip(&new_values) {
                if new > *best {
                    *best = new;
                }
            }
        }
        improves
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

fn random_walk(task: &dyn PlanningTask, expected_length: usize, rng: &mut impl Rng) -> Vec<i32> {
    let length = if expected_length == 0 { 0 } else { rng.gen_range(0..=2 * expected_length) };
    let mut state = task.initial_state().to_vec();
    for _ in 0..length {
        let applicable: Vec<OpId> = (0..task.num_operators())
            .map(OpId::from)
            .filter(|&op| is_applicable(task, &state, op))
            .collect();
        let Some(&op) = applicable.choose(rng) else {
            break;
        };
        state = apply_effects(task, &state, op);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{Pattern, Projection, ProjectionRepresentation};
    use cegar_task::explicit::{ExplicitOperator, ExplicitTask};
    use cegar_task::{Fact, Var};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn chain_task() -> ExplicitTask {
        ExplicitTask::new(
            vec![3],
            vec![0],
            vec![Fact::new(Var(0), 2)],
            vec![
                ExplicitOperator::new("o1", 1, vec![Fact::new(Var(0), 0)], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("o2", 1, vec![Fact::new(Var(0), 1)], vec![Fact::new(Var(0), 2)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn first_evaluated_order_is_always_diverse() {
        let task = chain_task();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut diversifier = Diversifier::sample(&task, 4, 2, &mut rng);
        let proj = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(proj)], vec![1, 1]);
        let mut cp = CostPartitioningHeuristic::new();
        cp.add_h_values(0, vec![2, 1, 0]);
        assert!(diversifier.is_diverse(&collection, &cp));
    }

    #[test]
    fn identical_order_is_not_diverse_twice() {
        let task = chain_task();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut diversifier = Diversifier::sample(&task, 4, 2, &mut rng);
        let proj = Projection::build(&task, Pattern(vec![Var(0)]), ProjectionRepresentation::Explicit);
        let collection = AbstractionCollection::new(vec![Box::new(proj)], vec![1, 1]);
        let mut cp = CostPartitioningHeuristic::new();
        cp.add_h_values(0, vec![2, 1, 0]);
        assert!(diversifier.is_diverse(&collection, &cp));
        assert!(!diversifier.is_diverse(&collection, &cp));
    }
}
