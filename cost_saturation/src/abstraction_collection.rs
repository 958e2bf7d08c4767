//! `AbstractionCollection`: the set of abstractions (Cartesian or projection) a cost
//! partitioning is computed over, plus the shared original operator costs every order
//! starts from.
//!
//! Grounded on the collection-generator pattern used by cost-saturation heuristics:
//! build one abstraction per subtask (via `SubtaskGenerator`) or one projection per
//! pattern, then hand the whole collection to the order generators.

use crate::abstraction_like::AbstractionLike;
use crate::cartesian_view::CartesianAbstractionView;
use crate::projection::{Pattern, Projection, ProjectionRepresentation};
use cartesian_abstractions::{Cegar, CegarConfig};
use cegar_task::explicit::ExplicitTask;
use cegar_task::subtask::SubtaskGenerator;
use cegar_task::PlanningTask;
use rand::Rng;

pub struct AbstractionCollection {
    abstractions: Vec<Box<dyn AbstractionLike>>,
    costs: Vec<i32>,
}

impl AbstractionCollection {
    pub fn new(abstractions: Vec<Box<dyn AbstractionLike>>, costs: Vec<i32>) -> Self {
        AbstractionCollection { abstractions, costs }
    }

    /// Builds one Cartesian abstraction per subtask `generator` derives from `task`,
    /// each refined to termination by CEGAR under `cegar_config`.
    pub fn build_cartesian(
        task: &ExplicitTask,
        generator: &dyn SubtaskGenerator,
        cegar_config: &CegarConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let costs: Vec<i32> = (0..task.num_operators())
            .map(|o| task.operator_cost(cegar_task::OpId::from(o)))
            .collect();
        let abstractions = generator
            .generate_subtasks(task)
            .into_iter()
            .map(|subtask| {
                let cegar = Cegar::build(&subtask, cegar_config, rng);
                let view = CartesianAbstractionView::new(cegar.abstraction, &subtask);
                Box::new(view) as Box<dyn AbstractionLike>
            })
            .collect();
        AbstractionCollection { abstractions, costs }
    }

    /// Builds one projection per pattern in `patterns`.
    pub fn build_projections(task: &ExplicitTask, patterns: Vec<Pattern>, representation: ProjectionRepresentation) -> Self {
        let costs: Vec<i32> = (0..task.num_operators())
            .map(|o| task.operator_cost(cegar_task::OpId::from(o)))
            .collect();
        let abstractions = patterns
            .into_iter()
            .map(|pattern| Box::new(Projection::build(task, pattern, representation)) as Box<dyn AbstractionLike>)
            .collect();
        AbstractionCollection { abstractions, costs }
    }

    pub fn len(&self) -> usize {
        self.abstractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abstractions.is_empty()
    }

    pub fn num_operators(&self) -> usize {
        self.costs.len()
    }

    pub fn operator_costs(&self) -> &[i32] {
        &self.costs
    }

    pub fn get(&self, index: usize) -> &dyn AbstractionLike {
        self.abstractions[index].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AbstractionLike> {
        self.abstractions.iter().map(|a| a.as_ref())
    }

    /// Maps a concrete state of the original task down to every abstraction's local
    /// state id, in collection order.
    pub fn local_state_ids(&self, state: &[i32]) -> Vec<usize> {
        self.abstractions.iter().map(|a| a.abstract_state_id(state)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cegar_task::{Fact, Var};
    use cegar_task::explicit::ExplicitOperator;
    use cegar_task::subtask::GoalFactsGenerator;
    use cartesian_abstractions::CegarConfig;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn two_goal_task() -> ExplicitTask {
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
    fn build_cartesian_produces_one_abstraction_per_goal_fact() {
        let task = two_goal_task();
        let mut rng = SmallRng::seed_from_u64(1);
        let collection = AbstractionCollection::build_cartesian(&task, &GoalFactsGenerator, &CegarConfig::default(), &mut rng);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.num_operators(), 2);
    }

    #[test]
    fn build_projections_produces_one_per_pattern() {
        let task = two_goal_task();
        let collection = AbstractionCollection::build_projections(
            &task,
            vec![Pattern(vec![Var(0)]), Pattern(vec![Var(1)])],
            ProjectionRepresentation::Explicit,
        );
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(0).num_states(), 2);
    }
}
