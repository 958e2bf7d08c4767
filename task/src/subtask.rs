//! Subtask generators: produce derived tasks that alter goal and/or
//! operator costs, each convertible back to the original task's state space.

use crate::explicit::ExplicitTask;
use crate::Fact;

/// Produces a collection of derived tasks, each of which an `Abstraction` will be built
/// for independently. Every derived task must support `convert_ancestor_state` so that
/// heuristics can evaluate an original-task state against an abstraction built for it.
pub trait SubtaskGenerator {
    fn generate_subtasks(&self, task: &ExplicitTask) -> Vec<ExplicitTask>;
}

/// One subtask per goal fact, each keeping the full operator set but restricting the
/// goal to a single fact. This is the default decomposition `CEGAR::refinement_loop`
/// relies on when a task is not itself a landmark subtask.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoalFactsGenerator;

impl SubtaskGenerator for GoalFactsGenerator {
    fn generate_subtasks(&self, task: &ExplicitTask) -> Vec<ExplicitTask> {
        task.goal().iter().map(|&fact| task.with_goal(vec![fact])).collect()
    }
}

/// One landmark subtask per goal fact: the goal is decomposed exactly as in
/// `GoalFactsGenerator`, but each derived task is additionally flagged as a landmark
/// subtask so `CEGAR` runs `separate_facts_unreachable_before_goal` instead of the
/// plain per-goal-fact split.
#[derive(Debug, Default, Clone, Copy)]
pub struct LandmarkGenerator;

impl SubtaskGenerator for LandmarkGenerator {
    fn generate_subtasks(&self, task: &ExplicitTask) -> Vec<ExplicitTask> {
        task.goal()
            .iter()
            .map(|&fact: &Fact| task.as_landmark_subtask(fact))
            .collect()
    }
}
