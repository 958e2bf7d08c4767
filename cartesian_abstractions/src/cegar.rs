//! `CEGAR`: ties `Abstraction`, `ShortestPaths`, `FlawSearch`, and `SplitSelector`
//! together into the counterexample-guided refinement loop.
//!
//! Grounded on the refinement-loop structure of a CEGAR-based abstraction builder.

use crate::abstraction::Abstraction;
use crate::config::CegarConfig;
use crate::dot;
use crate::flaw_search::{Flaw, FlawSearch, SearchResult};
use crate::resource::{ResourceBudget, StopReason};
use crate::shortest_paths::ShortestPaths;
use crate::split_selector::SplitSelector;
use cegar_task::{ExplicitTask, Fact, PlanningTask};
use fixedbitset::FixedBitSet;
use rand::Rng;
use tracing::{debug, info};

pub struct Cegar {
    pub abstraction: Abstraction,
    pub shortest_paths: ShortestPaths,
    stop_reason: StopReason,
}

impl Cegar {
    /// Builds and refines an abstraction for `task` until a resource limit is hit or a
    /// concrete solution is found along only f-optimal abstract transitions.
    pub fn build(task: &ExplicitTask, config: &CegarConfig, rng: &mut impl Rng) -> Self {
        let mut abstraction = Abstraction::new(task, config.transition_representation);
        let mut budget = ResourceBudget::new(config.max_states, config.max_transitions, config.max_time);

        if task.is_landmark_subtask() {
            separate_facts_unreachable_before_goal(task, &mut abstraction, &budget);
        } else {
            split_off_goal_facts(task, &mut abstraction, &budget);
        }

        info!("initializing goal distances");
        let mut shortest_paths = ShortestPaths::recompute(&abstraction);

        let flaw_search = FlawSearch::new(config.pick_flawed_abstract_state, config.max_concrete_states_per_abstract_state);
        let split_selector = SplitSelector::new(config.pick_split);

        let stop_reason = loop {
            if let Some(reason) = budget.check(abstraction.num_states(), abstraction.num_stored_transitions()) {
                info!(?reason, "stopping refinement: resource limit reached");
                break reason;
            }
            if shortest_paths.is_dead_end(abstraction.initial_state_id()) {
                info!("abstract task is unsolvable");
                break StopReason::Unsolvable;
            }

            match flaw_search.search(task, &abstraction, &shortest_paths, rng) {
                SearchResult::Solved => {
                    info!("found concrete solution");
                    break StopReason::Solved;
                }
                SearchResult::Unsolvable => {
                    info!("abstract task is unsolvable");
                    break StopReason::Unsolvable;
                }
                SearchResult::Flawed(flaw) => {
                    let state = flaw.state();
                    debug!(?state, "refining flawed abstract state");
                    let candidates = split_selector.candidates(task, &abstraction, &flaw);
                    let candidate = split_selector
                        .select(task, &abstraction, state, &candidates, rng)
                        .expect("a flaw always yields at least one candidate split (§4.6)");
                    let var = candidate.var;
                    let wanted_values = candidate.wanted.clone();
                    let domain_size = abstraction.cartesian_set(state).domain_size(var);
                    let mut wanted = FixedBitSet::with_capacity(domain_size);
                    for &value in &wanted_values {
                        wanted.insert(value as usize);
                    }
                    let (left, right) = abstraction.refine(state, var, &wanted, &wanted_values);
                    shortest_paths.update_incrementally(&abstraction, left, right);
                }
            }
        };

        if dot::dot_graph_requested() {
            debug!(graph = %dot::to_dot(&abstraction, task), "abstraction dot graph");
        }

        Cegar { abstraction, shortest_paths, stop_reason }
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }
}

/// Splits off each goal fact from the initial state, one at a time, so every goal
/// state is separated from every non-goal state before the main loop starts.
fn split_off_goal_facts(task: &ExplicitTask, abstraction: &mut Abstraction, budget: &ResourceBudget) {
    debug_assert_eq!(abstraction.num_states(), 1);
    let mut current = abstraction.initial_state_id();
    for fact in task.goal() {
        if budget.check(abstraction.num_states(), abstraction.num_stored_transitions()).is_some() {
            break;
        }
        let domain_size = abstraction.cartesian_set(current).domain_size(usize::from(fact.var));
        let mut wanted = FixedBitSet::with_capacity(domain_size);
        wanted.insert(fact.value as usize);
        let (_unchanged, goal_ish) = abstraction.refine(current, usize::from(fact.var), &wanted, &[fact.value]);
        current = goal_ish;
    }
}

/// Isolates the single landmark fact's achievement: splits off every value of every
/// variable that provably can never hold before the landmark is first reached, then
/// marks every remaining state a goal state, then (budget permitting) splits the
/// landmark fact itself off the initial state.
fn separate_facts_unreachable_before_goal(task: &ExplicitTask, abstraction: &mut Abstraction, budget: &ResourceBudget) {
    debug_assert_eq!(abstraction.num_states(), 1);
    let goal = task.goal()[0];
    let reachable = cegar_task::relaxed::possible_before(task, goal);

    for var in 0..task.num_variables() {
        if budget.check(abstraction.num_states(), abstraction.num_stored_transitions()).is_some() {
            break;
        }
        let domain_size = task.domain_size(cegar_task::Var::from(var));
        let unreachable_values: Vec<i32> = (0..domain_size as i32)
            .filter(|&value| !reachable.contains(&Fact::new(cegar_task::Var::from(var), value)))
            .collect();
        if unreachable_values.is_empty() {
            continue;
        }
        let mut wanted = FixedBitSet::with_capacity(domain_size);
        for &value in &unreachable_values {
            wanted.insert(value as usize);
        }
        abstraction.refine(abstraction.initial_state_id(), var, &wanted, &unreachable_values);
    }

    abstraction.mark_all_states_as_goals();

    if budget.check(abstraction.num_states(), abstraction.num_stored_transitions()).is_none() {
        let domain_size = task.domain_size(goal.var);
        let mut wanted = FixedBitSet::with_capacity(domain_size);
        wanted.insert(goal.value as usize);
        abstraction.refine(abstraction.initial_state_id(), usize::from(goal.var), &wanted, &[goal.value]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cegar_task::{ExplicitOperator, Fact, Var};
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
    fn build_fully_refines_a_simple_chain_task() {
        let task = chain_task();
        let config = CegarConfig::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let cegar = Cegar::build(&task, &config, &mut rng);
        assert_eq!(cegar.stop_reason(), StopReason::Solved);
        assert_eq!(cegar.abstraction.num_states(), 3);
    }

    #[test]
    fn build_stops_at_max_states_limit() {
        let task = chain_task();
        let mut config = CegarConfig::default();
        config.max_states = 2;
        let mut rng = SmallRng::seed_from_u64(0);
        let cegar = Cegar::build(&task, &config, &mut rng);
        assert_eq!(cegar.stop_reason(), StopReason::MaxStates);
        assert!(cegar.abstraction.num_states() <= 2);
    }

    /// Two no-precondition, single-effect operators over independent variables: `oa`
    /// sets `var0`, `ob` sets `var1`. After `split_off_goal_facts` splits `var0` off the
    /// initial state, `oa` is applicable at the initial abstract state but its concrete
    /// successor (`var0=1, var1=0`) deviates from the declared goal-ish target (whose
    /// region requires `var1=1` too) -- exactly the deviation flaw that used to be
    /// mislabeled `Flaw::Precondition` and so could never be refined, making CEGAR
    /// falsely declare the abstraction solved after a single split at h=1 instead of
    /// the true optimal h=2.
    fn two_independent_operators_task() -> ExplicitTask {
        ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![
                ExplicitOperator::new("oa", 1, vec![], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("ob", 1, vec![], vec![Fact::new(Var(1), 1)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn build_refines_past_a_deviation_flaw_to_the_true_optimum() {
        let task = two_independent_operators_task();
        let config = CegarConfig::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let cegar = Cegar::build(&task, &config, &mut rng);
        assert_eq!(cegar.stop_reason(), StopReason::Solved);
        assert_eq!(cegar.abstraction.num_states(), 4);
        let initial = cegar.abstraction.initial_state_id();
        assert_eq!(cegar.shortest_paths.distance(initial), 2);
    }
}
