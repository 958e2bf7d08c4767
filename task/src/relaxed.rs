//! Delete-relaxation reachability, used by the landmark pre-refinement pass
//! and by `MIN_HADD`/`MAX_HADD` split scoring.
//!
//! Generalizes `classical::heuristics::hadd` (boolean literals) to multi-valued facts.

use crate::{Fact, OpId, PlanningTask, Var};
use std::collections::HashSet;

/// Additive relaxed-plan cost estimate, `h^add`. Grounded on the fixpoint loop in
/// `classical/heuristics.rs::hadd`, generalized from boolean literals to facts.
pub struct HAdd {
    /// `fact_cost[(var, value)]`, flattened per-variable.
    fact_cost: Vec<Vec<f64>>,
}

impl HAdd {
    pub fn compute(task: &dyn PlanningTask, state: &[i32]) -> HAdd {
        let mut fact_cost: Vec<Vec<f64>> = (0..task.num_variables())
            .map(|v| vec![f64::INFINITY; task.domain_size(Var::from(v))])
            .collect();
        for (var, &value) in state.iter().enumerate() {
            fact_cost[var][value as usize] = 0.0;
        }

        let mut changed = true;
        while changed {
            changed = false;
            for op_idx in 0..task.num_operators() {
                let op = OpId::from(op_idx);
                let pre_cost: f64 = task
                    .preconditions(op)
                    .iter()
                    .map(|f| fact_cost[usize::from(f.var)][f.value as usize])
                    .sum();
                if pre_cost.is_infinite() {
                    continue;
                }
                let op_cost = pre_cost + task.operator_cost(op).max(1) as f64;
                for eff in task.effects(op) {
                    let slot = &mut fact_cost[usize::from(eff.var)][eff.value as usize];
                    if op_cost < *slot {
                        *slot = op_cost;
                        changed = true;
                    }
                }
            }
        }
        HAdd { fact_cost }
    }

    pub fn cost(&self, fact: Fact) -> f64 {
        self.fact_cost[usize::from(fact.var)][fact.value as usize]
    }

    pub fn is_reachable(&self, fact: Fact) -> bool {
        self.cost(fact).is_finite()
    }
}

/// The set of facts possibly true at some point before `goal` is first achieved:
/// the delete-relaxation reachability set computed with every operator that achieves
/// `goal` removed from consideration. Used by
/// `CEGAR::separate_facts_unreachable_before_goal` to split off, for each variable, the
/// values that can provably never hold before the landmark is reached.
pub fn possible_before(task: &dyn PlanningTask, goal: Fact) -> HashSet<Fact> {
    let mut reachable: Vec<HashSet<i32>> = (0..task.num_variables()).map(|_| HashSet::new()).collect();
    for (var, &value) in task.initial_state().iter().enumerate() {
        reachable[var].insert(value);
    }
    reachable[usize::from(goal.var)].insert(goal.value);

    let achieves_goal = |op: OpId| task.effects(op).iter().any(|f| *f == goal);

    let mut changed = true;
    while changed {
        changed = false;
        for op_idx in 0..task.num_operators() {
            let op = OpId::from(op_idx);
            if achieves_goal(op) {
                continue;
            }
            let applicable = task
                .preconditions(op)
                .iter()
                .all(|f| reachable[usize::from(f.var)].contains(&f.value));
            if !applicable {
                continue;
            }
            for eff in task.effects(op) {
                if reachable[usize::from(eff.var)].insert(eff.value) {
                    changed = true;
                }
            }
            // Facts unaffected by `op` that were already true in some reachable state
            // remain reachable; nothing to propagate for them beyond the fixpoint above
            // since we only track per-variable reachable values (a safe, standard
            // relaxation of reachability of full partial states).
        }
    }

    let mut out = HashSet::new();
    for (var, values) in reachable.into_iter().enumerate() {
        for value in values {
            out.insert(Fact::new(Var::from(var), value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explicit::{ExplicitOperator, ExplicitTask};

    #[test]
    fn possible_before_excludes_goal_achievers_successors() {
        // v in {0,1,2}: 0 -o1-> 1 -o2-> 2 (goal = (v,2))
        let task = ExplicitTask::new(
            vec![3],
            vec![0],
            vec![Fact::new(Var(0), 2)],
            vec![
                ExplicitOperator::new(
                    "o1",
                    1,
                    vec![Fact::new(Var(0), 0)],
                    vec![Fact::new(Var(0), 1)],
                ),
                ExplicitOperator::new(
                    "o2",
                    1,
                    vec![Fact::new(Var(0), 1)],
                    vec![Fact::new(Var(0), 2)],
                ),
            ],
        )
        .unwrap();
        let rpb = possible_before(&task, Fact::new(Var(0), 2));
        assert!(rpb.contains(&Fact::new(Var(0), 0)));
        assert!(rpb.contains(&Fact::new(Var(0), 1)));
        // value 2 is only reached by the operator that achieves the goal itself, but we
        // still seed the goal fact as reachable (it must be, trivially, "before" itself).
        assert!(rpb.contains(&Fact::new(Var(0), 2)));
    }

    #[test]
    fn hadd_matches_shortest_chain_cost() {
        let task = ExplicitTask::new(
            vec![3],
            vec![0],
            vec![Fact::new(Var(0), 2)],
            vec![
                ExplicitOperator::new("o1", 3, vec![Fact::new(Var(0), 0)], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("o2", 5, vec![Fact::new(Var(0), 1)], vec![Fact::new(Var(0), 2)]),
            ],
        )
        .unwrap();
        let h = HAdd::compute(&task, task.initial_state());
        assert_eq!(h.cost(Fact::new(Var(0), 1)), 3.0);
        assert_eq!(h.cost(Fact::new(Var(0), 2)), 8.0);
    }
}
