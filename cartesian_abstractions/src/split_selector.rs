//! `SplitSelector`: turns a `Flaw` into candidate
//! `(variable, wanted values)` splits and scores them to pick one.
//!
//! Grounded on the candidate generation and scoring functions of `examples/
//! original_source/src/search/cartesian_abstractions/split_selector.cc`.

use crate::abstraction::Abstraction;
use crate::flaw_search::Flaw;
use crate::ids::StateId;
use cegar_task::relaxed::HAdd;
use cegar_task::{ExplicitTask, Fact, PlanningTask, Var};
use rand::Rng;

/// A candidate split: pull `wanted` for `var` out of the flawed state into its own
/// state, leaving everything else behind. `wanted` is a singleton for applicability
/// and goal flaws (the single disagreeing fact value); a deviation flaw's candidate
/// may carry several values (`A_v(current) ∩ A_v(target)`, §4.6).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub var: usize,
    pub wanted: Vec<i32>,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    Random,
    MinUnwanted,
    MaxUnwanted,
    MinRefined,
    MaxRefined,
    MinHAdd,
    MaxHAdd,
    MinCg,
    MaxCg,
    MaxCover,
}

pub struct SplitSelector {
    pub strategy: SplitStrategy,
}

impl SplitSelector {
    pub fn new(strategy: SplitStrategy) -> Self {
        SplitSelector { strategy }
    }

    /// For a goal or applicability flaw: every variable/value pair where the flaw's
    /// concrete state disagrees with a fact the abstraction relies on (a goal fact, or
    /// the violated operator's precondition fact). For a deviation flaw: for every
    /// variable `op` leaves unaffected, if the concrete successor's value on that
    /// variable falls outside the declared target's domain, a candidate splitting off
    /// `A_v(current) ∩ A_v(target)` (§4.6) — non-empty by construction, since the
    /// source and target states must have intersected on `var` for the (now broken)
    /// transition to have existed at all.
    pub fn candidates(&self, task: &ExplicitTask, abstraction: &Abstraction, flaw: &Flaw) -> Vec<Candidate> {
        match flaw {
            Flaw::Goal { concrete, .. } => Self::disagreeing_facts(concrete, task.goal()),
            Flaw::Precondition { concrete, op, .. } => Self::disagreeing_facts(concrete, task.preconditions(*op)),
            Flaw::Deviation { state, op, target, successor, .. } => {
                Self::deviation_candidates(task, abstraction, *op, *state, *target, successor)
            }
        }
    }

    fn disagreeing_facts(concrete: &[i32], facts: &[Fact]) -> Vec<Candidate> {
        facts
            .iter()
            .filter(|f| concrete[usize::from(f.var)] != f.value)
            .map(|f| Candidate { var: usize::from(f.var), wanted: vec![f.value] })
            .collect()
    }

    fn deviation_candidates(
        task: &ExplicitTask,
        abstraction: &Abstraction,
        op: cegar_task::OpId,
        state: StateId,
        target: StateId,
        successor: &[i32],
    ) -> Vec<Candidate> {
        let current_cset = abstraction.cartesian_set(state);
        let target_cset = abstraction.cartesian_set(target);
        let affected = |var: usize| -> bool {
            task.preconditions(op).iter().any(|f| usize::from(f.var) == var)
                || task.effects(op).iter().any(|f| usize::from(f.var) == var)
        };
        (0..task.num_variables())
            .filter(|&var| !affected(var))
            .filter_map(|var| {
                let x = successor[var];
                if target_cset.test(var, x) {
                    return None;
                }
                let wanted: Vec<i32> = current_cset.values(var).filter(|&v| target_cset.test(var, v)).collect();
                if wanted.is_empty() { None } else { Some(Candidate { var, wanted }) }
            })
            .collect()
    }

    /// Picks one candidate for the flawed `state` according to `self.strategy`.
    /// Returns `None` only if `candidates` is empty (never happens for a real flaw,
    /// since a flaw is defined by at least one disagreeing fact).
    pub fn select<'a>(
        &self,
        task: &ExplicitTask,
        abstraction: &Abstraction,
        state: StateId,
        candidates: &'a [Candidate],
        rng: &mut impl Rng,
    ) -> Option<&'a Candidate> {
        if candidates.is_empty() {
            return None;
        }
        let cset = abstraction.cartesian_set(state);
        match self.strategy {
            SplitStrategy::Random => candidates.get(rng.random_range(0..candidates.len())),
            SplitStrategy::MinUnwanted => candidates.iter().min_by_key(|c| cset.count(c.var) - c.wanted.len()),
            SplitStrategy::MaxUnwanted => candidates.iter().max_by_key(|c| cset.count(c.var) - c.wanted.len()),
            SplitStrategy::MinRefined => candidates.iter().min_by_key(|c| cset.count(c.var)),
            SplitStrategy::MaxRefined => candidates.iter().max_by_key(|c| cset.count(c.var)),
            SplitStrategy::MinHAdd | SplitStrategy::MaxHAdd => {
                let hadd = HAdd::compute(task, task.initial_state());
                // min/max of h^add(v, x) over every x in the candidate's wanted set.
                let cost = |c: &Candidate| {
                    c.wanted
                        .iter()
                        .map(|&x| {
                            let v = hadd.cost(Fact::new(Var::from(c.var), x));
                            if v.is_finite() { v } else { f64::MAX }
                        })
                        .fold(None, |acc: Option<f64>, v| {
                            Some(match acc {
                                None => v,
                                Some(a) if self.strategy == SplitStrategy::MinHAdd => a.min(v),
                                Some(a) => a.max(v),
                            })
                        })
                        .expect("wanted is never empty")
                };
                if self.strategy == SplitStrategy::MinHAdd {
                    candidates.iter().min_by(|a, b| cost(a).partial_cmp(&cost(b)).unwrap())
                } else {
                    candidates.iter().max_by(|a, b| cost(a).partial_cmp(&cost(b)).unwrap())
                }
            }
            SplitStrategy::MinCg | SplitStrategy::MaxCg => {
                // Causal-graph-level scoring (how many other variables a variable's
                // operators read/write) is out of scope without building a causal
                // graph; fall back to variable index order, which at least gives a
                // deterministic, reproducible tie-break.
                if self.strategy == SplitStrategy::MinCg {
                    candidates.iter().min_by_key(|c| c.var)
                } else {
                    candidates.iter().max_by_key(|c| c.var)
                }
            }
            SplitStrategy::MaxCover => {
                // Prefers the candidate whose value is shared by the most *other*
                // pending flaws' required values on the same variable; with a single
                // flaw's candidates (no batched flaw set here) this degenerates to
                // picking the most frequent variable among the candidates themselves.
                let mut counts = std::collections::HashMap::new();
                for c in candidates {
                    *counts.entry(c.var).or_insert(0usize) += 1;
                }
                candidates.iter().max_by_key(|c| counts[&c.var])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::OracleStrategy;
    use cegar_task::{ExplicitOperator, Var};

    fn two_var_task() -> ExplicitTask {
        ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![ExplicitOperator::new("a", 1, vec![], vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)])],
        )
        .unwrap()
    }

    #[test]
    fn candidates_cover_every_disagreeing_goal_fact() {
        let task = two_var_task();
        let abstraction = Abstraction::new(&task, OracleStrategy::Explicit);
        let flaw = Flaw::Goal { state: StateId(0), concrete: vec![0, 0] };
        let selector = SplitSelector::new(SplitStrategy::Random);
        let candidates = selector.candidates(&task, &abstraction, &flaw);
        assert_eq!(candidates.len(), 2);
    }

    /// §4.6: a deviation flaw must split on the `op`-unaffected variable whose
    /// concrete successor value falls outside the declared target's domain, with
    /// `wanted = A_v(current) ∩ A_v(target)` — not an empty set from filtering `op`'s
    /// (non-existent, here) precondition facts.
    #[test]
    fn deviation_candidates_split_on_the_unaffected_variable() {
        let task = ExplicitTask::new(
            vec![2, 2],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 1)],
            vec![ExplicitOperator::new("oa", 1, vec![], vec![Fact::new(Var(0), 1)])],
        )
        .unwrap();
        let mut abstraction = Abstraction::new(&task, OracleStrategy::Explicit);
        let initial = abstraction.initial_state_id();

        let mut wanted = fixedbitset::FixedBitSet::with_capacity(2);
        wanted.insert(1);
        let (_rest, target) = abstraction.refine(initial, 1, &wanted, &[1]);

        let op = cegar_task::OpId::from(0);
        let flaw = Flaw::Deviation {
            state: initial,
            concrete: vec![0, 0],
            op,
            target,
            successor: vec![1, 0],
        };
        let selector = SplitSelector::new(SplitStrategy::Random);
        let candidates = selector.candidates(&task, &abstraction, &flaw);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].var, 1);
        assert_eq!(candidates[0].wanted, vec![1]);
    }
}
