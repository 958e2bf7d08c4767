//! The match-tree transition oracle: instead of storing
//! every transition explicitly, recovers them on demand by regressing each operator's
//! effect Cartesian set through the refinement hierarchy.
//!
//! Grounded on the match-tree regression technique used by CEGAR-based abstraction
//! refiners to avoid materializing every transition up front.

use crate::cartesian_set::CartesianSet;
use crate::ids::{NodeId, StateId};
use crate::refinement_hierarchy::{Matcher, RefinementHierarchy, VarMatch};
use crate::transition::Transition;
use cegar_task::{ExplicitTask, OpId};
use fixedbitset::FixedBitSet;
use std::rc::Rc;

/// Precomputed, per-operator Cartesian sets used to regress transitions through the
/// hierarchy without touching the task on every query.
struct OperatorInfo {
    /// The Cartesian set of states an operator can be applied in, restricted to the
    /// variables it has a precondition on (full domain elsewhere).
    precondition_set: CartesianSet,
    /// The Cartesian set of states an operator can lead to, i.e. preconditions
    /// overridden by effects on the variables the operator touches.
    effect_set: CartesianSet,
    matcher: Matcher,
}

fn build_operator_info(task: &ExplicitTask, domain_sizes: &Rc<[usize]>) -> Vec<OperatorInfo> {
    let num_vars = domain_sizes.len();
    (0..task.num_operators())
        .map(OpId::from)
        .map(|op| {
            let operator = task.operator(op);
            let mut precondition = CartesianSet::full_domain(domain_sizes.clone());
            let mut matcher = vec![VarMatch::Unaffected; num_vars];
            for fact in operator.preconditions.iter() {
                let var = usize::from(fact.var);
                let mut only = FixedBitSet::with_capacity(domain_sizes[var]);
                only.insert(fact.value as usize);
                let (_, taken) = precondition.split_domain(var, &only);
                precondition = taken;
                matcher[var] = VarMatch::SingleValue;
            }
            let mut effect = precondition.clone();
            for fact in operator.effects.iter() {
                let var = usize::from(fact.var);
                let mut only = FixedBitSet::with_capacity(domain_sizes[var]);
                only.insert(fact.value as usize);
                if effect.has_full_domain(var) {
                    let (_, taken) = effect.split_domain(var, &only);
                    effect = taken;
                } else {
                    effect = replace_domain(&effect, var, &only, domain_sizes);
                }
                matcher[var] = VarMatch::SingleValue;
            }
            OperatorInfo {
                precondition_set: precondition,
                effect_set: effect,
                matcher,
            }
        })
        .collect()
}

/// Replaces variable `var`'s domain subset of `cset` with `values`, regardless of what
/// it currently is (used when an operator's effect value differs from its already
/// precondition-restricted value on the same variable).
fn replace_domain(
    cset: &CartesianSet,
    var: usize,
    values: &FixedBitSet,
    domain_sizes: &Rc<[usize]>,
) -> CartesianSet {
    let mut full = CartesianSet::full_domain(domain_sizes.clone());
    for v in 0..domain_sizes.len() {
        if v == var {
            continue;
        }
        if cset.has_full_domain(v) {
            continue;
        }
        let mut wanted = FixedBitSet::with_capacity(domain_sizes[v]);
        for value in cset.values(v) {
            wanted.insert(value as usize);
        }
        let complement_size = domain_sizes[v] - wanted.count_ones(..);
        if complement_size > 0 {
            let (_, taken) = full.split_domain(v, &wanted);
            full = taken;
        }
    }
    let (_, taken) = full.split_domain(var, values);
    taken
}

pub struct MatchTree {
    operators: Vec<OperatorInfo>,
}

impl MatchTree {
    pub fn new(task: &ExplicitTask, domain_sizes: &Rc<[usize]>) -> Self {
        MatchTree {
            operators: build_operator_info(task, domain_sizes),
        }
    }

    /// Outgoing transitions from `state`: for every operator whose precondition set
    /// intersects `state`'s Cartesian set, regress the effect set through the hierarchy
    /// to find every abstract state it can reach.
    pub fn outgoing(
        &self,
        state: StateId,
        state_cset: &CartesianSet,
        hierarchy: &RefinementHierarchy,
        all_cartesian_sets: &[Option<CartesianSet>],
    ) -> Vec<Transition> {
        let mut result = Vec::new();
        for (idx, info) in self.operators.iter().enumerate() {
            if !preconditions_hold(info, state_cset) {
                continue;
            }
            let op = OpId::from(idx);
            hierarchy.for_each_leaf(all_cartesian_sets, &info.effect_set, &info.matcher, |target| {
                if target != state {
                    result.push(Transition::new(op, target));
                }
            });
        }
        result
    }

    pub fn is_applicable(&self, op: OpId, state_cset: &CartesianSet) -> bool {
        preconditions_hold(&self.operators[usize::from(op)], state_cset)
    }

    pub fn regress(
        &self,
        op: OpId,
        hierarchy: &RefinementHierarchy,
        all_cartesian_sets: &[Option<CartesianSet>],
        mut callback: impl FnMut(StateId),
    ) {
        let info = &self.operators[usize::from(op)];
        hierarchy.for_each_leaf(all_cartesian_sets, &info.effect_set, &info.matcher, |s| callback(s));
    }
}

fn preconditions_hold(info: &OperatorInfo, state_cset: &CartesianSet) -> bool {
    (0..state_cset.num_variables()).all(|v| state_cset.intersects_domain(&info.precondition_set, v))
}

/// Unifies the explicit and on-demand oracles behind one type so `Abstraction` can
/// switch strategies without duplicating call sites.
pub enum TransitionOracle {
    Explicit(crate::transition_system::TransitionSystem),
    Implicit(MatchTree),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cegar_task::{ExplicitOperator, Fact, Var};

    fn two_var_task() -> ExplicitTask {
        let op = ExplicitOperator::new(
            "op".into(),
            1,
            vec![Fact::new(Var(0), 0)],
            vec![Fact::new(Var(0), 1)],
        );
        ExplicitTask::new(vec![2, 2], vec![0, 0], vec![Fact::new(Var(0), 1)], vec![op]).unwrap()
    }

    #[test]
    fn outgoing_finds_the_single_split_state() {
        let task = two_var_task();
        let sizes: Rc<[usize]> = Rc::from(vec![2usize, 2usize].into_boxed_slice());
        let tree = MatchTree::new(&task, &sizes);

        let mut hierarchy = RefinementHierarchy::new(StateId(0));
        let full = CartesianSet::full_domain(sizes.clone());
        let mut wanted = FixedBitSet::with_capacity(2);
        wanted.insert(1);
        let (left_set, right_set) = full.split_domain(0, &wanted);
        let (chain, right_node) = hierarchy.split(NodeId(0), 0, &[1], StateId(0), StateId(1));
        let left_node = chain[1];
        let mut sets = vec![None; hierarchy.num_nodes()];
        sets[left_node] = Some(left_set.clone());
        sets[right_node] = Some(right_set);

        let transitions = tree.outgoing(StateId(0), &left_set, &hierarchy, &sets);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].target, StateId(1));
    }
}
