//! `Abstraction`: the mutable Cartesian abstraction built by repeated splitting
//!. Owns the Cartesian sets, the refinement
//! hierarchy, the goal states, and the chosen transition oracle.

use crate::cartesian_set::CartesianSet;
use crate::ids::{NodeId, StateId};
use crate::match_tree::{MatchTree, TransitionOracle};
use crate::operator_var_index::OperatorVarIndex;
use crate::refinement_hierarchy::RefinementHierarchy;
use crate::transition::Transition;
use crate::transition_system::{CsetLookup, TransitionSystem, VarProjection};
use cegar_task::{ExplicitTask, OpId, PlanningTask};
use fixedbitset::FixedBitSet;
use std::rc::Rc;

/// How transitions are looked up: the explicit store is cheap to query but grows with
/// every split; the match tree is always `O(splits)` memory but recomputes transitions
/// on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStrategy {
    Explicit,
    Implicit,
}

pub struct Abstraction {
    domain_sizes: Rc<[usize]>,
    states: Vec<StateId>,
    /// Indexed by node id. Every node ever created keeps its Cartesian set, even once
    /// it becomes an inner node, so the matcher can test an ancestor's region against a
    /// later split (see `RefinementHierarchy::for_each_leaf`).
    cartesian_sets: Vec<Option<CartesianSet>>,
    node_of_state: Vec<NodeId>,
    hierarchy: RefinementHierarchy,
    goal_states: FixedBitSet,
    var_index: OperatorVarIndex,
    oracle: TransitionOracle,
    initial_state_id: StateId,
    num_operators: usize,
    operator_costs: Vec<i32>,
    goal_facts: Vec<cegar_task::Fact>,
}

impl Abstraction {
    /// Builds the trivial (one-state) abstraction for `task`: a single abstract state
    /// with the full Cartesian set, goal iff the task's goal is empty (handled by the
    /// caller refining it down immediately otherwise), and every operator self-looping.
    pub fn new(task: &ExplicitTask, strategy: OracleStrategy) -> Self {
        let domain_sizes: Rc<[usize]> = Rc::from(
            (0..task.num_variables())
                .map(|v| task.domain_size(cegar_task::Var::from(v)))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        );
        let full = CartesianSet::full_domain(domain_sizes.clone());
        let initial_state_id = StateId(0);
        let hierarchy = RefinementHierarchy::new(initial_state_id);
        let var_index = OperatorVarIndex::build(task);

        let oracle = match strategy {
            OracleStrategy::Explicit => TransitionOracle::Explicit(TransitionSystem::new_trivial(task.num_operators())),
            OracleStrategy::Implicit => TransitionOracle::Implicit(MatchTree::new(task, &domain_sizes)),
        };

        let goal_facts = task.goal().to_vec();
        let mut goal_states = FixedBitSet::with_capacity(1);
        if goal_facts.iter().all(|f| full.test(usize::from(f.var), f.value)) {
            goal_states.insert(0);
        }

        Abstraction {
            domain_sizes,
            states: vec![initial_state_id],
            cartesian_sets: vec![Some(full)],
            node_of_state: vec![NodeId(0)],
            hierarchy,
            goal_states,
            var_index,
            oracle,
            initial_state_id,
            num_operators: task.num_operators(),
            operator_costs: (0..task.num_operators()).map(|o| task.operator_cost(OpId::from(o))).collect(),
            goal_facts,
        }
    }

    fn satisfies_goal(&self, cset: &CartesianSet) -> bool {
        self.goal_facts.iter().all(|f| cset.test(usize::from(f.var), f.value))
    }

    pub fn operator_cost(&self, op: OpId) -> i32 {
        self.operator_costs[usize::from(op)]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_stored_transitions(&self) -> usize {
        match &self.oracle {
            TransitionOracle::Explicit(ts) => ts.num_stored_transitions(),
            TransitionOracle::Implicit(_) => 0,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.domain_sizes.len()
    }

    pub fn num_operators(&self) -> usize {
        self.num_operators
    }

    /// Every currently live state id, in ascending order.
    pub fn state_ids(&self) -> &[StateId] {
        &self.states
    }

    pub fn initial_state_id(&self) -> StateId {
        self.initial_state_id
    }

    pub fn cartesian_set(&self, state: StateId) -> &CartesianSet {
        self.cartesian_sets[usize::from(self.node_of_state[usize::from(state)])]
            .as_ref()
            .expect("every live state's node must carry a Cartesian set")
    }

    pub fn is_goal(&self, state: StateId) -> bool {
        self.goal_states.contains(usize::from(state))
    }

    /// Safeguard for unsolvable landmark subtasks: marks every current
    /// state as a goal state so the shortest-path computation degenerates to `h = 0`
    /// everywhere instead of reporting the task unsolvable.
    pub fn mark_all_states_as_goals(&mut self) {
        self.goal_states.grow(self.states.len());
        self.goal_states.set_range(.., true);
    }

    pub fn resolve_state(&self, values: &[i32]) -> StateId {
        self.hierarchy.resolve(values)
    }

    pub fn outgoing(&self, state: StateId) -> Vec<Transition> {
        match &self.oracle {
            TransitionOracle::Explicit(ts) => ts.outgoing(state).to_vec(),
            TransitionOracle::Implicit(mt) => {
                mt.outgoing(state, self.cartesian_set(state), &self.hierarchy, &self.cartesian_sets)
            }
        }
    }

    pub fn incoming(&self, state: StateId) -> Vec<Transition> {
        match &self.oracle {
            TransitionOracle::Explicit(ts) => ts.incoming(state).to_vec(),
            TransitionOracle::Implicit(_) => {
                // The match tree only regresses forward transitions cheaply; incoming
                // transitions are recovered by scanning every other state's outgoing set.
                // Acceptable because callers only need this for search-time flaw
                // diagnostics, not the hot Dijkstra loop (which only needs outgoing).
                let mut result = Vec::new();
                for &src in &self.states {
                    if src == state {
                        continue;
                    }
                    for t in self.outgoing(src) {
                        if t.target == state {
                            result.push(Transition::new(t.op, src));
                        }
                    }
                }
                result
            }
        }
    }

    pub fn looping_operators(&self) -> FixedBitSet {
        match &self.oracle {
            TransitionOracle::Explicit(ts) => ts.looping_operators(&self.states),
            TransitionOracle::Implicit(mt) => {
                let mut bits = FixedBitSet::with_capacity(self.num_operators);
                for &s in &self.states {
                    let cset = self.cartesian_set(s);
                    for op in 0..self.num_operators {
                        let op = OpId::from(op);
                        if mt.is_applicable(op, cset) {
                            let mut reaches_self = false;
                            mt.regress(op, &self.hierarchy, &self.cartesian_sets, |t| {
                                if t == s {
                                    reaches_self = true;
                                }
                            });
                            if reaches_self {
                                bits.insert(usize::from(op));
                            }
                        }
                    }
                }
                bits
            }
        }
    }

    /// Splits `state` on `var`, sending the wanted values to a new state and keeping
    /// the rest on `state`'s id.
    ///
    /// # Panics
    /// Panics if `wanted` is empty or not a proper subset of `state`'s current domain
    /// on `var` (delegated to `CartesianSet::split_domain`).
    pub fn refine(&mut self, state: StateId, var: usize, wanted: &FixedBitSet, wanted_values: &[i32]) -> (StateId, StateId) {
        let node_id = self.node_of_state[usize::from(state)];
        let current_cset = self.cartesian_sets[usize::from(node_id)]
            .clone()
            .expect("state's node must hold a Cartesian set before refine");
        let (left_set, right_set) = current_cset.split_domain(var, wanted);

        let left_state_id = state;
        let right_state_id = StateId::from(self.states.len());

        let (chain, right_node_id) = self.hierarchy.split(node_id, var, wanted_values, left_state_id, right_state_id);
        let left_node_id = *chain.last().expect("split chain is never empty");

        self.cartesian_sets.resize(self.hierarchy.num_nodes(), None);
        // chain[i] tests wanted_values[i]; its denoted region is "var's domain minus
        // the wanted values ruled out so far", shrinking from `current_cset` down to
        // the final `left_set`. Every position is kept (not just the final leaf) since
        // an ancestor's matcher may later need an intermediate node's set as an "other"
        // sibling's Cartesian set.
        for (i, &node) in chain.iter().enumerate() {
            let cset = current_cset.without_values(var, &wanted_values[..i]);
            self.cartesian_sets[usize::from(node)] = Some(cset);
        }
        let left_is_goal = self.satisfies_goal(&left_set);
        let right_is_goal = self.satisfies_goal(&right_set);
        self.cartesian_sets[usize::from(left_node_id)] = Some(left_set);
        self.cartesian_sets[usize::from(right_node_id)] = Some(right_set);

        self.node_of_state[usize::from(left_state_id)] = left_node_id;
        self.node_of_state.push(right_node_id);
        self.states.push(right_state_id);

        self.goal_states.grow(self.states.len());
        self.goal_states.set(usize::from(left_state_id), left_is_goal);
        self.goal_states.set(usize::from(right_state_id), right_is_goal);

        if let TransitionOracle::Explicit(ts) = &mut self.oracle {
            ts.enlarge_for_split();
            let lookup = StateCsetLookup { abstraction_states: &self.node_of_state, cartesian_sets: &self.cartesian_sets };
            ts.rewire(state, left_state_id, right_state_id, var, &self.var_index, &lookup);
        }

        (left_state_id, right_state_id)
    }
}

struct StateCsetLookup<'a> {
    abstraction_states: &'a [NodeId],
    cartesian_sets: &'a [Option<CartesianSet>],
}

impl<'a> CsetLookup for StateCsetLookup<'a> {
    fn contains(&self, state: StateId, var: usize, value: i32) -> bool {
        let node = self.abstraction_states[usize::from(state)];
        self.cartesian_sets[usize::from(node)]
            .as_ref()
            .expect("live state must have a Cartesian set")
            .test(var, value)
    }

    fn intersects(&self, a: StateId, b: StateId, var: usize) -> bool {
        let na = self.abstraction_states[usize::from(a)];
        let nb = self.abstraction_states[usize::from(b)];
        let ca = self.cartesian_sets[usize::from(na)].as_ref().unwrap();
        let cb = self.cartesian_sets[usize::from(nb)].as_ref().unwrap();
        ca.intersects_domain(cb, var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cegar_task::{ExplicitOperator, Fact, Var};

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
    fn trivial_abstraction_has_one_state_that_is_trivially_a_goal() {
        let task = chain_task();
        let abs = Abstraction::new(&task, OracleStrategy::Explicit);
        assert_eq!(abs.num_states(), 1);
        // the whole state space collapses to one abstract state, which must be a goal
        // state since a full Cartesian set trivially satisfies every goal fact.
        assert!(abs.is_goal(abs.initial_state_id()));
    }

    #[test]
    fn refine_splits_state_and_preserves_resolution() {
        let task = chain_task();
        let mut abs = Abstraction::new(&task, OracleStrategy::Explicit);
        let mut wanted = FixedBitSet::with_capacity(3);
        wanted.insert(2);
        let (left, right) = abs.refine(abs.initial_state_id(), 0, &wanted, &[2]);
        assert_eq!(abs.num_states(), 2);
        assert_eq!(abs.resolve_state(&[0]), left);
        assert_eq!(abs.resolve_state(&[2]), right);
        assert!(abs.is_goal(right));
        assert!(!abs.is_goal(left));
    }
}
