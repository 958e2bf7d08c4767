//! The explicit transition-system transition oracle:
//! per-state incoming/outgoing/looping transition lists, rewired on every split.
//!
//! Grounded on the transition-system and transition-rewiring design used by
//! CEGAR-based abstraction refiners to keep a Cartesian abstraction's graph in sync
//! with each split.

use crate::ids::StateId;
use crate::transition::Transition;
use cegar_task::OpId;
use fixedbitset::FixedBitSet;

/// Per-operator precondition/postcondition value on one variable, looked up during
/// rewiring. `postcondition` is the effect value if the operator has one, else the
/// precondition value if it requires one (meaning the variable's value is preserved),
/// else `None` (the operator is wholly unaffected by the variable).
pub trait VarProjection {
    fn precondition_value(&self, op: OpId, var: usize) -> Option<i32>;
    fn postcondition_value(&self, op: OpId, var: usize) -> Option<i32>;
}

/// Lets the rewiring code test Cartesian-set intersection/membership for arbitrary
/// state ids without the `TransitionSystem` needing to own the abstraction itself.
pub trait CsetLookup {
    fn contains(&self, state: StateId, var: usize, value: i32) -> bool;
    fn intersects(&self, a: StateId, b: StateId, var: usize) -> bool;
}

#[derive(Default)]
pub struct TransitionSystem {
    incoming: Vec<Vec<Transition>>,
    outgoing: Vec<Vec<Transition>>,
    loops: Vec<Vec<OpId>>,
    num_operators: usize,
    num_non_loop_transitions: usize,
}

impl TransitionSystem {
    /// The trivial (one-state) abstraction: every operator is a self-loop.
    pub fn new_trivial(num_operators: usize) -> Self {
        let loops = vec![(0..num_operators).map(OpId::from).collect()];
        TransitionSystem {
            incoming: vec![Vec::new()],
            outgoing: vec![Vec::new()],
            loops,
            num_operators,
            num_non_loop_transitions: 0,
        }
    }

    pub fn num_states(&self) -> usize {
        self.outgoing.len()
    }

    pub fn num_stored_transitions(&self) -> usize {
        self.num_non_loop_transitions
    }

    pub fn outgoing(&self, state: StateId) -> &[Transition] {
        &self.outgoing[usize::from(state)]
    }

    /// Incoming transitions to `state`: each entry's `target` field names the *source*
    /// of the edge (the same `Transition` type is reused for both directions).
    pub fn incoming(&self, state: StateId) -> &[Transition] {
        &self.incoming[usize::from(state)]
    }

    pub fn loops(&self, state: StateId) -> &[OpId] {
        &self.loops[usize::from(state)]
    }

    pub fn has_transition(&self, src: StateId, op: OpId, dest: StateId) -> bool {
        self.outgoing(src).iter().any(|t| t.op == op && t.target == dest)
    }

    pub fn looping_operators(&self, states: &[StateId]) -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(self.num_operators);
        for &s in states {
            for &op in self.loops(s) {
                bits.insert(usize::from(op));
            }
        }
        bits
    }

    fn enlarge_by_one(&mut self) -> StateId {
        self.incoming.push(Vec::new());
        self.outgoing.push(Vec::new());
        self.loops.push(Vec::new());
        StateId::from(self.outgoing.len() - 1)
    }

    fn add_edge(&mut self, src: StateId, op: OpId, dest: StateId) {
        debug_assert_ne!(src, dest);
        self.outgoing[usize::from(src)].push(Transition::new(op, dest));
        self.incoming[usize::from(dest)].push(Transition::new(op, src));
        self.num_non_loop_transitions += 1;
    }

    fn add_loop(&mut self, state: StateId, op: OpId) {
        self.loops[usize::from(state)].push(op);
    }

    fn remove_transitions_with_target(transitions: &mut Vec<Transition>, target: StateId) -> usize {
        let before = transitions.len();
        transitions.retain(|t| t.target != target);
        before - transitions.len()
    }

    /// Rewires the transitions of the split state `v` into `v1` (reusing `v`'s slot)
    /// and `v2` (a fresh slot): redistributes `v`'s incoming, outgoing, and looping
    /// transitions between the two children based on each operator's precondition and
    /// postcondition value on the split variable.
    ///
    /// `v` must still have its (about to be discarded) edges in place; `v1`/`v2` must
    /// already have empty edge lists reserved (see `enlarge_for_split`).
    pub fn rewire(
        &mut self,
        v: StateId,
        v1: StateId,
        v2: StateId,
        var: usize,
        ops: &dyn VarProjection,
        csets: &dyn CsetLookup,
    ) {
        self.rewire_incoming(v, v1, v2, var, ops, csets);
        self.rewire_outgoing(v, v1, v2, var, ops, csets);
        self.rewire_loops(v, v1, v2, var, ops, csets);
    }

    /// Allocates the fresh state slot for `v2` (returns its id) and keeps `v1` aliased
    /// to `v`'s existing slot, matching `Abstraction::refine`'s id-reuse policy.
    pub fn enlarge_for_split(&mut self) -> StateId {
        self.enlarge_by_one()
    }

    fn rewire_incoming(
        &mut self,
        v: StateId,
        v1: StateId,
        v2: StateId,
        var: usize,
        ops: &dyn VarProjection,
        csets: &dyn CsetLookup,
    ) {
        let old_incoming = std::mem::take(&mut self.incoming[usize::from(v)]);
        let mut seen_sources = std::collections::HashSet::new();
        for t in &old_incoming {
            if seen_sources.insert(t.target) {
                Self::remove_transitions_with_target(&mut self.outgoing[usize::from(t.target)], v);
            }
        }
        for t in old_incoming {
            let u = t.target;
            let op = t.op;
            match ops.postcondition_value(op, var) {
                None => {
                    let u_v1 = csets.intersects(u, v1, var);
                    if u_v1 {
                        self.add_edge(u, op, v1);
                    }
                    if !u_v1 || csets.intersects(u, v2, var) {
                        self.add_edge(u, op, v2);
                    }
                }
                Some(post) => {
                    if csets.contains(v1, var, post) {
                        self.add_edge(u, op, v1);
                    } else {
                        debug_assert!(csets.contains(v2, var, post));
                        self.add_edge(u, op, v2);
                    }
                }
            }
        }
    }

    fn rewire_outgoing(
        &mut self,
        v: StateId,
        v1: StateId,
        v2: StateId,
        var: usize,
        ops: &dyn VarProjection,
        csets: &dyn CsetLookup,
    ) {
        let old_outgoing = std::mem::take(&mut self.outgoing[usize::from(v)]);
        let mut seen_targets = std::collections::HashSet::new();
        for t in &old_outgoing {
            if seen_targets.insert(t.target) {
                Self::remove_transitions_with_target(&mut self.incoming[usize::from(t.target)], v);
            }
        }
        for t in old_outgoing {
            let w = t.target;
            let op = t.op;
            let pre = ops.precondition_value(op, var);
            let post = ops.postcondition_value(op, var);
            match post {
                None => {
                    debug_assert!(pre.is_none());
                    let v1_w = csets.intersects(v1, w, var);
                    if v1_w {
                        self.add_edge(v1, op, w);
                    }
                    if !v1_w || csets.intersects(v2, w, var) {
                        self.add_edge(v2, op, w);
                    }
                }
                Some(_) if pre.is_none() => {
                    self.add_edge(v1, op, w);
                    self.add_edge(v2, op, w);
                }
                Some(pre_val) if csets.contains(v1, var, pre.unwrap()) => {
                    let _ = pre_val;
                    self.add_edge(v1, op, w);
                }
                Some(_) => {
                    debug_assert!(csets.contains(v2, var, pre.unwrap()));
                    self.add_edge(v2, op, w);
                }
            }
        }
    }

    fn rewire_loops(
        &mut self,
        v: StateId,
        v1: StateId,
        v2: StateId,
        var: usize,
        ops: &dyn VarProjection,
        csets: &dyn CsetLookup,
    ) {
        let old_loops = std::mem::take(&mut self.loops[usize::from(v)]);
        for op in old_loops {
            let pre = ops.precondition_value(op, var);
            let post = ops.postcondition_value(op, var);
            match pre {
                None => match post {
                    None => {
                        self.add_loop(v1, op);
                        self.add_loop(v2, op);
                    }
                    Some(post_val) => {
                        if csets.contains(v2, var, post_val) {
                            self.add_edge(v1, op, v2);
                            self.add_loop(v2, op);
                        } else {
                            debug_assert!(csets.contains(v1, var, post_val));
                            self.add_loop(v1, op);
                            self.add_edge(v2, op, v1);
                        }
                    }
                },
                Some(pre_val) => {
                    let post_val = post.expect("operator with a precondition on var must also constrain it");
                    if csets.contains(v1, var, pre_val) {
                        if csets.contains(v1, var, post_val) {
                            self.add_loop(v1, op);
                        } else {
                            self.add_edge(v1, op, v2);
                        }
                    } else {
                        debug_assert!(csets.contains(v2, var, pre_val));
                        if csets.contains(v1, var, post_val) {
                            self.add_edge(v2, op, v1);
                        } else {
                            self.add_loop(v2, op);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_abstraction_has_only_loops() {
        let ts = TransitionSystem::new_trivial(3);
        assert_eq!(ts.num_states(), 1);
        assert_eq!(ts.num_stored_transitions(), 0);
        assert_eq!(ts.loops(StateId(0)).len(), 3);
    }
}
