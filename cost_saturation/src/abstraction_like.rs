//! The capability trait shared by every abstraction family the cost-partitioning
//! code operates on (Cartesian abstractions and projections alike).
//!
//! Grounded on how cost-saturation engines treat `Abstraction`/`ExplicitAbstraction`
//! polymorphically: both concrete families expose the same `{abstract_state_id,
//! num_states, goal_states, for_each_transition, looping_operators}` surface, and
//! `compute_goal_distances`/`compute_saturated_costs` are derived once, generically,
//! from a backward adjacency list built from `for_each_transition` -- never
//! duplicated per concrete type.

use cegar_task::{OpId, INF};
use fixedbitset::FixedBitSet;
use std::collections::BinaryHeap;
use std::cmp::Reverse;

/// An edge `src --op--> target` in an abstraction's transition graph, in the global
/// (task-wide) operator numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub src: usize,
    pub op: OpId,
    pub target: usize,
}

/// Sentinel used in saturated-cost tables for "this operator needs no cost from this
/// abstraction" -- broadcasts as `-INF` the way a saturated-cost computation
/// initializes its per-operator `min_cost` accumulator.
pub const SATURATED_NEG_INF: i64 = i64::MIN / 4;

/// The small polymorphic surface every cost-partitionable abstraction exposes.
/// Concrete variants: `CartesianAbstractionView` (Cartesian/CEGAR abstractions) and
/// `Projection` (pattern databases).
pub trait AbstractionLike {
    fn num_states(&self) -> usize;
    fn num_operators(&self) -> usize;
    fn goal_states(&self) -> &[usize];
    /// Maps a *concrete* state of the task this abstraction was built for down to its
    /// local abstract state id.
    fn abstract_state_id(&self, state: &[i32]) -> usize;
    fn for_each_transition(&self, callback: &mut dyn FnMut(Transition));
    fn looping_operators(&self) -> &FixedBitSet;

    /// Builds the backward adjacency list (`target -> [(op, src)]`) once, used by
    /// both `compute_goal_distances` and `compute_saturated_costs`.
    fn backward_graph(&self) -> Vec<Vec<(OpId, usize)>> {
        let mut graph = vec![Vec::new(); self.num_states()];
        self.for_each_transition(&mut |t| graph[t.target].push((t.op, t.src)));
        graph
    }

    /// Goal distances under an arbitrary per-operator cost assignment (the "remaining"
    /// budget during saturated cost partitioning, or the original costs for a plain
    /// evaluation). Backward Dijkstra from the goal states, per
    /// `explicit_abstraction.cc::compute_goal_distances`/`dijkstra_search`.
    fn compute_goal_distances(&self, costs: &[i32]) -> Vec<i32> {
        let graph = self.backward_graph();
        let mut distances = vec![INF; self.num_states()];
        let mut heap = BinaryHeap::new();
        for &g in self.goal_states() {
            distances[g] = 0;
            heap.push(Reverse((0i32, g)));
        }
        while let Some(Reverse((d, state))) = heap.pop() {
            if d > distances[state] {
                continue;
            }
            for &(op, src) in &graph[state] {
                let op_cost = costs[usize::from(op)];
                if op_cost == INF {
                    continue;
                }
                let candidate = d.saturating_add(op_cost);
                if candidate < distances[src] {
                    distances[src] = candidate;
                    heap.push(Reverse((candidate, src)));
                }
            }
        }
        distances
    }

    /// Per-operator saturated costs: `max over (src,op,target) edges of
    /// h[src] - h[target]`, per `cartesian_abstractions/cost_saturation.cc`'s
    /// `compute_saturated_costs`. Operators with no live edge in this abstraction get
    /// `-INF` when `use_general_costs` (meaning: this abstraction needs none of this
    /// operator's cost, and the caller may even lift the remaining budget for it to
    /// `INF`), else `0`.
    fn compute_saturated_costs(&self, h_values: &[i32], use_general_costs: bool) -> Vec<i64> {
        let graph = self.backward_graph();
        let min_cost = if use_general_costs { SATURATED_NEG_INF } else { 0 };
        let mut saturated = vec![min_cost; self.num_operators()];
        if use_general_costs {
            for op in self.looping_operators().ones() {
                saturated[op] = 0;
            }
        }
        for (target, edges) in graph.iter().enumerate() {
            let target_h = h_values[target];
            if target_h == INF {
                continue;
            }
            for &(op, src) in edges {
                let src_h = h_values[src];
                if src_h == INF {
                    continue;
                }
                let needed = (src_h - target_h) as i64;
                let slot = &mut saturated[usize::from(op)];
                if needed > *slot {
                    *slot = needed;
                }
            }
        }
        saturated
    }
}
