//! Goal-distance maintenance over an `Abstraction`'s transition graph: shortest distance from every state to the nearest goal state, kept up
//! to date as the abstraction is refined.
//!
//! Grounded on the incremental-Dijkstra design common to CEGAR-based abstraction
//! refiners: costs are lifted by one so a zero-cost self-loop cannot be mistaken for
//! "no path", then lowered back before being reported. The priority queue reuses
//! `aries_collections::heap::IdxHeap`, a decrease-key binary heap.

use crate::abstraction::Abstraction;
use crate::ids::StateId;
use aries_collections::heap::IdxHeap;
use cegar_task::{OpId, INF};

/// Marks a state known to be unreachable from any goal.
const INF_COST: i64 = i64::MAX;
/// Marks a state whose distance is stale after a split and must be recomputed.
const DIRTY: i64 = i64::MAX - 1;

/// Lifts an operator cost into the 64-bit space summed along shortest paths: a
/// zero-cost operator contributes exactly `1` (so a chain of them is distinguishable
/// from "no edge at all") while every other cost is shifted into the high 32 bits, so
/// that summing any number of zero-cost edges alongside real-cost edges and then
/// shifting back down (`lower`) recovers the true total cost regardless of how many
/// zero-cost edges were on the path.
fn lift(cost: i32) -> i64 {
    if cost == 0 { 1 } else { (cost as i64) << 32 }
}

fn lower(lifted: i64) -> i32 {
    if lifted >= DIRTY {
        INF
    } else {
        (lifted >> 32) as i32
    }
}

/// Goal distances (lifted cost to reach the nearest goal state via an optimal-cost
/// path) and the shortest-path-tree child used to extract the induced abstract
/// solution.
pub struct ShortestPaths {
    distances: Vec<i64>,
    /// The operator taken on the shortest path out of `s` towards the goal, paired
    /// with the successor state it leads to, if any.
    shortest_path_successor: Vec<Option<(OpId, StateId)>>,
}

impl ShortestPaths {
    pub fn recompute(abstraction: &Abstraction) -> Self {
        let n = abstraction.num_states();
        let mut distances = vec![INF_COST; n];
        let mut shortest_path_successor = vec![None; n];
        for s in 0..n {
            if abstraction.is_goal(StateId::from(s)) {
                distances[s] = 0;
            }
        }
        Self::run_dijkstra(abstraction, &mut distances, &mut shortest_path_successor, &(0..n).collect::<Vec<_>>());
        ShortestPaths { distances, shortest_path_successor }
    }

    /// Relaxes distances over the *incoming* edges (distances here measure "to the
    /// goal", so relaxing `u` uses an edge `u -> v` where `v`'s distance is already
    /// final) until every reachable state in `frontier` (and everything transitively
    /// reachable from it through incoming edges) is settled.
    fn run_dijkstra(
        abstraction: &Abstraction,
        distances: &mut [i64],
        shortest_path_successor: &mut [Option<(OpId, StateId)>],
        frontier: &[usize],
    ) {
        let n = distances.len();
        let mut heap: IdxHeap<StateId, i64> = IdxHeap::new();
        for s in 0..n {
            let sid = StateId::from(s);
            heap.declare_element(sid, -distances[s]);
        }
        for &s in frontier {
            heap.enqueue(StateId::from(s));
        }
        let mut settled = vec![false; n];
        while let Some(state) = heap.pop() {
            let idx = usize::from(state);
            if settled[idx] {
                continue;
            }
            settled[idx] = true;
            let dist = distances[idx];
            if dist >= DIRTY {
                continue;
            }
            for t in abstraction.incoming(state) {
                let u = t.target;
                let uidx = usize::from(u);
                if settled[uidx] {
                    continue;
                }
                let op_cost = lift(abstraction.operator_cost(t.op));
                let candidate = dist.saturating_add(op_cost);
                if candidate < distances[uidx] {
                    distances[uidx] = candidate;
                    shortest_path_successor[uidx] = Some((t.op, state));
                    heap.set_priority(u, -candidate);
                    heap.enqueue(u);
                }
            }
        }
    }

    /// Updates distances after `old_state` was split into `left`/`right`. Marks both
    /// new states dirty, plus any state whose recorded shortest-path successor no
    /// longer resolves to a live transition (its target was rewired away), then
    /// propagates dirtiness to every state whose recorded successor is itself dirty
    /// (§4.5's orphan-candidate rule): `run_dijkstra` only ever lowers a distance, so a
    /// state seeded with its old cached value as an upper bound must have that value be
    /// a true upper bound, which no longer holds once the successor it was computed
    /// through has gotten more expensive. Only then does it re-run Dijkstra, seeded
    /// from every state (dirty ones reset, clean ones keeping their already-optimal
    /// distance as a valid upper bound).
    pub fn update_incrementally(&mut self, abstraction: &Abstraction, left: StateId, right: StateId) {
        let n = abstraction.num_states();
        self.distances.resize(n, DIRTY);
        self.shortest_path_successor.resize(n, None);

        let mut dirty = vec![false; n];
        dirty[usize::from(left)] = true;
        dirty[usize::from(right)] = true;

        for s in 0..n {
            if dirty[s] {
                continue;
            }
            let sid = StateId::from(s);
            let still_valid = match self.shortest_path_successor[s] {
                None => abstraction.is_goal(sid),
                Some((op, succ)) => abstraction.outgoing(sid).iter().any(|t| t.op == op && t.target == succ),
            };
            if !still_valid {
                dirty[s] = true;
            }
        }

        // Orphan-candidate propagation: a state whose shortest-path successor is dirty
        // cannot trust its own cached distance either, since that successor's true
        // distance may have increased (a predecessor's edge can stay syntactically
        // valid while the state it points to gets split and loses its cheapest route).
        loop {
            let mut changed = false;
            for s in 0..n {
                if dirty[s] {
                    continue;
                }
                if let Some((_, succ)) = self.shortest_path_successor[s] {
                    if dirty[usize::from(succ)] {
                        dirty[s] = true;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        let frontier: Vec<usize> = (0..n)
            .filter(|&s| {
                if dirty[s] {
                    self.distances[s] = if abstraction.is_goal(StateId::from(s)) { 0 } else { DIRTY };
                    self.shortest_path_successor[s] = None;
                }
                true
            })
            .collect();
        Self::run_dijkstra(abstraction, &mut self.distances, &mut self.shortest_path_successor, &frontier);
    }

    pub fn distance(&self, state: StateId) -> i32 {
        lower(self.distances[usize::from(state)])
    }

    pub fn is_dead_end(&self, state: StateId) -> bool {
        self.distances[usize::from(state)] >= DIRTY
    }

    /// Whether `op` taken from `state` to `target` lies on some shortest path to the
    /// goal, i.e. `distance(state) == lift(cost(op)) + distance(target)`.
    pub fn is_optimal_transition(&self, abstraction: &Abstraction, state: StateId, op: OpId, target: StateId) -> bool {
        let d_state = self.distances[usize::from(state)];
        let d_target = self.distances[usize::from(target)];
        if d_state >= DIRTY || d_target >= DIRTY {
            return false;
        }
        d_state == d_target.saturating_add(lift(abstraction.operator_cost(op)))
    }

    /// The operator sequence along the shortest-path tree from `state` to a goal
    /// state.
    pub fn extract_solution(&self, mut state: StateId) -> Vec<OpId> {
        let mut ops = Vec::new();
        while let Some((op, succ)) = self.shortest_path_successor[usize::from(state)] {
            ops.push(op);
            state = succ;
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::{Abstraction, OracleStrategy};
    use cegar_task::{ExplicitOperator, ExplicitTask, Fact, Var};

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
    fn trivial_abstraction_has_zero_distance() {
        let task = chain_task();
        let mut abs = Abstraction::new(&task, OracleStrategy::Explicit);
        abs.mark_all_states_as_goals();
        let sp = ShortestPaths::recompute(&abs);
        assert_eq!(sp.distance(abs.initial_state_id()), 0);
    }

    #[test]
    fn split_chain_has_increasing_distance_to_goal() {
        let task = chain_task();
        let mut abs = Abstraction::new(&task, OracleStrategy::Explicit);
        let mut wanted = fixedbitset::FixedBitSet::with_capacity(3);
        wanted.insert(2);
        let (not_goal, goal) = abs.refine(abs.initial_state_id(), 0, &wanted, &[2]);
        let sp = ShortestPaths::recompute(&abs);
        assert_eq!(sp.distance(goal), 0);
        assert!(sp.distance(not_goal) > 0);
    }

    /// P9: a path mixing a zero-cost edge with a positive-cost edge must round-trip to
    /// the true summed cost, not `true_cost + (number of edges) - 1` — the bug a naive
    /// `cost + 1` lift (instead of shifting non-zero costs into the high 32 bits)
    /// would produce on a multi-edge path.
    #[test]
    fn zero_cost_edge_does_not_inflate_a_multi_edge_distance() {
        let task = ExplicitTask::new(
            vec![3],
            vec![0],
            vec![Fact::new(Var(0), 2)],
            vec![
                ExplicitOperator::new("free", 0, vec![Fact::new(Var(0), 0)], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("paid", 5, vec![Fact::new(Var(0), 1)], vec![Fact::new(Var(0), 2)]),
            ],
        )
        .unwrap();
        let mut abs = Abstraction::new(&task, OracleStrategy::Explicit);
        let initial = abs.initial_state_id();

        let mut wanted = fixedbitset::FixedBitSet::with_capacity(3);
        wanted.insert(2);
        let (rest, goal) = abs.refine(initial, 0, &wanted, &[2]);

        let mut wanted = fixedbitset::FixedBitSet::with_capacity(3);
        wanted.insert(1);
        let (v0, v1) = abs.refine(rest, 0, &wanted, &[1]);

        let sp = ShortestPaths::recompute(&abs);
        assert_eq!(sp.distance(goal), 0);
        assert_eq!(sp.distance(v1), 5);
        assert_eq!(sp.distance(v0), 5);
    }

    /// I2/P6: `update_incrementally` must stay pointwise equal to `recompute` after
    /// every split, even when a predecessor's own recorded edge survives syntactically.
    /// A `P -> D -> G` chain where splitting `D` strips away its cheap route to the
    /// goal (leaving only a costlier detour) must raise `D`'s distance *and* propagate
    /// that increase to `P`, whose `op -> D` edge is untouched by the split (`D` keeps
    /// its old state id as the "not wanted" side of the split). A dirty-marking pass
    /// that only checks "does my own successor edge still resolve" misses this: `P`'s
    /// edge still resolves, so `P` is never marked dirty, and keeps a stale distance
    /// that is too low to be admissible.
    #[test]
    fn predecessor_distance_is_raised_when_its_successors_cheap_route_is_split_away() {
        let task = ExplicitTask::new(
            vec![5],
            vec![0],
            vec![Fact::new(Var(0), 4)],
            vec![
                ExplicitOperator::new("p_to_d", 1, vec![Fact::new(Var(0), 0)], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("d_cheap", 1, vec![Fact::new(Var(0), 2)], vec![Fact::new(Var(0), 4)]),
                ExplicitOperator::new("d_detour", 20, vec![Fact::new(Var(0), 3)], vec![Fact::new(Var(0), 4)]),
            ],
        )
        .unwrap();
        let mut abs = Abstraction::new(&task, OracleStrategy::Explicit);
        let mut sp = ShortestPaths::recompute(&abs);

        // Split off the goal value.
        let mut wanted = fixedbitset::FixedBitSet::with_capacity(5);
        wanted.insert(4);
        let (rest, goal_state) = abs.refine(abs.initial_state_id(), 0, &wanted, &[4]);
        sp.update_incrementally(&abs, rest, goal_state);

        // Split off `P` (value 0) from the rest, leaving `D_all = {1, 2, 3}`.
        let mut wanted = fixedbitset::FixedBitSet::with_capacity(5);
        wanted.insert(0);
        let (d_all, p) = abs.refine(rest, 0, &wanted, &[0]);
        sp.update_incrementally(&abs, d_all, p);
        assert_eq!(sp.distance(d_all), 1);
        assert_eq!(sp.distance(p), 2);

        // Split off `D`'s cheap-route value (2) into its own state; `D` (old id,
        // domain {1, 3}) keeps `p_to_d`'s target (value 1) but loses `d_cheap`,
        // leaving only the cost-20 `d_detour` via value 3.
        let mut wanted = fixedbitset::FixedBitSet::with_capacity(5);
        wanted.insert(2);
        let (d, d_cheap_state) = abs.refine(d_all, 0, &wanted, &[2]);
        sp.update_incrementally(&abs, d, d_cheap_state);

        assert_eq!(sp.distance(d_cheap_state), 1);
        assert_eq!(sp.distance(d), 20);
        assert_eq!(sp.distance(p), 21);
    }
}
