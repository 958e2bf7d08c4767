//! `FlawSearch`: a forward search over concrete states, restricted to f-optimal
//! abstract transitions, that collects the points where the abstraction's claim
//! about a concrete state turns out to be wrong, then picks one to refine.
//!
//! Grounded on the best-first search loop and the `PickFlawedAbstractState` strategy
//! family of a CEGAR-based abstraction refiner. `FirstOnShortestPath` (a legacy mode
//! that walks the shortest-path tree instead of searching) is left out: every other
//! strategy already subsumes it for a correctly built shortest-path tree.

use crate::abstraction::Abstraction;
use crate::ids::StateId;
use crate::shortest_paths::ShortestPaths;
use cegar_task::{self as task, ExplicitTask, OpId, PlanningTask, INF};
use rand::Rng;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A concrete counterexample to the current abstraction's optimistic cost estimate.
#[derive(Debug, Clone)]
pub enum Flaw {
    /// `state` is an abstract goal state, but `concrete` (which resolves to it) is not
    /// actually a goal state in the task. Splitting should separate `concrete`'s
    /// values for the goal variables from the rest of `state`.
    Goal { state: StateId, concrete: Vec<i32> },
    /// `op` is applicable from `state` along an f-optimal abstract transition, but
    /// `concrete` (which resolves to `state`) does not satisfy `op`'s precondition.
    Precondition { state: StateId, concrete: Vec<i32>, op: OpId },
    /// `op` is applicable from `state` along an f-optimal abstract transition to
    /// `target`, `concrete` (which resolves to `state`) satisfies `op`'s precondition,
    /// but `successor` (the concrete state `op` actually produces) resolves to some
    /// abstract state other than `target`. Splitting must separate `successor`'s value
    /// on some `op`-unaffected variable from `target`'s domain on it (§4.6).
    Deviation { state: StateId, concrete: Vec<i32>, op: OpId, target: StateId, successor: Vec<i32> },
}

impl Flaw {
    pub fn state(&self) -> StateId {
        match self {
            Flaw::Goal { state, .. } => *state,
            Flaw::Precondition { state, .. } => *state,
            Flaw::Deviation { state, .. } => *state,
        }
    }

    pub fn concrete(&self) -> &[i32] {
        match self {
            Flaw::Goal { concrete, .. } => concrete,
            Flaw::Precondition { concrete, .. } => concrete,
            Flaw::Deviation { concrete, .. } => concrete,
        }
    }
}

/// Which flawed abstract state to refine when a search surfaces more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlawStrategy {
    /// Stop at the very first flaw encountered; cheapest, least informed.
    First,
    /// Collect every flaw the search reaches, then pick one uniformly at random.
    Random,
    /// Collect every flaw, then pick one whose abstract state has the lowest goal
    /// distance (ties broken uniformly at random).
    MinH,
    /// As `MinH`, but highest goal distance; a goal check no longer ends the search
    /// early, since a deeper, harder-to-reach flaw might still be found.
    MaxH,
    /// Like `MinH`, but accumulates every witness seen for the chosen abstract state
    /// before handing it to the split selector, instead of a single witness.
    BatchMinH,
}

struct SearchNode {
    g: i32,
    concrete: Vec<i32>,
    abstract_state: StateId,
}

impl SearchNode {
    fn f(&self, h: i32) -> i32 {
        self.g.saturating_add(h)
    }
}

/// One abstract state's accumulated flaw evidence.
struct FlawedState {
    abstract_state: StateId,
    h: i32,
    witnesses: Vec<Flaw>,
}

pub enum SearchResult {
    /// A concrete path to a goal state was found that stays on f-optimal abstract
    /// transitions the whole way: the abstraction's estimate was tight.
    Solved,
    /// The search ran out of f-optimal successors before reaching a flaw or a goal.
    Unsolvable,
    Flawed(Flaw),
}

pub struct FlawSearch {
    strategy: FlawStrategy,
    /// Per-abstract-state concrete witness cap, mirroring the original's
    /// `max_concrete_states_per_abstract_state` (new witnesses are dropped once full).
    max_witnesses_per_state: usize,
}

impl FlawSearch {
    pub fn new(strategy: FlawStrategy, max_witnesses_per_state: usize) -> Self {
        FlawSearch { strategy, max_witnesses_per_state }
    }

    /// Explores concrete states reachable via abstract transitions the shortest-path
    /// tree considers optimal, breadth-first by `g`-cost, and reports the flaw picked
    /// by `self.strategy`.
    pub fn search(
        &self,
        task: &ExplicitTask,
        abstraction: &Abstraction,
        shortest_paths: &ShortestPaths,
        rng: &mut impl Rng,
    ) -> SearchResult {
        let initial = task.initial_state().to_vec();
        let initial_abstract = abstraction.resolve_state(&initial);
        if shortest_paths.is_dead_end(initial_abstract) {
            return SearchResult::Unsolvable;
        }

        let mut open: BinaryHeap<Reverse<(i32, usize)>> = BinaryHeap::new();
        let mut nodes = vec![SearchNode { g: 0, concrete: initial, abstract_state: initial_abstract }];
        open.push(Reverse((nodes[0].f(shortest_paths.distance(initial_abstract)), 0)));
        let mut visited = std::collections::HashSet::new();
        let mut flawed_states: Vec<FlawedState> = Vec::new();

        while let Some(Reverse((_, idx))) = open.pop() {
            let (g, concrete, abstract_state) = {
                let n = &nodes[idx];
                (n.g, n.concrete.clone(), n.abstract_state)
            };
            if !visited.insert(concrete.clone()) {
                continue;
            }

            if task::is_goal_state(task, &concrete) && self.strategy != FlawStrategy::MaxH {
                return SearchResult::Solved;
            }

            let mut found_flaw_here = false;
            for transition in abstraction.outgoing(abstract_state) {
                if !shortest_paths.is_optimal_transition(abstraction, abstract_state, transition.op, transition.target) {
                    continue;
                }
                if !task::is_applicable(task, &concrete, transition.op) {
                    if !found_flaw_here {
                        let flaw = Flaw::Precondition { state: abstract_state, concrete: concrete.clone(), op: transition.op };
                        if self.record_flaw(&mut flawed_states, shortest_paths, flaw) {
                            return self.finish(flawed_states, rng);
                        }
                        found_flaw_here = true;
                    }
                    if self.strategy == FlawStrategy::First {
                        break;
                    }
                    continue;
                }
                let successor = task::apply_effects(task, &concrete, transition.op);
                let resolved = abstraction.resolve_state(&successor);
                if resolved != transition.target {
                    if !found_flaw_here {
                        let flaw = Flaw::Deviation {
                            state: abstract_state,
                            concrete: concrete.clone(),
                            op: transition.op,
                            target: transition.target,
                            successor: successor.clone(),
                        };
                        if self.record_flaw(&mut flawed_states, shortest_paths, flaw) {
                            return self.finish(flawed_states, rng);
                        }
                        found_flaw_here = true;
                    }
                    if self.strategy == FlawStrategy::First {
                        break;
                    }
                    continue;
                }
                let new_g = g.saturating_add(task.operator_cost(transition.op));
                let node_idx = nodes.len();
                nodes.push(SearchNode { g: new_g, concrete: successor, abstract_state: resolved });
                let h = shortest_paths.distance(resolved);
                open.push(Reverse((nodes[node_idx].f(h), node_idx)));
                if self.strategy == FlawStrategy::First {
                    break;
                }
            }
            if abstraction.is_goal(abstract_state) && self.strategy == FlawStrategy::MaxH && !found_flaw_here {
                let flaw = Flaw::Goal { state: abstract_state, concrete: concrete.clone() };
                if task::is_goal_state(task, &concrete) {
                    // a genuine concrete goal under MaxH: not a flaw, just doesn't stop the search.
                } else if self.record_flaw(&mut flawed_states, shortest_paths, flaw) {
                    return self.finish(flawed_states, rng);
                }
            } else if abstraction.is_goal(abstract_state) && !task::is_goal_state(task, &concrete) && !found_flaw_here {
                let flaw = Flaw::Goal { state: abstract_state, concrete: concrete.clone() };
                if self.record_flaw(&mut flawed_states, shortest_paths, flaw) {
                    return self.finish(flawed_states, rng);
                }
            }
        }
        self.finish(flawed_states, rng)
    }

    /// Adds `flaw` to the per-abstract-state witness batch. Returns `true` iff the
    /// caller should stop searching immediately (only for `FlawStrategy::First`).
    fn record_flaw(&self, flawed_states: &mut Vec<FlawedState>, shortest_paths: &ShortestPaths, flaw: Flaw) -> bool {
        let state = flaw.state();
        let h = shortest_paths.distance(state);
        if let Some(existing) = flawed_states.iter_mut().find(|f| f.abstract_state == state) {
            if existing.witnesses.len() < self.max_witnesses_per_state {
                existing.witnesses.push(flaw);
            }
        } else {
            flawed_states.push(FlawedState { abstract_state: state, h, witnesses: vec![flaw] });
        }
        self.strategy == FlawStrategy::First
    }

    fn finish(&self, mut flawed_states: Vec<FlawedState>, rng: &mut impl Rng) -> SearchResult {
        if flawed_states.is_empty() {
            return SearchResult::Solved;
        }
        let chosen_idx = match self.strategy {
            FlawStrategy::First => 0,
            FlawStrategy::Random => rng.random_range(0..flawed_states.len()),
            FlawStrategy::MinH => {
                let best_h = flawed_states.iter().map(|f| f.h).min().unwrap_or(INF);
                let candidates: Vec<usize> = (0..flawed_states.len()).filter(|&i| flawed_states[i].h == best_h).collect();
                candidates[rng.random_range(0..candidates.len())]
            }
            FlawStrategy::MaxH | FlawStrategy::BatchMinH => {
                let extreme = if self.strategy == FlawStrategy::MaxH {
                    flawed_states.iter().map(|f| f.h).max().unwrap_or(0)
                } else {
                    flawed_states.iter().map(|f| f.h).min().unwrap_or(INF)
                };
                let candidates: Vec<usize> = (0..flawed_states.len()).filter(|&i| flawed_states[i].h == extreme).collect();
                candidates[rng.random_range(0..candidates.len())]
            }
        };
        let chosen = flawed_states.swap_remove(chosen_idx);
        let witness_idx = rng.random_range(0..chosen.witnesses.len());
        SearchResult::Flawed(chosen.witnesses.into_iter().nth(witness_idx).expect("witness just selected"))
    }
}
