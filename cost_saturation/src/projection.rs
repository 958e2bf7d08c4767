//! Projections (pattern databases): the abstraction family defined by a subset `P` of
//! task variables, where two concrete states are equivalent iff they agree on `P`.
//!
//! Grounded on the ranked-state projection encoding (`multiply_out`) and the eager
//! explicit-transition-graph construction of pattern-database heuristics, plus the
//! saturated-cost floor policy shared with `AbstractionLike`.

use crate::abstraction_like::{AbstractionLike, Transition};
use cegar_task::{OpId, PlanningTask, Var};
use fixedbitset::FixedBitSet;
use std::collections::HashMap;

/// A pattern: an ordered subset of task variables. Order fixes the mixed-radix rank
/// encoding: `m_0 = 1`, `m_i = m_{i-1} * |dom(P[i-1])|`.
#[derive(Debug, Clone)]
pub struct Pattern(pub Vec<Var>);

/// Whether a `Projection` materializes its transition graph once up front (`Explicit`,
/// trading memory for fast repeated queries) or recomputes it on demand from the
/// ranked operators every time it is asked (`Ranked`, trading CPU for near-zero
/// storage). Both must produce identical goal distances and saturated costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionRepresentation {
    Explicit,
    Ranked,
}

/// One operator's precondition/effect restricted to a pattern, keyed so that operators
/// inducing the exact same set of transitions collapse into one group (a label
/// reduction). Grouping by equal `(pre, eff)` is a sufficient (if slightly
/// conservative) condition for equal induced transitions, and lets
/// `for_each_transition` simply replay one group's edges for every member operator --
/// which, by construction, gives every member operator in the group the exact same
/// saturated cost, resolving label/operator saturation agreement by construction
/// rather than by a special-cased broadcast step.
struct OperatorGroup {
    members: Vec<OpId>,
    /// `(local pattern index, required value)`, sorted by local index.
    pre: Vec<(usize, i32)>,
    /// `(local pattern index, new value)`, sorted by local index.
    eff: Vec<(usize, i32)>,
}

pub struct Projection {
    pattern: Vec<Var>,
    domain_sizes: Vec<usize>,
    multipliers: Vec<usize>,
    num_states: usize,
    num_operators: usize,
    goal_states: Vec<usize>,
    groups: Vec<OperatorGroup>,
    looping_operators: FixedBitSet,
    representation: ProjectionRepresentation,
    /// Populated only when `representation == Explicit`.
    explicit_transitions: Vec<Transition>,
}

fn local_index_map(pattern: &[Var]) -> HashMap<usize, usize> {
    pattern.iter().enumerate().map(|(i, &v)| (usize::from(v), i)).collect()
}

/// Visits every rank whose decoded values satisfy every `(local_index, value)`
/// constraint in `pre`, without ever touching a rank that fails to match (the
/// "keyed by precondition hash" lookup of a match tree, specialized to the mixed-radix
/// encoding: the constrained dimensions contribute a fixed base rank, and only the
/// free dimensions are enumerated).
fn enumerate_matching_ranks(
    domain_sizes: &[usize],
    multipliers: &[usize],
    pre: &[(usize, i32)],
    mut callback: impl FnMut(usize),
) {
    let pre_vars: Vec<usize> = pre.iter().map(|&(v, _)| v).collect();
    let base: usize = pre.iter().map(|&(v, val)| multipliers[v] * val as usize).sum();
    let free_dims: Vec<(usize, usize)> = (0..domain_sizes.len())
        .filter(|v| !pre_vars.contains(v))
        .map(|v| (multipliers[v], domain_sizes[v]))
        .collect();
    if free_dims.is_empty() {
        callback(base);
        return;
    }
    let mut counters = vec![0usize; free_dims.len()];
    loop {
        let offset: usize = counters.iter().zip(&free_dims).map(|(&c, &(m, _))| c * m).sum();
        callback(base + offset);
        let mut pos = 0;
        loop {
            if pos == counters.len() {
                return;
            }
            counters[pos] += 1;
            if counters[pos] < free_dims[pos].1 {
                break;
            }
            counters[pos] = 0;
            pos += 1;
        }
    }
}

impl Projection {
    pub fn build(task: &dyn PlanningTask, pattern: Pattern, representation: ProjectionRepresentation) -> Self {
        let pattern = pattern.0;
        let local_idx = local_index_map(&pattern);
        let domain_sizes: Vec<usize> = pattern.iter().map(|&v| task.domain_size(v)).collect();
        let mut multipliers = vec![1usize; pattern.len()];
        for i in 1..pattern.len() {
            multipliers[i] = multipliers[i - 1] * domain_sizes[i - 1];
        }
        let num_states: usize = multipliers.last().copied().unwrap_or(1) * domain_sizes.last().copied().unwrap_or(1);
        let num_states = if pattern.is_empty() { 1 } else { num_states };

        let mut grouped: HashMap<(Vec<(usize, i32)>, Vec<(usize, i32)>), Vec<OpId>> = HashMap::new();
        for op_idx in 0..task.num_operators() {
            let op = OpId::from(op_idx);
            let mut pre: Vec<(usize, i32)> = task
                .preconditions(op)
                .iter()
                .filter_map(|f| local_idx.get(&usize::from(f.var)).map(|&li| (li, f.value)))
                .collect();
            pre.sort_unstable();
            let mut eff: Vec<(usize, i32)> = task
                .effects(op)
                .iter()
                .filter_map(|f| local_idx.get(&usize::from(f.var)).map(|&li| (li, f.value)))
                .collect();
            eff.sort_unstable();
            grouped.entry((pre, eff)).or_default().push(op);
        }
        let groups: Vec<OperatorGroup> = grouped
            .into_iter()
            .map(|((pre, eff), members)| OperatorGroup { members, pre, eff })
            .collect();

        let mut goal_states = Vec::new();
        let mut restricted_goal: Vec<(usize, i32)> = task
            .goal()
            .iter()
            .filter_map(|f| local_idx.get(&usize::from(f.var)).map(|&li| (li, f.value)))
            .collect();
        restricted_goal.sort_unstable();
        enumerate_matching_ranks(&domain_sizes, &multipliers, &restricted_goal, |rank| goal_states.push(rank));

        let mut looping_operators = FixedBitSet::with_capacity(task.num_operators());
        let mut explicit_transitions = Vec::new();
        for group in &groups {
            enumerate_matching_ranks(&domain_sizes, &multipliers, &group.pre, |src| {
                let mut values = decode(src, &domain_sizes, &multipliers);
                for &(v, val) in &group.eff {
                    values[v] = val;
                }
                let target = encode(&values, &multipliers);
                if target == src {
                    for &op in &group.members {
                        looping_operators.insert(usize::from(op));
                    }
                } else if representation == ProjectionRepresentation::Explicit {
                    for &op in &group.members {
                        explicit_transitions.push(Transition { src, op, target });
                    }
                }
            });
        }

        Projection {
            pattern,
            domain_sizes,
            multipliers,
            num_states,
            num_operators: task.num_operators(),
            goal_states,
            groups,
            looping_operators,
            representation,
            explicit_transitions,
        }
    }

    pub fn pattern(&self) -> &[Var] {
        &self.pattern
    }

    pub fn rank(&self, values: &[i32]) -> usize {
        let local_idx = local_index_map(&self.pattern);
        let mut local_values = vec![0i32; self.pattern.len()];
        for (&var, &li) in local_idx.iter() {
            local_values[li] = values[var];
        }
        encode(&local_values, &self.multipliers)
    }
}

fn decode(rank: usize, domain_sizes: &[usize], multipliers: &[usize]) -> Vec<i32> {
    (0..domain_sizes.len())
        .map(|v| ((rank / multipliers[v]) % domain_sizes[v]) as i32)
        .collect()
}

fn encode(values: &[i32], multipliers: &[usize]) -> usize {
    values.iter().zip(multipliers).map(|(&v, &m)| v as usize * m).sum()
}

impl AbstractionLike for Projection {
    fn num_states(&self) -> usize {
        self.num_states
    }

    fn num_operators(&self) -> usize {
        self.num_operators
    }

    fn goal_states(&self) -> &[usize] {
        &self.goal_states
    }

    fn abstract_state_id(&self, state: &[i32]) -> usize {
        self.rank(state)
    }

    fn for_each_transition(&self, callback: &mut dyn FnMut(Transition)) {
        match self.representation {
            ProjectionRepresentation::Explicit => {
                for &t in &self.explicit_transitions {
                    callback(t);
                }
            }
            ProjectionRepresentation::Ranked => {
                for group in &self.groups {
                    enumerate_matching_ranks(&self.domain_sizes, &self.multipliers, &group.pre, |src| {
                        let mut values = decode(src, &self.domain_sizes, &self.multipliers);
                        for &(v, val) in &group.eff {
                            values[v] = val;
                        }
                        let target = encode(&values, &self.multipliers);
                        if target != src {
                            for &op in &group.members {
                                callback(Transition { src, op, target });
                            }
                        }
                    });
                }
            }
        }
    }

    fn looping_operators(&self) -> &FixedBitSet {
        &self.looping_operators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cegar_task::explicit::{ExplicitOperator, ExplicitTask};
    use cegar_task::Fact;

    fn two_var_task() -> ExplicitTask {
        ExplicitTask::new(
            vec![2, 3],
            vec![0, 0],
            vec![Fact::new(Var(0), 1), Fact::new(Var(1), 2)],
            vec![
                ExplicitOperator::new("a", 1, vec![], vec![Fact::new(Var(0), 1)]),
                ExplicitOperator::new("b", 2, vec![Fact::new(Var(1), 0)], vec![Fact::new(Var(1), 1)]),
                ExplicitOperator::new("c", 1, vec![Fact::new(Var(1), 1)], vec![Fact::new(Var(1), 2)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn projection_on_single_var_has_matching_state_count() {
        let task = two_var_task();
        let proj = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        assert_eq!(proj.num_states(), 3);
        assert_eq!(proj.goal_states(), &[2]);
    }

    #[test]
    fn explicit_and_ranked_projections_agree_on_goal_distances() {
        let task = two_var_task();
        let costs: Vec<i32> = (0..task.num_operators()).map(|o| task.operator_cost(OpId::from(o))).collect();
        let explicit = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Explicit);
        let ranked = Projection::build(&task, Pattern(vec![Var(1)]), ProjectionRepresentation::Ranked);
        assert_eq!(explicit.compute_goal_distances(&costs), ranked.compute_goal_distances(&costs));
    }

    #[test]
    fn two_variable_pattern_covers_whole_task() {
        let task = two_var_task();
        let proj = Projection::build(&task, Pattern(vec![Var(0), Var(1)]), ProjectionRepresentation::Explicit);
        assert_eq!(proj.num_states(), 6);
        let rank0 = proj.rank(&[0, 0]);
        assert_eq!(rank0, 0);
        let costs: Vec<i32> = (0..task.num_operators()).map(|o| task.operator_cost(OpId::from(o))).collect();
        let distances = proj.compute_goal_distances(&costs);
        // shortest path to goal (v0=1, v1=2) from (0,0) is a(cost1)+b(cost2)+c(cost1) = 4
        assert_eq!(distances[rank0], 4);
    }
}
