//! Debug DOT-graph export for a built `Abstraction` -- no other persisted wire format
//! exists in this crate beyond this debug rendering.
//!
//! Grounded on the `create_dot_graph` convention common to Fast Downward-family
//! planners: goal states render as `doublecircle`, non-goal states as plain `circle`,
//! the initial state gets an incoming edge from a synthetic `start` node, and parallel
//! transitions between the same pair of states are merged into one edge whose label is
//! the sorted, comma-joined list of operator names.

use crate::abstraction::Abstraction;
use cegar_task::{OpId, PlanningTask};
use env_param::EnvParam;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Mirrors a `dot_graph_verbosity`-style plugin option, kept as a rarely-tuned env-var
/// escape hatch rather than a `CegarConfig` field: whether `Cegar::build` logs a DOT
/// rendering of the finished abstraction at `debug!` level when it stops refining.
static WRITE_DOT_GRAPH: EnvParam<bool> = EnvParam::new("CEGAR_WRITE_DOT_GRAPH", "false");

pub fn dot_graph_requested() -> bool {
    WRITE_DOT_GRAPH.get()
}

/// Renders `abstraction` as a Graphviz `digraph`. `task` supplies operator names for
/// edge labels; it must be the same task (or an ancestor with matching operator
/// numbering) the abstraction was built for.
pub fn to_dot(abstraction: &Abstraction, task: &dyn PlanningTask) -> String {
    let mut out = String::new();
    writeln!(out, "digraph transition_system {{").unwrap();
    writeln!(out, "    node [shape = none] start;").unwrap();
    for &state in abstraction.state_ids() {
        let shape = if abstraction.is_goal(state) { "doublecircle" } else { "circle" };
        writeln!(out, "    node [shape = {shape}] {};", usize::from(state)).unwrap();
        if state == abstraction.initial_state_id() {
            writeln!(out, "    start -> {};", usize::from(state)).unwrap();
        }
    }
    for &state in abstraction.state_ids() {
        let mut parallel: BTreeMap<usize, Vec<OpId>> = BTreeMap::new();
        for t in abstraction.outgoing(state) {
            parallel.entry(usize::from(t.target)).or_default().push(t.op);
        }
        for (target, mut ops) in parallel {
            ops.sort_by_key(|&op| usize::from(op));
            let names: Vec<&str> = ops.iter().map(|&op| task.operator_name(op)).collect();
            writeln!(
                out,
                "    {} -> {} [label = \"{}\"];",
                usize::from(state),
                target,
                names.join(", ")
            )
            .unwrap();
        }
    }
    writeln!(out, "}}").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::{Abstraction, OracleStrategy};
    use cegar_task::explicit::{ExplicitOperator, ExplicitTask};
    use cegar_task::{Fact, Var};

    #[test]
    fn trivial_abstraction_renders_one_doublecircle_goal_state() {
        let task = ExplicitTask::new(
            vec![2],
            vec![0],
            vec![],
            vec![ExplicitOperator::new("o", 1, vec![], vec![Fact::new(Var(0), 1)])],
        )
        .unwrap();
        let abstraction = Abstraction::new(&task, OracleStrategy::Explicit);
        let dot = to_dot(&abstraction, &task);
        assert!(dot.contains("digraph transition_system"));
        assert!(dot.contains("node [shape = doublecircle] 0;"));
        assert!(dot.contains("start -> 0;"));
        assert!(dot.contains("0 -> 0 [label = \"o\"];"));
    }

    #[test]
    fn split_abstraction_separates_goal_from_non_goal_shapes() {
        let task = ExplicitTask::new(
            vec![2],
            vec![0],
            vec![Fact::new(Var(0), 1)],
            vec![ExplicitOperator::new("o", 1, vec![], vec![Fact::new(Var(0), 1)])],
        )
        .unwrap();
        let mut abstraction = Abstraction::new(&task, OracleStrategy::Explicit);
        let domain_size = abstraction.cartesian_set(abstraction.initial_state_id()).domain_size(0);
        let mut wanted = fixedbitset::FixedBitSet::with_capacity(domain_size);
        wanted.insert(1);
        abstraction.refine(abstraction.initial_state_id(), 0, &wanted, &[1]);
        let dot = to_dot(&abstraction, &task);
        assert!(dot.contains("doublecircle"));
        assert!(dot.contains("circle"));
    }
}
