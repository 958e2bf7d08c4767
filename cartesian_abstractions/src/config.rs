//! `CegarConfig`: the knobs a driver sets per CEGAR run, mirroring the constructor
//! parameters of a CEGAR-based abstraction builder. Plain Rust values rather than a
//! plugin-registry schema, since there is no CLI/plugin surface in this crate.

use crate::abstraction::OracleStrategy;
use crate::flaw_search::FlawStrategy;
use crate::split_selector::SplitStrategy;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CegarConfig {
    pub max_states: usize,
    pub max_transitions: usize,
    pub max_time: Option<Duration>,
    pub pick_flawed_abstract_state: FlawStrategy,
    pub pick_split: SplitStrategy,
    pub tiebreak_split: SplitStrategy,
    pub max_concrete_states_per_abstract_state: usize,
    pub max_state_expansions: usize,
    pub transition_representation: OracleStrategy,
}

impl Default for CegarConfig {
    /// Matches the original's defaults: unbounded-ish state/transition caps meant to be
    /// overridden per experiment, `MaxHAdd` splitting with `MinUnwanted` as tiebreak, and
    /// the explicit transition store.
    fn default() -> Self {
        CegarConfig {
            max_states: 10_000,
            max_transitions: 1_000_000,
            max_time: Some(Duration::from_secs(60)),
            pick_flawed_abstract_state: FlawStrategy::First,
            pick_split: SplitStrategy::MaxHAdd,
            tiebreak_split: SplitStrategy::MinUnwanted,
            max_concrete_states_per_abstract_state: infinite_witness_cap(),
            max_state_expansions: usize::MAX,
            transition_representation: OracleStrategy::Explicit,
        }
    }
}

fn infinite_witness_cap() -> usize {
    usize::MAX
}
