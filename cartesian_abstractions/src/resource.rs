//! Cooperative cutoffs for the CEGAR refinement loop: a state/transition budget, a
//! wall-clock deadline, and a memory-padding reservation, mirroring the four stop
//! conditions a CEGAR planner checks between refinement steps.
//!
//! Safe Rust has no allocator failure hook to release the padding automatically (a
//! C++ planner can release it from a malloc new-handler); instead a driver that
//! catches an allocation failure from a `try_reserve`-based path calls
//! `release_padding` itself.

use env_param::EnvParam;
use std::time::{Duration, Instant};

/// Size of the pre-allocated padding reserved by `ResourceBudget::new`, tunable the way
/// the original exposes `utils::extra_memory_padding_mb` as a rarely-touched build knob
/// rather than a per-run `Config` field.
static MEMORY_PADDING_BYTES: EnvParam<u32> = EnvParam::new("CEGAR_MEMORY_PADDING_BYTES", "8388608");

pub struct ResourceBudget {
    deadline: Option<Instant>,
    max_states: usize,
    max_stored_transitions: usize,
    padding: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxStates,
    MaxTransitions,
    TimeLimit,
    MemoryLimit,
    Solved,
    Unsolvable,
}

impl ResourceBudget {
    pub fn new(max_states: usize, max_stored_transitions: usize, max_time: Option<Duration>) -> Self {
        let padding_len = MEMORY_PADDING_BYTES.get() as usize;
        ResourceBudget {
            deadline: max_time.map(|d| Instant::now() + d),
            max_states,
            max_stored_transitions,
            padding: Some(vec![0u8; padding_len]),
        }
    }

    pub fn is_time_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn is_padding_reserved(&self) -> bool {
        self.padding.is_some()
    }

    /// Releases the reserved padding, giving the allocator the room back. Call this
    /// once, from the point where a fallible allocation reports failure.
    pub fn release_padding(&mut self) {
        self.padding = None;
    }

    /// Returns the first limit hit by `(num_states, num_stored_transitions)`, if any,
    /// checked in the same order as the original's `may_keep_refining`.
    pub fn check(&self, num_states: usize, num_stored_transitions: usize) -> Option<StopReason> {
        if num_states >= self.max_states {
            Some(StopReason::MaxStates)
        } else if num_stored_transitions >= self.max_stored_transitions {
            Some(StopReason::MaxTransitions)
        } else if self.is_time_expired() {
            Some(StopReason::TimeLimit)
        } else if !self.is_padding_reserved() {
            Some(StopReason::MemoryLimit)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_stops_at_max_states() {
        let budget = ResourceBudget::new(2, usize::MAX, None);
        assert_eq!(budget.check(2, 0), Some(StopReason::MaxStates));
        assert_eq!(budget.check(1, 0), None);
    }

    #[test]
    fn releasing_padding_reports_memory_limit() {
        let mut budget = ResourceBudget::new(100, usize::MAX, None);
        assert_eq!(budget.check(1, 0), None);
        budget.release_padding();
        assert_eq!(budget.check(1, 0), Some(StopReason::MemoryLimit));
    }
}
