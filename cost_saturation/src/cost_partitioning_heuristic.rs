//! `CostPartitioningHeuristic`: the per-order lookup-table result of a single cost
//! partitioning run over an `AbstractionCollection`.
//!
//! Grounded on the lookup-table convention of cost-partitioning heuristics: a table
//! is only stored for an abstraction if at least one of its states has a positive
//! heuristic value (an all-zero table contributes nothing and is dropped to keep
//! memory proportional to informative abstractions only), and summing two tables for
//! the same abstraction index is `INF`-aware ("left addition": either side `INF`
//! makes the sum `INF`).

use cegar_task::INF;

fn add_h(a: i32, b: i32) -> i32 {
    if a == INF || b == INF {
        INF
    } else {
        a.saturating_add(b)
    }
}

/// One order's contribution: per-abstraction lookup tables, indexed by that
/// abstraction's position in the originating `AbstractionCollection`.
#[derive(Debug, Clone, Default)]
pub struct CostPartitioningHeuristic {
    lookup_tables: Vec<(usize, Vec<i32>)>,
}

impl CostPartitioningHeuristic {
    pub fn new() -> Self {
        CostPartitioningHeuristic::default()
    }

    /// Stores `h_values` for abstraction `abstraction_index`, unless every value is
    /// `<= 0` (a table with no positive entry never changes `compute_heuristic`'s sum,
    /// and the original drops it purely to bound memory).
    pub fn add_h_values(&mut self, abstraction_index: usize, h_values: Vec<i32>) {
        if h_values.iter().any(|&h| h > 0) {
            self.lookup_tables.push((abstraction_index, h_values));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_tables.is_empty()
    }

    pub fn num_tables(&self) -> usize {
        self.lookup_tables.len()
    }

    /// Folds `other`'s tables into `self`, summing entry-by-entry (INF-aware) wherever
    /// both carry a table for the same abstraction index, per `merge_h_values`.
    pub fn merge(&mut self, other: CostPartitioningHeuristic) {
        for (index, values) in other.lookup_tables {
            if let Some((_, existing)) = self.lookup_tables.iter_mut().find(|(i, _)| *i == index) {
                for (e, v) in existing.iter_mut().zip(values.into_iter()) {
                    *e = add_h(*e, v);
                }
            } else {
                self.lookup_tables.push((index, values));
            }
        }
    }

    /// Sums this order's stored tables' values for a state's per-abstraction local ids,
    /// short-circuiting to `INF` as soon as any stored table contributes it.
    pub fn compute_heuristic(&self, local_state_ids: &[usize]) -> i32 {
        let mut total = 0i32;
        for &(index, ref table) in &self.lookup_tables {
            let h = table[local_state_ids[index]];
            if h == INF {
                return INF;
            }
            total = total.saturating_add(h);
        }
        total
    }

    /// Like `compute_heuristic`, but takes the max across stored tables instead of
    /// summing them -- the `use_max` composition mode, which ignores cost
    /// partitioning's admissibility argument in favor of the cheaper max-heuristic one.
    /// `0` for an order with no stored tables, matching the additive case's identity.
    pub fn compute_heuristic_max(&self, local_state_ids: &[usize]) -> i32 {
        let mut best = 0i32;
        for &(index, ref table) in &self.lookup_tables {
            let h = table[local_state_ids[index]];
            if h == INF {
                return INF;
            }
            best = best.max(h);
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_table_is_dropped() {
        let mut cp = CostPartitioningHeuristic::new();
        cp.add_h_values(0, vec![0, 0, 0]);
        assert!(cp.is_empty());
    }

    #[test]
    fn informative_table_is_kept_and_summed() {
        let mut cp = CostPartitioningHeuristic::new();
        cp.add_h_values(0, vec![0, 3, 5]);
        cp.add_h_values(1, vec![2, 0]);
        assert_eq!(cp.compute_heuristic(&[1, 0]), 5);
        assert_eq!(cp.compute_heuristic(&[2, 1]), 5);
    }

    #[test]
    fn infinite_entry_short_circuits() {
        let mut cp = CostPartitioningHeuristic::new();
        cp.add_h_values(0, vec![INF, 1]);
        assert_eq!(cp.compute_heuristic(&[0]), INF);
    }

    #[test]
    fn merge_sums_overlapping_abstraction_tables() {
        let mut a = CostPartitioningHeuristic::new();
        a.add_h_values(0, vec![1, 2]);
        let mut b = CostPartitioningHeuristic::new();
        b.add_h_values(0, vec![3, 4]);
        a.merge(b);
        assert_eq!(a.compute_heuristic(&[0]), 4);
        assert_eq!(a.compute_heuristic(&[1]), 6);
    }
}
