//! Cartesian sets: a box `×_v A_v` with every `A_v` non-empty.

use fixedbitset::FixedBitSet;
use std::rc::Rc;

/// A Cartesian set over all of a task's variables. Every variable's domain subset is
/// non-empty. `domain_sizes` is shared across every Cartesian set of an abstraction
/// (it never changes once the abstraction is built) so splitting only clones the
/// per-variable bitsets, not the domain-size table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartesianSet {
    domain_sizes: Rc<[usize]>,
    domains: Vec<FixedBitSet>,
}

impl CartesianSet {
    /// The full Cartesian set: `A_v = dom(v)` for every variable.
    pub fn full_domain(domain_sizes: Rc<[usize]>) -> Self {
        let domains = domain_sizes.iter().map(|&size| {
            let mut bs = FixedBitSet::with_capacity(size);
            bs.set_range(.., true);
            bs
        }).collect();
        CartesianSet { domain_sizes, domains }
    }

    pub fn num_variables(&self) -> usize {
        self.domains.len()
    }

    pub fn test(&self, var: usize, value: i32) -> bool {
        self.domains[var].contains(value as usize)
    }

    pub fn has_full_domain(&self, var: usize) -> bool {
        self.domains[var].count_ones(..) == self.domain_sizes[var]
    }

    pub fn count(&self, var: usize) -> usize {
        self.domains[var].count_ones(..)
    }

    pub fn domain_size(&self, var: usize) -> usize {
        self.domain_sizes[var]
    }

    pub fn values(&self, var: usize) -> impl Iterator<Item = i32> + '_ {
        self.domains[var].ones().map(|x| x as i32)
    }

    /// `A_v ∩ B_v ≠ ∅` for the given variable.
    pub fn intersects_domain(&self, other: &CartesianSet, var: usize) -> bool {
        !self.domains[var].is_disjoint(&other.domains[var])
    }

    /// `∀v: B_v ⊆ A_v`, i.e. `other` is a (non-strict) subset of `self` on every
    /// variable.
    pub fn includes(&self, other: &CartesianSet) -> bool {
        (0..self.num_variables()).all(|v| other.domains[v].is_subset(&self.domains[v]))
    }

    pub fn includes_fact(&self, var: usize, value: i32) -> bool {
        self.test(var, value)
    }

    /// Clears `values` out of `var`'s domain subset, without requiring the result to
    /// be a proper subset. Used to build the intermediate (not-yet-fully-split)
    /// Cartesian sets of a chained multi-value split's helper nodes.
    pub fn without_values(&self, var: usize, values: &[i32]) -> CartesianSet {
        let mut out = self.clone();
        for &value in values {
            out.domains[var].set(value as usize, false);
        }
        out
    }

    /// Splits `A_v` into `(A_v \ wanted, wanted)`. Both halves must be non-empty;
    /// `wanted` must be a proper, non-empty subset of the current `A_v`.
    ///
    /// # Panics
    /// Panics if `wanted` is empty or equal to the full current domain subset.
    pub fn split_domain(&self, var: usize, wanted: &FixedBitSet) -> (CartesianSet, CartesianSet) {
        let current = &self.domains[var];
        assert!(wanted.count_ones(..) > 0, "wanted set must be non-empty");
        assert!(
            wanted.is_subset(current),
            "wanted set must be a subset of the current domain"
        );
        assert!(
            wanted.count_ones(..) < current.count_ones(..),
            "wanted set must be a proper subset of the current domain"
        );

        let mut remaining = current.clone();
        remaining.difference_with(wanted);
        let mut taken = current.clone();
        taken.intersect_with(wanted);

        let mut left = self.clone();
        left.domains[var] = remaining;
        let mut right = self.clone();
        right.domains[var] = taken;
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full(sizes: &[usize]) -> CartesianSet {
        CartesianSet::full_domain(Rc::from(sizes.to_vec().into_boxed_slice()))
    }

    #[test]
    fn full_domain_has_every_value() {
        let c = full(&[3, 2]);
        assert!(c.has_full_domain(0));
        assert!(c.has_full_domain(1));
        assert_eq!(c.count(0), 3);
        for x in 0..3 {
            assert!(c.test(0, x));
        }
    }

    #[test]
    fn split_preserves_union_and_partitions() {
        let c = full(&[4]);
        let mut wanted = FixedBitSet::with_capacity(4);
        wanted.insert(1);
        wanted.insert(3);
        let (left, right) = c.split_domain(0, &wanted);
        assert_eq!(left.count(0), 2);
        assert_eq!(right.count(0), 2);
        assert!(left.test(0, 0) && left.test(0, 2));
        assert!(right.test(0, 1) && right.test(0, 3));
        assert!(c.includes(&left));
        assert!(c.includes(&right));
        assert!(!left.test(0, 1) && !left.test(0, 3));
    }

    #[test]
    #[should_panic]
    fn split_requires_proper_subset() {
        let c = full(&[2]);
        let mut wanted = FixedBitSet::with_capacity(2);
        wanted.insert(0);
        wanted.insert(1);
        c.split_domain(0, &wanted);
    }
}
