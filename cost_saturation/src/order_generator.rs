//! Order generators: pick a permutation of an `AbstractionCollection`'s abstractions
//! for saturated cost partitioning to consume in.
//!
//! Grounded on the random, greedy, and dynamic-greedy order generators of cost-
//! saturation heuristics (the "stolen cost" ratio: how much heuristic value an
//! abstraction returns per unit of cost it needs), plus a capped systematic
//! permutation search for exhaustive small collections.

use crate::abstraction_collection::AbstractionCollection;
use crate::saturated::reduce_costs;
use rand::seq::SliceRandom;
use rand::Rng;

pub fn random_order(num_abstractions: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..num_abstractions).collect();
    order.shuffle(rng);
    order
}

/// Scores abstraction `i` by `h_i(initial) / used_cost_i`, where `used_cost_i` is the
/// total positive saturated cost it needs under the original costs; ties favor the
/// lower index for determinism. An abstraction that needs no cost but still reports a
/// positive `h_i(initial)` scores as "free" and sorts first.
fn stolen_cost_ratio(h_init: i32, saturated: &[i64]) -> f64 {
    let used_cost: i64 = saturated.iter().filter(|&&s| s > 0).sum();
    if used_cost > 0 {
        h_init as f64 / used_cost as f64
    } else if h_init > 0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Orders abstractions once, by their stolen-cost ratio computed against the
/// collection's original (unpartitioned) costs.
pub fn greedy_order(collection: &AbstractionCollection, initial_state: &[i32], use_general_costs: bool) -> Vec<usize> {
    let local_ids = collection.local_state_ids(initial_state);
    let costs = collection.operator_costs();
    let mut scored: Vec<(usize, f64)> = (0..collection.len())
        .map(|i| {
            let abstraction = collection.get(i);
            let h = abstraction.compute_goal_distances(costs);
            let h_init = h[local_ids[i]];
            let saturated = abstraction.compute_saturated_costs(&h, use_general_costs);
            (i, stolen_cost_ratio(h_init, &saturated))
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then(a.0.cmp(&b.0)));
    scored.into_iter().map(|(i, _)| i).collect()
}

/// Like `greedy_order`, but recomputes every remaining abstraction's ratio against the
/// cost left over after each pick, instead of scoring once against the original costs.
pub fn dynamic_greedy_order(collection: &AbstractionCollection, initial_state: &[i32], use_general_costs: bool) -> Vec<usize> {
    let local_ids = collection.local_state_ids(initial_state);
    let mut remaining = collection.operator_costs().to_vec();
    let mut picked = vec![false; collection.len()];
    let mut order = Vec::with_capacity(collection.len());

    for _ in 0..collection.len() {
        let mut best: Option<(usize, f64)> = None;
        for i in 0..collection.len() {
            if picked[i] {
                continue;
            }
            let abstraction = collection.get(i);
            let h = abstraction.compute_goal_distances(&remaining);
            let h_init = h[local_ids[i]];
            let saturated = abstraction.compute_saturated_costs(&h, use_general_costs);
            let ratio = stolen_cost_ratio(h_init, &saturated);
            if best.map_or(true, |(_, best_ratio)| ratio > best_ratio) {
                best = Some((i, ratio));
            }
        }
        let (chosen, _) = best.expect("at least one unpicked abstraction remains");
        picked[chosen] = true;
        order.push(chosen);
        let abstraction = collection.get(chosen);
        let h = abstraction.compute_goal_distances(&remaining);
        let saturated = abstraction.compute_saturated_costs(&h, use_general_costs);
        reduce_costs(&mut remaining, &saturated);
    }
    order
}

/// Exhaustively enumerates permutations of `0..num_abstractions`, capped at
/// `max_orders` (the collection's factorial growth makes an uncapped search
/// impractical past a handful of abstractions).
pub struct SystematicOrderGenerator {
    orders: Vec<Vec<usize>>,
    next: usize,
}

impl SystematicOrderGenerator {
    pub fn new(num_abstractions: usize, max_orders: usize) -> Self {
        let mut orders = Vec::new();
        let mut perm: Vec<usize> = (0..num_abstractions).collect();
        generate_permutations(&mut perm, 0, &mut orders, max_orders);
        if orders.len() >= max_orders {
            tracing::warn!(num_abstractions, max_orders, "systematic order generator truncated permutation search");
        }
        SystematicOrderGenerator { orders, next: 0 }
    }

    pub fn next_order(&mut self) -> Option<Vec<usize>> {
        let order = self.orders.get(self.next).cloned();
        self.next += 1;
        order
    }
}

fn generate_permutations(perm: &mut Vec<usize>, k: usize, out: &mut Vec<Vec<usize>>, cap: usize) {
    if out.len() >= cap {
        return;
    }
    if k == perm.len() {
        out.push(perm.clone());
        return;
    }
    for i in k..perm.len() {
        if out.len() >= cap {
            return;
        }
        perm.swap(k, i);
        generate_permutations(perm, k + 1, out, cap);
        perm.swap(k, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn systematic_generator_enumerates_all_permutations_of_three() {
        let mut gen = SystematicOrderGenerator::new(3, 100);
        let mut seen = Vec::new();
        while let Some(order) = gen.next_order() {
            seen.push(order);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn systematic_generator_respects_cap() {
        let mut gen = SystematicOrderGenerator::new(4, 5);
        let mut count = 0;
        while gen.next_order().is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
    }

    #[test]
    fn random_order_is_a_permutation() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;
        let mut rng = SmallRng::seed_from_u64(7);
        let mut order = random_order(5, &mut rng);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
