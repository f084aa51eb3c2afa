//! Genetic operators: roulette-wheel selection, order-preserving crossover and
//! swap mutation.
//!
//! Every operator takes its random source explicitly so runs are reproducible from a
//! seed and no global generator is involved.

use crate::heuristics::population::Chromosome;
use rand::prelude::*;

/// Roulette-wheel selection over a fitness vector.
///
/// Index `i` is drawn with probability `fitness[i] / total`. A zero or non-finite total
/// falls back to a uniform pick.
pub fn roulette_select<R: Rng + ?Sized>(fitness: &[f64], rng: &mut R) -> usize {
    debug_assert!(!fitness.is_empty(), "cannot select from an empty population");

    let total: f64 = fitness.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return rng.gen_range(0..fitness.len());
    }

    let point = rng.gen::<f64>() * total;
    roulette_index(fitness, point)
}

/// First index whose cumulative fitness reaches `point`.
///
/// Rounding can leave the running sum a hair below `point`; the last index absorbs that.
pub fn roulette_index(fitness: &[f64], point: f64) -> usize {
    let mut acc = 0.0;
    for (i, &f) in fitness.iter().enumerate() {
        acc += f;
        if acc >= point {
            return i;
        }
    }
    fitness.len().saturating_sub(1)
}

/// Order crossover (OX) with two random cut points `l <= r` drawn over `[0, n-1]`
pub fn order_crossover<R: Rng + ?Sized>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    let n = parent1.len();
    if n == 0 {
        return (parent1.clone(), parent2.clone());
    }

    let a = rng.gen_range(0..n);
    let b = rng.gen_range(0..n);
    let (l, r) = if a <= b { (a, b) } else { (b, a) };

    order_crossover_with_cuts(parent1, parent2, l, r)
}

/// Order crossover with fixed cut points.
///
/// Child 1 keeps `parent1[l..=r]` in place and fills the remaining slots, starting
/// right after `r` and wrapping, with `parent2`'s genes read from the same position
/// and skipping genes already present. Child 2 is the mirror image.
pub fn order_crossover_with_cuts(
    parent1: &Chromosome,
    parent2: &Chromosome,
    l: usize,
    r: usize,
) -> (Chromosome, Chromosome) {
    assert_eq!(parent1.len(), parent2.len(), "parents must have equal length");
    assert!(l <= r && r < parent1.len(), "cut points out of range: l={}, r={}", l, r);

    let child1 = fill_ordered(parent1.genes(), parent2.genes(), l, r);
    let child2 = fill_ordered(parent2.genes(), parent1.genes(), l, r);

    (Chromosome::from_genes(child1), Chromosome::from_genes(child2))
}

fn fill_ordered(primary: &[usize], secondary: &[usize], l: usize, r: usize) -> Vec<usize> {
    let n = primary.len();
    let mut child = vec![usize::MAX; n];
    let mut used = vec![false; n];

    for i in l..=r {
        child[i] = primary[i];
        used[primary[i]] = true;
    }

    // The scan visits all n source positions exactly once, and exactly n - (r - l + 1)
    // genes are unused, so the write cursor fills the free slots and never reaches l.
    let mut slot = (r + 1) % n;
    for k in 0..n {
        let gene = secondary[(r + 1 + k) % n];
        if !used[gene] {
            child[slot] = gene;
            used[gene] = true;
            slot = (slot + 1) % n;
        }
    }

    child
}

/// Swap mutation: with probability `rate`, exchange two random positions.
///
/// Returns whether a swap was performed. Both positions are drawn independently, so
/// they may coincide.
pub fn swap_mutation<R: Rng + ?Sized>(chromosome: &mut Chromosome, rate: f64, rng: &mut R) -> bool {
    let n = chromosome.len();
    if n < 2 || rng.gen::<f64>() >= rate {
        return false;
    }

    let i = rng.gen_range(0..n);
    let j = rng.gen_range(0..n);
    chromosome.swap(i, j);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roulette_index_boundaries() {
        let fitness = [0.5, 0.25, 0.25];
        assert_eq!(roulette_index(&fitness, 0.0), 0);
        assert_eq!(roulette_index(&fitness, 0.5), 0);
        assert_eq!(roulette_index(&fitness, 0.6), 1);
        assert_eq!(roulette_index(&fitness, 0.75), 1);
        assert_eq!(roulette_index(&fitness, 0.99), 2);
        assert_eq!(roulette_index(&fitness, 1.5), 2);
    }

    #[test]
    fn test_roulette_proportionality() {
        let fitness = [1.0, 2.0, 3.0, 4.0];
        let total: f64 = fitness.iter().sum();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let draws = 100_000;

        let mut counts = [0usize; 4];
        for _ in 0..draws {
            counts[roulette_select(&fitness, &mut rng)] += 1;
        }

        for (i, &count) in counts.iter().enumerate() {
            let observed = count as f64 / draws as f64;
            let expected = fitness[i] / total;
            assert!(
                (observed - expected).abs() < 0.01,
                "index {}: observed {:.4}, expected {:.4}",
                i,
                observed,
                expected
            );
        }
    }

    #[test]
    fn test_roulette_zero_total_uniform() {
        let fitness = [0.0; 5];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let idx = roulette_select(&fitness, &mut rng);
            assert!(idx < 5);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_crossover_known_cuts() {
        let p1 = Chromosome::from_genes(vec![0, 1, 2, 3, 4, 5, 6, 7]);
        let p2 = Chromosome::from_genes(vec![7, 6, 5, 4, 3, 2, 1, 0]);

        let (c1, c2) = order_crossover_with_cuts(&p1, &p2, 2, 4);

        // Slot order after r=4: 5, 6, 7, 0, 1. Parent 2 read from position 5: 2,1,0,7,6,5,4,3
        assert_eq!(c1.genes(), &[6, 5, 2, 3, 4, 1, 0, 7]);
        // Parent 1 read from position 5: 5,6,7,0,1,2,3,4
        assert_eq!(c2.genes(), &[1, 2, 5, 4, 3, 6, 7, 0]);
    }

    #[test]
    fn test_crossover_full_slice_copies_parents() {
        let p1 = Chromosome::from_genes(vec![3, 1, 0, 2]);
        let p2 = Chromosome::from_genes(vec![0, 1, 2, 3]);
        let (c1, c2) = order_crossover_with_cuts(&p1, &p2, 0, 3);
        assert_eq!(c1, p1);
        assert_eq!(c2, p2);
    }

    #[test]
    fn test_crossover_single_gene() {
        let p = Chromosome::from_genes(vec![0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let (c1, c2) = order_crossover(&p, &p, &mut rng);
        assert_eq!(c1.genes(), &[0]);
        assert_eq!(c2.genes(), &[0]);
    }

    #[test]
    fn test_mutation_rate_zero_never_changes() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let original = Chromosome::random(10, &mut rng);
        let mut c = original.clone();
        for _ in 0..1000 {
            assert!(!swap_mutation(&mut c, 0.0, &mut rng));
        }
        assert_eq!(c, original);
    }

    #[test]
    fn test_mutation_rate_one_keeps_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut c = Chromosome::random(10, &mut rng);
        for _ in 0..1000 {
            assert!(swap_mutation(&mut c, 1.0, &mut rng));
            assert!(c.is_valid_permutation(10));
        }
    }

    #[test]
    fn test_mutation_frequency() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut c = Chromosome::random(6, &mut rng);
        let trials = 20_000;
        let hits = (0..trials)
            .filter(|_| swap_mutation(&mut c, 0.1, &mut rng))
            .count();
        let rate = hits as f64 / trials as f64;
        assert!((rate - 0.1).abs() < 0.015, "observed mutation rate {:.4}", rate);
    }

    proptest! {
        #[test]
        fn test_crossover_children_are_permutations(
            n in 1usize..40,
            seed in any::<u64>(),
            a in any::<usize>(),
            b in any::<usize>(),
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p1 = Chromosome::random(n, &mut rng);
            let p2 = Chromosome::random(n, &mut rng);
            let (l, r) = (a % n, b % n);
            let (l, r) = (l.min(r), l.max(r));

            let (c1, c2) = order_crossover_with_cuts(&p1, &p2, l, r);
            prop_assert!(c1.is_valid_permutation(n));
            prop_assert!(c2.is_valid_permutation(n));
            prop_assert_eq!(&c1.genes()[l..=r], &p1.genes()[l..=r]);
            prop_assert_eq!(&c2.genes()[l..=r], &p2.genes()[l..=r]);
        }

        #[test]
        fn test_random_crossover_and_mutation_preserve_permutation(
            n in 1usize..30,
            seed in any::<u64>(),
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p1 = Chromosome::random(n, &mut rng);
            let p2 = Chromosome::random(n, &mut rng);

            let (mut c1, mut c2) = order_crossover(&p1, &p2, &mut rng);
            swap_mutation(&mut c1, 0.5, &mut rng);
            swap_mutation(&mut c2, 0.5, &mut rng);
            prop_assert!(c1.is_valid_permutation(n));
            prop_assert!(c2.is_valid_permutation(n));
        }
    }
}
