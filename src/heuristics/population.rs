//! Chromosome and population model for the genetic route optimizer.
//!
//! A chromosome is a permutation of location indices describing a closed tour.
//! Fitness is never stored on the chromosome: it is derived from the tour cost
//! each time a population is evaluated.

use crate::instance::RouteInstance;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rayon::prelude::*;
use std::cmp::Reverse;

/// Candidate tour encoded as a permutation of `0..n`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chromosome {
    genes: Vec<usize>,
}

impl Chromosome {
    /// Uniformly shuffled permutation of `0..n`
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        let mut genes: Vec<usize> = (0..n).collect();
        genes.shuffle(rng);
        Chromosome { genes }
    }

    /// Wrap an existing visiting order. The caller is responsible for passing a permutation.
    pub fn from_genes(genes: Vec<usize>) -> Self {
        Chromosome { genes }
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<usize> {
        self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Exchange the genes at two positions
    pub fn swap(&mut self, i: usize, j: usize) {
        self.genes.swap(i, j);
    }

    /// True when every index in `0..n` appears exactly once
    pub fn is_valid_permutation(&self, n: usize) -> bool {
        if self.genes.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &g in &self.genes {
            if g >= n || seen[g] {
                return false;
            }
            seen[g] = true;
        }
        true
    }

    /// Cyclic tour cost on the given instance
    pub fn cost(&self, instance: &RouteInstance) -> f64 {
        instance.tour_cost(&self.genes)
    }
}

/// Map a tour cost to a strictly positive fitness, higher is better
#[inline]
pub fn fitness_from_cost(cost: f64) -> f64 {
    1.0 / (1.0 + cost)
}

/// Costs and fitness values of one population, index-aligned with its chromosomes
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub costs: Vec<f64>,
    pub fitness: Vec<f64>,
}

impl Evaluation {
    /// Index of the fittest chromosome; the earliest one wins ties
    pub fn best_index(&self) -> usize {
        self.fitness
            .iter()
            .enumerate()
            .min_by_key(|&(_, f)| Reverse(OrderedFloat(*f)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    pub fn best_cost(&self) -> f64 {
        self.costs
            .get(self.best_index())
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    pub fn mean_cost(&self) -> f64 {
        if self.costs.is_empty() {
            return 0.0;
        }
        self.costs.iter().sum::<f64>() / self.costs.len() as f64
    }

    pub fn total_fitness(&self) -> f64 {
        self.fitness.iter().sum()
    }
}

/// Fixed-size collection of chromosomes for one generation
#[derive(Debug, Clone, Default)]
pub struct Population {
    chromosomes: Vec<Chromosome>,
}

impl Population {
    /// `size` independent random permutations of `0..n`; duplicates are allowed
    pub fn random<R: Rng + ?Sized>(size: usize, n: usize, rng: &mut R) -> Self {
        let chromosomes = (0..size).map(|_| Chromosome::random(n, rng)).collect();
        Population { chromosomes }
    }

    pub fn from_chromosomes(chromosomes: Vec<Chromosome>) -> Self {
        Population { chromosomes }
    }

    pub fn with_capacity(size: usize) -> Self {
        Population { chromosomes: Vec::with_capacity(size) }
    }

    pub fn push(&mut self, chromosome: Chromosome) {
        self.chromosomes.push(chromosome);
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn get(&self, index: usize) -> &Chromosome {
        &self.chromosomes[index]
    }

    pub fn chromosomes(&self) -> &[Chromosome] {
        &self.chromosomes
    }

    /// Compute cost and fitness for every chromosome.
    ///
    /// With `parallel` the work is spread over the rayon pool; each chromosome owns its
    /// output slot so the result is identical to the sequential path.
    pub fn evaluate(&self, instance: &RouteInstance, parallel: bool) -> Evaluation {
        let costs: Vec<f64> = if parallel {
            self.chromosomes.par_iter().map(|c| c.cost(instance)).collect()
        } else {
            self.chromosomes.iter().map(|c| c.cost(instance)).collect()
        };
        let fitness = costs.iter().map(|&c| fitness_from_cost(c)).collect();

        Evaluation { costs, fitness }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Location;
    use rand_chacha::ChaCha8Rng;

    fn line_instance(n: usize) -> RouteInstance {
        let locations = (0..n)
            .map(|i| Location::new(format!("L{}", i), i as f64, 0.0))
            .collect();
        RouteInstance::new("line", locations).unwrap()
    }

    #[test]
    fn test_random_permutation_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for n in 0..40 {
            let c = Chromosome::random(n, &mut rng);
            assert!(c.is_valid_permutation(n), "invalid permutation for n={}: {:?}", n, c);
        }
    }

    #[test]
    fn test_invalid_permutations_detected() {
        assert!(!Chromosome::from_genes(vec![0, 1, 1]).is_valid_permutation(3));
        assert!(!Chromosome::from_genes(vec![0, 1, 3]).is_valid_permutation(3));
        assert!(!Chromosome::from_genes(vec![0, 1]).is_valid_permutation(3));
        assert!(Chromosome::from_genes(vec![2, 0, 1]).is_valid_permutation(3));
    }

    #[test]
    fn test_fitness_monotonic() {
        assert_eq!(fitness_from_cost(0.0), 1.0);
        assert!(fitness_from_cost(1.0) > fitness_from_cost(2.0));
        assert!(fitness_from_cost(1e9) > 0.0);
    }

    #[test]
    fn test_population_initialization() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pop = Population::random(50, 8, &mut rng);
        assert_eq!(pop.len(), 50);
        assert!(pop.chromosomes().iter().all(|c| c.is_valid_permutation(8)));
    }

    #[test]
    fn test_cost_non_negative() {
        let instance = line_instance(6);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(Chromosome::random(6, &mut rng).cost(&instance) >= 0.0);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instance = line_instance(12);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let pop = Population::random(64, 12, &mut rng);

        let seq = pop.evaluate(&instance, false);
        let par = pop.evaluate(&instance, true);
        assert_eq!(seq.costs, par.costs);
        assert_eq!(seq.fitness, par.fitness);
    }

    #[test]
    fn test_best_index_first_wins_ties() {
        let instance = line_instance(3);
        let pop = Population::from_chromosomes(vec![
            Chromosome::from_genes(vec![0, 1, 2]),
            Chromosome::from_genes(vec![2, 1, 0]),
            Chromosome::from_genes(vec![1, 2, 0]),
        ]);
        // Every tour on a line of three points costs 4
        let eval = pop.evaluate(&instance, false);
        assert_eq!(eval.best_index(), 0);
        assert!((eval.best_cost() - 4.0).abs() < 1e-12);
        assert!((eval.mean_cost() - 4.0).abs() < 1e-12);
        assert!((eval.total_fitness() - 3.0 / 5.0).abs() < 1e-12);
    }
}
