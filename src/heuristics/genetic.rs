//! Genetic Algorithm for route optimization.
//!
//! The driver runs a fixed generation budget over a population of permutation
//! chromosomes:
//! - Fitness `1 / (1 + cost)` recomputed for every generation
//! - Single-chromosome elitism
//! - Roulette-wheel parent selection
//! - Order-preserving two-point crossover and swap mutation
//!
//! The best tour ever observed is tracked separately from the current population,
//! since stochastic replacement can make a later population worse than an earlier one.

use crate::error::{Result, SolverError};
use crate::heuristics::operators::{order_crossover, roulette_select, swap_mutation};
use crate::heuristics::population::{Chromosome, Evaluation, Population};
use crate::instance::RouteInstance;
use crate::solution::Solution;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GAConfig {
    /// Population size
    pub population_size: usize,
    /// Number of generations
    pub max_generations: usize,
    /// Crossover probability
    pub crossover_prob: f64,
    /// Mutation probability, applied to each offspring independently
    pub mutation_prob: f64,
    /// Random seed
    pub seed: u64,
    /// Stop early once the best cost drops below this value
    pub convergence_threshold: f64,
    /// Evaluate fitness on the rayon thread pool
    pub parallel_evaluation: bool,
    /// Keep per-generation statistics
    pub record_history: bool,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            population_size: 160,
            max_generations: 250,
            crossover_prob: 0.85,
            mutation_prob: 0.10,
            seed: 42,
            convergence_threshold: 1e-6,
            parallel_evaluation: true,
            record_history: true,
        }
    }
}

impl GAConfig {
    /// Reject configurations the driver cannot run
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 1 {
            return Err(SolverError::invalid("population size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return Err(SolverError::invalid(format!(
                "crossover rate must be in [0, 1], got {}",
                self.crossover_prob
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err(SolverError::invalid(format!(
                "mutation rate must be in [0, 1], got {}",
                self.mutation_prob
            )));
        }
        if self.convergence_threshold.is_nan() || self.convergence_threshold < 0.0 {
            return Err(SolverError::invalid(format!(
                "convergence threshold must be non-negative, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}

/// Phase of the generational loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GAState {
    /// Population created, nothing evaluated yet
    Initialized,
    /// Fitness computed for the current population
    Evaluating,
    /// Building the next population
    Reproducing,
    /// Next population installed and evaluated
    Replaced,
    /// Run finished
    Terminated,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// All configured generations were run
    GenerationBudget,
    /// Best cost fell below the convergence threshold
    Converged,
    /// Zero or one location, nothing to optimize
    Trivial,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::GenerationBudget => "generation budget exhausted",
            TerminationReason::Converged => "converged",
            TerminationReason::Trivial => "trivial tour",
        };
        f.write_str(s)
    }
}

/// Per-generation statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Best cost seen in any generation so far
    pub best_ever_cost: f64,
    /// Best cost in this generation's population
    pub population_best_cost: f64,
    pub mean_cost: f64,
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm {
    config: GAConfig,
    instance: RouteInstance,
    population: Population,
    evaluation: Option<Evaluation>,
    best: Option<(Chromosome, f64)>,
    rng: ChaCha8Rng,
    generation: usize,
    state: GAState,
    history: Vec<GenerationStats>,
    termination: Option<TerminationReason>,
}

impl GeneticAlgorithm {
    pub fn new(instance: RouteInstance, config: GAConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_rng(instance, config, rng)
    }

    /// Use a caller-supplied random source instead of seeding from `config.seed`
    pub fn with_rng(instance: RouteInstance, config: GAConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        if instance.dimension() == 0 {
            return Err(SolverError::invalid("at least one location is required"));
        }

        Ok(GeneticAlgorithm {
            config,
            instance,
            population: Population::default(),
            evaluation: None,
            best: None,
            rng,
            generation: 0,
            state: GAState::Initialized,
            history: Vec::new(),
            termination: None,
        })
    }

    /// Initialize population with random permutations
    fn initialize_population(&mut self) {
        let n = self.instance.dimension();
        self.population = Population::random(self.config.population_size, n, &mut self.rng);
        self.evaluation = None;
        self.best = None;
        self.generation = 0;
        self.history.clear();
        self.state = GAState::Initialized;

        log::debug!(
            "[GA] Initialized population: {} chromosomes over {} locations",
            self.population.len(),
            n
        );
    }

    /// Evaluate the current population and update the best-ever tour
    fn evaluate_population(&mut self) {
        let evaluation = self
            .population
            .evaluate(&self.instance, self.config.parallel_evaluation);

        // First strictly lower cost wins, matching the scan order of the population
        let mut candidate: Option<(usize, f64)> = None;
        for (i, &cost) in evaluation.costs.iter().enumerate() {
            if candidate.map_or(true, |(_, c)| cost < c) {
                candidate = Some((i, cost));
            }
        }

        if let Some((idx, cost)) = candidate {
            let improved = match self.best {
                Some((_, best_cost)) => cost < best_cost,
                None => true,
            };
            if improved {
                self.best = Some((self.population.get(idx).clone(), cost));
            }
        }

        if self.config.record_history {
            self.history.push(GenerationStats {
                generation: self.generation,
                best_ever_cost: self.best_cost().unwrap_or(f64::INFINITY),
                population_best_cost: evaluation.best_cost(),
                mean_cost: evaluation.mean_cost(),
            });
        }

        self.evaluation = Some(evaluation);
    }

    /// Build the next population from the current one
    fn reproduce(&mut self) -> Population {
        let size = self.config.population_size;
        let mut next = Population::with_capacity(size);

        let evaluation = match self.evaluation.as_ref() {
            Some(e) => e,
            None => return self.population.clone(),
        };

        next.push(self.population.get(evaluation.best_index()).clone());

        while next.len() < size {
            let p1 = roulette_select(&evaluation.fitness, &mut self.rng);
            let p2 = roulette_select(&evaluation.fitness, &mut self.rng);
            let parent1 = self.population.get(p1);
            let parent2 = self.population.get(p2);

            let (mut child1, mut child2) = if self.rng.gen::<f64>() < self.config.crossover_prob {
                order_crossover(parent1, parent2, &mut self.rng)
            } else {
                (parent1.clone(), parent2.clone())
            };

            swap_mutation(&mut child1, self.config.mutation_prob, &mut self.rng);
            swap_mutation(&mut child2, self.config.mutation_prob, &mut self.rng);

            next.push(child1);
            if next.len() < size {
                next.push(child2);
            }
        }

        next
    }

    /// Create new generation
    fn evolve(&mut self) {
        self.state = GAState::Reproducing;
        let next = self.reproduce();

        self.population = next;
        self.generation += 1;
        self.state = GAState::Replaced;
        log::trace!("[GA] Gen {} replaced ({} chromosomes)", self.generation, self.population.len());

        self.state = GAState::Evaluating;
        self.evaluate_population();
    }

    fn has_converged(&self) -> bool {
        self.best_cost()
            .map_or(false, |c| c < self.config.convergence_threshold)
    }

    /// Run the genetic algorithm
    pub fn run(&mut self) -> Solution {
        let start = Instant::now();
        let n = self.instance.dimension();

        if n <= 1 {
            let tour: Vec<usize> = (0..n).collect();
            log::info!("[GA] {} location(s), returning trivial tour", n);

            self.best = Some((Chromosome::from_genes(tour.clone()), 0.0));
            self.termination = Some(TerminationReason::Trivial);
            self.state = GAState::Terminated;

            let mut solution = Solution::from_tour(&self.instance, tour, "GeneticAlgorithm");
            solution.computation_time = start.elapsed().as_secs_f64();
            solution.generations = Some(0);
            solution.termination = self.termination;
            return solution;
        }

        log::info!(
            "[GA] Optimizing {} locations: population {}, {} generations, crossover {:.2}, mutation {:.2}, seed {}",
            n,
            self.config.population_size,
            self.config.max_generations,
            self.config.crossover_prob,
            self.config.mutation_prob,
            self.config.seed
        );

        self.initialize_population();
        self.state = GAState::Evaluating;
        self.evaluate_population();

        let reason = loop {
            if self.has_converged() {
                break TerminationReason::Converged;
            }
            if self.generation >= self.config.max_generations {
                break TerminationReason::GenerationBudget;
            }

            self.evolve();

            log::debug!(
                "[GA] Gen {}  Best cost {:.3}  Diversity {:.2}  Elapsed {:.2}s",
                self.generation,
                self.best_cost().unwrap_or(f64::INFINITY),
                self.population_diversity(),
                start.elapsed().as_secs_f64()
            );
        };

        self.termination = Some(reason);
        self.state = GAState::Terminated;

        let mut solution = match self.best.clone() {
            Some((chromosome, _)) => {
                Solution::from_tour(&self.instance, chromosome.into_genes(), "GeneticAlgorithm")
            }
            None => Solution::default(),
        };
        solution.computation_time = start.elapsed().as_secs_f64();
        solution.generations = Some(self.generation);
        solution.termination = Some(reason);

        log::info!(
            "[GA] Finished after {} generations ({}): best cost {:.3} in {:.3}s",
            self.generation,
            reason,
            solution.cost,
            solution.computation_time
        );

        solution
    }

    /// Get current best solution
    pub fn best_solution(&self) -> Option<Solution> {
        self.best.as_ref().map(|(chromosome, _)| {
            Solution::from_tour(&self.instance, chromosome.genes().to_vec(), "GeneticAlgorithm")
        })
    }

    /// Cost of the best tour seen so far
    pub fn best_cost(&self) -> Option<f64> {
        self.best.as_ref().map(|(_, cost)| *cost)
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn state(&self) -> GAState {
        self.state
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Statistics for every evaluated generation, starting with the initial population
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn instance(&self) -> &RouteInstance {
        &self.instance
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    /// Get population diversity (average number of differing positions between pairs)
    pub fn population_diversity(&self) -> f64 {
        let chromosomes = self.population.chromosomes();
        if chromosomes.len() < 2 {
            return 0.0;
        }

        let sample = chromosomes.len().min(20);
        let mut total_diff = 0.0;
        let mut count = 0;

        for i in 0..sample {
            for j in i + 1..sample {
                let diff = chromosomes[i]
                    .genes()
                    .iter()
                    .zip(chromosomes[j].genes().iter())
                    .filter(|(a, b)| a != b)
                    .count();
                total_diff += diff as f64;
                count += 1;
            }
        }

        if count > 0 {
            total_diff / count as f64
        } else {
            0.0
        }
    }
}
