//! Benchmarking and experimentation module.
//!
//! Runs the genetic algorithm repeatedly with different seeds, collects per-run
//! results and summarizes how stable the optimizer is on an instance.

use crate::error::{Result, SolverError};
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm, TerminationReason};
use crate::instance::RouteInstance;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Number of locations
    pub dimension: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Best tour cost found
    pub cost: f64,
    /// Generations actually run
    pub generations: usize,
    /// Why the run stopped
    pub termination: TerminationReason,
    /// Computation time in seconds
    pub time: f64,
}

/// Aggregated statistics over all runs on one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub instance: String,
    pub num_runs: usize,
    pub mean_cost: f64,
    /// Sample standard deviation, 0 for a single run
    pub std_cost: f64,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub best_seed: u64,
    pub mean_time: f64,
    pub mean_generations: f64,
    pub converged_runs: usize,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per instance
    pub num_runs: usize,
    /// Seed of the first run; run `i` uses `base_seed + i`
    pub base_seed: u64,
    /// Run seeds in parallel
    pub parallel: bool,
    /// Draw a progress bar on the terminal
    pub show_progress: bool,
    /// Settings shared by every run (its seed is overridden)
    pub ga: GAConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 10,
            base_seed: 0,
            parallel: true,
            show_progress: true,
            ga: GAConfig::default(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every configured seed on an instance
    pub fn run(&mut self, instance: &RouteInstance) -> Result<()> {
        if self.config.num_runs == 0 {
            return Err(SolverError::invalid("benchmark needs at least one run"));
        }
        self.config.ga.validate()?;

        log::info!(
            "Running {} seeds on instance {} (n={})",
            self.config.num_runs,
            instance.name,
            instance.dimension()
        );

        let progress = if self.config.show_progress {
            ProgressBar::new(self.config.num_runs as u64)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} runs ({elapsed})") {
            progress.set_style(style);
        }

        let seeds: Vec<u64> = (0..self.config.num_runs as u64)
            .map(|i| self.config.base_seed.wrapping_add(i))
            .collect();

        let ga = &self.config.ga;
        let run_seed = |seed: u64| -> Result<RunResult> {
            let result = run_single(instance, ga, seed);
            progress.inc(1);
            result
        };

        let mut runs: Vec<RunResult> = if self.config.parallel {
            seeds.par_iter().map(|&s| run_seed(s)).collect::<Result<Vec<_>>>()?
        } else {
            seeds.iter().map(|&s| run_seed(s)).collect::<Result<Vec<_>>>()?
        };
        progress.finish_and_clear();

        runs.sort_by_key(|r| r.seed);
        self.results.extend(runs);
        Ok(())
    }

    /// Compute statistics for each instance
    pub fn compute_statistics(&self) -> Vec<RunStatistics> {
        let mut by_instance: BTreeMap<&str, Vec<&RunResult>> = BTreeMap::new();
        for result in &self.results {
            by_instance.entry(result.instance.as_str()).or_default().push(result);
        }

        let mut statistics = Vec::new();

        for (instance, runs) in by_instance {
            let costs: Vec<f64> = runs.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
            let generations: Vec<f64> = runs.iter().map(|r| r.generations as f64).collect();

            let std_cost = if costs.len() > 1 { costs.iter().std_dev() } else { 0.0 };

            let best = runs
                .iter()
                .min_by(|a, b| a.cost.total_cmp(&b.cost))
                .map(|r| (r.cost, r.seed))
                .unwrap_or((f64::INFINITY, 0));
            let worst_cost = costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            statistics.push(RunStatistics {
                instance: instance.to_string(),
                num_runs: runs.len(),
                mean_cost: costs.iter().mean(),
                std_cost,
                best_cost: best.0,
                worst_cost,
                best_seed: best.1,
                mean_time: times.iter().mean(),
                mean_generations: generations.iter().mean(),
                converged_runs: runs
                    .iter()
                    .filter(|r| r.termination == TerminationReason::Converged)
                    .count(),
            });
        }

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Route Optimizer Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        report.push_str(&format!(
            "GA: population {}, generations {}, crossover {:.2}, mutation {:.2}\n\n",
            self.config.ga.population_size,
            self.config.ga.max_generations,
            self.config.ga.crossover_prob,
            self.config.ga.mutation_prob
        ));

        report.push_str("-".repeat(86).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<16} {:>6} {:>12} {:>10} {:>12} {:>12} {:>8} {:>6}\n",
            "Instance", "Runs", "Mean Cost", "Std", "Best Cost", "Worst Cost", "Seed", "Conv"
        ));
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!(
                "{:<16} {:>6} {:>12.3} {:>10.3} {:>12.3} {:>12.3} {:>8} {:>6}\n",
                stat.instance,
                stat.num_runs,
                stat.mean_cost,
                stat.std_cost,
                stat.best_cost,
                stat.worst_cost,
                stat.best_seed,
                stat.converged_runs
            ));
        }

        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

fn run_single(instance: &RouteInstance, ga: &GAConfig, seed: u64) -> Result<RunResult> {
    let config = GAConfig {
        seed,
        record_history: false,
        ..ga.clone()
    };
    let mut algorithm = GeneticAlgorithm::new(instance.clone(), config)?;
    let solution = algorithm.run();

    Ok(RunResult {
        instance: instance.name.clone(),
        dimension: instance.dimension(),
        seed,
        cost: solution.cost,
        generations: solution.generations.unwrap_or(0),
        termination: solution
            .termination
            .unwrap_or(TerminationReason::GenerationBudget),
        time: solution.computation_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(parallel: bool) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs: 4,
            base_seed: 10,
            parallel,
            show_progress: false,
            ga: GAConfig {
                population_size: 30,
                max_generations: 40,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 10);
        assert!(config.parallel);
    }

    #[test]
    fn test_benchmark_statistics() {
        let instance = RouteInstance::demo();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.run(&instance).unwrap();

        let seeds: Vec<u64> = benchmark.results().iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12, 13]);

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.num_runs, 4);
        assert!(s.best_cost <= s.mean_cost + 1e-9);
        assert!(s.mean_cost <= s.worst_cost + 1e-9);
        assert!(s.std_cost >= 0.0);
        assert!(benchmark.generate_report().contains("demo"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let instance = RouteInstance::demo();
        let mut seq = Benchmark::new(quick_config(false));
        let mut par = Benchmark::new(quick_config(true));
        seq.run(&instance).unwrap();
        par.run(&instance).unwrap();

        let seq_costs: Vec<f64> = seq.results().iter().map(|r| r.cost).collect();
        let par_costs: Vec<f64> = par.results().iter().map(|r| r.cost).collect();
        assert_eq!(seq_costs, par_costs);
    }

    #[test]
    fn test_zero_runs_rejected() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            num_runs: 0,
            ..quick_config(false)
        });
        assert!(benchmark.run(&RouteInstance::demo()).is_err());
    }

    #[test]
    fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut benchmark = Benchmark::new(quick_config(false));
        benchmark.run(&RouteInstance::demo()).unwrap();

        let results_path = dir.path().join("results.csv");
        let stats_path = dir.path().join("statistics.csv");
        benchmark.export_to_csv(&results_path).unwrap();
        benchmark.export_statistics_csv(&stats_path).unwrap();

        let results = std::fs::read_to_string(&results_path).unwrap();
        assert_eq!(results.lines().count(), 5);
        assert!(results.starts_with("instance,dimension,seed,cost"));

        let stats = std::fs::read_to_string(&stats_path).unwrap();
        assert_eq!(stats.lines().count(), 2);
    }
}
