//! Route Optimizer Library
//!
//! Finds a short round trip through a small set of 2D locations with a genetic algorithm.
//!
//! # Features
//!
//! - Permutation chromosomes with cyclic Euclidean tour cost
//! - Roulette-wheel selection, order crossover and swap mutation
//! - Single elitism with best-ever tracking and early exit
//! - Seeded, reproducible runs with optional parallel fitness evaluation
//! - Multi-seed benchmarking and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use route_optimizer::instance::RouteInstance;
//! use route_optimizer::heuristics::genetic::{GAConfig, GeneticAlgorithm};
//!
//! let instance = RouteInstance::from_file("town.csv").unwrap();
//!
//! let mut ga = GeneticAlgorithm::new(instance.clone(), GAConfig::default()).unwrap();
//! let mut solution = ga.run();
//!
//! // Start the printed route at home
//! solution.rotate_to_start(0).unwrap();
//! println!("{} ({:.2})", solution.describe(&instance), solution.cost);
//! ```

pub mod benchmark;
pub mod error;
pub mod heuristics;
pub mod instance;
pub mod solution;
pub mod visualization;

pub use error::{Result, SolverError};
pub use instance::RouteInstance;
pub use solution::Solution;
