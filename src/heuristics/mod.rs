//! Population-based heuristics for route optimization.

pub mod genetic;
pub mod operators;
pub mod population;

pub use genetic::{GAConfig, GAState, GeneticAlgorithm, GenerationStats, TerminationReason};
