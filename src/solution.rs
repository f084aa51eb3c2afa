//! Solution representation for the route optimizer.
//!
//! A solution is a closed tour over the instance's locations. The tour is cyclic, so
//! rotating it to start at a chosen anchor (usually home) never changes its cost.

use crate::error::{Result, SolverError};
use crate::heuristics::genetic::TerminationReason;
use crate::instance::RouteInstance;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solution to a route instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Visiting order as location indices; the tour returns to its first entry
    pub tour: Vec<usize>,
    /// Total cycle cost (Euclidean units)
    pub cost: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations run (if applicable)
    pub generations: Option<usize>,
    /// Why the run stopped (if applicable)
    pub termination: Option<TerminationReason>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            tour: Vec::new(),
            cost: f64::INFINITY,
            algorithm: String::new(),
            computation_time: 0.0,
            generations: None,
            termination: None,
        }
    }

    /// Create a solution from a tour
    pub fn from_tour(instance: &RouteInstance, tour: Vec<usize>, algorithm: &str) -> Self {
        let cost = instance.tour_cost(&tour);

        Solution {
            tour,
            cost,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            generations: None,
            termination: None,
        }
    }

    /// Check if every location is visited exactly once
    pub fn is_complete(&self, instance: &RouteInstance) -> bool {
        let n = instance.dimension();
        if self.tour.len() != n {
            return false;
        }

        let unique: HashSet<usize> = self.tour.iter().cloned().collect();
        unique.len() == n && self.tour.iter().all(|&i| i < n)
    }

    /// Get the position of a location in the tour
    pub fn position(&self, location: usize) -> Option<usize> {
        self.tour.iter().position(|&n| n == location)
    }

    /// Rotate the tour so that `anchor` is visited first
    pub fn rotate_to_start(&mut self, anchor: usize) -> Result<()> {
        let pos = self.position(anchor).ok_or_else(|| {
            SolverError::invalid(format!("anchor {} is not part of the tour", anchor))
        })?;
        self.tour.rotate_left(pos);
        Ok(())
    }

    /// Location names in visiting order
    pub fn named_route<'a>(&self, instance: &'a RouteInstance) -> Vec<&'a str> {
        self.tour
            .iter()
            .map(|&i| instance.locations()[i].name.as_str())
            .collect()
    }

    /// Human-readable route, e.g. `Home -> Market -> Office -> (return)`
    pub fn describe(&self, instance: &RouteInstance) -> String {
        let mut route = self.named_route(instance).join(" -> ");
        route.push_str(" -> (return)");
        route
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(generations) = self.generations {
            writeln!(f, "  Generations: {}", generations)?;
        }
        if let Some(reason) = self.termination {
            writeln!(f, "  Stopped: {}", reason)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Location;

    fn square() -> RouteInstance {
        RouteInstance::new(
            "square",
            vec![
                Location::new("Home", 0.0, 0.0),
                Location::new("B", 1.0, 0.0),
                Location::new("C", 1.0, 1.0),
                Location::new("D", 0.0, 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_solution_creation() {
        let sol = Solution::new();
        assert!(sol.tour.is_empty());
        assert_eq!(sol.cost, f64::INFINITY);
    }

    #[test]
    fn test_rotate_keeps_cost() {
        let instance = square();
        let mut sol = Solution::from_tour(&instance, vec![2, 3, 0, 1], "test");
        let before = sol.cost;

        sol.rotate_to_start(0).unwrap();
        assert_eq!(sol.tour, vec![0, 1, 2, 3]);
        assert!((instance.tour_cost(&sol.tour) - before).abs() < 1e-12);
        assert!((before - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_missing_anchor() {
        let instance = square();
        let mut sol = Solution::from_tour(&instance, vec![0, 1], "test");
        assert!(sol.rotate_to_start(3).is_err());
        assert_eq!(sol.tour, vec![0, 1]);
    }

    #[test]
    fn test_is_complete() {
        let instance = square();
        assert!(Solution::from_tour(&instance, vec![3, 1, 0, 2], "t").is_complete(&instance));
        assert!(!Solution::from_tour(&instance, vec![3, 1, 1, 2], "t").is_complete(&instance));
        assert!(!Solution::from_tour(&instance, vec![3, 1, 0], "t").is_complete(&instance));
    }

    #[test]
    fn test_describe() {
        let instance = square();
        let sol = Solution::from_tour(&instance, vec![0, 3, 2, 1], "t");
        assert_eq!(sol.describe(&instance), "Home -> D -> C -> B -> (return)");
    }
}
