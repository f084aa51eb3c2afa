//! Module for parsing and representing route instances.
//!
//! A route instance is an ordered list of named 2D locations. A location's identity
//! is its position in the list; names are only used for display. Distances are
//! Euclidean and precomputed into a matrix when the instance is built.

use crate::error::{Result, SolverError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use serde::{Deserialize, Serialize};

/// A named point on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Display name (need not be unique)
    pub name: String,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Location { name: name.into(), x, y }
    }
}

/// Euclidean distance between two locations
#[inline]
pub fn distance(a: &Location, b: &Location) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Represents a complete route instance
#[derive(Debug, Clone, Serialize)]
pub struct RouteInstance {
    /// Name of the instance
    pub name: String,
    /// Locations to visit, index 0 is "home" by convention
    locations: Vec<Location>,
    /// Precomputed distance matrix
    #[serde(skip)]
    distance_matrix: Vec<Vec<f64>>,
}

impl RouteInstance {
    /// Build an instance from a non-empty list of locations
    pub fn new(name: impl Into<String>, locations: Vec<Location>) -> Result<Self> {
        if locations.is_empty() {
            return Err(SolverError::invalid("at least one location is required"));
        }
        if let Some(bad) = locations.iter().find(|l| !l.x.is_finite() || !l.y.is_finite()) {
            return Err(SolverError::invalid(format!(
                "location '{}' has non-finite coordinates ({}, {})",
                bad.name, bad.x, bad.y
            )));
        }

        let distance_matrix = Self::compute_distance_matrix(&locations);

        Ok(RouteInstance {
            name: name.into(),
            locations,
            distance_matrix,
        })
    }

    /// The small town map used when no location file is given
    pub fn demo() -> Self {
        let locations = vec![
            Location::new("Home", 0.0, 0.0),
            Location::new("Office", 5.0, 1.0),
            Location::new("Gym", -1.0, 4.0),
            Location::new("Market", 3.0, -2.0),
            Location::new("Park", -3.0, -1.0),
        ];
        let distance_matrix = Self::compute_distance_matrix(&locations);

        RouteInstance {
            name: "demo".to_string(),
            locations,
            distance_matrix,
        }
    }

    /// Keep only the chosen locations for today's route.
    ///
    /// Out-of-range indices are dropped, duplicates collapse, and home (index 0) is
    /// always kept. When nothing valid was chosen the default plan `{0, 1, 3}` is used.
    pub fn subset(&self, chosen: &[usize]) -> Result<Self> {
        let n = self.dimension();
        let mut picked: BTreeSet<usize> = chosen.iter().copied().filter(|&i| i < n).collect();

        if picked.is_empty() {
            picked = [0, 1, 3].into_iter().filter(|&i| i < n).collect();
        }
        picked.insert(0);

        let locations = picked.iter().map(|&i| self.locations[i].clone()).collect();
        RouteInstance::new(self.name.clone(), locations)
    }

    /// Load locations from a file.
    ///
    /// `.csv` files hold `name,x,y` records with a header row. Anything else is read as
    /// TSP-LIB style text with a `NODE_COORD_SECTION` of `id x y [name]` lines.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let default_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());

        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            let mut reader = csv::Reader::from_path(path)?;
            let mut locations = Vec::new();
            for record in reader.deserialize::<Location>() {
                locations.push(record?);
            }
            return RouteInstance::new(default_name, locations);
        }

        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), &default_name)
    }

    /// Parse TSP-LIB style coordinates from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, default_name: &str) -> Result<Self> {
        let mut name = default_name.to_string();
        let mut locations = Vec::new();
        let mut in_coords = false;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NAME:") {
                name = line.replace("NAME:", "").trim().to_string();
                continue;
            }
            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if !in_coords {
                // Other header fields (COMMENT, TYPE, DIMENSION, ...) carry nothing we need
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return Err(SolverError::parse(line_no, "expected `id x y [name]`"));
            }
            let id: usize = parts[0]
                .parse()
                .map_err(|_| SolverError::parse(line_no, "Invalid node id"))?;
            let x: f64 = parts[1]
                .parse()
                .map_err(|_| SolverError::parse(line_no, "Invalid x coordinate"))?;
            let y: f64 = parts[2]
                .parse()
                .map_err(|_| SolverError::parse(line_no, "Invalid y coordinate"))?;
            let label = if parts.len() > 3 {
                parts[3..].join(" ")
            } else {
                format!("Location {}", id)
            };

            locations.push(Location::new(label, x, y));
        }

        RouteInstance::new(name, locations)
    }

    /// Compute Euclidean distance matrix
    fn compute_distance_matrix(locations: &[Location]) -> Vec<Vec<f64>> {
        let n = locations.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = distance(&locations[i], &locations[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// All locations in index order
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of locations
    #[inline]
    pub fn dimension(&self) -> usize {
        self.locations.len()
    }

    /// Get the distance between two locations by index
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    /// Cyclic tour cost: consecutive distances plus the closing edge back to the start.
    /// A single-location tour costs 0.
    pub fn tour_cost(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for pair in tour.windows(2) {
            length += self.distance(pair[0], pair[1]);
        }

        length += self.distance(tour[tour.len() - 1], tour[0]);

        length
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for loc in &self.locations {
            min_x = min_x.min(loc.x);
            max_x = max_x.max(loc.x);
            min_y = min_y.min(loc.y);
            max_y = max_y.max(loc.y);
        }

        let n = self.dimension();
        let mut distances: Vec<f64> = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance(i, j));
            }
        }
        let (avg_distance, min_distance, max_distance) = if distances.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                distances.iter().sum::<f64>() / distances.len() as f64,
                distances.iter().cloned().fold(f64::INFINITY, f64::min),
                distances.iter().cloned().fold(0.0, f64::max),
            )
        };

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            bounds: (min_x, max_x, min_y, max_y),
            avg_distance,
            min_distance,
            max_distance,
        }
    }
}

/// Statistics about a route instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    /// (min_x, max_x, min_y, max_y)
    pub bounds: (f64, f64, f64, f64),
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (min_x, max_x, min_y, max_y) = self.bounds;
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Locations: {}", self.dimension)?;
        writeln!(f, "  Bounds: x [{:.2}, {:.2}], y [{:.2}, {:.2}]", min_x, max_x, min_y, max_y)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}
