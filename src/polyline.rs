//! Polyline representation for route geometries.
//!
//! Stores decoded (lat, lng) points. Providers decode their wire format at
//! the boundary; the simulation only interpolates along the points.

use serde::{Deserialize, Serialize};

use crate::geo::{chain_length_km, is_finite_location};

/// A route geometry as decoded coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from (latitude, longitude) points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// A path can be traversed only with two or more finite waypoints.
    pub fn is_simulatable(&self) -> bool {
        self.points.len() >= 2 && self.points.iter().all(|point| is_finite_location(*point))
    }

    /// Position after covering `progress` of the path.
    ///
    /// Progress maps linearly onto segment count, not distance, so every
    /// segment takes the same share of the cycle regardless of its length.
    /// Returns `None` for paths that are not simulatable.
    pub fn position_at(&self, progress: f64) -> Option<(f64, f64)> {
        if !self.is_simulatable() {
            return None;
        }

        let total = self.points.len() - 1;
        // f64::max drops NaN, so a NaN progress starts at the first waypoint
        let scaled = progress.max(0.0) * total as f64;
        let segment = scaled.floor();
        let index = segment as usize;
        if index >= total {
            return self.points.last().copied();
        }

        let fraction = scaled - segment;
        let (from_lat, from_lng) = self.points[index];
        let (to_lat, to_lng) = self.points[index + 1];

        Some((
            from_lat + (to_lat - from_lat) * fraction,
            from_lng + (to_lng - from_lng) * fraction,
        ))
    }

    /// Haversine length of the whole path in kilometers.
    pub fn length_km(&self) -> f64 {
        chain_length_km(&self.points)
    }
}

impl From<Vec<(f64, f64)>> for Polyline {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points)
    }
}
