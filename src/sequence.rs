//! Stop sequencing: greedy nearest neighbor nudged toward the route end.
//!
//! Each step picks the remaining stop minimizing
//! `d(current, stop) + end_bias * d(stop, end)`. Pure nearest neighbor tends
//! to leave a far stop for last and backtrack; the bias term pulls the tour
//! toward the return leg. O(n²) in the number of stops.

use serde::{Deserialize, Serialize};

use crate::geo::degree_distance;
use crate::traits::Located;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceOptions {
    /// Weight of the distance from a candidate stop to the route end.
    pub end_bias: f64,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self { end_bias: 0.1 }
    }
}

/// Visiting order as indices into `stops`. Ties go to the lower index.
pub fn sequence_indices<S: Located>(
    start: (f64, f64),
    end: (f64, f64),
    stops: &[S],
    options: &SequenceOptions,
) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = start;

    while !remaining.is_empty() {
        let mut best_slot = 0;
        let mut best_score = f64::INFINITY;

        for (slot, &index) in remaining.iter().enumerate() {
            let location = stops[index].location();
            let score =
                degree_distance(current, location) + options.end_bias * degree_distance(location, end);
            if score < best_score {
                best_score = score;
                best_slot = slot;
            }
        }

        // Vec::remove keeps the rest in input order for the next tie-break
        let index = remaining.remove(best_slot);
        current = stops[index].location();
        order.push(index);
    }

    order
}

/// Reorders `stops` into visiting order.
pub fn sequence_stops<S: Located>(
    start: (f64, f64),
    end: (f64, f64),
    stops: Vec<S>,
    options: &SequenceOptions,
) -> Vec<S> {
    let order = sequence_indices(start, end, &stops, options);
    let mut slots: Vec<Option<S>> = stops.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
