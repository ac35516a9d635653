//! Route planner: clustering, sequencing and path lookup for a whole fleet.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cluster::{ClusterOptions, UnassignedPoint, cluster_points};
use crate::error::PathError;
use crate::model::{Bin, FuelModel, Route, RouteMetrics, Truck};
use crate::polyline::Polyline;
use crate::sequence::{SequenceOptions, sequence_stops};
use crate::sim::VehicleTrack;
use crate::traits::{Located, PathProvider};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    pub cluster: ClusterOptions,
    pub sequence: SequenceOptions,
    pub fuel: FuelModel,
}

#[derive(Debug, Clone, Default)]
pub struct FleetPlan {
    /// One route per available truck with a known start, in input order.
    pub routes: Vec<Route>,
    pub unassigned: Vec<UnassignedPoint<String>>,
    /// Trucks whose path came from a fallback instead of the provider.
    pub fallbacks: Vec<String>,
}

impl FleetPlan {
    pub fn route_for(&self, truck_id: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.truck_id == truck_id)
    }

    /// Simulation tracks for every planned route.
    pub fn tracks(&self) -> Vec<VehicleTrack> {
        self.routes
            .iter()
            .map(|route| VehicleTrack::new(route.truck_id.clone(), route.waypoints.clone()))
            .collect()
    }
}

/// Uses the stops themselves as the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLinePaths;

impl PathProvider for StraightLinePaths {
    fn path_for(&self, stops: &[(f64, f64)]) -> Result<Polyline, PathError> {
        if stops.len() < 2 {
            return Err(PathError::TooFewStops(stops.len()));
        }
        Ok(Polyline::new(stops.to_vec()))
    }
}

/// Plans a route for every available truck.
///
/// Trucks in maintenance take no part. `previous` routes provide the
/// last-known path when the provider fails; without one the straight-line
/// path through the stops is used.
pub fn plan_routes<P>(
    trucks: &[Truck],
    bins: &[Bin],
    previous: &[Route],
    provider: &P,
    options: &PlanOptions,
) -> FleetPlan
where
    P: PathProvider + Sync,
{
    let available: Vec<&Truck> = trucks.iter().filter(|truck| truck.is_available()).collect();
    let clustered = cluster_points(bins, &available, &options.cluster);

    info!(
        trucks = available.len(),
        bins = bins.len(),
        unassigned = clustered.unassigned.len(),
        "planning routes"
    );

    let planned: Vec<(Route, bool)> = available
        .par_iter()
        .filter_map(|truck| {
            let Some(start) = truck.route_start() else {
                debug!(truck = %truck.id, "truck has no start location; skipping");
                return None;
            };
            let end = truck.route_end().unwrap_or(start);
            let cluster = clustered.clusters.get(&truck.id).cloned().unwrap_or_default();
            let ordered = sequence_stops(start, end, cluster, &options.sequence);

            let mut stops = Vec::with_capacity(ordered.len() + 2);
            stops.push(start);
            stops.extend(ordered.iter().map(|bin| bin.location()));
            stops.push(end);

            let last_known = previous
                .iter()
                .find(|route| route.truck_id == truck.id)
                .map(|route| &route.waypoints);
            let (waypoints, fell_back) = resolve_path(&truck.id, &stops, provider, last_known);

            let metrics = RouteMetrics::measure(&waypoints, &stops, &options.fuel);
            let route = Route {
                id: truck
                    .route_id
                    .clone()
                    .unwrap_or_else(|| format!("route-{}", truck.id)),
                truck_id: truck.id.clone(),
                waypoints,
                bin_ids: ordered.iter().map(|bin| bin.id.clone()).collect(),
                metrics,
            };
            Some((route, fell_back))
        })
        .collect();

    let mut plan = FleetPlan {
        unassigned: clustered.unassigned,
        ..FleetPlan::default()
    };
    for (route, fell_back) in planned {
        if fell_back {
            plan.fallbacks.push(route.truck_id.clone());
        }
        plan.routes.push(route);
    }
    plan
}

fn resolve_path<P: PathProvider>(
    truck_id: &str,
    stops: &[(f64, f64)],
    provider: &P,
    last_known: Option<&Polyline>,
) -> (Polyline, bool) {
    match provider.path_for(stops) {
        Ok(path) if path.is_simulatable() => (path, false),
        Ok(path) => {
            warn!(truck = %truck_id, waypoints = path.len(), "provider path unusable; falling back");
            (fallback_path(stops, last_known), true)
        }
        Err(err) => {
            warn!(truck = %truck_id, error = %err, "path lookup failed; falling back");
            (fallback_path(stops, last_known), true)
        }
    }
}

fn fallback_path(stops: &[(f64, f64)], last_known: Option<&Polyline>) -> Polyline {
    match last_known {
        Some(path) if path.is_simulatable() => path.clone(),
        _ => Polyline::new(stops.to_vec()),
    }
}
