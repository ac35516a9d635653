//! Stop assignment: partitions collection points among vehicles.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::degree_distance;
use crate::traits::{CollectionPoint, FleetVehicle, PointStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Unassigned points need a fill level above this to be picked up.
    pub pickup_threshold: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            pickup_threshold: 50.0,
        }
    }
}

/// Why a point ended up in no cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnassignedReason {
    NoVehicles,
    BelowPickupThreshold,
    AlreadyEmpty,
    /// No vehicle has a reference location to measure against.
    NoLocatedVehicle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnassignedPoint<PointId> {
    pub point_id: PointId,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone)]
pub struct ClusterResult<'a, P, VehicleId, PointId> {
    /// One entry per input vehicle; points keep their input order.
    pub clusters: HashMap<VehicleId, Vec<&'a P>>,
    /// Points left out of every cluster. They are retried on the next pass.
    pub unassigned: Vec<UnassignedPoint<PointId>>,
}

/// Assigns each point to a vehicle.
///
/// An explicit assignment to a known vehicle always wins. Otherwise a point
/// that needs pickup goes to the nearest located vehicle, ties going to the
/// earliest vehicle in `vehicles`.
pub fn cluster_points<'a, P, V>(
    points: &'a [P],
    vehicles: &[V],
    options: &ClusterOptions,
) -> ClusterResult<'a, P, V::Id, P::Id>
where
    P: CollectionPoint<VehicleId = V::Id>,
    V: FleetVehicle,
{
    let mut clusters: HashMap<V::Id, Vec<&'a P>> = vehicles
        .iter()
        .map(|vehicle| (vehicle.id().clone(), Vec::new()))
        .collect();
    let mut unassigned = Vec::new();

    for point in points {
        if let Some(cluster) = point
            .assigned_vehicle()
            .and_then(|vehicle_id| clusters.get_mut(vehicle_id))
        {
            cluster.push(point);
            continue;
        }

        let reason = if vehicles.is_empty() {
            UnassignedReason::NoVehicles
        } else if point.status() == PointStatus::Empty {
            UnassignedReason::AlreadyEmpty
        } else if !(point.fill_level() > options.pickup_threshold) {
            UnassignedReason::BelowPickupThreshold
        } else if let Some(vehicle) = nearest_vehicle(point.location(), vehicles) {
            clusters.entry(vehicle.id().clone()).or_default().push(point);
            continue;
        } else {
            UnassignedReason::NoLocatedVehicle
        };

        unassigned.push(UnassignedPoint {
            point_id: point.id().clone(),
            reason,
        });
    }

    debug!(
        vehicles = vehicles.len(),
        points = points.len(),
        unassigned = unassigned.len(),
        "clustered collection points"
    );

    ClusterResult {
        clusters,
        unassigned,
    }
}

/// First vehicle with the strictly smallest distance. NaN distances never win.
fn nearest_vehicle<V: FleetVehicle>(location: (f64, f64), vehicles: &[V]) -> Option<&V> {
    let mut best: Option<&V> = None;
    let mut best_distance = f64::INFINITY;

    for vehicle in vehicles {
        let Some(reference) = vehicle.reference_location() else {
            continue;
        };
        let distance = degree_distance(location, reference);
        if distance < best_distance {
            best_distance = distance;
            best = Some(vehicle);
        }
    }

    best
}
