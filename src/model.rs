//! Concrete bin, truck and route records.
//!
//! Field names follow the dashboard's camelCase documents so records can be
//! exchanged with the data layer as-is.

use serde::{Deserialize, Serialize};

use crate::geo::chain_length_km;
use crate::polyline::Polyline;
use crate::traits::{CollectionPoint, FleetVehicle, Located, PointStatus};

/// A smart bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub fill_level: f64,
    /// Truck this bin is assigned to. Older documents call it `routeId`.
    #[serde(default, alias = "routeId")]
    pub assigned_truck: Option<String>,
    #[serde(default)]
    pub status: PointStatus,
}

impl Bin {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, fill_level: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            fill_level: clamp_fill(fill_level),
            assigned_truck: None,
            status: PointStatus::Active,
        }
    }

    pub fn assigned_to(mut self, truck_id: impl Into<String>) -> Self {
        self.assigned_truck = Some(truck_id.into());
        self
    }

    pub fn with_status(mut self, status: PointStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the fill level (clamped) and re-derives the status.
    pub fn set_fill(&mut self, fill_level: f64, critical_threshold: f64) {
        self.fill_level = clamp_fill(fill_level);
        self.status = self.status.for_fill(self.fill_level, critical_threshold);
    }

    /// Applies a partial update coming from the data layer.
    pub fn apply(&mut self, update: &PointUpdate) {
        if let Some(fill_level) = update.fill_level {
            self.fill_level = clamp_fill(fill_level);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

impl Located for Bin {
    fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl CollectionPoint for Bin {
    type Id = String;
    type VehicleId = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn fill_level(&self) -> f64 {
        self.fill_level
    }

    fn status(&self) -> PointStatus {
        self.status
    }

    fn assigned_vehicle(&self) -> Option<&String> {
        self.assigned_truck.as_ref()
    }
}

/// Clamps to [0, 100]; NaN becomes 0.
pub fn clamp_fill(fill_level: f64) -> f64 {
    if fill_level.is_nan() {
        0.0
    } else {
        fill_level.clamp(0.0, 100.0)
    }
}

/// Partial fields for `updatePoint(id, partialFields)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PointStatus>,
}

impl PointUpdate {
    /// The fields the simulation owns, taken from a bin's current state.
    pub fn from_bin(bin: &Bin) -> Self {
        Self {
            fill_level: Some(bin.fill_level),
            status: Some(bin.status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruckStatus {
    #[default]
    Active,
    Maintenance,
}

/// A collection truck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: String,
    /// Current load percentage.
    #[serde(default)]
    pub load: f64,
    #[serde(default)]
    pub status: TruckStatus,
    #[serde(default)]
    pub route_id: Option<String>,
    /// Depot or last known position.
    #[serde(default)]
    pub location: Option<(f64, f64)>,
    /// Where the route starts; falls back to `location`.
    #[serde(default)]
    pub start: Option<(f64, f64)>,
    /// Where the route ends (usually the disposal facility); falls back to the start.
    #[serde(default)]
    pub end: Option<(f64, f64)>,
}

impl Truck {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            load: 0.0,
            status: TruckStatus::Active,
            route_id: None,
            location: None,
            start: None,
            end: None,
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.location = Some((lat, lng));
        self
    }

    pub fn starting_at(mut self, lat: f64, lng: f64) -> Self {
        self.start = Some((lat, lng));
        self
    }

    pub fn ending_at(mut self, lat: f64, lng: f64) -> Self {
        self.end = Some((lat, lng));
        self
    }

    pub fn with_status(mut self, status: TruckStatus) -> Self {
        self.status = status;
        self
    }

    pub fn route_start(&self) -> Option<(f64, f64)> {
        self.start.or(self.location)
    }

    pub fn route_end(&self) -> Option<(f64, f64)> {
        self.end.or_else(|| self.route_start())
    }

    pub fn is_available(&self) -> bool {
        self.status == TruckStatus::Active
    }
}

impl FleetVehicle for Truck {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn reference_location(&self) -> Option<(f64, f64)> {
        self.location.or(self.start)
    }
}

/// Fuel consumption assumptions for route metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelModel {
    pub litres_per_km: f64,
    pub price_per_litre: f64,
}

impl Default for FuelModel {
    fn default() -> Self {
        Self {
            litres_per_km: 0.35,
            price_per_litre: 2.18,
        }
    }
}

/// Descriptive route figures shown next to the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub distance_km: f64,
    /// Percentage: straight-line length of the stop sequence over path length.
    pub efficiency: f64,
    pub fuel_cost: f64,
}

impl RouteMetrics {
    pub fn measure(path: &Polyline, stops: &[(f64, f64)], fuel: &FuelModel) -> Self {
        let distance_km = path.length_km();
        let direct_km = chain_length_km(stops);
        let efficiency = if distance_km > 0.0 {
            (direct_km / distance_km * 100.0).clamp(0.0, 100.0)
        } else {
            100.0
        };

        Self {
            distance_km,
            efficiency,
            fuel_cost: distance_km * fuel.litres_per_km * fuel.price_per_litre,
        }
    }
}

/// A planned route for one truck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub truck_id: String,
    pub waypoints: Polyline,
    pub bin_ids: Vec<String>,
    #[serde(default)]
    pub metrics: RouteMetrics,
}
