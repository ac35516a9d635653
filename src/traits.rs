//! Core domain traits for the fleet planner.
//!
//! These are intentionally minimal. The surrounding data layer implements
//! them for its own bin and truck records; `crate::model` ships one
//! implementation.

use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, StoreError};
use crate::model::PointUpdate;
use crate::polyline::Polyline;

/// Unique identifier for planner entities.
pub trait Id: Clone + Eq + Hash {}

impl<T> Id for T where T: Clone + Eq + Hash {}

/// Anything with a fixed position (lat, lng).
pub trait Located {
    fn location(&self) -> (f64, f64);
}

impl Located for (f64, f64) {
    fn location(&self) -> (f64, f64) {
        *self
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn location(&self) -> (f64, f64) {
        (**self).location()
    }
}

/// A collection point (bin) whose fill level grows between pickups.
pub trait CollectionPoint: Located {
    type Id: Id;
    type VehicleId: Id;

    fn id(&self) -> &Self::Id;

    /// Fill level as a percentage in [0, 100].
    fn fill_level(&self) -> f64;

    fn status(&self) -> PointStatus;

    /// Vehicle this point is explicitly assigned to, if any.
    fn assigned_vehicle(&self) -> Option<&Self::VehicleId>;
}

/// A collection truck.
pub trait FleetVehicle {
    type Id: Id;

    fn id(&self) -> &Self::Id;

    /// Position used for nearest-vehicle assignment (depot or last known fix).
    /// Vehicles without one never receive fallback assignments.
    fn reference_location(&self) -> Option<(f64, f64)>;
}

impl<T: FleetVehicle + ?Sized> FleetVehicle for &T {
    type Id = T::Id;

    fn id(&self) -> &Self::Id {
        (**self).id()
    }

    fn reference_location(&self) -> Option<(f64, f64)> {
        (**self).reference_location()
    }
}

/// Supplies road geometry for an ordered list of stops.
///
/// The planner treats implementations as opaque; failures are logged and
/// replaced with the last-known or straight-line path.
pub trait PathProvider {
    fn path_for(&self, stops: &[(f64, f64)]) -> Result<Polyline, PathError>;
}

/// Write side of the external data store (`updatePoint(id, partialFields)`).
pub trait PointStore {
    fn update_point(&mut self, id: &str, update: &PointUpdate) -> Result<(), StoreError>;
}

/// Operational status of a collection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    #[default]
    Active,
    Critical,
    Inactive,
    /// Just collected; never picked up by nearest-vehicle fallback.
    Empty,
}

impl PointStatus {
    /// Status after a fill transition. `Inactive` is set by the data layer
    /// and is never overridden here.
    pub fn for_fill(self, fill_level: f64, critical_threshold: f64) -> Self {
        match self {
            PointStatus::Inactive => PointStatus::Inactive,
            _ if fill_level <= 0.0 => PointStatus::Empty,
            _ if fill_level >= critical_threshold => PointStatus::Critical,
            _ => PointStatus::Active,
        }
    }
}
