//! Riyadh locations for realistic fixtures.
//!
//! Coordinates are approximate positions of public landmarks; they only need
//! to be routable with the GCC states extract.

use fleet_planner::model::{Bin, Truck};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Fleet Bases
// ============================================================================

pub const DEPOT: Location = Location::new("Al Sulay Depot", 24.6100, 46.7900);

pub const DISPOSAL_FACILITY: Location = Location::new("Second Industrial City", 24.5480, 46.8600);

// ============================================================================
// Bin Sites
// ============================================================================

pub const NORTH_SITES: &[Location] = &[
    Location::new("Riyadh Park", 24.7562, 46.6291),
    Location::new("Al Nakheel Mall", 24.7686, 46.7125),
    Location::new("King Saud University", 24.7165, 46.6192),
    Location::new("Kingdom Centre", 24.7114, 46.6744),
    Location::new("Diriyah At-Turaif", 24.7335, 46.5755),
];

pub const CENTRAL_SITES: &[Location] = &[
    Location::new("Al Faisaliyah Tower", 24.6905, 46.6851),
    Location::new("Panorama Mall", 24.6919, 46.6697),
    Location::new("National Museum", 24.6478, 46.7104),
    Location::new("Masmak Fortress", 24.6312, 46.7133),
    Location::new("Al Batha Market", 24.6330, 46.7170),
];

pub const EAST_SITES: &[Location] = &[
    Location::new("King Fahd Stadium", 24.7889, 46.8394),
    Location::new("Al Hamra Plaza", 24.7750, 46.7550),
    Location::new("Granada Mall", 24.7850, 46.7260),
    Location::new("Exit 15 Souq", 24.6700, 46.7950),
];

pub fn all_sites() -> Vec<Location> {
    NORTH_SITES
        .iter()
        .chain(CENTRAL_SITES)
        .chain(EAST_SITES)
        .cloned()
        .collect()
}

/// One bin per site with the given fill level.
pub fn bins_at(sites: &[Location], fill_level: f64) -> Vec<Bin> {
    sites
        .iter()
        .enumerate()
        .map(|(i, site)| Bin::new(format!("bin-{}", i + 1), site.lat, site.lng, fill_level))
        .collect()
}

/// Trucks parked at the depot, running to the disposal facility.
pub fn depot_trucks(count: usize) -> Vec<Truck> {
    (1..=count)
        .map(|i| {
            Truck::new(format!("truck-{}", i))
                .at(DEPOT.lat, DEPOT.lng)
                .ending_at(DISPOSAL_FACILITY.lat, DISPOSAL_FACILITY.lng)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_in_riyadh_area() {
        for loc in all_sites() {
            assert!(loc.lat > 24.4 && loc.lat < 24.9, "{} lat out of range: {}", loc.name, loc.lat);
            assert!(loc.lng > 46.4 && loc.lng < 47.0, "{} lng out of range: {}", loc.name, loc.lng);
        }
    }
}
