//! Sequencing and fleet planning tests.

mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};

use fleet_planner::cluster::UnassignedReason;
use fleet_planner::error::PathError;
use fleet_planner::model::{Bin, Route, RouteMetrics, Truck, TruckStatus};
use fleet_planner::planner::{PlanOptions, StraightLinePaths, plan_routes};
use fleet_planner::polyline::Polyline;
use fleet_planner::sequence::{SequenceOptions, sequence_indices, sequence_stops};
use fleet_planner::traits::PathProvider;

use fixtures::{CENTRAL_SITES, DEPOT, DISPOSAL_FACILITY, EAST_SITES, NORTH_SITES, all_sites, bins_at, depot_trucks};

// ============================================================================
// Test Providers
// ============================================================================

/// Fails every other request.
struct FlakyProvider {
    calls: AtomicUsize,
}

impl PathProvider for FlakyProvider {
    fn path_for(&self, stops: &[(f64, f64)]) -> Result<Polyline, PathError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            Err(PathError::NoRoute)
        } else {
            StraightLinePaths.path_for(stops)
        }
    }
}

struct DownProvider;

impl PathProvider for DownProvider {
    fn path_for(&self, _stops: &[(f64, f64)]) -> Result<Polyline, PathError> {
        Err(PathError::Api("service unavailable".to_string()))
    }
}

/// Inserts a midpoint into every leg, like a road network would.
struct DetourProvider;

impl PathProvider for DetourProvider {
    fn path_for(&self, stops: &[(f64, f64)]) -> Result<Polyline, PathError> {
        let mut points = vec![stops[0]];
        for leg in stops.windows(2) {
            points.push((leg[0].0, leg[1].1));
            points.push(leg[1]);
        }
        Ok(Polyline::new(points))
    }
}

// ============================================================================
// Sequencing
// ============================================================================

#[test]
fn test_sequencing_preserves_membership() {
    let bins = bins_at(&all_sites(), 80.0);
    let ordered = sequence_stops(DEPOT.coords(), DISPOSAL_FACILITY.coords(), bins.clone(), &SequenceOptions::default());

    assert_eq!(ordered.len(), bins.len());
    let mut expected: Vec<&str> = bins.iter().map(|b| b.id.as_str()).collect();
    let mut actual: Vec<&str> = ordered.iter().map(|b| b.id.as_str()).collect();
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn test_sequencing_keeps_duplicates() {
    let stops = vec![(1.0, 1.0), (1.0, 1.0), (2.0, 2.0)];
    let ordered = sequence_stops((0.0, 0.0), (3.0, 3.0), stops, &SequenceOptions::default());
    assert_eq!(ordered, vec![(1.0, 1.0), (1.0, 1.0), (2.0, 2.0)]);
}

#[test]
fn test_sequencing_is_deterministic() {
    let sites: Vec<(f64, f64)> = all_sites().iter().map(|s| s.coords()).collect();
    let first = sequence_indices(DEPOT.coords(), DISPOSAL_FACILITY.coords(), &sites, &SequenceOptions::default());
    for _ in 0..10 {
        let again = sequence_indices(DEPOT.coords(), DISPOSAL_FACILITY.coords(), &sites, &SequenceOptions::default());
        assert_eq!(again, first);
    }
}

#[test]
fn test_sequencing_starts_near_start() {
    let sites: Vec<(f64, f64)> = CENTRAL_SITES.iter().map(|s| s.coords()).collect();
    let order = sequence_indices(sites[3], DEPOT.coords(), &sites, &SequenceOptions::default());
    // Starting on top of Masmak Fortress visits it first
    assert_eq!(order[0], 3);
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn test_plan_covers_all_pickups() {
    let trucks = depot_trucks(3);
    let bins = bins_at(&all_sites(), 75.0);

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());

    assert_eq!(plan.routes.len(), 3);
    let planned: usize = plan.routes.iter().map(|r| r.bin_ids.len()).sum();
    assert_eq!(planned, bins.len());
    assert!(plan.unassigned.is_empty());
    assert!(plan.fallbacks.is_empty());
}

#[test]
fn test_plan_routes_run_start_to_end() {
    let trucks = depot_trucks(1);
    let bins = bins_at(NORTH_SITES, 90.0);

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());
    let route = plan.route_for("truck-1").unwrap();

    assert_eq!(route.id, "route-truck-1");
    assert_eq!(route.waypoints.points().first(), Some(&DEPOT.coords()));
    assert_eq!(route.waypoints.points().last(), Some(&DISPOSAL_FACILITY.coords()));
    assert_eq!(route.waypoints.len(), bins.len() + 2);
    assert!(route.metrics.distance_km > 0.0);
    assert!((route.metrics.efficiency - 100.0).abs() < 1e-9);
}

#[test]
fn test_explicit_assignments_survive_planning() {
    let trucks = vec![
        Truck::new("T1").at(24.75, 46.62),
        Truck::new("T2").at(24.63, 46.71),
    ];
    let bins = vec![
        Bin::new("near-T1", 24.751, 46.621, 20.0).assigned_to("T2"),
        Bin::new("near-T2", 24.631, 46.711, 80.0),
    ];

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());

    assert_eq!(plan.route_for("T1").unwrap().bin_ids, Vec::<String>::new());
    // Sequencing starts from T2, so its own neighbour comes first
    assert_eq!(plan.route_for("T2").unwrap().bin_ids, vec!["near-T2", "near-T1"]);
}

#[test]
fn test_maintenance_trucks_are_not_planned() {
    let trucks = vec![
        Truck::new("T1").at(24.75, 46.62).with_status(TruckStatus::Maintenance),
        Truck::new("T2").at(24.63, 46.71),
    ];
    let bins = vec![Bin::new("B1", 24.751, 46.621, 80.0).assigned_to("T1")];

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());

    assert!(plan.route_for("T1").is_none());
    // The full bin moves to the only available truck
    assert_eq!(plan.route_for("T2").unwrap().bin_ids, vec!["B1"]);
}

#[test]
fn test_trucks_without_start_are_skipped() {
    let trucks = vec![Truck::new("T1"), Truck::new("T2").at(24.63, 46.71)];
    let bins = vec![Bin::new("B1", 24.64, 46.72, 10.0).assigned_to("T1")];

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());

    assert_eq!(plan.routes.len(), 1);
    assert_eq!(plan.routes[0].truck_id, "T2");
}

#[test]
fn test_low_fill_bins_are_reported() {
    let trucks = depot_trucks(2);
    let bins = bins_at(EAST_SITES, 12.0);

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());

    assert_eq!(plan.unassigned.len(), bins.len());
    assert!(plan.unassigned.iter().all(|u| u.reason == UnassignedReason::BelowPickupThreshold));
    assert!(plan.routes.iter().all(|r| r.bin_ids.is_empty()));
}

#[test]
fn test_provider_failure_uses_last_known_path() {
    let trucks = depot_trucks(1);
    let bins = bins_at(CENTRAL_SITES, 90.0);
    let last_known = Route {
        id: "route-truck-1".to_string(),
        truck_id: "truck-1".to_string(),
        waypoints: Polyline::new(vec![DEPOT.coords(), (24.63, 46.75), DISPOSAL_FACILITY.coords()]),
        bin_ids: Vec::new(),
        metrics: RouteMetrics::default(),
    };

    let plan = plan_routes(&trucks, &bins, &[last_known.clone()], &DownProvider, &PlanOptions::default());

    assert_eq!(plan.fallbacks, vec!["truck-1"]);
    let route = plan.route_for("truck-1").unwrap();
    assert_eq!(route.waypoints, last_known.waypoints);
    // Bin order still comes from the fresh sequence
    assert_eq!(route.bin_ids.len(), bins.len());
}

#[test]
fn test_provider_failure_without_history_goes_straight() {
    let trucks = depot_trucks(2);
    let bins = bins_at(&all_sites(), 90.0);
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
    };

    let plan = plan_routes(&trucks, &bins, &[], &provider, &PlanOptions::default());

    assert_eq!(plan.routes.len(), 2);
    assert_eq!(plan.fallbacks.len(), 1);
    for route in &plan.routes {
        assert!(route.waypoints.is_simulatable());
        assert_eq!(route.waypoints.len(), route.bin_ids.len() + 2);
    }
}

#[test]
fn test_detours_lower_efficiency() {
    let trucks = depot_trucks(1);
    let bins = bins_at(NORTH_SITES, 90.0);

    let straight = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());
    let detour = plan_routes(&trucks, &bins, &[], &DetourProvider, &PlanOptions::default());

    let straight = &straight.routes[0].metrics;
    let detour = &detour.routes[0].metrics;
    assert!(detour.distance_km > straight.distance_km);
    assert!(detour.efficiency < straight.efficiency);
    assert!(detour.fuel_cost > straight.fuel_cost);
}

#[test]
fn test_plan_tracks_match_routes() {
    let trucks = depot_trucks(2);
    let bins = bins_at(&all_sites(), 90.0);

    let plan = plan_routes(&trucks, &bins, &[], &StraightLinePaths, &PlanOptions::default());
    let tracks = plan.tracks();

    assert_eq!(tracks.len(), plan.routes.len());
    for (track, route) in tracks.iter().zip(&plan.routes) {
        assert_eq!(track.vehicle_id, route.truck_id);
        assert_eq!(track.path, route.waypoints);
    }
}
