//! Live fleet simulation.
//!
//! [`FleetSimulation`] owns the simulated state: bins, one track per
//! vehicle, and the notification slots. Each [`FleetSimulation::tick`]
//! moves every vehicle along its path, empties bins within reach, and lets
//! the remaining bins slowly refill. Nothing here returns an error; a bad
//! path or location only removes that entity from the tick.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::geo::{degree_distance, is_finite_location};
use crate::model::{Bin, clamp_fill};
use crate::polyline::Polyline;
use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressMode {
    /// One progress value for every vehicle.
    #[default]
    Lockstep,
    /// Each track applies its own phase offset and speed factor.
    PerVehicle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Time for one full pass along every path.
    pub cycle_duration_ms: u64,
    /// Vehicle-to-bin distance (degrees) that counts as "at" the bin.
    pub proximity_threshold: f64,
    /// Bins at or below this fill are not worth collecting.
    pub near_empty_threshold: f64,
    /// Chance per tick that an idle bin gains `refill_amount`.
    pub refill_probability: f64,
    pub refill_amount: f64,
    /// How long a collection notification stays up.
    pub notification_duration_ms: u64,
    /// Progress range `[start, end)` announcing arrival at the facility.
    /// The notice stays up until progress wraps into the next cycle.
    pub facility_window: (f64, f64),
    pub critical_threshold: f64,
    pub progress_mode: ProgressMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycle_duration_ms: 20_000,
            proximity_threshold: 0.003,
            near_empty_threshold: 5.0,
            refill_probability: 0.02,
            refill_amount: 0.1,
            notification_duration_ms: 3_000,
            facility_window: (0.98, 0.99),
            critical_threshold: 95.0,
            progress_mode: ProgressMode::Lockstep,
        }
    }
}

/// Position within the cycle, in [0, 1).
pub fn cycle_progress(elapsed_ms: u64, cycle_duration_ms: u64) -> f64 {
    if cycle_duration_ms == 0 {
        return 0.0;
    }
    (elapsed_ms % cycle_duration_ms) as f64 / cycle_duration_ms as f64
}

/// A vehicle and the path it loops along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleTrack {
    pub vehicle_id: String,
    pub path: Polyline,
    /// Added to progress in per-vehicle mode, as a fraction of the cycle.
    #[serde(default)]
    pub phase_offset: f64,
    /// Cycles per base cycle in per-vehicle mode.
    #[serde(default = "default_speed_factor")]
    pub speed_factor: f64,
}

fn default_speed_factor() -> f64 {
    1.0
}

impl VehicleTrack {
    pub fn new(vehicle_id: impl Into<String>, path: Polyline) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            path,
            phase_offset: 0.0,
            speed_factor: 1.0,
        }
    }

    pub fn with_phase(mut self, phase_offset: f64) -> Self {
        self.phase_offset = phase_offset;
        self
    }

    pub fn with_speed(mut self, speed_factor: f64) -> Self {
        self.speed_factor = speed_factor;
        self
    }

    fn progress(&self, shared: f64, elapsed_ms: u64, config: &SimulationConfig) -> f64 {
        match config.progress_mode {
            ProgressMode::Lockstep => shared,
            ProgressMode::PerVehicle => {
                if config.cycle_duration_ms == 0 {
                    return 0.0;
                }
                let cycles = elapsed_ms as f64 / config.cycle_duration_ms as f64;
                let progress = (cycles * self.speed_factor + self.phase_offset).rem_euclid(1.0);
                // rem_euclid can round up to exactly 1.0 for tiny negatives
                if progress.is_finite() && progress < 1.0 { progress } else { 0.0 }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    pub vehicle_id: String,
    pub location: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    pub vehicle_id: String,
    pub point_id: String,
    /// Fill level just before the bin was emptied.
    pub collected_fill: f64,
}

/// A transient message for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub expires_at_ms: u64,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub elapsed_ms: u64,
    pub progress: f64,
    pub positions: Vec<VehiclePosition>,
    pub collections: Vec<CollectionEvent>,
    pub refilled: usize,
    /// The shared progress entered the facility window since the previous
    /// tick, even if a wrap in the same tick already cleared the notice.
    pub arrived_at_facility: bool,
    /// Bins whose fill or status changed this tick.
    pub changed: Vec<String>,
}

pub struct FleetSimulation {
    config: SimulationConfig,
    bins: Vec<Bin>,
    tracks: Vec<VehicleTrack>,
    positions: Vec<VehiclePosition>,
    notification: Option<Notification>,
    facility_notice: Option<String>,
    /// Shared progress of the previous tick.
    last_progress: Option<f64>,
}

impl FleetSimulation {
    pub fn new(config: SimulationConfig, bins: Vec<Bin>, tracks: Vec<VehicleTrack>) -> Self {
        Self {
            config,
            bins,
            tracks,
            positions: Vec::new(),
            notification: None,
            facility_notice: None,
            last_progress: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin(&self, id: &str) -> Option<&Bin> {
        self.bins.iter().find(|bin| bin.id == id)
    }

    pub fn tracks(&self) -> &[VehicleTrack] {
        &self.tracks
    }

    /// Positions computed by the last tick.
    pub fn positions(&self) -> &[VehiclePosition] {
        &self.positions
    }

    pub fn position_of(&self, vehicle_id: &str) -> Option<(f64, f64)> {
        self.positions
            .iter()
            .find(|position| position.vehicle_id == vehicle_id)
            .map(|position| position.location)
    }

    pub fn notification(&self) -> Option<&str> {
        self.notification.as_ref().map(|note| note.message.as_str())
    }

    pub fn facility_notice(&self) -> Option<&str> {
        self.facility_notice.as_deref()
    }

    /// Replaces the track for `track.vehicle_id`, or adds it.
    pub fn set_track(&mut self, track: VehicleTrack) {
        match self
            .tracks
            .iter_mut()
            .find(|existing| existing.vehicle_id == track.vehicle_id)
        {
            Some(existing) => *existing = track,
            None => self.tracks.push(track),
        }
    }

    pub fn remove_track(&mut self, vehicle_id: &str) -> Option<VehicleTrack> {
        let index = self
            .tracks
            .iter()
            .position(|track| track.vehicle_id == vehicle_id)?;
        Some(self.tracks.remove(index))
    }

    /// Replaces the bin snapshot with a fresh one from the data layer.
    pub fn load_bins(&mut self, bins: Vec<Bin>) {
        self.bins = bins;
    }

    /// Advances the simulation to `elapsed_ms` since start.
    pub fn tick<R: RandomSource + ?Sized>(&mut self, elapsed_ms: u64, rng: &mut R) -> TickReport {
        if self
            .notification
            .as_ref()
            .is_some_and(|note| elapsed_ms >= note.expires_at_ms)
        {
            self.notification = None;
        }

        let progress = cycle_progress(elapsed_ms, self.config.cycle_duration_ms);
        let positions = self.interpolate(progress, elapsed_ms);

        let mut report = TickReport {
            elapsed_ms,
            progress,
            ..TickReport::default()
        };

        for bin in &mut self.bins {
            let location = (bin.lat, bin.lng);
            let nearby = if is_finite_location(location) {
                positions.iter().find(|position| {
                    degree_distance(position.location, location) < self.config.proximity_threshold
                })
            } else {
                debug!(bin = %bin.id, "bin has a non-finite location; skipping proximity");
                None
            };

            match nearby {
                Some(vehicle) => {
                    if bin.fill_level > self.config.near_empty_threshold {
                        let collected_fill = bin.fill_level;
                        bin.set_fill(0.0, self.config.critical_threshold);
                        info!(vehicle = %vehicle.vehicle_id, bin = %bin.id, collected_fill, "bin collected");

                        if self.notification.is_none() {
                            self.notification = Some(Notification {
                                message: format!(
                                    "Truck {} collected bin {}",
                                    vehicle.vehicle_id, bin.id
                                ),
                                expires_at_ms: elapsed_ms
                                    .saturating_add(self.config.notification_duration_ms),
                            });
                        }

                        report.collections.push(CollectionEvent {
                            vehicle_id: vehicle.vehicle_id.clone(),
                            point_id: bin.id.clone(),
                            collected_fill,
                        });
                        report.changed.push(bin.id.clone());
                    }
                }
                None => {
                    if bin.fill_level < 100.0 && rng.chance(self.config.refill_probability) {
                        let previous = (bin.fill_level, bin.status);
                        bin.set_fill(
                            clamp_fill(bin.fill_level + self.config.refill_amount),
                            self.config.critical_threshold,
                        );
                        if (bin.fill_level, bin.status) != previous {
                            report.refilled += 1;
                            report.changed.push(bin.id.clone());
                        }
                    }
                }
            }
        }

        report.arrived_at_facility = self.update_facility_notice(progress);
        report.positions = positions.clone();
        self.positions = positions;
        report
    }

    fn interpolate(&self, shared: f64, elapsed_ms: u64) -> Vec<VehiclePosition> {
        self.tracks
            .iter()
            .filter_map(|track| {
                let progress = track.progress(shared, elapsed_ms, &self.config);
                match track.path.position_at(progress) {
                    Some(location) => Some(VehiclePosition {
                        vehicle_id: track.vehicle_id.clone(),
                        location,
                    }),
                    None => {
                        debug!(vehicle = %track.vehicle_id, waypoints = track.path.len(), "no usable path");
                        None
                    }
                }
            })
            .collect()
    }

    /// Works on the interval since the last tick, so coarse ticks can
    /// neither skip the window nor miss the wrap. Returns whether the fleet
    /// entered the window during that interval.
    fn update_facility_notice(&mut self, progress: f64) -> bool {
        let (window_start, window_end) = self.config.facility_window;
        let previous = self.last_progress.replace(progress);
        let wrapped = previous.is_some_and(|previous| progress < previous);

        // Arrival is entering the window, so a tick inside it is not counted twice
        let crossed = match previous {
            None => progress >= window_start && progress < window_end,
            Some(previous) if wrapped => previous < window_start,
            Some(previous) => previous < window_start && progress >= window_start,
        };

        if crossed {
            info!(progress, "fleet arriving at disposal facility");
        }

        if wrapped {
            self.facility_notice = None;
        } else if crossed && self.facility_notice.is_none() {
            self.facility_notice = Some("Trucks arriving at disposal facility".to_string());
        }

        crossed
    }
}
