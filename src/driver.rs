//! Tick loop around a [`FleetSimulation`].
//!
//! One thread runs every tick to completion and then, when due, the sync
//! task. Cancellation is checked before each tick, so no tick starts after
//! [`CancelToken::cancel`] has been observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::FleetConfig;
use crate::model::Bin;
use crate::rng::{RandomSource, SeededRandom};
use crate::sim::{FleetSimulation, TickReport, VehicleTrack};
use crate::sync::{SyncReport, SyncTask};
use crate::traits::PointStore;

/// Monotonic milliseconds since the driver started.
pub trait Clock {
    fn elapsed_ms(&self) -> u64;
}

pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn elapsed_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SimulationDriver<C, R, S> {
    simulation: FleetSimulation,
    clock: C,
    rng: R,
    sync: SyncTask<S>,
    tick_interval: Duration,
    ticks: u64,
}

impl<C, R, S> SimulationDriver<C, R, S>
where
    C: Clock,
    R: RandomSource,
    S: PointStore,
{
    pub fn new(
        simulation: FleetSimulation,
        clock: C,
        rng: R,
        sync: SyncTask<S>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            simulation,
            clock,
            rng,
            sync,
            tick_interval,
            ticks: 0,
        }
    }

    pub fn simulation(&self) -> &FleetSimulation {
        &self.simulation
    }

    pub fn sync(&self) -> &SyncTask<S> {
        &self.sync
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Swaps in a freshly fetched path for one vehicle.
    pub fn set_track(&mut self, track: VehicleTrack) {
        self.simulation.set_track(track);
    }

    /// Runs one full tick, then syncs if the cadence has elapsed.
    pub fn step(&mut self) -> (TickReport, Option<SyncReport>) {
        let now = self.clock.elapsed_ms();
        let report = self.simulation.tick(now, &mut self.rng);
        self.ticks += 1;
        self.sync.mark_dirty(report.changed.iter().cloned());
        let synced = self.sync.maybe_flush(now, self.simulation.bins());
        (report, synced)
    }

    /// Runs up to `n` ticks back to back. Returns how many ran.
    pub fn run_ticks(&mut self, n: u64, cancel: &CancelToken) -> u64 {
        let mut ran = 0;
        while ran < n && !cancel.is_cancelled() {
            self.step();
            ran += 1;
        }
        ran
    }

    /// Ticks every `tick_interval` until cancelled, then pushes pending writes.
    pub fn run(&mut self, cancel: &CancelToken) {
        let interval_ms = u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX);
        info!(interval_ms, "simulation loop started");

        while !cancel.is_cancelled() {
            let (report, _) = self.step();
            if !report.collections.is_empty() {
                debug!(collections = report.collections.len(), progress = report.progress, "tick");
            }
            thread::sleep(self.tick_interval);
        }

        let now = self.clock.elapsed_ms();
        let final_sync = self.sync.flush(now, self.simulation.bins());
        info!(ticks = self.ticks, pending = self.sync.pending(), pushed = final_sync.pushed, "simulation loop stopped");
    }

    pub fn into_parts(self) -> (FleetSimulation, SyncTask<S>) {
        (self.simulation, self.sync)
    }
}

impl<C, S> SimulationDriver<C, SeededRandom, S>
where
    C: Clock,
    S: PointStore,
{
    /// Driver with simulation constants, seed, tick rate and sync cadence
    /// taken from `config`.
    pub fn from_config(
        config: &FleetConfig,
        bins: Vec<Bin>,
        tracks: Vec<VehicleTrack>,
        clock: C,
        store: S,
    ) -> Self {
        let simulation = FleetSimulation::new(config.simulation.clone(), bins, tracks);
        Self::new(
            simulation,
            clock,
            config.random_source(),
            SyncTask::new(store, config.sync_interval_ms),
            config.tick_interval(),
        )
    }
}
