//! Test fixtures for fleet-planner.
//!
//! Riyadh landmarks used as bin sites, plus the depot and disposal facility
//! the fleet runs between.

#![allow(dead_code)]

pub mod riyadh_locations;

pub use riyadh_locations::*;

/// Routes `tracing` output through the test harness. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
