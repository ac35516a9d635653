//! fleet-planner core
//!
//! Collection-point assignment, stop sequencing and the live fleet
//! simulation behind a waste-collection dashboard.

pub mod traits;
pub mod error;
pub mod model;
pub mod geo;
pub mod polyline;
pub mod rng;
pub mod cluster;
pub mod sequence;
pub mod planner;
pub mod sim;
pub mod sync;
pub mod driver;
pub mod osrm;
pub mod osrm_data;
pub mod config;
