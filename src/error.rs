//! Error types for the fleet planner.
//!
//! None of these escape the simulation tick: path and store failures are
//! logged by the caller and the previous state is kept.

use std::io;

use thiserror::Error;

/// Failure to obtain route geometry from a `PathProvider`.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("routing provider returned {0}")]
    Api(String),

    #[error("routing provider returned no route")]
    NoRoute,

    #[error("need at least two stops to build a path, got {0}")]
    TooFewStops(usize),
}

/// Failure to write a point update back to the external store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("update for {0} was rejected")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure while preparing an OSRM dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    ProcessFailure(String),
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },

    #[error("malformed config document: {0}")]
    Document(String),
}
