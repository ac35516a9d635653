//! Configuration for planning and simulation.
//!
//! Every field has a default; `from_env` overrides them from `FLEET_*` and
//! `OSRM_*` variables, and `from_json` reads a config document.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, PathError};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::planner::PlanOptions;
use crate::rng::SeededRandom;
use crate::sim::{ProgressMode, SimulationConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub plan: PlanOptions,
    pub simulation: SimulationConfig,
    pub osrm: OsrmConfig,
    pub tick_interval_ms: u64,
    /// Cadence of the push to the external store.
    pub sync_interval_ms: u64,
    /// Seed for the refill draws; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            plan: PlanOptions::default(),
            simulation: SimulationConfig::default(),
            osrm: OsrmConfig::default(),
            tick_interval_ms: 50,
            sync_interval_ms: 3_000,
            seed: None,
        }
    }
}

impl FleetConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(document).map_err(|err| ConfigError::Document(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` on top of the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_with(&lookup, "FLEET_PICKUP_THRESHOLD", &mut config.plan.cluster.pickup_threshold)?;
        override_with(&lookup, "FLEET_END_BIAS", &mut config.plan.sequence.end_bias)?;
        override_with(&lookup, "FLEET_CYCLE_MS", &mut config.simulation.cycle_duration_ms)?;
        override_with(&lookup, "FLEET_PROXIMITY_DEG", &mut config.simulation.proximity_threshold)?;
        override_with(&lookup, "FLEET_NEAR_EMPTY", &mut config.simulation.near_empty_threshold)?;
        override_with(&lookup, "FLEET_REFILL_PROBABILITY", &mut config.simulation.refill_probability)?;
        override_with(&lookup, "FLEET_REFILL_AMOUNT", &mut config.simulation.refill_amount)?;
        override_with(&lookup, "FLEET_NOTIFICATION_MS", &mut config.simulation.notification_duration_ms)?;
        override_with(&lookup, "FLEET_CRITICAL_THRESHOLD", &mut config.simulation.critical_threshold)?;
        override_with(&lookup, "FLEET_TICK_MS", &mut config.tick_interval_ms)?;
        override_with(&lookup, "FLEET_SYNC_MS", &mut config.sync_interval_ms)?;

        if let Some(value) = lookup("FLEET_PROGRESS_MODE") {
            config.simulation.progress_mode = match value.trim() {
                "lockstep" => ProgressMode::Lockstep,
                "per-vehicle" => ProgressMode::PerVehicle,
                _ => return Err(invalid("FLEET_PROGRESS_MODE", &value)),
            };
        }

        if let Some(value) = lookup("FLEET_SEED") {
            let seed = value
                .trim()
                .parse()
                .map_err(|_| invalid("FLEET_SEED", &value))?;
            config.seed = Some(seed);
        }

        if let Some(url) = lookup("OSRM_URL") {
            config.osrm.base_url = url;
        }
        if let Some(profile) = lookup("OSRM_PROFILE") {
            config.osrm.profile = profile;
        }
        override_with(&lookup, "OSRM_TIMEOUT_SECS", &mut config.osrm.timeout_secs)?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot drive a simulation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.cycle_duration_ms == 0 {
            return Err(invalid("cycle_duration_ms", "0"));
        }
        if self.tick_interval_ms == 0 {
            return Err(invalid("tick_interval_ms", "0"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Seeded when `seed` is set, so runs can be replayed.
    pub fn random_source(&self) -> SeededRandom {
        match self.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_entropy(),
        }
    }

    pub fn osrm_client(&self) -> Result<OsrmClient, PathError> {
        Ok(OsrmClient::new(self.osrm.clone())?)
    }
}

fn override_with<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(key) else {
        return Ok(());
    };
    *target = value.trim().parse().map_err(|_| invalid(key, &value))?;
    debug!(key, value = %value.trim(), "config override");
    Ok(())
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}
