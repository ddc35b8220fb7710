//! FlightSurety configuration
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. `flightsurety.toml` (optional)
//! 3. `FLIGHTSURETY__<SECTION>__<KEY>` environment variables, `.env` included
//!
//! Monetary thresholds are protocol constants and cannot be configured.

use flightsurety_common::{FlightStatus, Result, SuretyError};
use flightsurety_oracle::OracleConfig;
use serde::{Deserialize, Serialize};

/// Default config file stem searched in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "flightsurety";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FLIGHTSURETY";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuretyConfig {
    /// Oracle consensus settings
    pub oracle: OracleConfig,
    /// Oracle fleet simulator settings
    pub simulator: SimulatorSettings,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_filter: String,
    /// Broadcast channel capacity
    pub event_capacity: usize,
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig::default(),
            simulator: SimulatorSettings::default(),
            log_filter: "info".to_string(),
            event_capacity: flightsurety_common::events::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SuretyConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load with an explicit config file path (extension optional)
    pub fn load_from(path: &str) -> Result<Self> {
        Self::build(path, None)
    }

    /// Environment values stay strings until serde asks for a number, so
    /// hex seeds made only of digits are never reparsed as floats.
    fn build(path: &str, env: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()
            .map_err(|e| SuretyError::Config(e.to_string()))?;

        let cfg: SuretyConfig = settings
            .try_deserialize()
            .map_err(|e| SuretyError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.oracle.validate()?;
        if self.event_capacity == 0 {
            return Err(SuretyError::Config("event_capacity must be at least 1".into()));
        }
        self.simulator.validate()
    }
}

/// Oracle fleet simulator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    /// Oracles registered by the fleet
    pub oracle_count: usize,
    /// Status every fleet oracle reports
    pub reported_status: FlightStatus,
    /// Seconds to wait for quorum before drawing a new index
    pub round_timeout_secs: u64,
    /// Fetch attempts before the simulation gives up
    pub max_fetch_attempts: usize,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            oracle_count: 20,
            reported_status: FlightStatus::LateAirline,
            round_timeout_secs: 2,
            max_fetch_attempts: 5,
        }
    }
}

impl SimulatorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.reported_status == FlightStatus::Unknown {
            return Err(SuretyError::Config(
                "simulator.reported_status cannot be unknown".into(),
            ));
        }
        if self.max_fetch_attempts == 0 {
            return Err(SuretyError::Config(
                "simulator.max_fetch_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = SuretyConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.simulator.oracle_count, 20);
        assert_eq!(cfg.simulator.reported_status, FlightStatus::LateAirline);
        assert_eq!(cfg.oracle.min_responses, 3);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = SuretyConfig::load_from("does-not-exist/flightsurety").unwrap();
        assert_eq!(cfg.oracle, OracleConfig::default());
        assert_eq!(cfg.event_capacity, 1024);
    }

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_env_overrides_numeric_keys() {
        let cfg = SuretyConfig::build(
            "does-not-exist/flightsurety",
            env(&[
                ("FLIGHTSURETY__ORACLE__MIN_RESPONSES", "5"),
                ("FLIGHTSURETY__ORACLE__REQUEST_TTL_SECS", "60"),
                ("FLIGHTSURETY__EVENT_CAPACITY", "16"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.oracle.min_responses, 5);
        assert_eq!(cfg.oracle.request_ttl_secs, Some(60));
        assert_eq!(cfg.event_capacity, 16);
    }

    #[test]
    fn test_index_space_out_of_range_rejected() {
        let result = SuretyConfig::build(
            "does-not-exist/flightsurety",
            env(&[("FLIGHTSURETY__ORACLE__INDEX_SPACE", "300")]),
        );
        assert!(matches!(result, Err(SuretyError::Config(_))));
    }

    #[test]
    fn test_digit_only_seed_from_env_is_kept_verbatim() {
        let seed = "42".repeat(32);
        let cfg = SuretyConfig::build(
            "does-not-exist/flightsurety",
            env(&[("FLIGHTSURETY__ORACLE__ENTROPY_SEED", seed.as_str())]),
        )
        .unwrap();
        assert_eq!(cfg.oracle.entropy_seed.as_deref(), Some(seed.as_str()));
        assert_eq!(cfg.oracle.entropy_key().unwrap(), Some([0x42; 32]));
    }

    #[test]
    fn test_debug_redacts_entropy_seed() {
        let seed = "ab".repeat(32);
        let cfg = SuretyConfig {
            oracle: OracleConfig {
                entropy_seed: Some(seed.clone()),
                ..OracleConfig::default()
            },
            ..SuretyConfig::default()
        };
        let rendered = format!("{:?}", cfg);
        assert!(!rendered.contains(&seed));
        assert!(rendered.contains("entropy_seed"));
    }

    #[test]
    fn test_unknown_reported_status_rejected() {
        let cfg = SuretyConfig {
            simulator: SimulatorSettings {
                reported_status: FlightStatus::Unknown,
                ..SimulatorSettings::default()
            },
            ..SuretyConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(SuretyError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let cfg: SuretyConfig = serde_json::from_str(
            r#"{"oracle": {"min_responses": 5}, "simulator": {"reported_status": "on_time"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.oracle.min_responses, 5);
        assert_eq!(cfg.oracle.index_space, 10);
        assert_eq!(cfg.simulator.reported_status, FlightStatus::OnTime);
        assert_eq!(cfg.log_filter, "info");
    }
}
