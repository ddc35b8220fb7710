//! # FlightSurety Oracle
//!
//! Multi-party oracle consensus for flight status resolution.
//!
//! ## Components
//!
//! - **Consensus**: index assignment and quorum tallying
//! - **Requests**: per-(index, flight) request lifecycle
//! - **Engine**: registration, fetch, response submission and expiry
//!
//! ## Flow
//!
//! ```text
//! fetch_flight_status ──▶ OracleRequest{index} ──broadcast──▶ oracles
//!                                                              │
//!        Finalized ◀── min_responses matching ◀── submit_response
//! ```

pub mod consensus;
pub mod engine;
pub mod request;

pub use consensus::{IndexAssigner, Oracle, QuorumManager, ResponseTally};
pub use engine::{FetchOutcome, IgnoreReason, OracleConsensusEngine, Submission};
pub use request::{OracleRequest, RequestKey, RequestState};

use flightsurety_common::{
    Result, SuretyError, DEFAULT_INDEXES_PER_ORACLE, DEFAULT_INDEX_SPACE, DEFAULT_MIN_RESPONSES,
};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Default request lifetime before it is abandoned (1 hour)
pub const DEFAULT_REQUEST_TTL_SECS: u64 = 3600;

/// Oracle engine configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Matching responses required to finalize (quorum)
    pub min_responses: usize,
    /// Indexes are drawn from `[0, index_space)`
    #[serde(deserialize_with = "deserialize_index_space")]
    pub index_space: u8,
    /// Indexes assigned to each oracle
    pub indexes_per_oracle: usize,
    /// Open requests older than this are abandoned; `None` never expires
    pub request_ttl_secs: Option<u64>,
    /// Hex-encoded 32-byte entropy key; random when unset
    pub entropy_seed: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            min_responses: DEFAULT_MIN_RESPONSES,
            index_space: DEFAULT_INDEX_SPACE,
            indexes_per_oracle: DEFAULT_INDEXES_PER_ORACLE,
            request_ttl_secs: Some(DEFAULT_REQUEST_TTL_SECS),
            entropy_seed: None,
        }
    }
}

// Some config sources narrow integers with `as`; reject instead of wrapping
fn deserialize_index_space<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = u64::deserialize(deserializer)?;
    u8::try_from(raw)
        .map_err(|_| de::Error::custom(format!("index_space {} exceeds 255", raw)))
}

impl fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The seed keys index assignment and must not reach logs
        f.debug_struct("OracleConfig")
            .field("min_responses", &self.min_responses)
            .field("index_space", &self.index_space)
            .field("indexes_per_oracle", &self.indexes_per_oracle)
            .field("request_ttl_secs", &self.request_ttl_secs)
            .field(
                "entropy_seed",
                &self.entropy_seed.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_responses == 0 {
            return Err(SuretyError::Config("min_responses must be at least 1".into()));
        }
        if self.index_space == 0 {
            return Err(SuretyError::Config("index_space must be at least 1".into()));
        }
        if self.indexes_per_oracle == 0 || self.indexes_per_oracle > self.index_space as usize {
            return Err(SuretyError::Config(format!(
                "indexes_per_oracle must be in 1..={}",
                self.index_space
            )));
        }
        self.entropy_key()?;
        Ok(())
    }

    /// Decoded entropy key, if configured
    pub fn entropy_key(&self) -> Result<Option<[u8; 32]>> {
        let Some(seed) = &self.entropy_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed.trim_start_matches("0x"))
            .map_err(|e| SuretyError::Config(format!("entropy_seed is not hex: {}", e)))?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SuretyError::Config("entropy_seed must be 32 bytes".into()))?;
        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OracleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_responses, 3);
        assert_eq!(config.index_space, 10);
        assert_eq!(config.indexes_per_oracle, 3);
    }

    #[test]
    fn test_invalid_configs() {
        let too_many = OracleConfig {
            indexes_per_oracle: 11,
            ..OracleConfig::default()
        };
        assert!(matches!(too_many.validate(), Err(SuretyError::Config(_))));

        let no_quorum = OracleConfig {
            min_responses: 0,
            ..OracleConfig::default()
        };
        assert!(no_quorum.validate().is_err());

        let bad_seed = OracleConfig {
            entropy_seed: Some("abcd".into()),
            ..OracleConfig::default()
        };
        assert!(bad_seed.validate().is_err());
    }

    #[test]
    fn test_entropy_key_decoding() {
        let config = OracleConfig {
            entropy_seed: Some(format!("0x{}", "ab".repeat(32))),
            ..OracleConfig::default()
        };
        assert_eq!(config.entropy_key().unwrap(), Some([0xab; 32]));
    }

    #[test]
    fn test_debug_hides_entropy_seed() {
        let seed = "cd".repeat(32);
        let config = OracleConfig {
            entropy_seed: Some(seed.clone()),
            ..OracleConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains(&seed));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("min_responses: 3"));

        let unseeded = format!("{:?}", OracleConfig::default());
        assert!(unseeded.contains("entropy_seed: None"));
    }
}
