//! Oracle requests
//!
//! Lifecycle per request:
//!
//! ```text
//! Open ──quorum──▶ Finalized   (terminal)
//!   │
//!   └──ttl elapsed──▶ Abandoned (reopened by a later fetch)
//! ```

use flightsurety_common::{Address, FlightKey, FlightStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::consensus::ResponseTally;

/// Request key: the drawn index plus the flight being asked about
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
    pub index: u8,
    pub flight: FlightKey,
}

impl RequestKey {
    pub fn new(index: u8, flight: FlightKey) -> Self {
        Self { index, flight }
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.index, self.flight)
    }
}

/// Request state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum RequestState {
    Open,
    Finalized {
        status: FlightStatus,
        finalized_at: i64,
    },
    Abandoned {
        abandoned_at: i64,
    },
}

/// Status fetch awaiting oracle responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    /// Correlation id for logs
    pub request_id: Uuid,
    pub key: RequestKey,
    pub requester: Address,
    /// Block time the request (re)opened
    pub opened_at: i64,
    pub state: RequestState,
    pub responses: ResponseTally,
}

impl OracleRequest {
    pub fn open(key: RequestKey, requester: Address, opened_at: i64) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            key,
            requester,
            opened_at,
            state: RequestState::Open,
            responses: ResponseTally::default(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == RequestState::Open
    }

    pub fn final_status(&self) -> Option<FlightStatus> {
        match self.state {
            RequestState::Finalized { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Open and older than `ttl_secs` at `now`
    pub fn is_expired(&self, now: i64, ttl_secs: Option<u64>) -> bool {
        match ttl_secs {
            Some(ttl) if self.is_open() => {
                now.saturating_sub(self.opened_at) >= i64::try_from(ttl).unwrap_or(i64::MAX)
            }
            _ => false,
        }
    }
}
