//! Broadcast notifications
//!
//! One-way, fire-and-forget notifications for collaborators outside the
//! core (UI, oracle processes). Delivery is not guaranteed: a bus with no
//! subscribers, or a subscriber that lags, silently loses events.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::types::{address::Address, flight::FlightStatus, wei::Wei};

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Events emitted after a state transition commits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SuretyEvent {
    /// Candidate entered the voting queue
    AirlineApplied { airline: Address, sponsor: Address },
    /// Candidate admitted to the registry
    AirlineRegistered { airline: Address, votes: usize },
    /// Funding deposit accepted
    AirlineFunded {
        airline: Address,
        total: Wei,
        participating: bool,
    },
    FlightRegistered {
        airline: Address,
        flight: String,
        timestamp: i64,
    },
    InsurancePurchased {
        holder: Address,
        airline: Address,
        flight: String,
        timestamp: i64,
        premium: Wei,
    },
    PayoutCredited {
        holder: Address,
        airline: Address,
        flight: String,
        timestamp: i64,
        amount: Wei,
    },
    PayoutClaimed { holder: Address, amount: Wei },
    OracleRegistered { oracle: Address, indexes: Vec<u8> },
    /// Status fetch opened; oracles holding `index` should respond
    OracleRequest {
        index: u8,
        airline: Address,
        flight: String,
        timestamp: i64,
    },
    /// An oracle response was accepted
    OracleReport {
        index: u8,
        oracle: Address,
        airline: Address,
        flight: String,
        timestamp: i64,
        status: FlightStatus,
    },
    /// Quorum reached
    FlightStatusInfo {
        airline: Address,
        flight: String,
        timestamp: i64,
        status: FlightStatus,
    },
    /// Request expired without quorum
    RequestAbandoned {
        index: u8,
        airline: Address,
        flight: String,
        timestamp: i64,
    },
}

impl SuretyEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SuretyEvent::AirlineApplied { .. } => "AirlineApplied",
            SuretyEvent::AirlineRegistered { .. } => "AirlineRegistered",
            SuretyEvent::AirlineFunded { .. } => "AirlineFunded",
            SuretyEvent::FlightRegistered { .. } => "FlightRegistered",
            SuretyEvent::InsurancePurchased { .. } => "InsurancePurchased",
            SuretyEvent::PayoutCredited { .. } => "PayoutCredited",
            SuretyEvent::PayoutClaimed { .. } => "PayoutClaimed",
            SuretyEvent::OracleRegistered { .. } => "OracleRegistered",
            SuretyEvent::OracleRequest { .. } => "OracleRequest",
            SuretyEvent::OracleReport { .. } => "OracleReport",
            SuretyEvent::FlightStatusInfo { .. } => "FlightStatusInfo",
            SuretyEvent::RequestAbandoned { .. } => "RequestAbandoned",
        }
    }
}

/// Broadcast bus for [`SuretyEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SuretyEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SuretyEvent> {
        self.tx.subscribe()
    }

    /// Publish without waiting for, or requiring, any subscriber
    pub fn publish(&self, event: SuretyEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => trace!(event = name, receivers, "Event published"),
            Err(_) => trace!(event = name, "Event dropped, no subscribers"),
        }
    }

    pub fn publish_all(&self, events: impl IntoIterator<Item = SuretyEvent>) {
        for event in events {
            self.publish(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
