//! Insurance policy records

use flightsurety_common::{Address, FlightKey, Wei};
use serde::{Deserialize, Serialize};

/// Policy key: one policy per holder per flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyKey {
    pub holder: Address,
    pub flight: FlightKey,
}

impl PolicyKey {
    pub fn new(holder: Address, flight: FlightKey) -> Self {
        Self { holder, flight }
    }
}

/// Premium paid against a flight delay
///
/// Once claimed the record is kept for audit with its credit forced to zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub holder: Address,
    pub flight: FlightKey,
    pub premium_paid: Wei,
    /// Zero until the flight resolves as `LateAirline`
    pub payout_credit: Wei,
    pub claimed: bool,
    /// Block time of purchase (Unix seconds)
    pub purchased_at: i64,
}

impl InsurancePolicy {
    pub fn new(holder: Address, flight: FlightKey, premium_paid: Wei, purchased_at: i64) -> Self {
        Self {
            holder,
            flight,
            premium_paid,
            payout_credit: Wei::ZERO,
            claimed: false,
            purchased_at,
        }
    }
}
