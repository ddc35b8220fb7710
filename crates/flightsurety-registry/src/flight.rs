//! Flight Directory
//!
//! Maps registered flights to the airline that owns them. A flight's status
//! is written exactly once, when the oracle quorum resolves it.

use flightsurety_common::{Address, FlightKey, FlightStatus, Result, SuretyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::airline::AirlineRegistry;

/// Registered flight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub key: FlightKey,
    pub status: FlightStatus,
    pub resolved: bool,
}

/// Directory of registered flights
#[derive(Debug, Default)]
pub struct FlightDirectory {
    flights: HashMap<FlightKey, Flight>,
    /// (airline, code) → departure timestamps, ascending
    schedule: HashMap<(Address, String), BTreeSet<i64>>,
}

impl FlightDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a flight owned by `caller`
    pub fn register_flight(
        &mut self,
        airlines: &AirlineRegistry,
        caller: Address,
        code: &str,
        timestamp: i64,
    ) -> Result<&Flight> {
        airlines.require_participating(&caller)?;
        if code.is_empty() {
            return Err(SuretyError::invalid_state("flight code is empty"));
        }

        let key = FlightKey::new(caller, code, timestamp);
        if self.flights.contains_key(&key) {
            return Err(SuretyError::DuplicateFlight);
        }

        self.schedule
            .entry((caller, code.to_string()))
            .or_default()
            .insert(timestamp);
        info!(flight = %key, "Flight registered");

        let flight = self.flights.entry(key.clone()).or_insert(Flight {
            key,
            status: FlightStatus::Unknown,
            resolved: false,
        });
        Ok(flight)
    }

    /// Record the final status decided by the oracle quorum
    pub fn resolve_flight(&mut self, key: &FlightKey, status: FlightStatus) -> Result<&Flight> {
        let flight = self.flights.get_mut(key).ok_or(SuretyError::UnknownFlight)?;
        if flight.resolved {
            return Err(SuretyError::invalid_state(format!(
                "flight {} already resolved as {}",
                key, flight.status
            )));
        }

        flight.status = status;
        flight.resolved = true;
        info!(flight = %key, status = %status, "Flight resolved");
        Ok(flight)
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    /// Fail unless the flight exists and is still open for purchase
    pub fn require_open(&self, key: &FlightKey) -> Result<&Flight> {
        self.flights
            .get(key)
            .filter(|f| !f.resolved)
            .ok_or(SuretyError::UnknownFlight)
    }

    /// Status of the latest-departing flight with this code
    pub fn latest_flight_status(&self, airline: &Address, code: &str) -> Option<FlightStatus> {
        let timestamp = self
            .schedule
            .get(&(*airline, code.to_string()))?
            .last()?;
        self.flights
            .get(&FlightKey::new(*airline, code, *timestamp))
            .map(|f| f.status)
    }

    /// Flights owned by `airline`, ordered by code then departure
    pub fn flights_of(&self, airline: &Address) -> Vec<&Flight> {
        let mut flights: Vec<&Flight> = self
            .flights
            .values()
            .filter(|f| &f.key.airline == airline)
            .collect();
        flights.sort_by(|a, b| a.key.cmp(&b.key));
        flights
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
