//! Quorum tally for oracle responses

use flightsurety_common::{Address, FlightStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Decides when matching responses are enough to finalize
#[derive(Debug, Clone, Copy)]
pub struct QuorumManager {
    threshold: usize,
}

impl QuorumManager {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn is_reached(&self, matching: usize) -> bool {
        matching >= self.threshold
    }
}

/// Responding oracles grouped by reported status
///
/// Minority responses stay recorded for audit once a status wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTally {
    responses: BTreeMap<FlightStatus, BTreeSet<Address>>,
}

impl ResponseTally {
    /// Record `oracle` under `status`, returning the matching count
    pub fn record(&mut self, status: FlightStatus, oracle: Address) -> usize {
        let voters = self.responses.entry(status).or_default();
        voters.insert(oracle);
        voters.len()
    }

    pub fn count(&self, status: FlightStatus) -> usize {
        self.responses.get(&status).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn has_responded(&self, oracle: &Address) -> bool {
        self.responses.values().any(|voters| voters.contains(oracle))
    }

    pub fn total(&self) -> usize {
        self.responses.values().map(BTreeSet::len).sum()
    }

    pub fn responders(&self, status: FlightStatus) -> impl Iterator<Item = &Address> {
        self.responses.get(&status).into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_groups_by_status() {
        let mut tally = ResponseTally::default();
        assert_eq!(tally.record(FlightStatus::LateAirline, Address::derive("o1")), 1);
        assert_eq!(tally.record(FlightStatus::OnTime, Address::derive("o2")), 1);
        assert_eq!(tally.record(FlightStatus::LateAirline, Address::derive("o3")), 2);

        assert_eq!(tally.count(FlightStatus::LateAirline), 2);
        assert_eq!(tally.total(), 3);
        assert!(tally.has_responded(&Address::derive("o2")));
        assert!(!tally.has_responded(&Address::derive("o4")));
    }

    #[test]
    fn test_same_oracle_counted_once() {
        let mut tally = ResponseTally::default();
        let oracle = Address::derive("o1");
        tally.record(FlightStatus::OnTime, oracle);
        assert_eq!(tally.record(FlightStatus::OnTime, oracle), 1);
    }

    #[test]
    fn test_quorum_threshold() {
        let quorum = QuorumManager::new(3);
        assert!(!quorum.is_reached(2));
        assert!(quorum.is_reached(3));
    }
}
