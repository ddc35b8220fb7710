//! Airline Registry
//!
//! Membership lifecycle: `Applied → Registered → Participating`.
//!
//! - While fewer than [`FOUNDING_SIZE`] airlines are registered, a single
//!   endorsement from a participating airline admits a candidate.
//! - Past that, candidates queue as `Applied` and need a strict majority of
//!   the registered airlines, counted at the moment of the deciding vote.
//! - Registered airlines unlock participation once cumulative funding
//!   reaches [`MIN_FUNDING`].

use flightsurety_common::{Address, Result, SuretyError, Wei, FOUNDING_SIZE, MIN_FUNDING};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Membership status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AirlineStatus {
    /// Waiting for endorsement votes
    Applied,
    /// Admitted, funding below threshold
    Registered,
    /// Admitted and funded
    Participating,
}

impl std::fmt::Display for AirlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AirlineStatus::Applied => write!(f, "applied"),
            AirlineStatus::Registered => write!(f, "registered"),
            AirlineStatus::Participating => write!(f, "participating"),
        }
    }
}

/// Governed participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airline {
    pub address: Address,
    pub status: AirlineStatus,
    /// Cumulative funding deposited
    pub funds_deposited: Wei,
    /// Endorsements received while `Applied`
    pub votes_received: BTreeSet<Address>,
}

impl Airline {
    fn applied(address: Address, sponsor: Address) -> Self {
        let mut votes_received = BTreeSet::new();
        votes_received.insert(sponsor);
        Self {
            address,
            status: AirlineStatus::Applied,
            funds_deposited: Wei::ZERO,
            votes_received,
        }
    }

    fn registered(address: Address) -> Self {
        Self {
            address,
            status: AirlineStatus::Registered,
            funds_deposited: Wei::ZERO,
            votes_received: BTreeSet::new(),
        }
    }

    /// Admitted, in either funded or unfunded state
    pub fn is_registered(&self) -> bool {
        matches!(
            self.status,
            AirlineStatus::Registered | AirlineStatus::Participating
        )
    }

    pub fn is_participating(&self) -> bool {
        self.is_registered() && self.funds_deposited >= MIN_FUNDING
    }
}

/// Result of a registration or approval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Candidate is now registered
    Registered { votes: usize },
    /// Candidate still waiting for votes
    Pending { votes: usize, required: usize },
}

/// Result of a funding deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingReceipt {
    pub total: Wei,
    pub participating: bool,
    /// True only on the deposit that crossed the threshold
    pub newly_participating: bool,
}

/// Membership registry and admission voting
#[derive(Debug, Default)]
pub struct AirlineRegistry {
    airlines: HashMap<Address, Airline>,
    registered_count: usize,
}

impl AirlineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit the founding airline
    ///
    /// Only valid while the registry is empty.
    pub fn register_first(&mut self, airline: Address) -> Result<()> {
        if !self.airlines.is_empty() {
            return Err(SuretyError::invalid_state(
                "first airline already registered",
            ));
        }
        self.airlines.insert(airline, Airline::registered(airline));
        self.registered_count = 1;
        info!(airline = %airline, "Founding airline registered");
        Ok(())
    }

    /// Register or nominate a candidate on behalf of `caller`
    pub fn register_airline(&mut self, caller: Address, candidate: Address) -> Result<Admission> {
        self.require_participating(&caller)?;
        if self.airlines.contains_key(&candidate) {
            return Err(SuretyError::AlreadyRegistered);
        }

        if self.registered_count < FOUNDING_SIZE {
            self.airlines.insert(candidate, Airline::registered(candidate));
            self.registered_count += 1;
            info!(
                airline = %candidate,
                sponsor = %caller,
                registered = self.registered_count,
                "Airline registered by single endorsement"
            );
            return Ok(Admission::Registered { votes: 1 });
        }

        // The nominating airline's endorsement counts as the first vote
        self.airlines.insert(candidate, Airline::applied(candidate, caller));
        debug!(airline = %candidate, sponsor = %caller, "Airline applied");
        Ok(self.tally(candidate))
    }

    /// Record `caller`'s endorsement of an applied candidate
    pub fn approve_airline(&mut self, caller: Address, candidate: Address) -> Result<Admission> {
        self.require_participating(&caller)?;

        let entry = self
            .airlines
            .get(&candidate)
            .ok_or_else(|| SuretyError::invalid_state("candidate has not applied"))?;
        if entry.status != AirlineStatus::Applied {
            return Err(SuretyError::invalid_state(format!(
                "candidate is {}, not applied",
                entry.status
            )));
        }
        if entry.votes_received.contains(&caller) {
            return Err(SuretyError::DuplicateVote);
        }

        if let Some(airline) = self.airlines.get_mut(&candidate) {
            airline.votes_received.insert(caller);
        }
        debug!(airline = %candidate, voter = %caller, "Approval recorded");
        Ok(self.tally(candidate))
    }

    /// Deposit funding for a registered airline
    pub fn add_funding(&mut self, caller: Address, amount: Wei) -> Result<FundingReceipt> {
        let airline = self
            .airlines
            .get_mut(&caller)
            .filter(|a| a.is_registered())
            .ok_or_else(|| SuretyError::unauthorized("airline is not registered"))?;
        if amount.is_zero() {
            return Err(SuretyError::InvalidAmount);
        }

        let was_participating = airline.is_participating();
        airline.funds_deposited = airline
            .funds_deposited
            .checked_add(amount)
            .ok_or(SuretyError::InvalidAmount)?;
        if airline.is_participating() {
            airline.status = AirlineStatus::Participating;
        }

        let receipt = FundingReceipt {
            total: airline.funds_deposited,
            participating: airline.is_participating(),
            newly_participating: !was_participating && airline.is_participating(),
        };

        info!(
            airline = %caller,
            amount = %amount,
            total = %receipt.total,
            participating = receipt.participating,
            "Funding added"
        );
        Ok(receipt)
    }

    pub fn is_participating(&self, airline: &Address) -> bool {
        self.airlines
            .get(airline)
            .map(Airline::is_participating)
            .unwrap_or(false)
    }

    pub fn is_registered(&self, airline: &Address) -> bool {
        self.airlines
            .get(airline)
            .map(Airline::is_registered)
            .unwrap_or(false)
    }

    pub fn airline(&self, airline: &Address) -> Option<&Airline> {
        self.airlines.get(airline)
    }

    /// Airlines admitted so far (funded or not)
    pub fn registered_count(&self) -> usize {
        self.registered_count
    }

    pub fn is_empty(&self) -> bool {
        self.airlines.is_empty()
    }

    /// Endorsements a candidate has collected
    pub fn votes_for(&self, candidate: &Address) -> usize {
        self.airlines
            .get(candidate)
            .map(|a| a.votes_received.len())
            .unwrap_or(0)
    }

    /// Votes needed for admission at the current registered count
    pub fn votes_required(&self) -> usize {
        self.registered_count / 2 + 1
    }

    /// Fail with `Unauthorized` unless `caller` is participating
    pub fn require_participating(&self, caller: &Address) -> Result<()> {
        if self.is_participating(caller) {
            Ok(())
        } else {
            Err(SuretyError::unauthorized("airline is not participating"))
        }
    }

    fn tally(&mut self, candidate: Address) -> Admission {
        let required = self.votes_required();
        let Some(airline) = self.airlines.get_mut(&candidate) else {
            return Admission::Pending { votes: 0, required };
        };
        let votes = airline.votes_received.len();

        if votes > self.registered_count / 2 {
            airline.status = AirlineStatus::Registered;
            self.registered_count += 1;
            info!(
                airline = %candidate,
                votes,
                registered = self.registered_count,
                "Airline admitted by majority vote"
            );
            Admission::Registered { votes }
        } else {
            Admission::Pending { votes, required }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Admission happens exactly on the vote that exceeds half the registered count
        #[test]
        fn admission_at_strict_majority(registered in 4usize..12) {
            let voters: Vec<Address> = (0..registered)
                .map(|n| Address::derive(&format!("member-{}", n)))
                .collect();

            let mut registry = AirlineRegistry::new();
            registry.register_first(voters[0]).unwrap();
            registry.add_funding(voters[0], MIN_FUNDING).unwrap();

            // Grow the registry to `registered` members through the voting path
            for member in voters.iter().skip(1) {
                let admission = registry.register_airline(voters[0], *member).unwrap();
                let mut voter_iter = voters.iter().skip(1);
                let mut status = admission;
                while let Admission::Pending { .. } = status {
                    let voter = voter_iter.next().unwrap();
                    status = registry.approve_airline(*voter, *member).unwrap();
                }
                registry.add_funding(*member, MIN_FUNDING).unwrap();
            }
            prop_assert_eq!(registry.registered_count(), registered);

            let candidate = Address::derive("candidate");
            let mut admission = registry.register_airline(voters[0], candidate).unwrap();
            let mut votes = 1usize;
            for voter in voters.iter().skip(1) {
                if votes > registered / 2 {
                    break;
                }
                let is_pending = matches!(admission, Admission::Pending { .. });
                prop_assert!(is_pending);
                admission = registry.approve_airline(*voter, candidate).unwrap();
                votes += 1;
            }
            prop_assert_eq!(admission, Admission::Registered { votes: registered / 2 + 1 });
        }
    }
}
