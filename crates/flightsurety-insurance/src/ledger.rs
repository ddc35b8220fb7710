//! Insurance Ledger
//!
//! Records premiums per (holder, flight) and the payout credits computed
//! when a flight resolves. Withdrawal is pull-based: holders claim their
//! credits, and the ledger zeroes them before any funds move.

use flightsurety_common::{
    Address, FlightKey, FlightStatus, Result, SuretyError, Wei, MAX_PREMIUM, PAYOUT_DENOMINATOR,
    PAYOUT_NUMERATOR,
};
use flightsurety_registry::FlightDirectory;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::policy::{InsurancePolicy, PolicyKey};

/// Payout credited to one holder on flight resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutCredit {
    pub holder: Address,
    pub flight: FlightKey,
    pub amount: Wei,
}

/// Credits released by a claim
///
/// Carries enough detail to put the credits back if the outbound payment
/// fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub holder: Address,
    pub amount: Wei,
    pub credits: Vec<(FlightKey, Wei)>,
}

/// Policy store and payout accounting
#[derive(Debug, Default)]
pub struct InsuranceLedger {
    policies: HashMap<PolicyKey, InsurancePolicy>,
    by_flight: HashMap<FlightKey, Vec<Address>>,
    by_holder: HashMap<Address, Vec<FlightKey>>,
}

impl InsuranceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a purchase without recording it
    pub fn check_purchase(
        &self,
        flights: &FlightDirectory,
        holder: &Address,
        flight: &FlightKey,
        amount: Wei,
    ) -> Result<()> {
        if amount.is_zero() || amount > MAX_PREMIUM {
            return Err(SuretyError::InvalidAmount);
        }
        flights.require_open(flight)?;
        if self
            .policies
            .contains_key(&PolicyKey::new(*holder, flight.clone()))
        {
            return Err(SuretyError::DuplicatePolicy);
        }
        Ok(())
    }

    /// Record a premium paid by `holder` on `flight`
    ///
    /// Moving the premium into escrow is the caller's job; it must happen in
    /// the same atomic step.
    pub fn buy(
        &mut self,
        flights: &FlightDirectory,
        holder: Address,
        flight: &FlightKey,
        amount: Wei,
        purchased_at: i64,
    ) -> Result<&InsurancePolicy> {
        self.check_purchase(flights, &holder, flight, amount)?;

        self.by_flight
            .entry(flight.clone())
            .or_default()
            .push(holder);
        self.by_holder
            .entry(holder)
            .or_default()
            .push(flight.clone());

        info!(holder = %holder, flight = %flight, premium = %amount, "Insurance purchased");

        let key = PolicyKey::new(holder, flight.clone());
        let policy = self
            .policies
            .entry(key)
            .or_insert_with(|| InsurancePolicy::new(holder, flight.clone(), amount, purchased_at));
        Ok(policy)
    }

    /// Compute payouts for every policy on a freshly resolved flight
    ///
    /// Only `LateAirline` pays; every other status leaves credits at zero.
    /// Policies that were already credited are skipped.
    pub fn credit_payouts(
        &mut self,
        flight: &FlightKey,
        status: FlightStatus,
    ) -> Result<Vec<PayoutCredit>> {
        if !status.is_airline_fault() {
            debug!(flight = %flight, status = %status, "Resolution does not pay out");
            return Ok(Vec::new());
        }

        let holders = self.by_flight.get(flight).cloned().unwrap_or_default();
        let mut pending = Vec::with_capacity(holders.len());
        for holder in holders {
            let key = PolicyKey::new(holder, flight.clone());
            let Some(policy) = self.policies.get(&key) else {
                continue;
            };
            if policy.claimed || !policy.payout_credit.is_zero() {
                warn!(holder = %holder, flight = %flight, "Policy already credited");
                continue;
            }
            let amount = policy
                .premium_paid
                .checked_mul_ratio(PAYOUT_NUMERATOR, PAYOUT_DENOMINATOR)
                .ok_or_else(|| SuretyError::Internal("payout overflow".to_string()))?;
            pending.push((key, amount));
        }

        let mut credits = Vec::with_capacity(pending.len());
        for (key, amount) in pending {
            if let Some(policy) = self.policies.get_mut(&key) {
                policy.payout_credit = amount;
                credits.push(PayoutCredit {
                    holder: key.holder,
                    flight: key.flight.clone(),
                    amount,
                });
            }
        }

        info!(flight = %flight, policies = credits.len(), "Payouts credited");
        Ok(credits)
    }

    /// Total withdrawable by `holder`
    pub fn claimable(&self, holder: &Address) -> Wei {
        self.claimable_policies(holder)
            .map(|p| p.payout_credit)
            .sum()
    }

    /// Release every outstanding credit held by `holder`
    ///
    /// Credits are zeroed and policies marked claimed here, before the caller
    /// performs the external transfer.
    pub fn claim(&mut self, holder: &Address) -> Result<ClaimReceipt> {
        let credits: Vec<(FlightKey, Wei)> = self
            .claimable_policies(holder)
            .map(|p| (p.flight.clone(), p.payout_credit))
            .collect();
        if credits.is_empty() {
            return Err(SuretyError::NothingToClaim);
        }

        let mut amount = Wei::ZERO;
        for (_, credit) in &credits {
            amount = amount
                .checked_add(*credit)
                .ok_or_else(|| SuretyError::Internal("claim overflow".to_string()))?;
        }

        for (flight, _) in &credits {
            if let Some(policy) = self
                .policies
                .get_mut(&PolicyKey::new(*holder, flight.clone()))
            {
                policy.payout_credit = Wei::ZERO;
                policy.claimed = true;
            }
        }

        info!(holder = %holder, amount = %amount, policies = credits.len(), "Payout claimed");
        Ok(ClaimReceipt {
            holder: *holder,
            amount,
            credits,
        })
    }

    /// Undo a claim whose transfer failed
    pub fn restore(&mut self, receipt: &ClaimReceipt) {
        for (flight, credit) in &receipt.credits {
            if let Some(policy) = self
                .policies
                .get_mut(&PolicyKey::new(receipt.holder, flight.clone()))
            {
                policy.payout_credit = *credit;
                policy.claimed = false;
            }
        }
        warn!(holder = %receipt.holder, amount = %receipt.amount, "Claim restored after failed payment");
    }

    pub fn policy(&self, holder: &Address, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies.get(&PolicyKey::new(*holder, flight.clone()))
    }

    pub fn policies_on(&self, flight: &FlightKey) -> Vec<&InsurancePolicy> {
        self.by_flight
            .get(flight)
            .into_iter()
            .flatten()
            .filter_map(|holder| self.policy(holder, flight))
            .collect()
    }

    pub fn policies_of(&self, holder: &Address) -> Vec<&InsurancePolicy> {
        self.by_holder
            .get(holder)
            .into_iter()
            .flatten()
            .filter_map(|flight| self.policy(holder, flight))
            .collect()
    }

    fn claimable_policies<'a>(
        &'a self,
        holder: &'a Address,
    ) -> impl Iterator<Item = &'a InsurancePolicy> + 'a {
        self.policies_of(holder)
            .into_iter()
            .filter(|p| !p.claimed && !p.payout_credit.is_zero())
    }
}
