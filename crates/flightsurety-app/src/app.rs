//! FlightSurety dispatcher
//!
//! Routes every external call to the owning component and enforces the
//! one-call-one-transition rule: each operation takes the state lock once,
//! validates completely, commits, releases the lock and only then publishes
//! events. A claim additionally hands control to the payment sink, which
//! happens after the lock is released and every credit is already zeroed.

use std::sync::Arc;

use flightsurety_common::{
    Address, CallContext, EscrowAccount, EventBus, FlightKey, FlightStatus, PaymentSink, Result,
    SuretyError, SuretyEvent, Wei,
};
use flightsurety_insurance::{InsuranceLedger, InsurancePolicy};
use flightsurety_oracle::{
    FetchOutcome, OracleConsensusEngine, OracleRequest, RequestKey, Submission,
};
use flightsurety_registry::{Admission, Airline, AirlineRegistry, Flight, FlightDirectory, FundingReceipt};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::config::SuretyConfig;

/// Every store the dispatcher owns
struct CoreState {
    operational: bool,
    airlines: AirlineRegistry,
    flights: FlightDirectory,
    insurance: InsuranceLedger,
    oracles: OracleConsensusEngine,
    escrow: EscrowAccount,
}

impl CoreState {
    fn require_operational(&self) -> Result<()> {
        if self.operational {
            Ok(())
        } else {
            Err(SuretyError::NotOperational)
        }
    }
}

/// Public entry point for airlines, passengers, oracles and the owner
pub struct FlightSuretyApp {
    owner: Address,
    state: RwLock<CoreState>,
    events: EventBus,
    payments: Arc<dyn PaymentSink>,
}

impl FlightSuretyApp {
    /// Create a dispatcher owned by `owner`
    pub fn new(owner: Address, config: &SuretyConfig, payments: Arc<dyn PaymentSink>) -> Result<Self> {
        config.validate()?;
        let oracles = OracleConsensusEngine::new(config.oracle.clone())?;

        info!(owner = %owner, "FlightSurety initialized");
        Ok(Self {
            owner,
            state: RwLock::new(CoreState {
                operational: true,
                airlines: AirlineRegistry::new(),
                flights: FlightDirectory::new(),
                insurance: InsuranceLedger::new(),
                oracles,
                escrow: EscrowAccount::new(),
            }),
            events: EventBus::new(config.event_capacity),
            payments,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Receive every event published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SuretyEvent> {
        self.events.subscribe()
    }

    /// Zero-value calls are a caller error, not an escrow failure
    fn ensure_depositable(escrow: &EscrowAccount, amount: Wei) -> Result<()> {
        if amount.is_zero() {
            return Err(SuretyError::InvalidAmount);
        }
        escrow.ensure_depositable(amount)?;
        Ok(())
    }

    fn require_owner(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller == self.owner {
            Ok(())
        } else {
            Err(SuretyError::unauthorized("caller is not the contract owner"))
        }
    }

    // ---- operating status ----

    pub fn is_operational(&self) -> bool {
        self.state.read().operational
    }

    /// Pause or resume every mutating operation
    #[instrument(skip(self))]
    pub fn set_operating_status(&self, ctx: &CallContext, operational: bool) -> Result<()> {
        self.require_owner(ctx)?;
        let mut state = self.state.write();
        if state.operational != operational {
            state.operational = operational;
            info!(operational, "Operating status changed");
        }
        Ok(())
    }

    // ---- airlines ----

    /// Seed the registry with its founding airline
    #[instrument(skip(self))]
    pub fn register_first_airline(&self, ctx: &CallContext, airline: Address) -> Result<()> {
        self.require_owner(ctx)?;
        {
            let mut state = self.state.write();
            state.require_operational()?;
            state.airlines.register_first(airline)?;
        }
        self.events.publish(SuretyEvent::AirlineRegistered { airline, votes: 0 });
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn register_airline(&self, ctx: &CallContext, candidate: Address) -> Result<Admission> {
        let admission = {
            let mut state = self.state.write();
            state.require_operational()?;
            state.airlines.register_airline(ctx.caller, candidate)?
        };

        let mut events = Vec::with_capacity(2);
        if let Admission::Pending { .. } = admission {
            events.push(SuretyEvent::AirlineApplied {
                airline: candidate,
                sponsor: ctx.caller,
            });
        }
        events.extend(Self::admission_event(candidate, admission));
        self.events.publish_all(events);
        Ok(admission)
    }

    #[instrument(skip(self))]
    pub fn approve_airline(&self, ctx: &CallContext, candidate: Address) -> Result<Admission> {
        let admission = {
            let mut state = self.state.write();
            state.require_operational()?;
            state.airlines.approve_airline(ctx.caller, candidate)?
        };
        self.events.publish_all(Self::admission_event(candidate, admission));
        Ok(admission)
    }

    fn admission_event(airline: Address, admission: Admission) -> Option<SuretyEvent> {
        match admission {
            Admission::Registered { votes } => Some(SuretyEvent::AirlineRegistered { airline, votes }),
            Admission::Pending { .. } => None,
        }
    }

    /// Deposit `ctx.value` towards the caller's participation threshold
    #[instrument(skip(self))]
    pub fn add_funding(&self, ctx: &CallContext) -> Result<FundingReceipt> {
        let receipt = {
            let mut state = self.state.write();
            state.require_operational()?;
            if !state.airlines.is_registered(&ctx.caller) {
                return Err(SuretyError::unauthorized("airline is not registered"));
            }
            Self::ensure_depositable(&state.escrow, ctx.value)?;
            let receipt = state.airlines.add_funding(ctx.caller, ctx.value)?;
            state.escrow.deposit(ctx.value)?;
            receipt
        };

        self.events.publish(SuretyEvent::AirlineFunded {
            airline: ctx.caller,
            total: receipt.total,
            participating: receipt.participating,
        });
        Ok(receipt)
    }

    pub fn is_participating(&self, airline: &Address) -> bool {
        self.state.read().airlines.is_participating(airline)
    }

    pub fn airline(&self, airline: &Address) -> Option<Airline> {
        self.state.read().airlines.airline(airline).cloned()
    }

    pub fn registered_airline_count(&self) -> usize {
        self.state.read().airlines.registered_count()
    }

    // ---- flights ----

    #[instrument(skip(self))]
    pub fn register_flight(&self, ctx: &CallContext, code: &str, timestamp: i64) -> Result<FlightKey> {
        let key = {
            let mut state = self.state.write();
            state.require_operational()?;
            let CoreState { airlines, flights, .. } = &mut *state;
            flights.register_flight(airlines, ctx.caller, code, timestamp)?.key.clone()
        };

        self.events.publish(SuretyEvent::FlightRegistered {
            airline: key.airline,
            flight: key.code.clone(),
            timestamp: key.timestamp,
        });
        Ok(key)
    }

    pub fn flight(&self, key: &FlightKey) -> Option<Flight> {
        self.state.read().flights.flight(key).cloned()
    }

    /// Status of the most recently scheduled flight with `code`
    pub fn latest_flight_status(&self, airline: &Address, code: &str) -> Option<FlightStatus> {
        self.state.read().flights.latest_flight_status(airline, code)
    }

    // ---- insurance ----

    /// Insure the caller on `flight` for `ctx.value`
    #[instrument(skip(self))]
    pub fn buy(&self, ctx: &CallContext, flight: &FlightKey) -> Result<InsurancePolicy> {
        let policy = {
            let mut state = self.state.write();
            state.require_operational()?;
            state
                .insurance
                .check_purchase(&state.flights, &ctx.caller, flight, ctx.value)?;
            Self::ensure_depositable(&state.escrow, ctx.value)?;
            let CoreState {
                flights,
                insurance,
                escrow,
                ..
            } = &mut *state;
            let policy = insurance
                .buy(flights, ctx.caller, flight, ctx.value, ctx.timestamp)?
                .clone();
            escrow.deposit(ctx.value)?;
            policy
        };

        self.events.publish(SuretyEvent::InsurancePurchased {
            holder: policy.holder,
            airline: flight.airline,
            flight: flight.code.clone(),
            timestamp: flight.timestamp,
            premium: policy.premium_paid,
        });
        Ok(policy)
    }

    pub fn policy(&self, holder: &Address, flight: &FlightKey) -> Option<InsurancePolicy> {
        self.state.read().insurance.policy(holder, flight).cloned()
    }

    pub fn claimable(&self, holder: &Address) -> Wei {
        self.state.read().insurance.claimable(holder)
    }

    /// Withdraw every credited payout held by the caller
    ///
    /// Credits are zeroed and escrow debited before the payment sink runs,
    /// so a payee re-entering `claim` finds nothing left. A failed payment
    /// restores exactly what this call took.
    #[instrument(skip(self))]
    pub async fn claim(&self, ctx: &CallContext) -> Result<Wei> {
        let receipt = {
            let mut state = self.state.write();
            state.require_operational()?;
            let amount = state.insurance.claimable(&ctx.caller);
            if amount.is_zero() {
                return Err(SuretyError::NothingToClaim);
            }
            state.escrow.ensure_available(amount)?;
            if state.escrow.liabilities < amount {
                return Err(SuretyError::Internal(format!(
                    "claim of {} exceeds outstanding liabilities {}",
                    amount, state.escrow.liabilities
                )));
            }

            let receipt = state.insurance.claim(&ctx.caller)?;
            state.escrow.withdraw(receipt.amount)?;
            state.escrow.settle(receipt.amount)?;
            receipt
        };

        match self.payments.pay(ctx.caller, receipt.amount).await {
            Ok(()) => {
                info!(holder = %ctx.caller, amount = %receipt.amount, "Payout transferred");
                self.events.publish(SuretyEvent::PayoutClaimed {
                    holder: ctx.caller,
                    amount: receipt.amount,
                });
                Ok(receipt.amount)
            }
            Err(e) => {
                let mut state = self.state.write();
                state.insurance.restore(&receipt);
                state.escrow.deposit(receipt.amount)?;
                state.escrow.obligate(receipt.amount)?;
                warn!(holder = %ctx.caller, amount = %receipt.amount, error = %e, "Payout transfer failed");
                Err(match e {
                    SuretyError::Payment(reason) => SuretyError::Payment(reason),
                    other => SuretyError::Payment(other.to_string()),
                })
            }
        }
    }

    // ---- oracles ----

    /// Register the caller as an oracle against a `ctx.value` deposit
    #[instrument(skip(self))]
    pub fn register_oracle(&self, ctx: &CallContext) -> Result<Vec<u8>> {
        let indexes = {
            let mut state = self.state.write();
            state.require_operational()?;
            state.oracles.check_registration(&ctx.caller, ctx.value)?;
            Self::ensure_depositable(&state.escrow, ctx.value)?;
            let indexes = state
                .oracles
                .register_oracle(ctx.caller, ctx.value, ctx.timestamp)?
                .indexes
                .clone();
            state.escrow.deposit(ctx.value)?;
            indexes
        };

        self.events.publish(SuretyEvent::OracleRegistered {
            oracle: ctx.caller,
            indexes: indexes.clone(),
        });
        Ok(indexes)
    }

    /// Indexes assigned to the calling oracle
    pub fn get_my_indexes(&self, ctx: &CallContext) -> Result<Vec<u8>> {
        self.state.read().oracles.my_indexes(&ctx.caller)
    }

    pub fn oracle_count(&self) -> usize {
        self.state.read().oracles.oracle_count()
    }

    /// Ask the oracle fleet for the status of a registered, unresolved flight
    #[instrument(skip(self))]
    pub fn fetch_flight_status(
        &self,
        ctx: &CallContext,
        airline: Address,
        code: &str,
        timestamp: i64,
    ) -> Result<FetchOutcome> {
        let flight = FlightKey::new(airline, code, timestamp);
        let outcome = {
            let mut state = self.state.write();
            state.require_operational()?;
            let current = state.flights.flight(&flight).ok_or(SuretyError::UnknownFlight)?;
            if current.resolved {
                return Err(SuretyError::invalid_state(format!(
                    "flight {} already resolved as {}",
                    flight, current.status
                )));
            }
            state
                .oracles
                .fetch_flight_status(ctx.caller, flight.clone(), ctx.timestamp)?
        };

        let mut events = Vec::with_capacity(2);
        if outcome.abandoned_stale {
            events.push(Self::abandoned_event(&outcome.key));
        }
        events.push(SuretyEvent::OracleRequest {
            index: outcome.key.index,
            airline: flight.airline,
            flight: flight.code.clone(),
            timestamp: flight.timestamp,
        });
        self.events.publish_all(events);
        Ok(outcome)
    }

    /// Record an oracle's answer; quorum resolves the flight and credits payouts
    #[instrument(skip(self))]
    pub fn submit_oracle_response(
        &self,
        ctx: &CallContext,
        index: u8,
        airline: Address,
        code: &str,
        timestamp: i64,
        status: FlightStatus,
    ) -> Result<Submission> {
        let key = RequestKey::new(index, FlightKey::new(airline, code, timestamp));
        let mut events = Vec::new();

        let submission = {
            let mut state = self.state.write();
            state.require_operational()?;
            let submission = state
                .oracles
                .submit_response(ctx.caller, &key, status, ctx.timestamp)?;

            if submission.is_accepted() {
                events.push(SuretyEvent::OracleReport {
                    index,
                    oracle: ctx.caller,
                    airline,
                    flight: code.to_string(),
                    timestamp,
                    status,
                });
            }

            match &submission {
                Submission::Finalized { status, .. } => {
                    Self::resolve(&mut state, &key.flight, *status, &mut events)?;
                }
                Submission::Expired => events.push(Self::abandoned_event(&key)),
                Submission::Recorded { .. } | Submission::Ignored(_) => {}
            }
            submission
        };

        self.events.publish_all(events);
        Ok(submission)
    }

    /// Apply a quorum decision to the directory, ledger and escrow
    fn resolve(
        state: &mut CoreState,
        flight: &FlightKey,
        status: FlightStatus,
        events: &mut Vec<SuretyEvent>,
    ) -> Result<()> {
        if let Err(e) = state.flights.resolve_flight(flight, status) {
            warn!(flight = %flight, status = %status, error = %e, "Quorum reached for a resolved flight, skipping");
            return Ok(());
        }
        events.push(SuretyEvent::FlightStatusInfo {
            airline: flight.airline,
            flight: flight.code.clone(),
            timestamp: flight.timestamp,
            status,
        });

        for credit in state.insurance.credit_payouts(flight, status)? {
            state.escrow.obligate(credit.amount)?;
            events.push(SuretyEvent::PayoutCredited {
                holder: credit.holder,
                airline: flight.airline,
                flight: flight.code.clone(),
                timestamp: flight.timestamp,
                amount: credit.amount,
            });
        }
        info!(flight = %flight, status = %status, "Flight resolved");
        Ok(())
    }

    fn abandoned_event(key: &RequestKey) -> SuretyEvent {
        SuretyEvent::RequestAbandoned {
            index: key.index,
            airline: key.flight.airline,
            flight: key.flight.code.clone(),
            timestamp: key.flight.timestamp,
        }
    }

    /// Abandon every open request older than the configured ttl
    #[instrument(skip(self))]
    pub fn expire_stale_requests(&self, now: i64) -> Vec<RequestKey> {
        let expired = self.state.write().oracles.expire_stale_requests(now);
        self.events
            .publish_all(expired.iter().map(Self::abandoned_event));
        expired
    }

    pub fn oracle_request(&self, key: &RequestKey) -> Option<OracleRequest> {
        self.state.read().oracles.request(key).cloned()
    }

    // ---- escrow ----

    /// Snapshot of the escrow account
    pub fn escrow(&self) -> EscrowAccount {
        self.state.read().escrow.clone()
    }
}
