//! Oracle Consensus Engine
//!
//! Coordinates the status resolution process:
//! 1. Oracles register with a deposit and receive indexes
//! 2. A status fetch draws one index and opens a request
//! 3. Oracles holding that index submit responses
//! 4. The first status to collect `min_responses` matching answers finalizes
//!    the request
//!
//! Late or duplicate responses are dropped without error so honest oracles
//! are never penalized for network-level redelivery.

use flightsurety_common::{Address, FlightKey, FlightStatus, Result, SuretyError, Wei, ORACLE_FEE};
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::consensus::{IndexAssigner, Oracle, QuorumManager};
use crate::request::{OracleRequest, RequestKey, RequestState};
use crate::OracleConfig;

/// Result of opening a status fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub key: RequestKey,
    pub request_id: Uuid,
    /// False when an already-open request was reused
    pub opened: bool,
    /// An open request under the same key had outlived its ttl and was abandoned
    pub abandoned_stale: bool,
}

/// Why a response was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    AlreadyFinalized,
    Abandoned,
    DuplicateResponse,
}

/// Result of a response submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Response accepted, quorum not yet reached
    Recorded { matching: usize },
    /// Response accepted and it decided the request
    Finalized {
        status: FlightStatus,
        agreeing: Vec<Address>,
    },
    /// Request had outlived its ttl and is now abandoned
    Expired,
    /// Response dropped
    Ignored(IgnoreReason),
}

impl Submission {
    /// Response was recorded in the tally
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Recorded { .. } | Submission::Finalized { .. })
    }
}

/// Oracle registration, request tracking and quorum decisions
pub struct OracleConsensusEngine {
    config: OracleConfig,
    quorum: QuorumManager,
    assigner: IndexAssigner,
    oracles: HashMap<Address, Oracle>,
    requests: HashMap<RequestKey, OracleRequest>,
}

impl OracleConsensusEngine {
    /// Create an engine; the entropy key comes from config or the OS RNG
    pub fn new(config: OracleConfig) -> Result<Self> {
        config.validate()?;
        let assigner = match config.entropy_key()? {
            Some(key) => IndexAssigner::with_key(key, config.index_space),
            None => IndexAssigner::from_os_rng(config.index_space),
        };

        Ok(Self {
            quorum: QuorumManager::new(config.min_responses),
            config,
            assigner,
            oracles: HashMap::new(),
            requests: HashMap::new(),
        })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Validate a registration without recording it
    pub fn check_registration(&self, caller: &Address, deposit: Wei) -> Result<()> {
        if deposit < ORACLE_FEE {
            return Err(SuretyError::InsufficientDeposit {
                provided: deposit,
                required: ORACLE_FEE,
            });
        }
        if self.oracles.contains_key(caller) {
            return Err(SuretyError::AlreadyRegistered);
        }
        Ok(())
    }

    /// Register `caller` as an oracle and assign its indexes
    pub fn register_oracle(&mut self, caller: Address, deposit: Wei, now: i64) -> Result<&Oracle> {
        self.check_registration(&caller, deposit)?;

        let indexes = self
            .assigner
            .assign(&caller, now, self.config.indexes_per_oracle);
        info!(oracle = %caller, indexes = ?indexes, "Oracle registered");

        let oracle = self.oracles.entry(caller).or_insert(Oracle {
            address: caller,
            indexes,
            registered_at: now,
        });
        Ok(oracle)
    }

    pub fn is_registered(&self, oracle: &Address) -> bool {
        self.oracles.contains_key(oracle)
    }

    /// Indexes assigned to `caller`
    pub fn my_indexes(&self, caller: &Address) -> Result<Vec<u8>> {
        self.oracles
            .get(caller)
            .map(|o| o.indexes.clone())
            .ok_or_else(|| SuretyError::unauthorized("caller is not a registered oracle"))
    }

    pub fn oracle_count(&self) -> usize {
        self.oracles.len()
    }

    /// Open (or reuse) a request for `flight` under a freshly drawn index
    ///
    /// Flight existence is checked by the caller against the directory.
    pub fn fetch_flight_status(
        &mut self,
        caller: Address,
        flight: FlightKey,
        now: i64,
    ) -> Result<FetchOutcome> {
        let index = self.assigner.draw(&caller, now);
        let key = RequestKey::new(index, flight);
        let ttl = self.config.request_ttl_secs;
        let mut abandoned_stale = false;

        if let Some(existing) = self.requests.get_mut(&key) {
            if let RequestState::Finalized { status, .. } = existing.state {
                return Err(SuretyError::invalid_state(format!(
                    "request {} already finalized as {}",
                    key, status
                )));
            }
            if existing.is_expired(now, ttl) {
                existing.state = RequestState::Abandoned { abandoned_at: now };
                warn!(request = %key, request_id = %existing.request_id, "Request expired without quorum");
                abandoned_stale = true;
            } else if existing.is_open() {
                debug!(request = %key, request_id = %existing.request_id, "Reusing open request");
                return Ok(FetchOutcome {
                    key,
                    request_id: existing.request_id,
                    opened: false,
                    abandoned_stale: false,
                });
            }
        }

        let request = OracleRequest::open(key.clone(), caller, now);
        let request_id = request.request_id;
        info!(request = %key, request_id = %request_id, requester = %caller, "Oracle request opened");
        self.requests.insert(key.clone(), request);

        Ok(FetchOutcome {
            key,
            request_id,
            opened: true,
            abandoned_stale,
        })
    }

    /// Record an oracle's answer
    pub fn submit_response(
        &mut self,
        caller: Address,
        key: &RequestKey,
        status: FlightStatus,
        now: i64,
    ) -> Result<Submission> {
        let oracle = self
            .oracles
            .get(&caller)
            .ok_or_else(|| SuretyError::unauthorized("caller is not a registered oracle"))?;
        if !oracle.holds(key.index) {
            return Err(SuretyError::unauthorized(format!(
                "index {} is not assigned to this oracle",
                key.index
            )));
        }
        if status == FlightStatus::Unknown {
            return Err(SuretyError::invalid_state("oracles cannot report an unknown status"));
        }

        let ttl = self.config.request_ttl_secs;
        let request = self
            .requests
            .get_mut(key)
            .ok_or_else(|| SuretyError::invalid_state(format!("no request open for {}", key)))?;

        match request.state {
            RequestState::Finalized { .. } => {
                debug!(request = %key, oracle = %caller, "Late response ignored");
                return Ok(Submission::Ignored(IgnoreReason::AlreadyFinalized));
            }
            RequestState::Abandoned { .. } => {
                debug!(request = %key, oracle = %caller, "Response to abandoned request ignored");
                return Ok(Submission::Ignored(IgnoreReason::Abandoned));
            }
            RequestState::Open => {}
        }

        if request.is_expired(now, ttl) {
            request.state = RequestState::Abandoned { abandoned_at: now };
            warn!(request = %key, request_id = %request.request_id, "Request expired without quorum");
            return Ok(Submission::Expired);
        }

        if request.responses.has_responded(&caller) {
            debug!(request = %key, oracle = %caller, "Duplicate response ignored");
            return Ok(Submission::Ignored(IgnoreReason::DuplicateResponse));
        }

        let matching = request.responses.record(status, caller);
        debug!(
            request = %key,
            oracle = %caller,
            status = %status,
            matching,
            required = self.quorum.threshold(),
            "Oracle response recorded"
        );

        if self.quorum.is_reached(matching) {
            request.state = RequestState::Finalized {
                status,
                finalized_at: now,
            };
            let agreeing: Vec<Address> = request.responses.responders(status).copied().collect();
            info!(
                request = %key,
                request_id = %request.request_id,
                status = %status,
                responses = request.responses.total(),
                "Oracle request finalized"
            );
            Ok(Submission::Finalized { status, agreeing })
        } else {
            Ok(Submission::Recorded { matching })
        }
    }

    /// Abandon every open request older than the configured ttl
    pub fn expire_stale_requests(&mut self, now: i64) -> Vec<RequestKey> {
        let ttl = self.config.request_ttl_secs;
        let mut expired = Vec::new();
        for (key, request) in self.requests.iter_mut() {
            if request.is_expired(now, ttl) {
                request.state = RequestState::Abandoned { abandoned_at: now };
                warn!(request = %key, request_id = %request.request_id, "Request expired without quorum");
                expired.push(key.clone());
            }
        }
        expired.sort();
        expired
    }

    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    /// Requests still waiting for quorum
    pub fn open_requests(&self) -> impl Iterator<Item = &OracleRequest> {
        self.requests.values().filter(|r| r.is_open())
    }
}
