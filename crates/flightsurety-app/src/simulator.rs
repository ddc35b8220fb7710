//! Oracle fleet simulator
//!
//! Registers a set of oracle identities and answers every `OracleRequest`
//! broadcast with a fixed status, the way an off-chain oracle server would.

use std::collections::BTreeMap;
use std::sync::Arc;

use flightsurety_common::{
    Address, CallContext, FlightStatus, Result, SuretyError, SuretyEvent, ORACLE_FEE,
};
use flightsurety_oracle::Submission;
use futures::StreamExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::app::FlightSuretyApp;

/// Registered oracle identities and their cached indexes
#[derive(Debug, Clone, Default)]
pub struct OracleFleet {
    oracles: BTreeMap<Address, Vec<u8>>,
}

impl OracleFleet {
    /// Register `count` oracles, each paying the registration fee
    pub fn register(app: &FlightSuretyApp, count: usize, timestamp: i64) -> Result<Self> {
        let mut oracles = BTreeMap::new();
        for n in 0..count {
            let address = Address::derive(&format!("oracle-{}", n));
            let ctx = CallContext::new(address, timestamp).with_value(ORACLE_FEE);
            let indexes = app.register_oracle(&ctx)?;
            debug!(oracle = %address, indexes = ?indexes, "Fleet oracle registered");
            oracles.insert(address, indexes);
        }
        info!(count, "Oracle fleet registered");
        Ok(Self { oracles })
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }

    /// Fleet members holding `index`
    pub fn holders(&self, index: u8) -> impl Iterator<Item = &Address> {
        self.oracles
            .iter()
            .filter(move |(_, indexes)| indexes.contains(&index))
            .map(|(address, _)| address)
    }

    /// Have every holder of `index` report `status`
    ///
    /// Returns the number of accepted responses. Rejections are logged and
    /// skipped so one bad answer does not silence the rest of the fleet.
    #[allow(clippy::too_many_arguments)]
    pub fn respond(
        &self,
        app: &FlightSuretyApp,
        index: u8,
        airline: Address,
        flight: &str,
        timestamp: i64,
        status: FlightStatus,
        now: i64,
    ) -> usize {
        let mut accepted = 0;
        for oracle in self.holders(index) {
            let ctx = CallContext::new(*oracle, now);
            match app.submit_oracle_response(&ctx, index, airline, flight, timestamp, status) {
                Ok(submission) if submission.is_accepted() => {
                    accepted += 1;
                    if let Submission::Finalized { .. } = submission {
                        debug!(index, flight, "Fleet response finalized request");
                    }
                }
                Ok(submission) => debug!(oracle = %oracle, ?submission, "Fleet response not recorded"),
                Err(e) => warn!(oracle = %oracle, error = %e, "Fleet response rejected"),
            }
        }
        accepted
    }

    /// Answer requests in the background until stopped or the bus closes
    ///
    /// Responses are stamped with wall-clock time. Dropping the handle stops
    /// the task as well.
    pub fn spawn(self, app: Arc<FlightSuretyApp>, status: FlightStatus) -> FleetHandle {
        let mut stream = BroadcastStream::new(app.subscribe());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut accepted = 0;
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    next = stream.next() => match next {
                        Some(Ok(SuretyEvent::OracleRequest { index, airline, flight, timestamp })) => {
                            info!(index, flight = %flight, "Fleet answering oracle request");
                            let now = chrono::Utc::now().timestamp();
                            accepted += self.respond(&app, index, airline, &flight, timestamp, status, now);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                            warn!(skipped, "Fleet lagged behind the event bus");
                        }
                        None => break,
                    },
                }
            }
            info!(accepted, "Oracle fleet stopped");
            accepted
        });

        FleetHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Running fleet task
pub struct FleetHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<usize>,
}

impl FleetHandle {
    /// Stop listening and return the number of accepted responses
    pub async fn stop(mut self) -> Result<usize> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.task
            .await
            .map_err(|e| SuretyError::Internal(e.to_string()))
    }
}
