//! FlightSurety simulation binary
//!
//! Runs one full round: airline admission, funding, flight registration,
//! insurance purchase, oracle resolution and claim.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};

use flightsurety_app::{init_tracing, FlightSuretyApp, OracleFleet, SuretyConfig};
use flightsurety_common::{
    Address, CallContext, FlightKey, FlightStatus, InMemoryPayments, SuretyEvent, MAX_PREMIUM,
    MIN_FUNDING, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = SuretyConfig::load()?;

    // Initialize tracing
    init_tracing(&config.log_filter);

    info!("Starting FlightSurety simulation v{}", VERSION);
    info!("Loaded configuration: {:?}", config);

    let payments = Arc::new(InMemoryPayments::new());
    let owner = Address::derive("owner");
    let app = Arc::new(FlightSuretyApp::new(owner, &config, payments.clone())?);
    let now = chrono::Utc::now().timestamp();

    // Airlines: founder plus one sponsored member, both funded
    let founder = Address::derive("airline-1");
    let second = Address::derive("airline-2");
    app.register_first_airline(&CallContext::new(owner, now), founder)?;
    app.add_funding(&CallContext::new(founder, now).with_value(MIN_FUNDING))?;
    app.register_airline(&CallContext::new(founder, now), second)?;
    app.add_funding(&CallContext::new(second, now).with_value(MIN_FUNDING))?;
    info!(airlines = app.registered_airline_count(), "Airlines participating");

    // Flight departing in an hour
    let departure = now + 3600;
    let flight = app.register_flight(&CallContext::new(founder, now), "FS100", departure)?;

    // Passenger insures the flight at the maximum premium
    let passenger = Address::derive("passenger-1");
    app.buy(&CallContext::new(passenger, now).with_value(MAX_PREMIUM), &flight)?;

    // Oracle fleet
    let fleet = OracleFleet::register(&app, config.simulator.oracle_count, now)?;
    info!(oracles = fleet.len(), "Oracle fleet ready");
    let handle = fleet.spawn(app.clone(), config.simulator.reported_status);

    let status = resolve(&app, &config, passenger, &flight).await?;
    info!(flight = %flight, status = %status, "Flight resolved");

    let claimable = app.claimable(&passenger);
    if claimable.is_zero() {
        info!(passenger = %passenger, "No payout for this status");
    } else {
        let paid = app
            .claim(&CallContext::new(passenger, chrono::Utc::now().timestamp()))
            .await?;
        info!(
            passenger = %passenger,
            paid = %paid,
            received = %payments.received(&passenger),
            "Payout claimed"
        );
    }

    let accepted = handle.stop().await?;
    let escrow = app.escrow();
    info!(
        responses = accepted,
        escrow_balance = %escrow.balance,
        liabilities = %escrow.liabilities,
        total_paid = %payments.total_paid(),
        "Simulation complete"
    );

    Ok(())
}

/// Fetch until the fleet reaches quorum, drawing a fresh index each attempt
async fn resolve(
    app: &FlightSuretyApp,
    config: &SuretyConfig,
    passenger: Address,
    flight: &FlightKey,
) -> Result<FlightStatus> {
    let mut events = app.subscribe();
    let timeout = Duration::from_secs(config.simulator.round_timeout_secs);

    for attempt in 1..=config.simulator.max_fetch_attempts {
        let ctx = CallContext::new(passenger, chrono::Utc::now().timestamp());
        let outcome = app.fetch_flight_status(&ctx, flight.airline, &flight.code, flight.timestamp)?;
        info!(attempt, index = outcome.key.index, request_id = %outcome.request_id, "Status requested");

        match tokio::time::timeout(timeout, wait_for_status(&mut events, flight)).await {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => bail!("event bus closed before the flight resolved"),
            Err(_) => warn!(attempt, index = outcome.key.index, "No quorum before timeout"),
        }
    }

    bail!(
        "flight {} unresolved after {} attempts",
        flight,
        config.simulator.max_fetch_attempts
    )
}

async fn wait_for_status(
    events: &mut broadcast::Receiver<SuretyEvent>,
    flight: &FlightKey,
) -> Option<FlightStatus> {
    loop {
        match events.recv().await {
            Ok(SuretyEvent::FlightStatusInfo {
                airline,
                flight: code,
                timestamp,
                status,
            }) if airline == flight.airline && code == flight.code && timestamp == flight.timestamp => {
                return Some(status);
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Simulation lagged behind the event bus");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
