//! # FlightSurety
//!
//! Facade over the airline registry, flight directory, insurance ledger and
//! oracle consensus engine.
//!
//! ## Architecture
//!
//! ```text
//!   airlines / passengers / oracles / owner
//!                    │ CallContext
//!                    ▼
//!            ┌───────────────┐      ┌──────────────┐
//!            │FlightSuretyApp│─────▶│   EventBus   │──▶ OracleFleet, UIs
//!            └───────┬───────┘      └──────────────┘
//!     ┌──────────┬───┴──────┬──────────────┐
//!     ▼          ▼          ▼              ▼
//!  Registry  Directory  Insurance    Oracle engine
//!                          │
//!                          ▼ claim
//!                     PaymentSink
//! ```

pub mod app;
pub mod config;
pub mod simulator;
pub mod telemetry;

pub use app::FlightSuretyApp;
pub use config::{SimulatorSettings, SuretyConfig};
pub use simulator::{FleetHandle, OracleFleet};
pub use telemetry::init_tracing;

pub use flightsurety_common::{
    Address, CallContext, FlightKey, FlightStatus, InMemoryPayments, PaymentSink, Result,
    SuretyError, SuretyEvent, Wei,
};
