//! # FlightSurety Registry
//!
//! Membership governance and the flight directory.
//!
//! - [`AirlineRegistry`]: admission voting and funding-gated participation
//! - [`FlightDirectory`]: flights keyed by (airline, code, departure)

pub mod airline;
pub mod flight;

pub use airline::{Admission, Airline, AirlineRegistry, AirlineStatus, FundingReceipt};
pub use flight::{Flight, FlightDirectory};
