//! Core data types for FlightSurety

pub mod address;
pub mod context;
pub mod escrow;
pub mod flight;
pub mod wei;
