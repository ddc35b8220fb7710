//! # FlightSurety Insurance
//!
//! Premium records and payout accounting.
//!
//! ## Payout Formula
//!
//! ```text
//! payout = premium × 3 / 2     (LateAirline only)
//! ```
//!
//! Withdrawal is pull-based. [`InsuranceLedger::claim`] zeroes credits and
//! marks policies claimed before any currency leaves escrow.

pub mod ledger;
pub mod policy;

pub use ledger::{ClaimReceipt, InsuranceLedger, PayoutCredit};
pub use policy::{InsurancePolicy, PolicyKey};
