//! # FlightSurety Common
//!
//! Shared types, errors and plumbing for the FlightSurety governance core.
//!
//! ## Core Types
//!
//! - [`Address`]: participant identity supplied by the ledger substrate
//! - [`Wei`]: currency amounts in the smallest unit
//! - [`FlightKey`] / [`FlightStatus`]: flight identity and oracle status codes
//! - [`EscrowAccount`]: substrate-held funds and outstanding payout liabilities
//! - [`CallContext`]: caller identity, attached value and block time
//!
//! ## Plumbing
//!
//! - [`events`]: broadcast notifications for out-of-core collaborators
//! - [`payment`]: outbound payment seam for untrusted payees

pub mod error;
pub mod events;
pub mod payment;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Result, SuretyError};
pub use events::{EventBus, SuretyEvent};
pub use payment::{InMemoryPayments, PaymentSink};
pub use types::{
    address::Address,
    context::CallContext,
    escrow::{EscrowAccount, EscrowError},
    flight::{FlightKey, FlightStatus},
    wei::{Wei, WEI_PER_ETHER},
};

/// FlightSurety version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Funding an airline must deposit before it participates (10 ether)
pub const MIN_FUNDING: Wei = Wei::ether(10);

/// Largest premium accepted per policy (1 ether)
pub const MAX_PREMIUM: Wei = Wei::ether(1);

/// Deposit required to register an oracle (1 ether)
pub const ORACLE_FEE: Wei = Wei::ether(1);

/// Registered airlines admitted by a single endorsement
pub const FOUNDING_SIZE: usize = 4;

/// Payout multiplier numerator (payout = premium × 3 / 2)
pub const PAYOUT_NUMERATOR: u128 = 3;

/// Payout multiplier denominator
pub const PAYOUT_DENOMINATOR: u128 = 2;

/// Default matching responses required to finalize an oracle request
pub const DEFAULT_MIN_RESPONSES: usize = 3;

/// Default size of the oracle index space
pub const DEFAULT_INDEX_SPACE: u8 = 10;

/// Default number of indexes assigned to each oracle
pub const DEFAULT_INDEXES_PER_ORACLE: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(MIN_FUNDING.as_u128(), 10 * WEI_PER_ETHER);
        assert_eq!(MAX_PREMIUM.as_u128(), WEI_PER_ETHER);
        assert_eq!(ORACLE_FEE.as_u128(), WEI_PER_ETHER);
    }
}
