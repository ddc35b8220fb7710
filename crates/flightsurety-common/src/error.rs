//! Error types for FlightSurety
//!
//! Every core operation is rejected synchronously at the call boundary with
//! one of these variants. No operation commits partial state before failing.

use thiserror::Error;

use crate::types::escrow::EscrowError;
use crate::types::wei::Wei;

/// Result type alias using SuretyError
pub type Result<T> = std::result::Result<T, SuretyError>;

/// Unified error type for FlightSurety operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SuretyError {
    // Role / status errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    // Idempotency violations
    #[error("Caller already voted for this candidate")]
    DuplicateVote,

    #[error("Flight is already registered")]
    DuplicateFlight,

    #[error("Caller already holds a policy on this flight")]
    DuplicatePolicy,

    #[error("Identity is already registered")]
    AlreadyRegistered,

    // Value constraints
    #[error("Invalid amount")]
    InvalidAmount,

    #[error("Insufficient deposit: {provided} < {required}")]
    InsufficientDeposit { provided: Wei, required: Wei },

    // Missing entities
    #[error("Unknown flight")]
    UnknownFlight,

    #[error("Nothing to claim")]
    NothingToClaim,

    // Facade
    #[error("Contract is currently not operational")]
    NotOperational,

    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("Payment failed: {0}")]
    Payment(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SuretyError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        SuretyError::Unauthorized(reason.into())
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        SuretyError::InvalidState(reason.into())
    }
}

impl From<serde_json::Error> for SuretyError {
    fn from(err: serde_json::Error) -> Self {
        SuretyError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SuretyError {
    fn from(err: anyhow::Error) -> Self {
        SuretyError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SuretyError::unauthorized("airline is not participating");
        assert!(err.to_string().contains("not participating"));
    }

    #[test]
    fn test_deposit_error() {
        let err = SuretyError::InsufficientDeposit {
            provided: Wei::new(500_000_000_000_000_000),
            required: Wei::ether(1),
        };
        assert!(err.to_string().contains("0.5 ETH < 1 ETH"));
    }

    #[test]
    fn test_escrow_conversion() {
        let err: SuretyError = EscrowError::InvalidAmount.into();
        assert!(matches!(err, SuretyError::Escrow(EscrowError::InvalidAmount)));
    }
}
