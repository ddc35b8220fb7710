//! Escrow account - funds held against future conditional payouts
//!
//! The escrow holds:
//! - Airline funding deposits
//! - Insurance premiums
//! - Oracle registration deposits
//!
//! Credited-but-unclaimed payouts are tracked as liabilities so the
//! outstanding obligation is visible next to the balance. Version field
//! increments on every mutation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::wei::Wei;

/// Escrow operation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Insufficient escrow balance: required {required}, available {available}")]
    InsufficientBalance { required: Wei, available: Wei },

    #[error("Liability underflow: settling {amount}, outstanding {outstanding}")]
    LiabilityUnderflow { amount: Wei, outstanding: Wei },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Escrow balance overflow")]
    Overflow,
}

/// Substrate-held escrow balance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Funds currently held
    pub balance: Wei,

    /// Payouts credited to policy holders but not yet withdrawn
    pub liabilities: Wei,

    /// Version for optimistic concurrency
    pub version: u64,

    /// Timestamp of last modification (Unix millis)
    pub updated_at: i64,
}

impl EscrowAccount {
    pub fn new() -> Self {
        Self {
            updated_at: chrono::Utc::now().timestamp_millis(),
            ..Default::default()
        }
    }

    /// Check that `amount` could be deposited without mutating anything
    pub fn ensure_depositable(&self, amount: Wei) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }
        self.balance
            .checked_add(amount)
            .map(|_| ())
            .ok_or(EscrowError::Overflow)
    }

    /// Take funds into escrow
    pub fn deposit(&mut self, amount: Wei) -> Result<(), EscrowError> {
        self.ensure_depositable(amount)?;
        self.balance = self.balance.checked_add(amount).ok_or(EscrowError::Overflow)?;
        self.touch();
        Ok(())
    }

    /// Check that `amount` could be withdrawn without mutating anything
    pub fn ensure_available(&self, amount: Wei) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }
        if self.balance < amount {
            return Err(EscrowError::InsufficientBalance {
                required: amount,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Release funds out of escrow
    pub fn withdraw(&mut self, amount: Wei) -> Result<(), EscrowError> {
        self.ensure_available(amount)?;
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(EscrowError::InsufficientBalance {
                required: amount,
                available: self.balance,
            })?;
        self.touch();
        Ok(())
    }

    /// Record a credited payout as an outstanding obligation
    pub fn obligate(&mut self, amount: Wei) -> Result<(), EscrowError> {
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }
        self.liabilities = self
            .liabilities
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        self.touch();
        Ok(())
    }

    /// Clear an obligation that has been paid out
    pub fn settle(&mut self, amount: Wei) -> Result<(), EscrowError> {
        self.liabilities = self
            .liabilities
            .checked_sub(amount)
            .ok_or(EscrowError::LiabilityUnderflow {
                amount,
                outstanding: self.liabilities,
            })?;
        self.touch();
        Ok(())
    }

    /// Balance not committed to outstanding payouts
    pub fn uncommitted(&self) -> Wei {
        self.balance.checked_sub(self.liabilities).unwrap_or(Wei::ZERO)
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl std::fmt::Display for EscrowAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EscrowAccount(balance={}, liabilities={})",
            self.balance, self.liabilities
        )
    }
}
