//! Wei - currency amounts in the smallest unit
//!
//! All thresholds are integers of the smallest currency unit
//! (1 ether = 10^18 wei). Ether conversions go through `rust_decimal` so that
//! human-facing amounts like `0.5` round-trip without float error.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

use crate::error::SuretyError;

/// Wei per ether
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Decimal places between wei and ether
const ETHER_SCALE: u32 = 18;

/// Amount of currency in wei
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn new(wei: u128) -> Self {
        Self(wei)
    }

    /// Whole ether amount
    pub const fn ether(ether: u128) -> Self {
        Self(ether * WEI_PER_ETHER)
    }

    /// Convert a (possibly fractional) ether amount
    ///
    /// Fails with `InvalidAmount` for negative amounts or amounts finer than
    /// one wei.
    pub fn from_ether(ether: Decimal) -> Result<Self, SuretyError> {
        if ether.is_sign_negative() {
            return Err(SuretyError::InvalidAmount);
        }
        let scaled = ether
            .checked_mul(Decimal::from(WEI_PER_ETHER as u64))
            .ok_or(SuretyError::InvalidAmount)?;
        if !scaled.fract().is_zero() {
            return Err(SuretyError::InvalidAmount);
        }
        scaled.to_u128().map(Self).ok_or(SuretyError::InvalidAmount)
    }

    /// Amount in ether, `None` if it exceeds decimal precision
    pub fn to_ether(&self) -> Option<Decimal> {
        let raw = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(raw, ETHER_SCALE)
            .ok()
            .map(|d| d.normalize())
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_sub(self, other: Wei) -> Option<Wei> {
        self.0.checked_sub(other.0).map(Wei)
    }

    /// Multiply by `numerator / denominator`, rounding down
    pub fn checked_mul_ratio(self, numerator: u128, denominator: u128) -> Option<Wei> {
        if denominator == 0 {
            return None;
        }
        self.0.checked_mul(numerator).map(|v| Wei(v / denominator))
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_ether() {
            Some(ether) => write!(f, "{} ETH", ether),
            None => write!(f, "{} wei", self.0),
        }
    }
}

impl From<u128> for Wei {
    fn from(wei: u128) -> Self {
        Self(wei)
    }
}

impl From<Wei> for String {
    fn from(wei: Wei) -> Self {
        wei.0.to_string()
    }
}

impl TryFrom<String> for Wei {
    type Error = SuretyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .parse::<u128>()
            .map(Wei)
            .map_err(|e| SuretyError::Serialization(format!("Invalid wei amount {}: {}", value, e)))
    }
}

impl Sum for Wei {
    fn sum<I: Iterator<Item = Wei>>(iter: I) -> Self {
        iter.fold(Wei::ZERO, |acc, w| Wei(acc.0.saturating_add(w.0)))
    }
}
