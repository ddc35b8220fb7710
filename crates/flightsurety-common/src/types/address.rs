//! Address - participant identity
//!
//! Airlines, passengers, oracles and the contract owner are all identified by
//! a 20-byte address supplied by the ledger substrate as the caller of each
//! operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SuretyError;

/// Address length in bytes
pub const ADDRESS_LEN: usize = 20;

/// Participant identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a stable address from a label
    ///
    /// Used by simulators and tests to mint reproducible identities.
    ///
    /// # Example
    /// ```
    /// use flightsurety_common::Address;
    ///
    /// let a = Address::derive("airline-1");
    /// assert_eq!(a, Address::derive("airline-1"));
    /// assert_ne!(a, Address::derive("airline-2"));
    /// ```
    pub fn derive(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash.as_bytes()[..ADDRESS_LEN]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Shortened form for log lines (`0x1234…abcd`)
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}…{}", &full[..4], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = SuretyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(raw)
            .map_err(|e| SuretyError::Serialization(format!("Invalid address {}: {}", s, e)))?;
        let bytes: [u8; ADDRESS_LEN] = decoded.try_into().map_err(|_| {
            SuretyError::Serialization(format!("Address must be {} bytes: {}", ADDRESS_LEN, s))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = SuretyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse() {
        let addr = Address::derive("oracle-7");
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 2 + ADDRESS_LEN * 2);
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_parse_without_prefix() {
        let addr: Address = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(addr.as_bytes()[19], 0xff);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::derive("passenger");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
