//! Call context supplied by the ledger substrate

use serde::{Deserialize, Serialize};

use crate::types::address::Address;
use crate::types::wei::Wei;

/// Authenticated caller of a single operation
///
/// `value` is the currency attached to the call and `timestamp` is the
/// substrate's block time in Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: Wei,
    pub timestamp: i64,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: i64) -> Self {
        Self {
            caller,
            value: Wei::ZERO,
            timestamp,
        }
    }

    /// Context stamped with the current wall-clock time
    pub fn now(caller: Address) -> Self {
        Self::new(caller, chrono::Utc::now().timestamp())
    }

    /// Attach currency to the call
    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}
