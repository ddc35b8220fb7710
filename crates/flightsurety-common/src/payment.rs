//! Outbound payment seam
//!
//! Paying a policy holder hands control to code the core does not own. The
//! payee may call back into the core before the payment returns, so callers
//! must commit every bookkeeping update before invoking a sink.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{address::Address, wei::Wei};

/// Destination for currency leaving escrow
#[async_trait]
pub trait PaymentSink: Send + Sync {
    async fn pay(&self, to: Address, amount: Wei) -> Result<()>;
}

/// Sink that credits in-process balances
///
/// Stands in for the substrate's transfer primitive in simulations and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPayments {
    balances: Arc<DashMap<Address, Wei>>,
}

impl InMemoryPayments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total received by `addr`
    pub fn received(&self, addr: &Address) -> Wei {
        self.balances.get(addr).map(|b| *b).unwrap_or(Wei::ZERO)
    }

    pub fn total_paid(&self) -> Wei {
        self.balances.iter().map(|entry| *entry.value()).sum()
    }
}

#[async_trait]
impl PaymentSink for InMemoryPayments {
    async fn pay(&self, to: Address, amount: Wei) -> Result<()> {
        let mut entry = self.balances.entry(to).or_insert(Wei::ZERO);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| crate::SuretyError::Payment(format!("balance overflow for {}", to)))?;
        Ok(())
    }
}
