//! Oracle records and index assignment
//!
//! Indexes are drawn from a keyed blake3 hash over the engine's entropy key,
//! the caller, the block time and a per-draw nonce. Anyone holding the key
//! can re-derive an assignment; the registering oracle alone cannot steer it.

use flightsurety_common::Address;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Registered oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oracle {
    pub address: Address,
    /// Assigned indexes, ascending and distinct
    pub indexes: Vec<u8>,
    pub registered_at: i64,
}

impl Oracle {
    pub fn holds(&self, index: u8) -> bool {
        self.indexes.contains(&index)
    }
}

/// Pseudo-random index source
#[derive(Clone)]
pub struct IndexAssigner {
    key: [u8; 32],
    index_space: u8,
    nonce: u64,
}

impl fmt::Debug for IndexAssigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexAssigner")
            .field("key", &"<redacted>")
            .field("index_space", &self.index_space)
            .field("nonce", &self.nonce)
            .finish()
    }
}

impl IndexAssigner {
    /// Assigner with a fixed entropy key
    pub fn with_key(key: [u8; 32], index_space: u8) -> Self {
        Self {
            key,
            index_space,
            nonce: 0,
        }
    }

    /// Assigner keyed from the OS RNG
    pub fn from_os_rng(index_space: u8) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::with_key(key, index_space)
    }

    /// Draw one index in `[0, index_space)`
    pub fn draw(&mut self, caller: &Address, timestamp: i64) -> u8 {
        let nonce = self.nonce;
        self.nonce = self.nonce.wrapping_add(1);
        Self::derive(&self.key, self.index_space, caller, timestamp, nonce)
    }

    /// Draw `count` distinct indexes
    pub fn assign(&mut self, caller: &Address, timestamp: i64, count: usize) -> Vec<u8> {
        let count = count.min(self.index_space as usize);
        let mut indexes = BTreeSet::new();
        // Bounded retries, then fill deterministically from the lowest gap
        let max_draws = count.saturating_mul(64);
        let mut draws = 0;
        while indexes.len() < count && draws < max_draws {
            indexes.insert(self.draw(caller, timestamp));
            draws += 1;
        }
        let mut filler = 0u8;
        while indexes.len() < count {
            indexes.insert(filler);
            filler = filler.saturating_add(1);
        }
        indexes.into_iter().collect()
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Recompute the index produced by a given draw
    pub fn derive(key: &[u8; 32], index_space: u8, caller: &Address, timestamp: i64, nonce: u64) -> u8 {
        let mut hasher = blake3::Hasher::new_keyed(key);
        hasher.update(caller.as_bytes());
        hasher.update(&timestamp.to_le_bytes());
        hasher.update(&nonce.to_le_bytes());
        let digest = hasher.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        (u64::from_le_bytes(head) % u64::from(index_space.max(1))) as u8
    }
}
