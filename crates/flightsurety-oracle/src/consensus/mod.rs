//! Consensus module - oracle index assignment and response quorum
//!
//! This module provides:
//! - Oracle records and pseudo-random index assignment
//! - Quorum tallying of status responses

pub mod oracle;
pub mod quorum;

pub use oracle::{IndexAssigner, Oracle};
pub use quorum::{QuorumManager, ResponseTally};
