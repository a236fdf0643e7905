//! Multi-party approval core: proposal rows, keyed state tables, and the
//! lifecycle engine.
//!
//! - One approval record per permission level (never requested AND provided)
//! - Revocation by per-actor watermark, filtered at execution time
//! - Operations validate every precondition before mutating the store

pub mod engine;
pub mod store;
pub mod types;

#[cfg(test)]
mod proptests;

pub use engine::{EngineError, ProposalEngine};
pub use store::{InvalidationLedger, ProposalStore};
pub use types::{
    ApprovalRecord, ApprovalSet, ApprovalStateError, ApprovalStatus, Proposal, ProposalName,
};
