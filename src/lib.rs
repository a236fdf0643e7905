//! Consign - Multi-Party Approval for Deferred Transactions
//!
//! A proposer stages a transaction together with the permission levels
//! required to authorize it; approvers grant or retract approval
//! independently; once the provided approvals satisfy the host's
//! authorization policy, any party may trigger execution, which dispatches
//! the staged actions exactly once and retires the proposal.
//!
//! Key principles:
//! - One approval record per permission level (never both requested and provided)
//! - Revocation by per-actor invalidation watermark, filtered at execution
//! - Host capabilities (clock, authority, policy oracle, dispatch) behind
//!   traits, so the engine runs without a real execution host

pub mod approval;
pub mod docgraph;
pub mod host;
pub mod serialization;
pub mod transaction;
pub mod types;
