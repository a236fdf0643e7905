//! Capability traits the embedding host provides.
//!
//! The engine never reaches into an execution environment directly: the
//! clock, authority proof, authorization policy, and action dispatch are
//! injected behind these traits. Enables mock implementations for unit
//! testing without a real host.

use crate::transaction::Action;
use crate::types::{AccountName, PermissionLevel, Timestamp};
use thiserror::Error;

pub mod mock;

/// Current-time source.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Proof of control over identities.
pub trait Authority {
    /// Whether the current caller holds authority over `account`.
    fn has_account_control(&self, account: &AccountName) -> bool;

    /// Whether the current caller holds the specific permission `level`.
    fn has_permission_control(&self, level: &PermissionLevel) -> bool;
}

/// Black-box policy evaluator over the host's permission hierarchy: does the
/// candidate approval set satisfy the packed transaction's required
/// authorization?
pub trait AuthorizationOracle {
    fn is_authorization_sufficient(
        &self,
        packed_transaction: &[u8],
        approvals: &[PermissionLevel],
    ) -> bool;
}

/// Action dispatch failed on the host side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Executes one staged action with host-level side effects.
///
/// An `Err` aborts the remainder of an execution run. The engine does not
/// unwind actions already dispatched; implementations that need
/// all-or-nothing semantics must stage effects and commit only once the
/// whole run has succeeded.
pub trait ActionDispatcher {
    fn dispatch(&self, action: &Action) -> Result<(), DispatchError>;
}

/// The full capability set the engine needs from its host.
pub trait Host: Clock + Authority + AuthorizationOracle + ActionDispatcher {}

impl<T: Clock + Authority + AuthorizationOracle + ActionDispatcher> Host for T {}
