//! Mock host for testing the engine without a real execution environment.

use super::{ActionDispatcher, Authority, AuthorizationOracle, Clock, DispatchError};
use crate::transaction::Action;
use crate::types::{AccountName, PermissionLevel, Timestamp};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex};

/// Mock host with a settable clock, scripted authority and oracle verdicts,
/// and recorded dispatches.
///
/// The scripted oracle policy: a candidate set is sufficient when it
/// contains every level registered via [`require_approvals`]. With no
/// registered levels every candidate set passes, so tests only opt in to
/// the checks they exercise.
///
/// [`require_approvals`]: MockHost::require_approvals
#[derive(Clone, Default)]
pub struct MockHost {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    now: Timestamp,
    account_control: HashSet<AccountName>,
    permission_control: HashSet<PermissionLevel>,
    required_approvals: BTreeSet<PermissionLevel>,
    dispatched: Vec<Action>,
    fail_dispatch_at: Option<usize>,
}

impl MockHost {
    /// Create a mock host with the clock at zero and no authority granted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock.
    pub fn set_now(&self, now: Timestamp) {
        self.state.lock().unwrap().now = now;
    }

    /// Advance the clock by `micros`.
    pub fn advance(&self, micros: u64) {
        let mut state = self.state.lock().unwrap();
        state.now = Timestamp::from_micros(state.now.as_micros() + micros);
    }

    /// Grant the caller authority over `account` (and thereby over every
    /// permission level of that actor).
    pub fn grant_account_control(&self, account: &AccountName) {
        self.state
            .lock()
            .unwrap()
            .account_control
            .insert(account.clone());
    }

    /// Grant the caller one specific permission level.
    pub fn grant_permission_control(&self, level: &PermissionLevel) {
        self.state
            .lock()
            .unwrap()
            .permission_control
            .insert(level.clone());
    }

    /// Revoke all granted authority.
    pub fn revoke_all_control(&self) {
        let mut state = self.state.lock().unwrap();
        state.account_control.clear();
        state.permission_control.clear();
    }

    /// Script the oracle: a candidate set passes only if it contains every
    /// level in `levels`.
    pub fn require_approvals<I: IntoIterator<Item = PermissionLevel>>(&self, levels: I) {
        self.state.lock().unwrap().required_approvals = levels.into_iter().collect();
    }

    /// Make the `index`-th dispatch call (0-based) fail.
    pub fn fail_dispatch_at(&self, index: usize) {
        self.state.lock().unwrap().fail_dispatch_at = Some(index);
    }

    /// Actions dispatched so far, in order.
    pub fn dispatched_actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().dispatched.clone()
    }
}

impl Clock for MockHost {
    fn now(&self) -> Timestamp {
        self.state.lock().unwrap().now
    }
}

impl Authority for MockHost {
    fn has_account_control(&self, account: &AccountName) -> bool {
        self.state.lock().unwrap().account_control.contains(account)
    }

    fn has_permission_control(&self, level: &PermissionLevel) -> bool {
        let state = self.state.lock().unwrap();
        state.permission_control.contains(level) || state.account_control.contains(&level.actor)
    }
}

impl AuthorizationOracle for MockHost {
    fn is_authorization_sufficient(
        &self,
        _packed_transaction: &[u8],
        approvals: &[PermissionLevel],
    ) -> bool {
        let state = self.state.lock().unwrap();
        state
            .required_approvals
            .iter()
            .all(|required| approvals.contains(required))
    }
}

impl ActionDispatcher for MockHost {
    fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_dispatch_at == Some(state.dispatched.len()) {
            return Err(DispatchError(format!(
                "scripted failure dispatching {}::{}",
                action.account, action.name
            )));
        }
        state.dispatched.push(action.clone());
        Ok(())
    }
}
