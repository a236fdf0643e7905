//! Proposal rows and the approval-set state machine.

use crate::docgraph::DocumentHash;
use crate::types::{AccountName, PermissionLevel, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Symbolic key of a live proposal. Unique among live proposals; reusable
/// once the proposal is erased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalName(pub String);

impl ProposalName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProposalName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Which side of the approval split a level currently sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Asked for, not yet granted.
    Requested,
    /// Granted.
    Provided,
}

/// Per-level approval bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub status: ApprovalStatus,
    /// `Timestamp::ZERO` until the first grant/retract transition. After a
    /// grant it is the approval time; after a retract it only marks
    /// "requested since".
    pub time: Timestamp,
}

/// Invalid approval-state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalStateError {
    #[error("approval is not on the list of requested approvals")]
    NotRequested,
    #[error("no approval previously granted")]
    NotApproved,
}

/// The requested/provided approval split.
///
/// Stored as ONE map keyed by permission level, so a level can never sit on
/// both sides and never appears twice on either; the transition methods are
/// the only mutation path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSet {
    records: BTreeMap<PermissionLevel, ApprovalRecord>,
}

impl ApprovalSet {
    /// Build the initial set: every level requested, unstamped.
    pub fn request_all<I: IntoIterator<Item = PermissionLevel>>(levels: I) -> Self {
        let records = levels
            .into_iter()
            .map(|level| {
                (
                    level,
                    ApprovalRecord {
                        status: ApprovalStatus::Requested,
                        time: Timestamp::ZERO,
                    },
                )
            })
            .collect();
        Self { records }
    }

    /// Move `level` from requested to provided, stamped `now`.
    pub fn grant(
        &mut self,
        level: &PermissionLevel,
        now: Timestamp,
    ) -> Result<(), ApprovalStateError> {
        match self.records.get_mut(level) {
            Some(record) if record.status == ApprovalStatus::Requested => {
                record.status = ApprovalStatus::Provided;
                record.time = now;
                Ok(())
            }
            _ => Err(ApprovalStateError::NotRequested),
        }
    }

    /// Move `level` back to requested, stamped `now` as the new "requested
    /// since" marker.
    pub fn retract(
        &mut self,
        level: &PermissionLevel,
        now: Timestamp,
    ) -> Result<(), ApprovalStateError> {
        match self.records.get_mut(level) {
            Some(record) if record.status == ApprovalStatus::Provided => {
                record.status = ApprovalStatus::Requested;
                record.time = now;
                Ok(())
            }
            _ => Err(ApprovalStateError::NotApproved),
        }
    }

    /// Current status of `level`, if it was ever requested.
    pub fn status(&self, level: &PermissionLevel) -> Option<ApprovalStatus> {
        self.records.get(level).map(|record| record.status)
    }

    /// Levels still requested, with their stamps, in level order.
    pub fn requested(&self) -> impl Iterator<Item = (&PermissionLevel, Timestamp)> {
        self.with_status(ApprovalStatus::Requested)
    }

    /// Levels granted, with their grant stamps, in level order.
    pub fn provided(&self) -> impl Iterator<Item = (&PermissionLevel, Timestamp)> {
        self.with_status(ApprovalStatus::Provided)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn with_status(
        &self,
        status: ApprovalStatus,
    ) -> impl Iterator<Item = (&PermissionLevel, Timestamp)> {
        self.records
            .iter()
            .filter(move |(_, record)| record.status == status)
            .map(|(level, record)| (level, record.time))
    }
}

/// A pending proposal row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: AccountName,
    pub name: ProposalName,
    /// Opaque packed transaction bytes; immutable after creation.
    pub packed_transaction: Vec<u8>,
    /// Linked content-graph document.
    pub document_hash: DocumentHash,
    pub approvals: ApprovalSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(actor: &str) -> PermissionLevel {
        PermissionLevel::new(actor, "active")
    }

    #[test]
    fn test_request_all_starts_unstamped() {
        let set = ApprovalSet::request_all([level("alice"), level("bob")]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.provided().count(), 0);
        assert!(set.requested().all(|(_, time)| time.is_zero()));
    }

    #[test]
    fn test_grant_moves_and_stamps() {
        let alice = level("alice");
        let mut set = ApprovalSet::request_all([alice.clone(), level("bob")]);

        set.grant(&alice, Timestamp::from_micros(50)).unwrap();

        assert_eq!(set.status(&alice), Some(ApprovalStatus::Provided));
        assert_eq!(set.requested().count(), 1);
        let (granted, time) = set.provided().next().unwrap();
        assert_eq!(granted, &alice);
        assert_eq!(time, Timestamp::from_micros(50));
    }

    #[test]
    fn test_grant_requires_requested() {
        let alice = level("alice");
        let mut set = ApprovalSet::request_all([alice.clone()]);

        // Unknown level.
        assert_eq!(
            set.grant(&level("mallory"), Timestamp::from_micros(1)),
            Err(ApprovalStateError::NotRequested)
        );

        // Double grant.
        set.grant(&alice, Timestamp::from_micros(1)).unwrap();
        assert_eq!(
            set.grant(&alice, Timestamp::from_micros(2)),
            Err(ApprovalStateError::NotRequested)
        );
    }

    #[test]
    fn test_retract_requires_provided() {
        let alice = level("alice");
        let mut set = ApprovalSet::request_all([alice.clone()]);

        assert_eq!(
            set.retract(&alice, Timestamp::from_micros(1)),
            Err(ApprovalStateError::NotApproved)
        );
        assert_eq!(
            set.retract(&level("mallory"), Timestamp::from_micros(1)),
            Err(ApprovalStateError::NotApproved)
        );

        set.grant(&alice, Timestamp::from_micros(1)).unwrap();
        set.retract(&alice, Timestamp::from_micros(2)).unwrap();
        assert_eq!(set.status(&alice), Some(ApprovalStatus::Requested));
        let (_, time) = set.requested().next().unwrap();
        assert_eq!(time, Timestamp::from_micros(2));
    }

    #[test]
    fn test_regrant_carries_later_stamp() {
        let alice = level("alice");
        let mut set = ApprovalSet::request_all([alice.clone()]);

        set.grant(&alice, Timestamp::from_micros(10)).unwrap();
        set.retract(&alice, Timestamp::from_micros(20)).unwrap();
        set.grant(&alice, Timestamp::from_micros(30)).unwrap();

        let (_, time) = set.provided().next().unwrap();
        assert_eq!(time, Timestamp::from_micros(30));
    }
}
