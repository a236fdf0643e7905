//! Keyed state tables: the proposal store and the invalidation ledger.
//!
//! Both are in-process ordered maps owned by the engine; durable backing is
//! the embedding host's concern, served by the CBOR snapshot/restore pair
//! on each table.

use super::types::{Proposal, ProposalName};
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use crate::types::{AccountName, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Live proposals, keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalStore {
    rows: BTreeMap<ProposalName, Proposal>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new row. Returns `false` (leaving the store untouched) if a
    /// live proposal with the same name exists.
    pub fn insert_if_absent(&mut self, proposal: Proposal) -> bool {
        match self.rows.entry(proposal.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(proposal);
                true
            }
        }
    }

    pub fn contains(&self, name: &ProposalName) -> bool {
        self.rows.contains_key(name)
    }

    pub fn find(&self, name: &ProposalName) -> Option<&Proposal> {
        self.rows.get(name)
    }

    pub fn find_mut(&mut self, name: &ProposalName) -> Option<&mut Proposal> {
        self.rows.get_mut(name)
    }

    /// Secondary lookup path: the row must both carry `name` and be owned by
    /// `proposer`.
    pub fn find_for_proposer(
        &self,
        proposer: &AccountName,
        name: &ProposalName,
    ) -> Option<&Proposal> {
        self.rows.get(name).filter(|row| &row.proposer == proposer)
    }

    /// Remove and return the row named `name`.
    pub fn erase(&mut self, name: &ProposalName) -> Option<Proposal> {
        self.rows.remove(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Live rows in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.rows.values()
    }

    /// Serialize every live row to CBOR for host-side checkpointing.
    pub fn snapshot(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    /// Rebuild a store from `snapshot` bytes.
    pub fn restore(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}

/// Per-actor invalidation watermarks.
///
/// An approval stamped at or before its actor's watermark is void at
/// execution time. Entries are upserted, never removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidationLedger {
    watermarks: BTreeMap<AccountName, Timestamp>,
}

impl InvalidationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the watermark for `account`.
    pub fn invalidate(&mut self, account: &AccountName, now: Timestamp) {
        self.watermarks.insert(account.clone(), now);
    }

    pub fn watermark(&self, account: &AccountName) -> Option<Timestamp> {
        self.watermarks.get(account).copied()
    }

    /// Whether an approval stamped `time` by `account` still counts: there
    /// is no watermark, or the watermark is strictly older than the stamp.
    pub fn is_effective(&self, account: &AccountName, time: Timestamp) -> bool {
        match self.watermark(account) {
            Some(watermark) => watermark < time,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.watermarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watermarks.is_empty()
    }

    /// Serialize the ledger to CBOR for host-side checkpointing.
    pub fn snapshot(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    /// Rebuild a ledger from `snapshot` bytes.
    pub fn restore(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}
