//! Staged transaction model.
//!
//! A proposal stages an opaque, CBOR-packed transaction. The engine keeps
//! the packed bytes immutable after creation and decodes them only where the
//! lifecycle needs header or action access; the authorization oracle always
//! receives the raw bytes.

use crate::serialization::{from_cbor, to_cbor, SerializationError};
use crate::types::{AccountName, PermissionLevel, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Transaction header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Instant at which the transaction stops being executable.
    pub expiration: Timestamp,
}

impl TransactionHeader {
    /// A header is expired once `now` has reached its expiration.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration <= now
    }
}

/// One staged action: a call into `account`'s `name` handler carrying opaque
/// payload bytes, authorized by `authorization`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: AccountName,
    pub name: String,
    pub authorization: Vec<PermissionLevel>,
    pub data: Vec<u8>,
}

/// A deferred transaction: header plus action lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
}

impl Transaction {
    /// Encode to the packed form stored in a proposal row.
    pub fn pack(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    /// Decode from packed bytes.
    pub fn unpack(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}

/// SHA-256 digest of a packed transaction (32 bytes).
///
/// Approvers supply an expected digest to prove they are approving the
/// transaction they believe they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionDigest([u8; 32]);

impl TransactionDigest {
    /// Digest packed transaction bytes.
    pub fn of(packed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(packed);
        Self(hasher.finalize().into())
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[..32]);
        Self(digest)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TransactionDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
