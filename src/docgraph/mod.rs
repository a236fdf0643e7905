//! Content-graph collaborator.
//!
//! Every proposal links 1:1 to an opaque, content-addressed document used
//! for metadata and audit. How documents are addressed and stored is an
//! external concern behind [`DocumentGraph`]; the engine only holds the
//! hash and drives creation/erasure at the lifecycle edges.

use crate::serialization::SerializationError;
use crate::types::AccountName;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub mod memory;

/// Content-addressed document identifier (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentHash([u8; 32]);

impl DocumentHash {
    /// Create from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[..32]);
        Self(hash)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Opaque document content.
pub type DocumentContent = serde_json::Value;

/// Document operation errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Content could not be encoded for addressing or storage.
    #[error("document content could not be encoded: {0}")]
    Encode(#[from] SerializationError),
}

/// Trait abstraction for document storage.
pub trait DocumentGraph {
    /// Create (or re-reference) a document owned by `owner`; returns its
    /// content hash.
    fn create_document(
        &mut self,
        owner: &AccountName,
        content: &DocumentContent,
    ) -> Result<DocumentHash, DocumentError>;

    /// Erase the document with `hash`. Erasing an unknown hash is a no-op so
    /// orphaned links can be force-cleared.
    fn erase_document(&mut self, hash: &DocumentHash);
}
