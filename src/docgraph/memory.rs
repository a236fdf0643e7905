//! In-memory content graph.
//!
//! Addresses documents by the SHA-256 of their CBOR encoding. Suitable for
//! tests and for lightweight embeddings that do not bring their own graph.

use super::{DocumentContent, DocumentError, DocumentGraph, DocumentHash};
use crate::serialization::to_cbor;
use crate::types::AccountName;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A stored document record.
#[derive(Debug, Clone)]
pub struct Document {
    pub owner: AccountName,
    pub content: DocumentContent,
}

/// In-memory, content-addressed document store.
#[derive(Debug, Default)]
pub struct InMemoryDocumentGraph {
    documents: HashMap<DocumentHash, Document>,
}

impl InMemoryDocumentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: &DocumentHash) -> Option<&Document> {
        self.documents.get(hash)
    }

    pub fn contains(&self, hash: &DocumentHash) -> bool {
        self.documents.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentGraph for InMemoryDocumentGraph {
    fn create_document(
        &mut self,
        owner: &AccountName,
        content: &DocumentContent,
    ) -> Result<DocumentHash, DocumentError> {
        let encoded = to_cbor(content)?;
        let digest: [u8; 32] = Sha256::digest(&encoded).into();
        let hash = DocumentHash::from_bytes(&digest);

        // Identical content re-proposed maps to the same document; the first
        // creator stays the owner.
        self.documents.entry(hash).or_insert_with(|| Document {
            owner: owner.clone(),
            content: content.clone(),
        });

        Ok(hash)
    }

    fn erase_document(&mut self, hash: &DocumentHash) {
        self.documents.remove(hash);
    }
}
