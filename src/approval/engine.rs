//! The proposal lifecycle engine.
//!
//! Lifecycle per proposal:
//! `nonexistent -> pending (propose) -> pending (approve/unapprove)
//! -> erased (cancel | execute)`. A name freed by erasure is reusable.
//!
//! Every operation runs to completion synchronously and validates all of
//! its preconditions before mutating the store; the embedding host
//! serializes invocations, so no locking happens here.

use super::store::{InvalidationLedger, ProposalStore};
use super::types::{ApprovalSet, Proposal, ProposalName};
use crate::docgraph::{DocumentContent, DocumentError, DocumentGraph, DocumentHash};
use crate::host::{DispatchError, Host};
use crate::serialization::SerializationError;
use crate::transaction::{Transaction, TransactionDigest};
use crate::types::{AccountName, PermissionLevel};
use std::collections::BTreeSet;
use thiserror::Error;

/// Engine operation failures.
///
/// All abort the operation with no persisted mutation, except `Dispatch`,
/// which can surface after some actions of an execution run already went
/// out (see [`ProposalEngine::execute`]). None are retried internally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transaction expired")]
    ExpiredTransaction,

    #[error("transaction authorization failed")]
    AuthorizationFailure,

    #[error("proposal with the same name exists: {0}")]
    DuplicateProposal(ProposalName),

    #[error("proposal does not exist: {0}")]
    ProposalNotFound(ProposalName),

    #[error("transaction digest does not match the staged transaction")]
    HashMismatch,

    #[error("approval is not on the list of requested approvals: {0}")]
    NotRequested(PermissionLevel),

    #[error("no approval previously granted: {0}")]
    NotApproved(PermissionLevel),

    #[error("cannot cancel until expiration")]
    NotYetCancellable,

    #[error("not allowed to execute a transaction with context-free actions")]
    UnsupportedContextFreeActions,

    #[error("missing authority of {0}")]
    Unauthorized(String),

    #[error("malformed packed transaction: {0}")]
    Malformed(#[from] SerializationError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The proposal lifecycle engine.
///
/// Owns the proposal store and the invalidation ledger; talks to the
/// execution environment and the content graph through injected
/// capabilities, so it runs unmodified under a mock host in tests.
pub struct ProposalEngine<H: Host, G: DocumentGraph> {
    host: H,
    documents: G,
    proposals: ProposalStore,
    invalidations: InvalidationLedger,
}

impl<H: Host, G: DocumentGraph> ProposalEngine<H, G> {
    pub fn new(host: H, documents: G) -> Self {
        Self {
            host,
            documents,
            proposals: ProposalStore::new(),
            invalidations: InvalidationLedger::new(),
        }
    }

    /// Rebuild an engine around previously snapshotted state.
    pub fn with_state(
        host: H,
        documents: G,
        proposals: ProposalStore,
        invalidations: InvalidationLedger,
    ) -> Self {
        Self {
            host,
            documents,
            proposals,
            invalidations,
        }
    }

    /// The live proposal named `name`, if any.
    pub fn proposal(&self, name: &ProposalName) -> Option<&Proposal> {
        self.proposals.find(name)
    }

    pub fn proposals(&self) -> &ProposalStore {
        &self.proposals
    }

    pub fn invalidations(&self) -> &InvalidationLedger {
        &self.invalidations
    }

    pub fn documents(&self) -> &G {
        &self.documents
    }

    /// Stage a transaction for multi-party approval.
    ///
    /// Validates proposer authority and transaction freshness, asks the
    /// oracle whether the requested approver set is sufficient in
    /// principle, then persists the row and creates its linked document.
    /// Returns the document hash.
    pub fn propose(
        &mut self,
        proposer: AccountName,
        name: ProposalName,
        requested: BTreeSet<PermissionLevel>,
        content: DocumentContent,
        packed_transaction: Vec<u8>,
    ) -> Result<DocumentHash, EngineError> {
        self.require_account(&proposer)?;

        let transaction = Transaction::unpack(&packed_transaction)?;
        if transaction.header.is_expired(self.host.now()) {
            return Err(EngineError::ExpiredTransaction);
        }

        let candidate: Vec<PermissionLevel> = requested.iter().cloned().collect();
        if !self
            .host
            .is_authorization_sufficient(&packed_transaction, &candidate)
        {
            return Err(EngineError::AuthorizationFailure);
        }

        // Checked before document creation, so a rejected propose leaves no
        // orphan document behind.
        if self.proposals.contains(&name) {
            return Err(EngineError::DuplicateProposal(name));
        }

        let document_hash = self.documents.create_document(&proposer, &content)?;

        let inserted = self.proposals.insert_if_absent(Proposal {
            proposer: proposer.clone(),
            name: name.clone(),
            packed_transaction,
            document_hash,
            approvals: ApprovalSet::request_all(requested),
        });
        debug_assert!(inserted);

        tracing::info!(proposal = %name, proposer = %proposer, "proposal staged");
        Ok(document_hash)
    }

    /// Grant one requested approval, stamping it with the current time.
    ///
    /// With `expected_digest`, the staged transaction is first located via
    /// the proposer-scoped path and its digest compared, so the approver is
    /// provably signing the transaction they believe they are.
    pub fn approve(
        &mut self,
        proposer: AccountName,
        name: ProposalName,
        level: PermissionLevel,
        expected_digest: Option<TransactionDigest>,
    ) -> Result<(), EngineError> {
        self.require_permission(&level)?;

        if let Some(expected) = expected_digest {
            let row = self
                .proposals
                .find_for_proposer(&proposer, &name)
                .ok_or_else(|| EngineError::ProposalNotFound(name.clone()))?;
            if TransactionDigest::of(&row.packed_transaction) != expected {
                return Err(EngineError::HashMismatch);
            }
        }

        let now = self.host.now();
        let row = self
            .proposals
            .find_mut(&name)
            .ok_or_else(|| EngineError::ProposalNotFound(name.clone()))?;
        row.approvals
            .grant(&level, now)
            .map_err(|_| EngineError::NotRequested(level.clone()))?;

        tracing::info!(proposal = %name, level = %level, "approval granted");
        Ok(())
    }

    /// Retract one provided approval, moving the level back to requested.
    pub fn unapprove(
        &mut self,
        _proposer: AccountName,
        name: ProposalName,
        level: PermissionLevel,
    ) -> Result<(), EngineError> {
        self.require_permission(&level)?;

        let now = self.host.now();
        let row = self
            .proposals
            .find_mut(&name)
            .ok_or_else(|| EngineError::ProposalNotFound(name.clone()))?;
        row.approvals
            .retract(&level, now)
            .map_err(|_| EngineError::NotApproved(level.clone()))?;

        tracing::info!(proposal = %name, level = %level, "approval retracted");
        Ok(())
    }

    /// Erase a pending proposal and its linked document.
    ///
    /// The proposer may cancel at any time; anyone else only once the
    /// staged transaction has expired (stale-proposal cleanup).
    pub fn cancel(
        &mut self,
        proposer: AccountName,
        name: ProposalName,
        canceler: AccountName,
    ) -> Result<(), EngineError> {
        self.require_account(&canceler)?;

        let row = self
            .proposals
            .find_for_proposer(&proposer, &name)
            .ok_or_else(|| EngineError::ProposalNotFound(name.clone()))?;

        if canceler != row.proposer {
            let transaction = Transaction::unpack(&row.packed_transaction)?;
            if !transaction.header.is_expired(self.host.now()) {
                return Err(EngineError::NotYetCancellable);
            }
        }

        let document_hash = row.document_hash;
        self.documents.erase_document(&document_hash);
        let _ = self.proposals.erase(&name);

        tracing::info!(proposal = %name, canceler = %canceler, "proposal canceled");
        Ok(())
    }

    /// Execute a satisfied proposal: dispatch its staged actions exactly
    /// once each, then erase the row and its document.
    ///
    /// The effective approval set is the provided set minus every approval
    /// voided by its actor's invalidation watermark; the oracle decides on
    /// that filtered set. A dispatch failure aborts the run and leaves the
    /// row and document intact; unwinding actions already dispatched is the
    /// [`crate::host::ActionDispatcher`] implementor's transactional
    /// concern.
    pub fn execute(
        &mut self,
        proposer: AccountName,
        name: ProposalName,
        executer: AccountName,
    ) -> Result<(), EngineError> {
        self.require_account(&executer)?;

        let row = self
            .proposals
            .find_for_proposer(&proposer, &name)
            .ok_or_else(|| EngineError::ProposalNotFound(name.clone()))?;

        let transaction = Transaction::unpack(&row.packed_transaction)?;
        if transaction.header.is_expired(self.host.now()) {
            return Err(EngineError::ExpiredTransaction);
        }
        if !transaction.context_free_actions.is_empty() {
            return Err(EngineError::UnsupportedContextFreeActions);
        }

        let effective: Vec<PermissionLevel> = row
            .approvals
            .provided()
            .filter(|(level, time)| self.invalidations.is_effective(&level.actor, *time))
            .map(|(level, _)| level.clone())
            .collect();
        tracing::debug!(
            proposal = %name,
            provided = row.approvals.provided().count(),
            effective = effective.len(),
            "effective approval set computed"
        );

        if !self
            .host
            .is_authorization_sufficient(&row.packed_transaction, &effective)
        {
            return Err(EngineError::AuthorizationFailure);
        }

        let document_hash = row.document_hash;
        for action in &transaction.actions {
            self.host.dispatch(action)?;
        }

        self.documents.erase_document(&document_hash);
        let _ = self.proposals.erase(&name);

        tracing::info!(proposal = %name, executer = %executer, "proposal executed");
        Ok(())
    }

    /// Void every approval `account` granted up to now, without touching
    /// any proposal row; observed lazily by [`execute`](Self::execute).
    pub fn invalidate(&mut self, account: AccountName) -> Result<(), EngineError> {
        self.require_account(&account)?;

        let now = self.host.now();
        self.invalidations.invalidate(&account, now);

        tracing::info!(account = %account, at = %now, "approvals invalidated");
        Ok(())
    }

    /// Force-clear an orphaned document link. Trusted passthrough: the
    /// embedding host restricts who may call it.
    pub fn erase_document(&mut self, hash: &DocumentHash) {
        self.documents.erase_document(hash);
    }

    fn require_account(&self, account: &AccountName) -> Result<(), EngineError> {
        if self.host.has_account_control(account) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(account.to_string()))
        }
    }

    fn require_permission(&self, level: &PermissionLevel) -> Result<(), EngineError> {
        if self.host.has_permission_control(level) {
            Ok(())
        } else {
            Err(EngineError::Unauthorized(level.to_string()))
        }
    }
}
