//! External Collaborator Interfaces
//!
//! The engine never talks to an indexer, a key store, or the network
//! directly. Everything past the consistency-checked candidate goes through
//! these traits, injected at startup. Balancing (fees, change, wallet input
//! selection) lives inside the [`TransactionFinalizer`] implementation; its
//! failure contract is `BalancingError`, and the ledger's own rejection of a
//! submitted transaction surfaces as `SubmissionRejected`.

use async_trait::async_trait;

use crate::assembler::TransactionCandidate;
use crate::errors::MigrationResult;
use crate::types::{InputRef, TokenId, TxId, UnspentOutput};

/// Read access to confirmed ledger state
#[async_trait]
pub trait LedgerStateProvider: Send + Sync {
    /// The single UTxO currently holding the given asset, if any. Used with
    /// the state token, whose supply is one.
    async fn get_unspent_output_by_asset_id(
        &self,
        asset: &TokenId,
    ) -> MigrationResult<Option<UnspentOutput>>;

    /// Resolves output references to full outputs, dropping unknown ones
    async fn resolve_unspent_outputs(
        &self,
        refs: &[InputRef],
    ) -> MigrationResult<Vec<UnspentOutput>>;
}

/// Balanced but unsigned transaction, opaque to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction(pub Vec<u8>);

/// Fully signed transaction ready for submission, opaque to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction(pub Vec<u8>);

/// Ledger-construction layer that turns a candidate into a balanced
/// transaction (adds wallet inputs, change and fees)
#[async_trait]
pub trait TransactionFinalizer: Send + Sync {
    async fn complete(
        &self,
        candidate: &TransactionCandidate,
    ) -> MigrationResult<UnsignedTransaction>;
}

/// Holder of the key material
#[async_trait]
pub trait SigningService: Send + Sync {
    async fn sign(&self, tx: &UnsignedTransaction) -> MigrationResult<SignedTransaction>;
}

/// Network-facing submission endpoint
#[async_trait]
pub trait SubmissionService: Send + Sync {
    async fn post_transaction(&self, tx: &SignedTransaction) -> MigrationResult<TxId>;
}
