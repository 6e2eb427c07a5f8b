//! Hard-Fork Migration Engine
//!
//! One-shot state migration on a UTxO-model ledger: lock legacy tokens into
//! the vault contract, mint the same quantity of the successor token, and
//! advance the shared on-chain lock counter, all in a single atomic
//! multi-script transaction.
//!
//! The engine's job is the part that must not go wrong off-chain:
//!
//! - read the vault's current lock state from its one-of-one state token,
//! - derive the new state deterministically,
//! - encode three mutually-consistent redeemers (spend, mint, withdraw)
//!   from one migration amount and one output index,
//! - assemble reference inputs, vault spend, re-lock output, mint and the
//!   zero-value trigger withdrawal into one candidate transaction,
//! - cross-check every embedded amount and index locally before anything
//!   is signed, so an on-chain rejection stays a rarity.
//!
//! Balancing, key custody and network submission are collaborator traits
//! ([`provider`]); deployment identifiers are injected via
//! [`config::ProtocolConfig`], never derived at runtime.

pub mod assembler;
pub mod config;
pub mod datum;
pub mod errors;
pub mod migrate;
pub mod plutus;
pub mod provider;
pub mod redeemer;
pub mod state_reader;
pub mod transition;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use assembler::{
    build_lock_output, locate_lock_output, MintOperation, SpendInput, TransactionAssembler,
    TransactionCandidate, TransactionOutput, TriggerWithdrawal,
};
pub use config::ProtocolConfig;
pub use datum::LockState;
pub use errors::{
    AmountErrorReason, ConsistencyCheck, MigrationError, MigrationResult, StateSubject,
};
pub use migrate::{assemble_candidate, run_migration};
pub use plutus::PlutusData;
pub use provider::{
    LedgerStateProvider, SignedTransaction, SigningService, SubmissionService,
    TransactionFinalizer, UnsignedTransaction,
};
pub use redeemer::{MintRedeemer, RedeemerSet, UnlockRedeemer, WithdrawRedeemer};
pub use state_reader::{read_lock_state, resolve_reference_scripts, VaultState};
pub use transition::next;
pub use types::{
    Address, Amount, AssetName, Datum, InputRef, Network, PolicyId, RewardAccount, ScriptHash,
    TokenId, TxId, UnspentOutput, Value,
};
