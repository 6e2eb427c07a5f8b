//! Migration Pipeline Driver
//!
//! One vault read, one computed transition, one assembled transaction, one
//! submission. The pipeline is strictly sequential and depends on a single
//! snapshot of the vault UTxO; if the chain moves underneath it, the ledger
//! rejects the transaction as a double-spend and the only recovery is to
//! run the whole pipeline again from the read. Nothing here retries.

use tracing::info;

use crate::assembler::{
    build_lock_output, locate_lock_output, TransactionAssembler, TransactionCandidate,
};
use crate::config::ProtocolConfig;
use crate::errors::{ConsistencyCheck, MigrationError, MigrationResult};
use crate::provider::{
    LedgerStateProvider, SigningService, SubmissionService, TransactionFinalizer,
};
use crate::redeemer::RedeemerSet;
use crate::state_reader::{read_lock_state, resolve_reference_scripts};
use crate::transition;
use crate::types::{Amount, TxId};

/// Reads the vault snapshot, derives the transition, and assembles the
/// consistency-checked candidate. Everything up to but excluding the
/// balancing/signing collaborators.
pub async fn assemble_candidate<P>(
    provider: &P,
    config: &ProtocolConfig,
    migration_amount: Amount,
) -> MigrationResult<TransactionCandidate>
where
    P: LedgerStateProvider + ?Sized,
{
    let vault = read_lock_state(provider, config).await?;
    let [spend_script, mint_script] = resolve_reference_scripts(provider, config).await?;
    info!(
        vault_utxo = %vault.utxo.input,
        current_locked = %vault.state.current_locked,
        "vault snapshot taken"
    );

    let new_state = transition::next(&vault.state, migration_amount)?;

    // outputs first, as an indexed list; redeemers are derived from the
    // list's real indices, never the reverse
    let outputs = vec![build_lock_output(
        config,
        &vault.utxo,
        &new_state,
        migration_amount,
    )?];
    let lock_output_index =
        locate_lock_output(&outputs, config).ok_or(MigrationError::ConsistencyError {
            check: ConsistencyCheck::OutputIndexMismatch {
                declared: 0,
                actual: None,
            },
        })?;
    let redeemers = RedeemerSet::for_migration(migration_amount, lock_output_index)?;

    let candidate = TransactionAssembler::new(config)
        .attach_reference_inputs(spend_script, mint_script)?
        .consume_vault_input(vault.utxo.clone(), redeemers.unlock)?
        .add_outputs(outputs)?
        .add_mint(config.successor_token(), migration_amount, redeemers.mint)?
        .add_withdrawal(config.reward_account(), 0, redeemers.withdraw)?
        .finish()?;
    info!(
        new_locked = %new_state.current_locked,
        lock_output_index,
        "candidate assembled and locally consistent"
    );
    Ok(candidate)
}

/// Runs the full migration: read state, derive the transition, encode the
/// redeemer set off the real output index, assemble, cross-check, then hand
/// over to the balancing, signing and submission collaborators.
pub async fn run_migration<P, F, G, S>(
    provider: &P,
    finalizer: &F,
    signer: &G,
    submitter: &S,
    config: &ProtocolConfig,
    migration_amount: Amount,
) -> MigrationResult<TxId>
where
    P: LedgerStateProvider + ?Sized,
    F: TransactionFinalizer + ?Sized,
    G: SigningService + ?Sized,
    S: SubmissionService + ?Sized,
{
    info!(amount = %migration_amount, network = ?config.network, "starting migration");

    let candidate = assemble_candidate(provider, config, migration_amount).await?;

    let unsigned = finalizer.complete(&candidate).await?;
    let signed = signer.sign(&unsigned).await?;
    let tx_id = submitter.post_transaction(&signed).await?;
    info!(%tx_id, "migration transaction submitted");
    Ok(tx_id)
}
