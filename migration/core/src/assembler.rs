//! Transaction Assembler
//!
//! Composes the migration transaction from five ordered, append-only build
//! steps:
//!
//! 1. attach both reference inputs (spend- and mint-script bodies),
//! 2. consume the vault's current UTxO under the unlock redeemer,
//! 3. append the output list, headed by the re-lock output,
//! 4. mint the successor amount under the mint redeemer,
//! 5. append the zero-value trigger withdrawal.
//!
//! No step may remove or reorder what an earlier step added; an out-of-order
//! call is a `ConsistencyError`. [`TransactionAssembler::finish`] then runs
//! every local cross-check the on-chain guard script will repeat, so a
//! mismatch is caught here instead of as a costly on-chain rejection.
//! Ledger-level balancing (fees, change, wallet inputs) is deliberately not
//! reimplemented; that is the `TransactionFinalizer` collaborator's contract.

use crate::config::ProtocolConfig;
use crate::datum::LockState;
use crate::errors::{
    AmountErrorReason, ConsistencyCheck, MigrationError, MigrationResult,
};
use crate::redeemer::{MintRedeemer, UnlockRedeemer, WithdrawRedeemer};
use crate::types::{Address, Amount, Datum, RewardAccount, TokenId, UnspentOutput, Value};

/// A produced output of the migration transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    pub address: Address,
    pub value: Value,
    pub datum: Option<Datum>,
}

/// The consumed vault input together with its spend authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendInput {
    pub utxo: UnspentOutput,
    pub redeemer: UnlockRedeemer,
}

/// The successor-token issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOperation {
    pub token: TokenId,
    pub amount: Amount,
    pub redeemer: MintRedeemer,
}

/// The zero-value stake withdrawal that forces the guard script to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerWithdrawal {
    pub account: RewardAccount,
    pub lovelace: u64,
    pub redeemer: WithdrawRedeemer,
}

/// A fully assembled, locally consistency-checked transaction, ready for
/// the balancing/signing collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionCandidate {
    pub reference_inputs: Vec<UnspentOutput>,
    pub vault_input: SpendInput,
    pub outputs: Vec<TransactionOutput>,
    pub mint: MintOperation,
    pub withdrawal: TriggerWithdrawal,
}

/// Builds the vault re-lock output: same address, the state-token unit, the
/// grown legacy balance and the rewritten inline datum. Lovelace is carried
/// over from the consumed vault output; the finalizer tops it up if the
/// ledger's minimum grows.
pub fn build_lock_output(
    config: &ProtocolConfig,
    vault_utxo: &UnspentOutput,
    new_state: &LockState,
    migration_amount: Amount,
) -> MigrationResult<TransactionOutput> {
    let legacy = config.legacy_token();
    let relocked = vault_utxo
        .value
        .asset(&legacy)
        .checked_add(migration_amount)?;
    let value = Value::new(vault_utxo.value.lovelace)
        .with_asset(config.state_token(), Amount::new(1))
        .with_asset(legacy, relocked);
    Ok(TransactionOutput {
        address: config.vault_address.clone(),
        value,
        datum: Some(Datum(new_state.to_bytes()?)),
    })
}

/// Position of the re-lock output within an output list: the first output
/// at the vault address carrying the state token. Redeemers are derived
/// from this, never the other way round.
pub fn locate_lock_output(outputs: &[TransactionOutput], config: &ProtocolConfig) -> Option<u64> {
    let state_token = config.state_token();
    outputs
        .iter()
        .position(|o| o.address == config.vault_address && !o.value.asset(&state_token).is_zero())
        .map(|i| i as u64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildStep {
    ReferenceInputs,
    VaultInput,
    Outputs,
    Mint,
    Withdrawal,
    Finish,
}

impl BuildStep {
    fn name(self) -> &'static str {
        match self {
            Self::ReferenceInputs => "attach-reference-inputs",
            Self::VaultInput => "consume-vault-input",
            Self::Outputs => "add-outputs",
            Self::Mint => "add-mint",
            Self::Withdrawal => "add-withdrawal",
            Self::Finish => "finish",
        }
    }
}

/// Append-only builder for the migration transaction
#[derive(Debug, Clone)]
pub struct TransactionAssembler<'a> {
    config: &'a ProtocolConfig,
    step: BuildStep,
    reference_inputs: Vec<UnspentOutput>,
    vault_input: Option<SpendInput>,
    outputs: Vec<TransactionOutput>,
    mint: Option<MintOperation>,
    withdrawal: Option<TriggerWithdrawal>,
}

impl<'a> TransactionAssembler<'a> {
    pub fn new(config: &'a ProtocolConfig) -> Self {
        Self {
            config,
            step: BuildStep::ReferenceInputs,
            reference_inputs: Vec::new(),
            vault_input: None,
            outputs: Vec::new(),
            mint: None,
            withdrawal: None,
        }
    }

    fn advance(&mut self, at: BuildStep, next: BuildStep) -> MigrationResult<()> {
        if self.step != at {
            return Err(MigrationError::ConsistencyError {
                check: ConsistencyCheck::StepOrder {
                    expected: self.step.name(),
                    actual: at.name(),
                },
            });
        }
        self.step = next;
        Ok(())
    }

    /// Step 1: both script bodies, consumed by reference only
    pub fn attach_reference_inputs(
        mut self,
        spend_script: UnspentOutput,
        mint_script: UnspentOutput,
    ) -> MigrationResult<Self> {
        self.advance(BuildStep::ReferenceInputs, BuildStep::VaultInput)?;
        self.reference_inputs.push(spend_script);
        self.reference_inputs.push(mint_script);
        Ok(self)
    }

    /// Step 2: spend the vault's current UTxO
    pub fn consume_vault_input(
        mut self,
        utxo: UnspentOutput,
        redeemer: UnlockRedeemer,
    ) -> MigrationResult<Self> {
        self.advance(BuildStep::VaultInput, BuildStep::Outputs)?;
        self.vault_input = Some(SpendInput { utxo, redeemer });
        Ok(self)
    }

    /// Step 3: the pre-assembled, index-stable output list
    pub fn add_outputs(mut self, outputs: Vec<TransactionOutput>) -> MigrationResult<Self> {
        self.advance(BuildStep::Outputs, BuildStep::Mint)?;
        self.outputs = outputs;
        Ok(self)
    }

    /// Step 4: mint the successor amount
    pub fn add_mint(
        mut self,
        token: TokenId,
        amount: Amount,
        redeemer: MintRedeemer,
    ) -> MigrationResult<Self> {
        self.advance(BuildStep::Mint, BuildStep::Withdrawal)?;
        if amount.is_zero() {
            return Err(MigrationError::AmountError {
                reason: AmountErrorReason::Zero,
            });
        }
        self.mint = Some(MintOperation {
            token,
            amount,
            redeemer,
        });
        Ok(self)
    }

    /// Step 5: the zero-value withdrawal that fires the guard script
    pub fn add_withdrawal(
        mut self,
        account: RewardAccount,
        lovelace: u64,
        redeemer: WithdrawRedeemer,
    ) -> MigrationResult<Self> {
        self.advance(BuildStep::Withdrawal, BuildStep::Finish)?;
        self.withdrawal = Some(TriggerWithdrawal {
            account,
            lovelace,
            redeemer,
        });
        Ok(self)
    }

    /// Runs every local cross-check and yields the candidate. Failing any
    /// check here is cheap; failing it on-chain is not.
    pub fn finish(mut self) -> MigrationResult<TransactionCandidate> {
        self.advance(BuildStep::Finish, BuildStep::Finish)?;

        let vault_input = self.vault_input.take().ok_or(missing("vault input"))?;
        let mint = self.mint.take().ok_or(missing("mint"))?;
        let withdrawal = self.withdrawal.take().ok_or(missing("withdrawal"))?;

        let candidate = TransactionCandidate {
            reference_inputs: self.reference_inputs,
            vault_input,
            outputs: self.outputs,
            mint,
            withdrawal,
        };
        check_candidate(&candidate, self.config)?;
        Ok(candidate)
    }
}

fn missing(component: &'static str) -> MigrationError {
    MigrationError::ConsistencyError {
        check: ConsistencyCheck::MissingComponent { component },
    }
}

fn inconsistent(check: ConsistencyCheck) -> MigrationError {
    MigrationError::ConsistencyError { check }
}

/// The full pre-submission cross-check battery: every embedded amount and
/// index must agree with the transaction that was actually constructed,
/// because the guard script will re-derive all of them on-chain.
fn check_candidate(candidate: &TransactionCandidate, config: &ProtocolConfig) -> MigrationResult<()> {
    // both configured reference inputs must be attached
    for wanted in [config.spend_script_ref, config.mint_script_ref] {
        if !candidate
            .reference_inputs
            .iter()
            .any(|r| r.input == wanted)
        {
            return Err(inconsistent(ConsistencyCheck::ReferenceInputMissing {
                input: wanted,
            }));
        }
    }

    // the vault spend must take the Spend validator path
    if candidate.vault_input.redeemer != UnlockRedeemer::Spend {
        return Err(inconsistent(ConsistencyCheck::WrongUnlockVariant {
            actual: "Mint",
        }));
    }

    // mint must issue the successor token
    let successor = config.successor_token();
    if candidate.mint.token != successor {
        return Err(inconsistent(ConsistencyCheck::MintTokenMismatch {
            expected: successor.asset_id(),
            actual: candidate.mint.token.asset_id(),
        }));
    }

    // the trigger withdrawal is side-effect-only
    if candidate.withdrawal.lovelace != 0 {
        return Err(inconsistent(ConsistencyCheck::WithdrawalNotZero {
            lovelace: candidate.withdrawal.lovelace,
        }));
    }
    let WithdrawRedeemer::Lock {
        lock_output_index,
        locking_amount,
    } = candidate.withdrawal.redeemer
    else {
        return Err(inconsistent(ConsistencyCheck::WrongWithdrawVariant {
            actual: "HardFork",
        }));
    };

    // the redeemer's amount and the minted value must agree
    if locking_amount != candidate.mint.amount {
        return Err(inconsistent(ConsistencyCheck::MintWithdrawMismatch {
            minted: candidate.mint.amount.quantity(),
            locked: locking_amount.quantity(),
        }));
    }

    // the bound output index must be where the re-lock output actually sits
    let actual_index = locate_lock_output(&candidate.outputs, config);
    match actual_index {
        Some(actual) if actual == lock_output_index => {}
        other => {
            return Err(inconsistent(ConsistencyCheck::OutputIndexMismatch {
                declared: lock_output_index,
                actual: other,
            }));
        }
    }
    let lock_output = &candidate.outputs[lock_output_index as usize];

    // exactly one state-token unit travels to the new vault output
    let state_quantity = lock_output.value.asset(&config.state_token());
    if state_quantity != Amount::new(1) {
        return Err(inconsistent(ConsistencyCheck::StateTokenQuantity {
            output_index: lock_output_index,
            quantity: state_quantity.quantity(),
        }));
    }

    // old and new datums bracket the transition
    let old_datum = candidate
        .vault_input
        .utxo
        .datum
        .as_ref()
        .ok_or(MigrationError::DatumMissing {
            utxo: candidate.vault_input.utxo.input,
        })?;
    let old_state = LockState::from_bytes(&old_datum.0)?;
    let new_datum = lock_output
        .datum
        .as_ref()
        .ok_or(missing("re-lock inline datum"))?;
    let new_state = LockState::from_bytes(&new_datum.0)?;

    if new_state.block_height != old_state.block_height {
        return Err(inconsistent(ConsistencyCheck::BlockHeightChanged {
            old: old_state.block_height,
            new: new_state.block_height,
        }));
    }

    let delta = new_state
        .current_locked
        .checked_sub(old_state.current_locked)
        .unwrap_or(Amount::ZERO);
    if new_state.current_locked < old_state.current_locked || delta != candidate.mint.amount {
        return Err(inconsistent(ConsistencyCheck::LockDeltaMismatch {
            minted: candidate.mint.amount.quantity(),
            old_locked: old_state.current_locked.quantity(),
            new_locked: new_state.current_locked.quantity(),
        }));
    }

    // conservation of the legacy token across the vault
    let legacy = config.legacy_token();
    let expected = candidate
        .vault_input
        .utxo
        .value
        .asset(&legacy)
        .checked_add(candidate.mint.amount)?;
    let relocked = lock_output.value.asset(&legacy);
    if relocked != expected {
        return Err(inconsistent(ConsistencyCheck::RelockedBalanceMismatch {
            expected: expected.quantity(),
            actual: relocked.quantity(),
        }));
    }

    Ok(())
}
