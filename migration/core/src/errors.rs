//! Error Types for the Hard-Fork Migration Engine
//!
//! Every failure in the single-shot migration workflow maps to one of the
//! eight terminal error classes below. Nothing is retried internally; the
//! caller reports the stage and reason and exits non-zero. Variants carry
//! the exact mismatched fields so the operator sees "minted X but withdrawal
//! redeemer locks Y" rather than a generic failure.

use core::fmt;

use crate::types::InputRef;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Main error enum for the migration workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    // ============ State Read Errors ============
    /// Required on-chain state could not be located
    StateNotFound { subject: StateSubject },

    /// The vault output exists but carries no inline datum
    DatumMissing { utxo: InputRef },

    /// On-chain data did not match the expected shape
    DecodeError { detail: String },

    // ============ Transition / Encoding Errors ============
    /// Invalid migration amount
    AmountError { reason: AmountErrorReason },

    /// Redeemer or datum could not be encoded
    EncodingError { detail: String },

    // ============ Assembly Errors ============
    /// Cross-check between redeemers, outputs and mint failed
    ConsistencyError { check: ConsistencyCheck },

    /// Transaction does not balance (surfaced by the ledger-construction
    /// collaborator, never produced by the assembler itself)
    BalancingError { detail: String },

    // ============ Submission Errors ============
    /// The ledger rejected the signed transaction
    SubmissionRejected { reason: String },
}

/// What piece of on-chain state a lookup was after
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSubject {
    /// The vault UTxO marked by exactly one unit of the state token
    VaultUtxo { asset_id: String },
    /// One of the two reference-script UTxOs
    ReferenceScript { input: InputRef },
}

/// Reasons for amount-related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountErrorReason {
    /// Amount is zero where a strictly positive amount is required
    Zero,
    /// A ledger integer was negative where a quantity was expected
    Negative,
    /// Checked addition overflowed
    Overflow,
    /// Checked subtraction underflowed
    Underflow,
}

/// The specific pre-submission cross-check that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyCheck {
    /// Assembler build steps were invoked out of order
    StepOrder {
        expected: &'static str,
        actual: &'static str,
    },

    /// A required transaction component was never attached
    MissingComponent { component: &'static str },

    /// Withdrawal redeemer amount disagrees with the minted quantity
    MintWithdrawMismatch { minted: u128, locked: u128 },

    /// Lock-state delta disagrees with the minted quantity
    LockDeltaMismatch {
        minted: u128,
        old_locked: u128,
        new_locked: u128,
    },

    /// Withdrawal redeemer points at the wrong output position
    OutputIndexMismatch {
        declared: u64,
        actual: Option<u64>,
    },

    /// The rewritten datum changed the provenance block height
    BlockHeightChanged { old: u64, new: u64 },

    /// The re-lock output does not carry exactly one state-token unit
    StateTokenQuantity { output_index: u64, quantity: u128 },

    /// Re-locked legacy balance != consumed balance + migration amount
    RelockedBalanceMismatch { expected: u128, actual: u128 },

    /// Mint is under the wrong policy or asset name
    MintTokenMismatch { expected: String, actual: String },

    /// The trigger withdrawal must be zero-value
    WithdrawalNotZero { lovelace: u64 },

    /// Withdrawal redeemer is not the Lock variant
    WrongWithdrawVariant { actual: &'static str },

    /// Vault spend redeemer is not the Spend variant
    WrongUnlockVariant { actual: &'static str },

    /// A configured reference input was not attached
    ReferenceInputMissing { input: InputRef },
}

impl MigrationError {
    /// Returns a stable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::StateNotFound { .. } => "E001_STATE_NOT_FOUND",
            Self::DatumMissing { .. } => "E002_DATUM_MISSING",
            Self::DecodeError { .. } => "E003_DECODE",
            Self::AmountError { .. } => "E010_AMOUNT",
            Self::EncodingError { .. } => "E011_ENCODING",
            Self::ConsistencyError { .. } => "E020_CONSISTENCY",
            Self::BalancingError { .. } => "E021_BALANCING",
            Self::SubmissionRejected { .. } => "E030_SUBMISSION_REJECTED",
        }
    }

    /// The pipeline stage this error belongs to, for operator-facing reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::StateNotFound { .. } | Self::DatumMissing { .. } | Self::DecodeError { .. } => {
                "state-read"
            }
            Self::AmountError { .. } => "transition",
            Self::EncodingError { .. } => "redeemer-encoding",
            Self::ConsistencyError { .. } | Self::BalancingError { .. } => "assembly",
            Self::SubmissionRejected { .. } => "submission",
        }
    }
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateNotFound { subject } => match subject {
                StateSubject::VaultUtxo { asset_id } => {
                    write!(f, "no unspent output holds exactly one unit of state token {asset_id}")
                }
                StateSubject::ReferenceScript { input } => {
                    write!(f, "reference script input {input} could not be resolved")
                }
            },
            Self::DatumMissing { utxo } => {
                write!(f, "vault output {utxo} has no inline datum")
            }
            Self::DecodeError { detail } => write!(f, "datum decode failed: {detail}"),
            Self::AmountError { reason } => match reason {
                AmountErrorReason::Zero => {
                    write!(f, "migration amount must be strictly positive, got 0")
                }
                AmountErrorReason::Negative => {
                    write!(f, "ledger integer is negative where a quantity was expected")
                }
                AmountErrorReason::Overflow => write!(f, "amount addition overflowed"),
                AmountErrorReason::Underflow => write!(f, "amount subtraction underflowed"),
            },
            Self::EncodingError { detail } => write!(f, "encoding failed: {detail}"),
            Self::ConsistencyError { check } => write!(f, "consistency check failed: {check}"),
            Self::BalancingError { detail } => {
                write!(f, "transaction does not balance: {detail}")
            }
            Self::SubmissionRejected { reason } => {
                write!(f, "ledger rejected transaction: {reason}")
            }
        }
    }
}

impl fmt::Display for ConsistencyCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepOrder { expected, actual } => {
                write!(f, "build step '{actual}' invoked while '{expected}' was pending")
            }
            Self::MissingComponent { component } => {
                write!(f, "transaction is missing its {component}")
            }
            Self::MintWithdrawMismatch { minted, locked } => {
                write!(f, "minted {minted} but withdrawal redeemer locks {locked}")
            }
            Self::LockDeltaMismatch {
                minted,
                old_locked,
                new_locked,
            } => write!(
                f,
                "minted {minted} but lock state moved {old_locked} -> {new_locked}"
            ),
            Self::OutputIndexMismatch { declared, actual } => match actual {
                Some(actual) => write!(
                    f,
                    "withdrawal redeemer binds output index {declared} but the re-lock output sits at {actual}"
                ),
                None => write!(
                    f,
                    "withdrawal redeemer binds output index {declared} but no output re-locks the vault"
                ),
            },
            Self::BlockHeightChanged { old, new } => {
                write!(f, "lock datum block height changed {old} -> {new}")
            }
            Self::StateTokenQuantity {
                output_index,
                quantity,
            } => write!(
                f,
                "re-lock output {output_index} carries {quantity} state-token units, expected 1"
            ),
            Self::RelockedBalanceMismatch { expected, actual } => write!(
                f,
                "re-lock output holds {actual} legacy tokens, expected {expected}"
            ),
            Self::MintTokenMismatch { expected, actual } => {
                write!(f, "mint is for asset {actual}, expected {expected}")
            }
            Self::WithdrawalNotZero { lovelace } => {
                write!(f, "trigger withdrawal must be zero-value, got {lovelace} lovelace")
            }
            Self::WrongWithdrawVariant { actual } => {
                write!(f, "withdrawal redeemer must be the Lock variant, got {actual}")
            }
            Self::WrongUnlockVariant { actual } => {
                write!(f, "vault spend redeemer must be the Spend variant, got {actual}")
            }
            Self::ReferenceInputMissing { input } => {
                write!(f, "configured reference input {input} is not attached")
            }
        }
    }
}

impl std::error::Error for MigrationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InputRef, TxId};
    use std::collections::BTreeSet;

    #[test]
    fn test_error_codes_unique() {
        let sample_ref = InputRef {
            tx_id: TxId::from_hex(&"00".repeat(32)).unwrap(),
            index: 0,
        };
        let errors = [
            MigrationError::StateNotFound {
                subject: StateSubject::VaultUtxo {
                    asset_id: "ab".into(),
                },
            },
            MigrationError::DatumMissing { utxo: sample_ref },
            MigrationError::DecodeError { detail: "x".into() },
            MigrationError::AmountError {
                reason: AmountErrorReason::Zero,
            },
            MigrationError::EncodingError { detail: "x".into() },
            MigrationError::ConsistencyError {
                check: ConsistencyCheck::MissingComponent { component: "mint" },
            },
            MigrationError::BalancingError { detail: "x".into() },
            MigrationError::SubmissionRejected { reason: "x".into() },
        ];

        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "Error codes must be unique");
    }

    #[test]
    fn test_mint_withdraw_mismatch_message() {
        let err = MigrationError::ConsistencyError {
            check: ConsistencyCheck::MintWithdrawMismatch {
                minted: 200_000_000,
                locked: 200_000_001,
            },
        };
        assert_eq!(
            err.to_string(),
            "consistency check failed: minted 200000000 but withdrawal redeemer locks 200000001"
        );
        assert_eq!(err.stage(), "assembly");
    }
}
