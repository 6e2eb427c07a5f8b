//! Authorization Payloads (Redeemers)
//!
//! Three script purposes fire in the migration transaction and each needs
//! its own redeemer: the spend purpose consuming the vault, the mint purpose
//! issuing the successor token, and the withdraw purpose whose only job is
//! to trigger the guard script that cross-checks the other two.
//!
//! The deployed validators fix the schemas:
//!
//! - unlock (spend): `Mint{zero} | Spend{zero}`, constructors 0/1 with a
//!   single unused integer field;
//! - mint: the hard-fork branch is constructor 2 with no fields (the minted
//!   value itself carries the amount);
//! - withdraw: `HardFork{lock_output_index} | Lock{lock_output_index,
//!   locking_amount}`, constructors 0/1.
//!
//! All three must agree on one migration amount and one output index, so
//! the only way to obtain them is [`RedeemerSet::for_migration`]; changing
//! either input means regenerating the whole set.

use crate::errors::{AmountErrorReason, MigrationError, MigrationResult};
use crate::plutus::PlutusData;
use crate::types::Amount;

/// Spend-purpose redeemer selecting which validator path authorizes the
/// vault spend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockRedeemer {
    Mint,
    Spend,
}

impl UnlockRedeemer {
    pub fn to_plutus(&self) -> PlutusData {
        let tag = match self {
            Self::Mint => 0,
            Self::Spend => 1,
        };
        // the single field is an unused zero placeholder in the script schema
        PlutusData::constr(tag, vec![PlutusData::int(0)])
    }

    pub fn from_plutus(data: &PlutusData) -> MigrationResult<Self> {
        match data.as_constr() {
            Some((0, [PlutusData::Int(_)])) => Ok(Self::Mint),
            Some((1, [PlutusData::Int(_)])) => Ok(Self::Spend),
            _ => Err(unknown_variant("unlock", data)),
        }
    }

    pub fn to_bytes(&self) -> MigrationResult<Vec<u8>> {
        self.to_plutus().to_bytes()
    }
}

/// Mint-purpose redeemer: the discriminant alone selects the hard-fork
/// branch, the minted value carries the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintRedeemer {
    HardFork,
}

impl MintRedeemer {
    const HARD_FORK_TAG: u64 = 2;

    pub fn to_plutus(&self) -> PlutusData {
        PlutusData::constr(Self::HARD_FORK_TAG, vec![])
    }

    pub fn from_plutus(data: &PlutusData) -> MigrationResult<Self> {
        match data.as_constr() {
            Some((Self::HARD_FORK_TAG, [])) => Ok(Self::HardFork),
            _ => Err(unknown_variant("mint", data)),
        }
    }

    pub fn to_bytes(&self) -> MigrationResult<Vec<u8>> {
        self.to_plutus().to_bytes()
    }
}

/// Withdraw-purpose redeemer for the zero-value trigger withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawRedeemer {
    HardFork {
        lock_output_index: u64,
    },
    Lock {
        /// Position of the re-lock output in the transaction's output list
        lock_output_index: u64,
        /// Must equal the successor amount minted in the same transaction
        locking_amount: Amount,
    },
}

impl WithdrawRedeemer {
    pub fn to_plutus(&self) -> MigrationResult<PlutusData> {
        match self {
            Self::HardFork { lock_output_index } => Ok(PlutusData::constr(
                0,
                vec![PlutusData::int(i128::from(*lock_output_index))],
            )),
            Self::Lock {
                lock_output_index,
                locking_amount,
            } => Ok(PlutusData::constr(
                1,
                vec![
                    PlutusData::int(i128::from(*lock_output_index)),
                    PlutusData::int(locking_amount.as_int()?),
                ],
            )),
        }
    }

    pub fn from_plutus(data: &PlutusData) -> MigrationResult<Self> {
        match data.as_constr() {
            Some((0, [PlutusData::Int(index)])) => {
                let lock_output_index = index_from_int(*index)?;
                Ok(Self::HardFork { lock_output_index })
            }
            Some((1, [PlutusData::Int(index), PlutusData::Int(amount)])) => {
                let lock_output_index = index_from_int(*index)?;
                let locking_amount = Amount::from_int(*amount)?;
                Ok(Self::Lock {
                    lock_output_index,
                    locking_amount,
                })
            }
            _ => Err(unknown_variant("withdraw", data)),
        }
    }

    pub fn to_bytes(&self) -> MigrationResult<Vec<u8>> {
        self.to_plutus()?.to_bytes()
    }
}

fn index_from_int(i: i128) -> MigrationResult<u64> {
    u64::try_from(i).map_err(|_| MigrationError::DecodeError {
        detail: format!("output index {i} out of range"),
    })
}

fn unknown_variant(purpose: &str, data: &PlutusData) -> MigrationError {
    MigrationError::DecodeError {
        detail: format!("{purpose} redeemer: unexpected shape {data:?}"),
    }
}

/// The three redeemers of one migration transaction, derived together from
/// one amount and one output index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedeemerSet {
    pub unlock: UnlockRedeemer,
    pub mint: MintRedeemer,
    pub withdraw: WithdrawRedeemer,
}

impl RedeemerSet {
    /// Builds the mutually-consistent set. `lock_output_index` must be the
    /// real position of the re-lock output, which is why callers assemble
    /// the output list first and derive the set from it, never the reverse.
    pub fn for_migration(
        migration_amount: Amount,
        lock_output_index: u64,
    ) -> MigrationResult<Self> {
        if migration_amount.is_zero() {
            return Err(MigrationError::AmountError {
                reason: AmountErrorReason::Zero,
            });
        }
        Ok(Self {
            unlock: UnlockRedeemer::Spend,
            mint: MintRedeemer::HardFork,
            withdraw: WithdrawRedeemer::Lock {
                lock_output_index,
                locking_amount: migration_amount,
            },
        })
    }
}
