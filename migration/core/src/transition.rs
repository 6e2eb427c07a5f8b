//! Lock-State Transition
//!
//! The single mutation path for the vault's lock state. A migration only
//! ever adds to the counter; the block height is provenance from the last
//! anchoring event and passes through untouched.

use crate::datum::LockState;
use crate::errors::{AmountErrorReason, MigrationError, MigrationResult};
use crate::types::Amount;

/// Computes the post-migration lock state.
///
/// Fails with `AmountError` when the amount is zero (a migration must
/// strictly increase locked supply) or when the counter would overflow.
pub fn next(old: &LockState, migration_amount: Amount) -> MigrationResult<LockState> {
    if migration_amount.is_zero() {
        return Err(MigrationError::AmountError {
            reason: AmountErrorReason::Zero,
        });
    }
    Ok(LockState {
        block_height: old.block_height,
        current_locked: old.current_locked.checked_add(migration_amount)?,
    })
}
