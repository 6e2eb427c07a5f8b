//! Vault Lock-State Datum
//!
//! The vault's inline datum is a two-field constructor-0 record:
//! `{ block_height, current_locked }`. `block_height` is an external
//! provenance marker carried through unchanged by every migration;
//! `current_locked` is the cumulative migrated supply and only ever grows.

use crate::errors::{MigrationError, MigrationResult};
use crate::plutus::PlutusData;
use crate::types::Amount;

/// Cumulative migration state as recorded at the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockState {
    /// Block height at which the lock was last anchored (not advanced here)
    pub block_height: u64,
    /// Total legacy tokens locked across all migrations so far
    pub current_locked: Amount,
}

impl LockState {
    pub fn new(block_height: u64, current_locked: Amount) -> Self {
        Self {
            block_height,
            current_locked,
        }
    }

    pub fn to_plutus(&self) -> MigrationResult<PlutusData> {
        Ok(PlutusData::constr(
            0,
            vec![
                PlutusData::int(i128::from(self.block_height)),
                PlutusData::int(self.current_locked.as_int()?),
            ],
        ))
    }

    pub fn to_bytes(&self) -> MigrationResult<Vec<u8>> {
        self.to_plutus()?.to_bytes()
    }

    pub fn from_plutus(data: &PlutusData) -> MigrationResult<Self> {
        let (tag, fields) = data.as_constr().ok_or_else(|| shape("not a constructor"))?;
        if tag != 0 {
            return Err(shape(&format!("constructor tag {tag}, expected 0")));
        }
        let [block_height, current_locked] = fields else {
            return Err(shape(&format!("{} fields, expected 2", fields.len())));
        };

        let block_height = block_height
            .as_int()
            .and_then(|i| u64::try_from(i).ok())
            .ok_or_else(|| shape("blockHeight is not a non-negative integer"))?;
        let current_locked = current_locked
            .as_int()
            .ok_or_else(|| shape("currentLockedAmount is not an integer"))?;
        let current_locked = Amount::from_int(current_locked)
            .map_err(|_| shape("currentLockedAmount is negative"))?;

        Ok(Self {
            block_height,
            current_locked,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> MigrationResult<Self> {
        Self::from_plutus(&PlutusData::from_bytes(bytes)?)
    }
}

fn shape(detail: &str) -> MigrationError {
    MigrationError::DecodeError {
        detail: format!("lock state datum: {detail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let encoded = state.to_bytes().unwrap();
        let decoded = LockState::from_bytes(&encoded).unwrap();
        assert_eq!(decoded, state);
        assert_eq!(decoded.to_bytes().unwrap(), encoded);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let datum = PlutusData::constr(0, vec![PlutusData::int(1_000_000)])
            .to_bytes()
            .unwrap();
        let err = LockState::from_bytes(&datum).unwrap_err();
        assert!(matches!(err, MigrationError::DecodeError { .. }));
        assert!(err.to_string().contains("1 fields, expected 2"));
    }

    #[test]
    fn test_wrong_constructor_rejected() {
        let datum = PlutusData::constr(1, vec![PlutusData::int(1), PlutusData::int(2)])
            .to_bytes()
            .unwrap();
        assert!(matches!(
            LockState::from_bytes(&datum).unwrap_err(),
            MigrationError::DecodeError { .. }
        ));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        let datum = PlutusData::constr(
            0,
            vec![PlutusData::int(1), PlutusData::bytes(vec![0x01])],
        )
        .to_bytes()
        .unwrap();
        assert!(matches!(
            LockState::from_bytes(&datum).unwrap_err(),
            MigrationError::DecodeError { .. }
        ));
    }

    #[test]
    fn test_negative_locked_amount_rejected() {
        let datum = PlutusData::constr(0, vec![PlutusData::int(1), PlutusData::int(-5)])
            .to_bytes()
            .unwrap();
        let err = LockState::from_bytes(&datum).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }
}
