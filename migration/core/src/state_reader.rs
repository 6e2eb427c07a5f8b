//! On-Chain State Reader
//!
//! Locates the vault's current UTxO via the one-of-one state token and
//! decodes its inline datum. The snapshot taken here is the single source
//! of truth for the rest of the assembly pass: the transaction binds to
//! exactly this UTxO, so a concurrent update simply invalidates the
//! transaction at submission time and the whole pipeline restarts.

use tracing::debug;

use crate::config::ProtocolConfig;
use crate::datum::LockState;
use crate::errors::{MigrationError, MigrationResult, StateSubject};
use crate::provider::LedgerStateProvider;
use crate::types::{Amount, UnspentOutput};

/// The vault snapshot: the UTxO that will be consumed plus its decoded state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultState {
    pub utxo: UnspentOutput,
    pub state: LockState,
}

/// Reads the current lock state.
///
/// Fails with `StateNotFound` when no UTxO holds exactly one unit of the
/// state token, `DatumMissing` when the UTxO has no inline datum, and
/// `DecodeError` when the datum is not a well-formed lock state.
pub async fn read_lock_state<P>(provider: &P, config: &ProtocolConfig) -> MigrationResult<VaultState>
where
    P: LedgerStateProvider + ?Sized,
{
    let state_token = config.state_token();
    let not_found = || MigrationError::StateNotFound {
        subject: StateSubject::VaultUtxo {
            asset_id: state_token.asset_id(),
        },
    };

    let utxo = provider
        .get_unspent_output_by_asset_id(&state_token)
        .await?
        .ok_or_else(not_found)?;

    // the marker is one-of-one; anything else is not the vault
    if utxo.value.asset(&state_token) != Amount::new(1) {
        return Err(not_found());
    }

    let datum = utxo
        .datum
        .as_ref()
        .ok_or(MigrationError::DatumMissing { utxo: utxo.input })?;
    let state = LockState::from_bytes(&datum.0)?;

    debug!(
        utxo = %utxo.input,
        block_height = state.block_height,
        current_locked = %state.current_locked,
        "vault lock state read"
    );
    Ok(VaultState { utxo, state })
}

/// Resolves the two reference-script UTxOs named by the configuration,
/// in spend-script, mint-script order.
pub async fn resolve_reference_scripts<P>(
    provider: &P,
    config: &ProtocolConfig,
) -> MigrationResult<[UnspentOutput; 2]>
where
    P: LedgerStateProvider + ?Sized,
{
    let wanted = [config.spend_script_ref, config.mint_script_ref];
    let resolved = provider.resolve_unspent_outputs(&wanted).await?;

    let pick = |input| {
        resolved
            .iter()
            .find(|o| o.input == input)
            .cloned()
            .ok_or(MigrationError::StateNotFound {
                subject: StateSubject::ReferenceScript { input },
            })
    };
    Ok([pick(config.spend_script_ref)?, pick(config.mint_script_ref)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plutus::PlutusData;
    use crate::types::{Datum, InputRef, TokenId, TxId, Value};
    use async_trait::async_trait;

    struct StaticLedger {
        utxos: Vec<UnspentOutput>,
    }

    #[async_trait]
    impl LedgerStateProvider for StaticLedger {
        async fn get_unspent_output_by_asset_id(
            &self,
            asset: &TokenId,
        ) -> MigrationResult<Option<UnspentOutput>> {
            Ok(self
                .utxos
                .iter()
                .find(|u| !u.value.asset(asset).is_zero())
                .cloned())
        }

        async fn resolve_unspent_outputs(
            &self,
            refs: &[InputRef],
        ) -> MigrationResult<Vec<UnspentOutput>> {
            Ok(self
                .utxos
                .iter()
                .filter(|u| refs.contains(&u.input))
                .cloned()
                .collect())
        }
    }

    fn config() -> ProtocolConfig {
        ProtocolConfig::mainnet().unwrap()
    }

    fn vault_utxo(config: &ProtocolConfig, quantity: u128, datum: Option<Datum>) -> UnspentOutput {
        UnspentOutput {
            input: InputRef::new(TxId::new([0xaa; 32]), 0),
            address: config.vault_address.clone(),
            value: Value::new(2_000_000).with_asset(config.state_token(), Amount::new(quantity)),
            datum,
        }
    }

    #[tokio::test]
    async fn test_reads_current_state() {
        let config = config();
        let state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let ledger = StaticLedger {
            utxos: vec![vault_utxo(&config, 1, Some(Datum(state.to_bytes().unwrap())))],
        };
        let vault = read_lock_state(&ledger, &config).await.unwrap();
        assert_eq!(vault.state, state);
    }

    #[tokio::test]
    async fn test_missing_state_token() {
        let config = config();
        let ledger = StaticLedger { utxos: vec![] };
        let err = read_lock_state(&ledger, &config).await.unwrap_err();
        assert!(matches!(
            err,
            MigrationError::StateNotFound {
                subject: StateSubject::VaultUtxo { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_wrong_state_token_quantity() {
        let config = config();
        let ledger = StaticLedger {
            utxos: vec![vault_utxo(&config, 2, None)],
        };
        let err = read_lock_state(&ledger, &config).await.unwrap_err();
        assert!(matches!(err, MigrationError::StateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_datum_missing() {
        let config = config();
        let ledger = StaticLedger {
            utxos: vec![vault_utxo(&config, 1, None)],
        };
        let err = read_lock_state(&ledger, &config).await.unwrap_err();
        assert!(matches!(err, MigrationError::DatumMissing { .. }));
    }

    #[tokio::test]
    async fn test_wrong_datum_shape() {
        let config = config();
        let bad_datum = PlutusData::constr(0, vec![PlutusData::int(1)])
            .to_bytes()
            .unwrap();
        let ledger = StaticLedger {
            utxos: vec![vault_utxo(&config, 1, Some(Datum(bad_datum)))],
        };
        let err = read_lock_state(&ledger, &config).await.unwrap_err();
        assert!(matches!(err, MigrationError::DecodeError { .. }));
    }

    #[tokio::test]
    async fn test_reference_scripts_resolved_in_order() {
        let config = config();
        let mk = |input: InputRef| UnspentOutput {
            input,
            address: config.vault_address.clone(),
            value: Value::new(20_000_000),
            datum: None,
        };
        let ledger = StaticLedger {
            utxos: vec![mk(config.mint_script_ref), mk(config.spend_script_ref)],
        };
        let [spend, mint] = resolve_reference_scripts(&ledger, &config).await.unwrap();
        assert_eq!(spend.input, config.spend_script_ref);
        assert_eq!(mint.input, config.mint_script_ref);
    }

    #[tokio::test]
    async fn test_missing_reference_script() {
        let config = config();
        let ledger = StaticLedger { utxos: vec![] };
        let err = resolve_reference_scripts(&ledger, &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::StateNotFound {
                subject: StateSubject::ReferenceScript { .. }
            }
        ));
    }
}
