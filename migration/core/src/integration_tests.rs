//! Integration Tests
//!
//! End-to-end runs of the migration pipeline against in-memory
//! collaborators: a static ledger snapshot, a recording finalizer, a
//! keyless signer and a scripted submitter.

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::assembler::TransactionCandidate;
    use crate::config::ProtocolConfig;
    use crate::datum::LockState;
    use crate::errors::{MigrationError, MigrationResult, StateSubject};
    use crate::migrate::run_migration;
    use crate::plutus::PlutusData;
    use crate::provider::{
        LedgerStateProvider, SignedTransaction, SigningService, SubmissionService,
        TransactionFinalizer, UnsignedTransaction,
    };
    use crate::redeemer::WithdrawRedeemer;
    use crate::types::{Amount, Datum, InputRef, TokenId, TxId, UnspentOutput, Value};

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

    /// Captures the candidate it is asked to balance
    struct RecordingFinalizer {
        seen: Mutex<Option<TransactionCandidate>>,
    }

    impl RecordingFinalizer {
        fn new() -> Self {
            Self {
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl TransactionFinalizer for RecordingFinalizer {
        async fn complete(
            &self,
            candidate: &TransactionCandidate,
        ) -> MigrationResult<UnsignedTransaction> {
            *self.seen.lock().unwrap() = Some(candidate.clone());
            Ok(UnsignedTransaction(b"unsigned".to_vec()))
        }
    }

    struct KeylessSigner;

    #[async_trait]
    impl SigningService for KeylessSigner {
        async fn sign(&self, tx: &UnsignedTransaction) -> MigrationResult<SignedTransaction> {
            let mut bytes = tx.0.clone();
            bytes.extend_from_slice(b"+witness");
            Ok(SignedTransaction(bytes))
        }
    }

    struct AcceptingSubmitter {
        tx_id: TxId,
    }

    #[async_trait]
    impl SubmissionService for AcceptingSubmitter {
        async fn post_transaction(&self, _tx: &SignedTransaction) -> MigrationResult<TxId> {
            Ok(self.tx_id)
        }
    }

    /// Models a ledger-construction layer that cannot cover the outputs
    struct InsolventFinalizer;

    #[async_trait]
    impl TransactionFinalizer for InsolventFinalizer {
        async fn complete(
            &self,
            _candidate: &TransactionCandidate,
        ) -> MigrationResult<UnsignedTransaction> {
            Err(MigrationError::BalancingError {
                detail: "wallet cannot cover 200000000 legacy tokens".into(),
            })
        }
    }

    struct RejectingSubmitter;

    #[async_trait]
    impl SubmissionService for RejectingSubmitter {
        async fn post_transaction(&self, _tx: &SignedTransaction) -> MigrationResult<TxId> {
            Err(MigrationError::SubmissionRejected {
                reason: "BadInputsUTxO".into(),
            })
        }
    }

    fn config() -> ProtocolConfig {
        ProtocolConfig::mainnet().unwrap()
    }

    fn vault_utxo(config: &ProtocolConfig, state: &LockState) -> UnspentOutput {
        UnspentOutput {
            input: InputRef::new(TxId::new([0x42; 32]), 0),
            address: config.vault_address.clone(),
            value: Value::new(2_000_000)
                .with_asset(config.state_token(), Amount::new(1))
                .with_asset(config.legacy_token(), state.current_locked),
            datum: Some(Datum(state.to_bytes().unwrap())),
        }
    }

    fn script_ref(config: &ProtocolConfig, input: InputRef) -> UnspentOutput {
        UnspentOutput {
            input,
            address: config.vault_address.clone(),
            value: Value::new(20_000_000),
            datum: None,
        }
    }

    fn populated_ledger(config: &ProtocolConfig, state: &LockState) -> StaticLedger {
        StaticLedger {
            utxos: vec![
                vault_utxo(config, state),
                script_ref(config, config.spend_script_ref),
                script_ref(config, config.mint_script_ref),
            ],
        }
    }

    #[tokio::test]
    async fn test_end_to_end_migration() {
        let config = config();
        let old_state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let ledger = populated_ledger(&config, &old_state);
        let finalizer = RecordingFinalizer::new();
        let submitter = AcceptingSubmitter {
            tx_id: TxId::new([0x77; 32]),
        };

        let tx_id = run_migration(
            &ledger,
            &finalizer,
            &KeylessSigner,
            &submitter,
            &config,
            Amount::new(200_000_000),
        )
        .await
        .unwrap();
        assert_eq!(tx_id, TxId::new([0x77; 32]));

        let candidate = finalizer.seen.lock().unwrap().clone().unwrap();

        // the withdrawal redeemer binds the re-lock output and the amount
        assert_eq!(
            candidate.withdrawal.redeemer,
            WithdrawRedeemer::Lock {
                lock_output_index: 0,
                locking_amount: Amount::new(200_000_000),
            }
        );
        assert_eq!(candidate.mint.amount, Amount::new(200_000_000));
        assert_eq!(candidate.mint.token, config.successor_token());
        assert_eq!(candidate.withdrawal.lovelace, 0);
        assert_eq!(candidate.reference_inputs.len(), 2);

        // the re-lock output carries the grown balance and the new datum
        let lock_output = &candidate.outputs[0];
        assert_eq!(
            lock_output.value.asset(&config.legacy_token()),
            Amount::new(5_200_000_000)
        );
        assert_eq!(
            lock_output.value.asset(&config.state_token()),
            Amount::new(1)
        );
        let new_state = LockState::from_bytes(&lock_output.datum.as_ref().unwrap().0).unwrap();
        assert_eq!(new_state, LockState::new(1_000_000, Amount::new(5_200_000_000)));
    }

    #[tokio::test]
    async fn test_vault_not_found_builds_nothing() {
        let config = config();
        let ledger = StaticLedger { utxos: vec![] };
        let finalizer = RecordingFinalizer::new();
        let submitter = AcceptingSubmitter {
            tx_id: TxId::new([0u8; 32]),
        };

        let err = run_migration(
            &ledger,
            &finalizer,
            &KeylessSigner,
            &submitter,
            &config,
            Amount::new(200_000_000),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::StateNotFound {
                subject: StateSubject::VaultUtxo { .. }
            }
        ));
        assert!(finalizer.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_datum_builds_nothing() {
        let config = config();
        let bad = PlutusData::constr(0, vec![PlutusData::int(1)])
            .to_bytes()
            .unwrap();
        let mut utxo = vault_utxo(
            &config,
            &LockState::new(1_000_000, Amount::new(5_000_000_000)),
        );
        utxo.datum = Some(Datum(bad));
        let ledger = StaticLedger {
            utxos: vec![
                utxo,
                script_ref(&config, config.spend_script_ref),
                script_ref(&config, config.mint_script_ref),
            ],
        };
        let finalizer = RecordingFinalizer::new();
        let submitter = AcceptingSubmitter {
            tx_id: TxId::new([0u8; 32]),
        };

        let err = run_migration(
            &ledger,
            &finalizer,
            &KeylessSigner,
            &submitter,
            &config,
            Amount::new(200_000_000),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MigrationError::DecodeError { .. }));
        assert!(finalizer.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_amount_fails_before_assembly() {
        let config = config();
        let old_state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let ledger = populated_ledger(&config, &old_state);
        let finalizer = RecordingFinalizer::new();
        let submitter = AcceptingSubmitter {
            tx_id: TxId::new([0u8; 32]),
        };

        let err = run_migration(
            &ledger,
            &finalizer,
            &KeylessSigner,
            &submitter,
            &config,
            Amount::ZERO,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MigrationError::AmountError { .. }));
        assert!(finalizer.seen.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_balancing_failure_stops_before_signing() {
        let config = config();
        let old_state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let ledger = populated_ledger(&config, &old_state);
        let submitter = AcceptingSubmitter {
            tx_id: TxId::new([0u8; 32]),
        };

        let err = run_migration(
            &ledger,
            &InsolventFinalizer,
            &KeylessSigner,
            &submitter,
            &config,
            Amount::new(200_000_000),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MigrationError::BalancingError { .. }));
        assert_eq!(err.stage(), "assembly");
    }

    #[tokio::test]
    async fn test_submission_rejection_propagates() {
        let config = config();
        let old_state = LockState::new(1_000_000, Amount::new(5_000_000_000));
        let ledger = populated_ledger(&config, &old_state);
        let finalizer = RecordingFinalizer::new();

        let err = run_migration(
            &ledger,
            &finalizer,
            &KeylessSigner,
            &RejectingSubmitter,
            &config,
            Amount::new(200_000_000),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            MigrationError::SubmissionRejected {
                reason: "BadInputsUTxO".into(),
            }
        );
        assert_eq!(err.stage(), "submission");
    }
}
