//! File-Backed Ledger Snapshot
//!
//! An offline stand-in for the indexer: a JSON file listing the unspent
//! outputs the pipeline needs (the vault UTxO and the two reference-script
//! UTxOs), captured at a single point in time. The engine treats it exactly
//! like a live provider, which keeps the air-gapped assembly path identical
//! to the online one.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use hardfork_core::errors::MigrationResult;
use hardfork_core::provider::LedgerStateProvider;
use hardfork_core::types::{InputRef, TokenId, UnspentOutput};

/// On-disk snapshot shape
#[derive(Debug, Deserialize)]
pub struct SnapshotFile {
    pub utxos: Vec<UnspentOutput>,
}

/// Provider over a fixed set of unspent outputs
#[derive(Debug)]
pub struct SnapshotLedger {
    utxos: Vec<UnspentOutput>,
}

impl SnapshotLedger {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: SnapshotFile = serde_json::from_str(&raw)?;
        Ok(Self { utxos: file.utxos })
    }
}

#[async_trait]
impl LedgerStateProvider for SnapshotLedger {
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

#[cfg(test)]
mod tests {
    use super::*;
    use hardfork_core::config::ProtocolConfig;
    use hardfork_core::types::Amount;

    const SNAPSHOT: &str = r#"{
        "utxos": [
            {
                "input": {
                    "tx_id": "4242424242424242424242424242424242424242424242424242424242424242",
                    "index": 0
                },
                "address": "addr1wye5g0txzw8evz0gddc5lad6x5rs9ttaferkun96gr9wd9sj5y20t",
                "value": {
                    "lovelace": 2000000,
                    "assets": {
                        "33443d66138f9609e86b714ff5ba350702ad7d4e476e4cba40cae6966c6f636b5f7374617465": 1,
                        "279f842c33eed9054b9e3c70cd6a3b32298259c24b78b895cb41d91a54554e41": 5000000000
                    }
                },
                "datum": "d8799f1a000f42401b000000012a05f200ff"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_snapshot_lookup_by_asset() {
        let file: SnapshotFile = serde_json::from_str(SNAPSHOT).unwrap();
        let ledger = SnapshotLedger { utxos: file.utxos };
        let config = ProtocolConfig::mainnet().unwrap();

        let vault = ledger
            .get_unspent_output_by_asset_id(&config.state_token())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            vault.value.asset(&config.legacy_token()),
            Amount::new(5_000_000_000)
        );
        assert!(vault.datum.is_some());

        let missing = ledger
            .resolve_unspent_outputs(&[config.spend_script_ref])
            .await
            .unwrap();
        assert!(missing.is_empty());
    }
}
