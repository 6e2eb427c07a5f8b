//! Protocol Configuration
//!
//! Every identifier the assembler depends on (policy ids, the migration
//! script hash, the vault address, the two reference-script locations) is
//! deployment data, not code. It is injected here once at startup and never
//! derived at runtime, so pointing the engine at another network is a
//! config swap, not a rebuild.
//!
//! [`ProtocolConfig::mainnet`] carries the production deployment; a JSON
//! file with the same field names (see serde derives) overrides it for test
//! networks.

use serde::{Deserialize, Serialize};

use crate::errors::MigrationResult;
use crate::types::{
    Address, AssetName, InputRef, Network, PolicyId, RewardAccount, ScriptHash, TokenId, TxId,
};

/// Mainnet deployment constants
mod mainnet {
    /// Policy of the legacy token being locked away
    pub const LEGACY_POLICY_ID: &str = "279f842c33eed9054b9e3c70cd6a3b32298259c24b78b895cb41d91a";
    /// Policy of the successor token being minted
    pub const SUCCESSOR_POLICY_ID: &str =
        "c981fc98e761e3bb44ae35e7d97ae6227f684bcb6f50a636753da48e";
    /// Hash of the migration script; doubles as the state token's policy
    /// and as the withdraw trigger's stake credential
    pub const MIGRATION_SCRIPT_HASH: &str =
        "33443d66138f9609e86b714ff5ba350702ad7d4e476e4cba40cae696";
    /// Asset name shared by legacy and successor tokens ("TUNA")
    pub const ASSET_NAME: &str = "54554e41";
    /// Asset name of the one-of-one state marker ("lock_state")
    pub const STATE_TOKEN_NAME: &str = "6c6f636b5f7374617465";
    /// Script address the vault lives at
    pub const VAULT_ADDRESS: &str = "addr1wye5g0txzw8evz0gddc5lad6x5rs9ttaferkun96gr9wd9sj5y20t";
    /// UTxO exposing the spend-script body by reference
    pub const SPEND_SCRIPT_REF_TX: &str =
        "55897091192254abbe6501bf4fd63f4d9346e9c2f5300cadfcbe2cda25fd6351";
    pub const SPEND_SCRIPT_REF_INDEX: u64 = 0;
    /// UTxO exposing the mint-script body by reference
    pub const MINT_SCRIPT_REF_TX: &str =
        "80874829afb2cb34e23d282d763b419e26e9fb976fe8a7044eebbdf6531214b7";
    pub const MINT_SCRIPT_REF_INDEX: u64 = 0;
}

/// Fixed protocol constants for one deployment of the migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub network: Network,
    pub legacy_policy: PolicyId,
    pub successor_policy: PolicyId,
    /// Asset name shared by the legacy and successor tokens
    pub asset_name: AssetName,
    pub state_token_name: AssetName,
    pub migration_script_hash: ScriptHash,
    pub vault_address: Address,
    pub spend_script_ref: InputRef,
    pub mint_script_ref: InputRef,
}

impl ProtocolConfig {
    /// The production deployment
    pub fn mainnet() -> MigrationResult<Self> {
        Ok(Self {
            network: Network::Mainnet,
            legacy_policy: PolicyId::from_hex(mainnet::LEGACY_POLICY_ID)?,
            successor_policy: PolicyId::from_hex(mainnet::SUCCESSOR_POLICY_ID)?,
            asset_name: AssetName::from_hex(mainnet::ASSET_NAME)?,
            state_token_name: AssetName::from_hex(mainnet::STATE_TOKEN_NAME)?,
            migration_script_hash: ScriptHash::from_hex(mainnet::MIGRATION_SCRIPT_HASH)?,
            vault_address: Address::from_bech32(mainnet::VAULT_ADDRESS)?,
            spend_script_ref: InputRef::new(
                TxId::from_hex(mainnet::SPEND_SCRIPT_REF_TX)?,
                mainnet::SPEND_SCRIPT_REF_INDEX,
            ),
            mint_script_ref: InputRef::new(
                TxId::from_hex(mainnet::MINT_SCRIPT_REF_TX)?,
                mainnet::MINT_SCRIPT_REF_INDEX,
            ),
        })
    }

    /// The one-of-one marker asset that tags the vault's current UTxO
    pub fn state_token(&self) -> TokenId {
        TokenId::new(self.migration_script_hash, self.state_token_name.clone())
    }

    pub fn legacy_token(&self) -> TokenId {
        TokenId::new(self.legacy_policy, self.asset_name.clone())
    }

    pub fn successor_token(&self) -> TokenId {
        TokenId::new(self.successor_policy, self.asset_name.clone())
    }

    /// Reward account whose zero-value withdrawal triggers the guard script
    pub fn reward_account(&self) -> RewardAccount {
        RewardAccount::from_script_hash(self.migration_script_hash, self.network)
    }
}
