//! Core Types for the Migration Engine
//!
//! Typed wrappers for the ledger's identifiers and quantities. No protocol
//! logic lives here; every wrapper exists so a policy id cannot be confused
//! with a transaction id and an amount can never silently overflow.
//!
//! Text forms follow the ledger's conventions: hashes and asset names are
//! hex, addresses are bech32, amounts are plain integers. The serde
//! representations use those text forms so configuration and snapshot files
//! stay human-readable.

use core::fmt;
use std::collections::BTreeMap;

use bech32::{FromBase32, ToBase32, Variant};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{AmountErrorReason, MigrationError, MigrationResult};

/// Length in bytes of a policy id / script hash
pub const HASH28_LEN: usize = 28;

/// Length in bytes of a transaction id
pub const TXID_LEN: usize = 32;

/// Maximum length in bytes of an asset name
pub const MAX_ASSET_NAME_LEN: usize = 32;

fn malformed(what: &str, detail: impl fmt::Display) -> MigrationError {
    MigrationError::EncodingError {
        detail: format!("malformed {what}: {detail}"),
    }
}

// ============ Hashes ============

/// Identifier of the logic governing a token's mint/burn rules (28-byte hash)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId([u8; HASH28_LEN]);

/// Hash of an on-chain script. Same shape as a policy id; the state token's
/// policy is the migration script hash itself.
pub type ScriptHash = PolicyId;

impl PolicyId {
    pub fn new(bytes: [u8; HASH28_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> MigrationResult<Self> {
        let bytes = hex::decode(s).map_err(|e| malformed("policy id", e))?;
        let bytes: [u8; HASH28_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| malformed("policy id", format!("{} bytes, expected 28", b.len())))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; HASH28_LEN] {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for PolicyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PolicyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Transaction identifier (32-byte hash)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxId([u8; TXID_LEN]);

impl TxId {
    pub fn new(bytes: [u8; TXID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> MigrationResult<Self> {
        let bytes = hex::decode(s).map_err(|e| malformed("transaction id", e))?;
        let bytes: [u8; TXID_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            malformed("transaction id", format!("{} bytes, expected 32", b.len()))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; TXID_LEN] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

// ============ Asset Identification ============

/// Byte-string name of an asset under a policy (up to 32 bytes)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetName(Vec<u8>);

impl AssetName {
    pub fn from_bytes(bytes: Vec<u8>) -> MigrationResult<Self> {
        if bytes.len() > MAX_ASSET_NAME_LEN {
            return Err(malformed(
                "asset name",
                format!("{} bytes, maximum is 32", bytes.len()),
            ));
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(s: &str) -> MigrationResult<Self> {
        let bytes = hex::decode(s).map_err(|e| malformed("asset name", e))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Serialize for AssetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AssetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// Fungible asset class: policy id plus asset name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId {
    pub policy: PolicyId,
    pub name: AssetName,
}

impl TokenId {
    pub fn new(policy: PolicyId, name: AssetName) -> Self {
        Self { policy, name }
    }

    /// Concatenated-hex form the ledger provider understands as a lookup key
    pub fn asset_id(&self) -> String {
        format!("{}{}", self.policy, self.name)
    }

    pub fn from_asset_id(s: &str) -> MigrationResult<Self> {
        if s.len() < 2 * HASH28_LEN {
            return Err(malformed(
                "asset id",
                format!("{} hex chars, expected at least 56", s.len()),
            ));
        }
        let (policy, name) = s.split_at(2 * HASH28_LEN);
        Ok(Self {
            policy: PolicyId::from_hex(policy)?,
            name: AssetName::from_hex(name)?,
        })
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.asset_id())
    }
}

impl Serialize for TokenId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.asset_id())
    }
}

impl<'de> Deserialize<'de> for TokenId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_asset_id(&s).map_err(D::Error::custom)
    }
}

// ============ Amounts ============

/// Non-negative token quantity with checked arithmetic.
///
/// 128 bits gives the cumulative lock counter ample headroom over the
/// ledger's 64-bit per-output quantities. Overflow is a typed error, never
/// a silent wrap, and ledger integers are rejected at this boundary if
/// negative.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(quantity: u128) -> Self {
        Self(quantity)
    }

    pub const fn quantity(&self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> MigrationResult<Amount> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or(MigrationError::AmountError {
                reason: AmountErrorReason::Overflow,
            })
    }

    pub fn checked_sub(self, other: Amount) -> MigrationResult<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(MigrationError::AmountError {
                reason: AmountErrorReason::Underflow,
            })
    }

    /// Converts a signed ledger integer, rejecting negatives
    pub fn from_int(i: i128) -> MigrationResult<Amount> {
        u128::try_from(i)
            .map(Amount)
            .map_err(|_| MigrationError::AmountError {
                reason: AmountErrorReason::Negative,
            })
    }

    /// Signed form for ledger integer encoding
    pub fn as_int(&self) -> MigrationResult<i128> {
        i128::try_from(self.0)
            .map_err(|_| malformed("amount", format!("{} exceeds signed integer range", self.0)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============ Outputs ============

/// Reference to a transaction output: transaction id plus output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InputRef {
    pub tx_id: TxId,
    pub index: u64,
}

impl InputRef {
    pub fn new(tx_id: TxId, index: u64) -> Self {
        Self { tx_id, index }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

/// Network the migration runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

/// Bech32 payment address (held opaque; only the text form travels)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    hrp: String,
    bytes: Vec<u8>,
}

impl Address {
    pub fn from_bech32(s: &str) -> MigrationResult<Self> {
        let (hrp, data, _variant) = bech32::decode(s).map_err(|e| malformed("address", e))?;
        let bytes = Vec::<u8>::from_base32(&data).map_err(|e| malformed("address", e))?;
        if bytes.is_empty() {
            return Err(malformed("address", "empty payload"));
        }
        Ok(Self { hrp, bytes })
    }

    pub fn to_bech32(&self) -> String {
        bech32::encode(&self.hrp, self.bytes.to_base32(), Variant::Bech32)
            .expect("hrp was accepted by bech32::decode at construction")
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_bech32())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(D::Error::custom)
    }
}

/// Stake address with a script credential, used for the zero-value trigger
/// withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAccount {
    pub script_hash: ScriptHash,
    pub network: Network,
}

impl RewardAccount {
    pub fn from_script_hash(script_hash: ScriptHash, network: Network) -> Self {
        Self {
            script_hash,
            network,
        }
    }

    /// Bech32 form: one header byte (script credential) plus the hash
    pub fn to_bech32(&self) -> String {
        let (hrp, header) = match self.network {
            Network::Mainnet => ("stake", 0xf1u8),
            Network::Testnet => ("stake_test", 0xf0u8),
        };
        let mut payload = Vec::with_capacity(1 + HASH28_LEN);
        payload.push(header);
        payload.extend_from_slice(self.script_hash.as_bytes());
        bech32::encode(hrp, payload.to_base32(), Variant::Bech32)
            .expect("hrp is a fixed valid prefix")
    }
}

impl fmt::Display for RewardAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bech32())
    }
}

/// Multiset of assets carried by an output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Value {
    pub lovelace: u64,
    #[serde(default)]
    pub assets: BTreeMap<TokenId, Amount>,
}

impl Value {
    pub fn new(lovelace: u64) -> Self {
        Self {
            lovelace,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_asset(mut self, token: TokenId, amount: Amount) -> Self {
        self.assets.insert(token, amount);
        self
    }

    /// Quantity of one asset class; zero when absent
    pub fn asset(&self, token: &TokenId) -> Amount {
        self.assets.get(token).copied().unwrap_or(Amount::ZERO)
    }
}

/// Raw inline-datum bytes (CBOR), kept verbatim so byte-identity with the
/// chain encoding is checkable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datum(pub Vec<u8>);

impl Serialize for Datum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Datum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Datum).map_err(D::Error::custom)
    }
}

/// Consumable ledger state: created by a prior transaction, spent at most
/// once, replaced by new outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub input: InputRef,
    pub address: Address,
    pub value: Value,
    #[serde(default)]
    pub datum: Option<Datum>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AmountErrorReason;

    #[test]
    fn test_policy_id_roundtrip() {
        let hex_str = "279f842c33eed9054b9e3c70cd6a3b32298259c24b78b895cb41d91a";
        let policy = PolicyId::from_hex(hex_str).unwrap();
        assert_eq!(policy.to_string(), hex_str);
    }

    #[test]
    fn test_policy_id_wrong_length() {
        assert!(PolicyId::from_hex("deadbeef").is_err());
    }

    #[test]
    fn test_asset_id_concat_and_parse() {
        let token = TokenId::new(
            PolicyId::from_hex("279f842c33eed9054b9e3c70cd6a3b32298259c24b78b895cb41d91a")
                .unwrap(),
            AssetName::from_hex("54554e41").unwrap(),
        );
        let id = token.asset_id();
        assert_eq!(
            id,
            "279f842c33eed9054b9e3c70cd6a3b32298259c24b78b895cb41d91a54554e41"
        );
        assert_eq!(TokenId::from_asset_id(&id).unwrap(), token);
    }

    #[test]
    fn test_asset_name_too_long() {
        assert!(AssetName::from_bytes(vec![0u8; 33]).is_err());
    }

    #[test]
    fn test_amount_checked_add_overflow() {
        let err = Amount::new(u128::MAX)
            .checked_add(Amount::new(1))
            .unwrap_err();
        assert_eq!(
            err,
            MigrationError::AmountError {
                reason: AmountErrorReason::Overflow
            }
        );
    }

    #[test]
    fn test_amount_rejects_negative_ledger_integer() {
        let err = Amount::from_int(-1).unwrap_err();
        assert_eq!(
            err,
            MigrationError::AmountError {
                reason: AmountErrorReason::Negative
            }
        );
        assert_eq!(Amount::from_int(42).unwrap(), Amount::new(42));
    }

    #[test]
    fn test_vault_address_roundtrip() {
        let addr = "addr1wye5g0txzw8evz0gddc5lad6x5rs9ttaferkun96gr9wd9sj5y20t";
        let parsed = Address::from_bech32(addr).unwrap();
        assert_eq!(parsed.to_bech32(), addr);
    }

    #[test]
    fn test_reward_account_network_prefix() {
        let hash = PolicyId::from_hex("33443d66138f9609e86b714ff5ba350702ad7d4e476e4cba40cae696")
            .unwrap();
        let mainnet = RewardAccount::from_script_hash(hash, Network::Mainnet);
        assert!(mainnet.to_bech32().starts_with("stake1"));
        let testnet = RewardAccount::from_script_hash(hash, Network::Testnet);
        assert!(testnet.to_bech32().starts_with("stake_test1"));
    }

    #[test]
    fn test_value_asset_lookup_defaults_to_zero() {
        let token = TokenId::new(
            PolicyId::from_hex("c981fc98e761e3bb44ae35e7d97ae6227f684bcb6f50a636753da48e")
                .unwrap(),
            AssetName::from_hex("54554e41").unwrap(),
        );
        let value = Value::new(2_000_000).with_asset(token.clone(), Amount::new(7));
        assert_eq!(value.asset(&token), Amount::new(7));

        let other = TokenId::new(token.policy, AssetName::from_hex("00").unwrap());
        assert_eq!(value.asset(&other), Amount::ZERO);
    }
}
