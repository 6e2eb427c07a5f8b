//! Ledger Script Data (Plutus) Encoding
//!
//! Datums and redeemers cross the wire as CBOR with the ledger's
//! constructor-tag convention: constructor indices 0-6 map to CBOR tags
//! 121-127, indices 7-127 to 1280+(i-7), anything larger to the general
//! tag-102 wrapper. This module makes that encoding an explicit sum type
//! with exhaustive matching at both boundaries; unknown tags and CBOR items
//! the scripts never use (text, floats, maps) are rejected instead of
//! coerced.

use ciborium::value::{Integer, Value};

use crate::errors::{MigrationError, MigrationResult};

/// Structured script data as the on-chain validators see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlutusData {
    /// Tagged constructor: variant index plus its fields
    Constr { tag: u64, fields: Vec<PlutusData> },
    /// Arbitrary-precision integer (bounded here by CBOR's 64-bit majors)
    Int(i128),
    /// Raw byte string
    Bytes(Vec<u8>),
    /// Homogeneous-by-convention list
    List(Vec<PlutusData>),
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        Self::Constr { tag, fields }
    }

    pub fn int(i: i128) -> Self {
        Self::Int(i)
    }

    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }

    /// Constructor view, for shape checks at decode sites
    pub fn as_constr(&self) -> Option<(u64, &[PlutusData])> {
        match self {
            Self::Constr { tag, fields } => Some((*tag, fields)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Serializes to the ledger's CBOR form (definite-length throughout)
    pub fn to_bytes(&self) -> MigrationResult<Vec<u8>> {
        let value = self.to_value()?;
        let mut buf = Vec::new();
        ciborium::ser::into_writer(&value, &mut buf).map_err(|e| {
            MigrationError::EncodingError {
                detail: format!("CBOR serialization failed: {e}"),
            }
        })?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> MigrationResult<Self> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| MigrationError::DecodeError {
                detail: format!("not valid CBOR: {e}"),
            })?;
        Self::from_value(&value)
    }

    fn to_value(&self) -> MigrationResult<Value> {
        match self {
            Self::Int(i) => {
                let i = Integer::try_from(*i).map_err(|_| MigrationError::EncodingError {
                    detail: format!("integer {i} exceeds CBOR integer range"),
                })?;
                Ok(Value::Integer(i))
            }
            Self::Bytes(bytes) => Ok(Value::Bytes(bytes.clone())),
            Self::List(items) => {
                let items = items
                    .iter()
                    .map(Self::to_value)
                    .collect::<MigrationResult<Vec<_>>>()?;
                Ok(Value::Array(items))
            }
            Self::Constr { tag, fields } => {
                let fields = fields
                    .iter()
                    .map(Self::to_value)
                    .collect::<MigrationResult<Vec<_>>>()?;
                let value = match compact_cbor_tag(*tag) {
                    Some(cbor_tag) => Value::Tag(cbor_tag, Box::new(Value::Array(fields))),
                    None => Value::Tag(
                        GENERAL_CONSTR_TAG,
                        Box::new(Value::Array(vec![
                            Value::Integer(Integer::from(*tag)),
                            Value::Array(fields),
                        ])),
                    ),
                };
                Ok(value)
            }
        }
    }

    fn from_value(value: &Value) -> MigrationResult<Self> {
        match value {
            Value::Integer(i) => Ok(Self::Int(i128::from(*i))),
            Value::Bytes(bytes) => Ok(Self::Bytes(bytes.clone())),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(Self::from_value)
                    .collect::<MigrationResult<Vec<_>>>()?;
                Ok(Self::List(items))
            }
            Value::Tag(cbor_tag, inner) => {
                let tag = constr_tag(*cbor_tag).ok_or_else(|| MigrationError::DecodeError {
                    detail: format!("unknown CBOR tag {cbor_tag}"),
                })?;
                match (tag, inner.as_ref()) {
                    (ConstrTag::Compact(tag), Value::Array(fields)) => {
                        let fields = fields
                            .iter()
                            .map(Self::from_value)
                            .collect::<MigrationResult<Vec<_>>>()?;
                        Ok(Self::Constr { tag, fields })
                    }
                    (ConstrTag::General, Value::Array(pair)) => match pair.as_slice() {
                        [Value::Integer(tag), Value::Array(fields)] => {
                            let tag = u64::try_from(i128::from(*tag)).map_err(|_| {
                                MigrationError::DecodeError {
                                    detail: "general constructor tag out of range".into(),
                                }
                            })?;
                            let fields = fields
                                .iter()
                                .map(Self::from_value)
                                .collect::<MigrationResult<Vec<_>>>()?;
                            Ok(Self::Constr { tag, fields })
                        }
                        _ => Err(MigrationError::DecodeError {
                            detail: "tag 102 payload must be [tag, fields]".into(),
                        }),
                    },
                    _ => Err(MigrationError::DecodeError {
                        detail: format!("CBOR tag {cbor_tag} payload is not an array"),
                    }),
                }
            }
            other => Err(MigrationError::DecodeError {
                detail: format!("unsupported CBOR item: {other:?}"),
            }),
        }
    }
}

const COMPACT_BASE_LOW: u64 = 121;
const COMPACT_BASE_HIGH: u64 = 1280;
const GENERAL_CONSTR_TAG: u64 = 102;

enum ConstrTag {
    Compact(u64),
    General,
}

/// CBOR tag for constructor indices with a compact form, if one exists
fn compact_cbor_tag(tag: u64) -> Option<u64> {
    match tag {
        0..=6 => Some(COMPACT_BASE_LOW + tag),
        7..=127 => Some(COMPACT_BASE_HIGH + (tag - 7)),
        _ => None,
    }
}

fn constr_tag(cbor_tag: u64) -> Option<ConstrTag> {
    match cbor_tag {
        121..=127 => Some(ConstrTag::Compact(cbor_tag - COMPACT_BASE_LOW)),
        1280..=1400 => Some(ConstrTag::Compact(7 + (cbor_tag - COMPACT_BASE_HIGH))),
        GENERAL_CONSTR_TAG => Some(ConstrTag::General),
        _ => None,
    }
}
