//! Chain identifiers
//!
//! Two widths cover every identifier on the platform: 32-byte [`Id`]s
//! (transactions, blockchains, subnets, assets) and 20-byte [`Address`]es
//! (key-derived accounts, node identifiers). Ids print as hex; addresses
//! use Base58Check, version byte plus a 4-byte double-SHA256 checksum.

use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::crypto::hash::double_sha256;

/// Version byte prepended to addresses before Base58Check encoding
pub const ADDRESS_VERSION: u8 = 0x00;

/// Identifier parsing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("Address checksum mismatch")]
    BadChecksum,
    #[error("Unknown address version byte {0:#04x}")]
    UnknownVersion(u8),
}

// =============================================================================
// Id (32 bytes)
// =============================================================================

/// A 32-byte identifier (transaction, blockchain, subnet, or asset id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Id(pub [u8; 32]);

impl Id {
    /// The all-zero id, used for the primary network's subnet and for
    /// "not yet known" placeholders
    pub const EMPTY: Id = Id([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Id(bytes)
    }

    /// Build an id from up to 32 bytes, zero-padding on the right
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        let n = data.len().min(32);
        bytes[..n].copy_from_slice(&data[..n]);
        Id(bytes)
    }

    /// Parse a 64-character hex string
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        let data = hex::decode(s.trim()).map_err(|e| IdError::InvalidEncoding(e.to_string()))?;
        if data.len() != 32 {
            return Err(IdError::InvalidLength {
                expected: 32,
                got: data.len(),
            });
        }
        Ok(Id::from_slice(&data))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// First four bytes as hex, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Id::from_hex(&s).map_err(D::Error::custom)
    }
}

// =============================================================================
// Address (20 bytes)
// =============================================================================

/// A 20-byte key-derived address
///
/// Text form is Base58Check: version byte, payload, then the first four
/// bytes of a double SHA-256 checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Build an address from up to 20 bytes, zero-padding on the right
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        let n = data.len().min(20);
        bytes[..n].copy_from_slice(&data[..n]);
        Address(bytes)
    }

    /// Parse the Base58Check text form
    pub fn from_base58check(s: &str) -> Result<Self, IdError> {
        let data = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| IdError::InvalidEncoding(e.to_string()))?;
        if data.len() != 25 {
            return Err(IdError::InvalidLength {
                expected: 25,
                got: data.len(),
            });
        }
        let checksum = &double_sha256(&data[..21])[..4];
        if checksum != &data[21..] {
            return Err(IdError::BadChecksum);
        }
        if data[0] != ADDRESS_VERSION {
            return Err(IdError::UnknownVersion(data[0]));
        }
        Ok(Address::from_slice(&data[1..21]))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = vec![ADDRESS_VERSION];
        data.extend_from_slice(&self.0);
        let checksum = double_sha256(&data);
        data.extend_from_slice(&checksum[..4]);
        write!(f, "{}", bs58::encode(data).into_string())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_base58check(&s).map_err(D::Error::custom)
    }
}

/// A 20-byte node identifier, distinct from key-derived addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub [u8; 20]);

impl NodeId {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        NodeId(bytes)
    }

    /// Build a node id from up to 20 bytes, zero-padding on the right
    pub fn from_slice(data: &[u8]) -> Self {
        let mut bytes = [0u8; 20];
        let n = data.len().min(20);
        bytes[..n].copy_from_slice(&data[..n]);
        NodeId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_hex_round_trip() {
        let id = Id::from_slice(&[0xab; 32]);
        let parsed = Id::from_hex(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_from_slice_pads() {
        let id = Id::from_slice(&[1, 2, 3]);
        assert_eq!(id.0[..3], [1, 2, 3]);
        assert!(id.0[3..].iter().all(|b| *b == 0));
        assert!(!id.is_zero());
        assert!(Id::EMPTY.is_zero());
    }

    #[test]
    fn test_id_rejects_wrong_length() {
        assert_eq!(
            Id::from_hex("abcd"),
            Err(IdError::InvalidLength {
                expected: 32,
                got: 2
            })
        );
    }

    #[test]
    fn test_address_round_trip() {
        let addr = Address::from_slice(&[7u8; 20]);
        let text = addr.to_string();
        // Version byte 0x00 produces Bitcoin-style addresses starting with 1
        assert!(text.starts_with('1'));
        assert_eq!(Address::from_base58check(&text).unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_bad_checksum() {
        let addr = Address::from_slice(&[7u8; 20]);
        let mut text = addr.to_string();
        // Flip the last character to another base58 digit
        let last = text.pop().unwrap();
        text.push(if last == '2' { '3' } else { '2' });
        assert!(matches!(
            Address::from_base58check(&text),
            Err(IdError::BadChecksum) | Err(IdError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_address_serde_as_text() {
        let addr = Address::from_slice(&[9u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
