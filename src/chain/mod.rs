//! Transaction formats for the three chains
//!
//! Each chain registers its own transaction type ids over the same codec,
//! which is why raw bytes carry no chain marker and classification has to
//! be done by trial decoding (see [`crate::codec::detect`]).

pub mod asset;
pub mod components;
pub mod contract;
pub mod platform;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::packer::{CodecError, Unpacker};
use crate::core::ids::Id;
use asset::AssetTx;
use contract::ContractTx;
use platform::PlatformTx;

/// Which chain a blob of transaction bytes belongs to
///
/// `Undefined` is a verdict, not a chain: it means trial decoding could
/// not settle on exactly one format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Platform,
    Asset,
    Contract,
    Undefined,
}

impl ChainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainKind::Platform => "platform",
            ChainKind::Asset => "asset",
            ChainKind::Contract => "contract",
            ChainKind::Undefined => "undefined",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded transaction from any of the three chains
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTx {
    Platform(PlatformTx),
    Asset(AssetTx),
    Contract(ContractTx),
}

impl ChainTx {
    pub fn kind(&self) -> ChainKind {
        match self {
            ChainTx::Platform(_) => ChainKind::Platform,
            ChainTx::Asset(_) => ChainKind::Asset,
            ChainTx::Contract(_) => ChainKind::Contract,
        }
    }

    pub fn type_id(&self) -> u32 {
        match self {
            ChainTx::Platform(tx) => tx.type_id(),
            ChainTx::Asset(tx) => tx.type_id(),
            ChainTx::Contract(tx) => tx.type_id(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ChainTx::Platform(tx) => tx.type_name(),
            ChainTx::Asset(tx) => tx.type_name(),
            ChainTx::Contract(tx) => tx.type_name(),
        }
    }

    pub fn network_id(&self) -> u32 {
        match self {
            ChainTx::Platform(tx) => tx.network_id(),
            ChainTx::Asset(tx) => tx.network_id(),
            ChainTx::Contract(tx) => tx.network_id(),
        }
    }

    pub fn pack_unsigned(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            ChainTx::Platform(tx) => tx.pack_unsigned(),
            ChainTx::Asset(tx) => tx.pack_unsigned(),
            ChainTx::Contract(tx) => tx.pack_unsigned(),
        }
    }

    /// Signature slot counts for the funding credentials, in wire order
    pub fn funding_sig_counts(&self) -> Vec<usize> {
        match self {
            ChainTx::Platform(tx) => tx.funding_sig_counts(),
            ChainTx::Asset(tx) => tx.funding_sig_counts(),
            ChainTx::Contract(tx) => tx.funding_sig_counts(),
        }
    }

    /// Slot count of the trailing authorization credential, only ever
    /// present on platform governance variants
    pub fn auth_sig_count(&self) -> Option<usize> {
        match self {
            ChainTx::Platform(tx) => tx.auth_sig_count(),
            ChainTx::Asset(_) => None,
            ChainTx::Contract(_) => None,
        }
    }

    /// The governed subnet and its auth reference, for platform
    /// governance variants
    pub fn auth_reference(&self) -> Option<(&Id, &components::SubnetAuth)> {
        match self {
            ChainTx::Platform(tx) => tx.auth_reference(),
            ChainTx::Asset(_) => None,
            ChainTx::Contract(_) => None,
        }
    }

    pub fn as_platform(&self) -> Option<&PlatformTx> {
        match self {
            ChainTx::Platform(tx) => Some(tx),
            ChainTx::Asset(_) => None,
            ChainTx::Contract(_) => None,
        }
    }

    /// Decode the unsigned prefix of `kind`'s format, leaving the
    /// unpacker at the credential boundary
    pub fn unpack_as(kind: ChainKind, unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match kind {
            ChainKind::Platform => Ok(ChainTx::Platform(PlatformTx::unpack(unpacker)?)),
            ChainKind::Asset => Ok(ChainTx::Asset(AssetTx::unpack(unpacker)?)),
            ChainKind::Contract => Ok(ChainTx::Contract(ContractTx::unpack(unpacker)?)),
            ChainKind::Undefined => Err(CodecError::InvalidData(
                "no codec is registered for the undefined chain".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::components::BaseTx;

    #[test]
    fn test_chain_kind_strings() {
        assert_eq!(ChainKind::Platform.to_string(), "platform");
        assert_eq!(ChainKind::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_unpack_as_dispatches_by_kind() {
        let tx = ChainTx::Platform(PlatformTx::Base(BaseTx::new(9, Id::from_slice(&[1; 32]))));
        let bytes = tx.pack_unsigned().unwrap();

        let mut u = Unpacker::new(&bytes);
        let back = ChainTx::unpack_as(ChainKind::Platform, &mut u).unwrap();
        assert_eq!(back.kind(), ChainKind::Platform);
        assert_eq!(back.network_id(), 9);

        // The same bytes are not a valid asset transaction: type id 0x22
        // is unregistered there
        let mut u = Unpacker::new(&bytes);
        assert!(ChainTx::unpack_as(ChainKind::Asset, &mut u).is_err());
    }

    #[test]
    fn test_undefined_kind_has_no_codec() {
        let mut u = Unpacker::new(&[]);
        assert!(ChainTx::unpack_as(ChainKind::Undefined, &mut u).is_err());
    }
}
