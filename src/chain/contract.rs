//! Contract chain atomic transactions
//!
//! Only cross-chain movement is visible at this layer: an import spends
//! transferable inputs exported by another chain and credits account-style
//! outputs; an export debits accounts by nonce and produces transferable
//! outputs. There is no base body, so network and blockchain ids appear
//! directly in each variant.

use crate::chain::components::{TransferableInput, TransferableOutput};
use crate::codec::packer::{CodecError, Packer, Unpacker, CODEC_VERSION};
use crate::core::ids::{Address, Id};

pub const CONTRACT_IMPORT_TX_ID: u32 = 0x00;
pub const CONTRACT_EXPORT_TX_ID: u32 = 0x01;

// =============================================================================
// Account-side values
// =============================================================================

/// Credit to an account: address, amount, asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmOutput {
    pub address: Address,
    pub amount: u64,
    pub asset_id: Id,
}

impl EvmOutput {
    pub const WIRE_LEN: usize = 20 + 8 + 32;

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_address(&self.address);
        packer.pack_u64(self.amount);
        packer.pack_id(&self.asset_id);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(EvmOutput {
            address: unpacker.unpack_address()?,
            amount: unpacker.unpack_u64()?,
            asset_id: unpacker.unpack_id()?,
        })
    }
}

/// Debit from an account, replay-protected by the account nonce. Each
/// input is answered by a single-signature credential from that account's
/// key, so there is no signature index list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmInput {
    pub address: Address,
    pub amount: u64,
    pub asset_id: Id,
    pub nonce: u64,
}

impl EvmInput {
    pub const WIRE_LEN: usize = 20 + 8 + 32 + 8;

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_address(&self.address);
        packer.pack_u64(self.amount);
        packer.pack_id(&self.asset_id);
        packer.pack_u64(self.nonce);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(EvmInput {
            address: unpacker.unpack_address()?,
            amount: unpacker.unpack_u64()?,
            asset_id: unpacker.unpack_id()?,
            nonce: unpacker.unpack_u64()?,
        })
    }
}

// =============================================================================
// Transaction variants
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractImportTx {
    pub network_id: u32,
    pub blockchain_id: Id,
    pub source_chain: Id,
    pub imported_inputs: Vec<TransferableInput>,
    pub outputs: Vec<EvmOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractExportTx {
    pub network_id: u32,
    pub blockchain_id: Id,
    pub destination_chain: Id,
    pub inputs: Vec<EvmInput>,
    pub exported_outputs: Vec<TransferableOutput>,
}

/// Any contract chain transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractTx {
    Import(ContractImportTx),
    Export(ContractExportTx),
}

impl ContractTx {
    pub fn type_id(&self) -> u32 {
        match self {
            ContractTx::Import(_) => CONTRACT_IMPORT_TX_ID,
            ContractTx::Export(_) => CONTRACT_EXPORT_TX_ID,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ContractTx::Import(_) => "contract_import",
            ContractTx::Export(_) => "contract_export",
        }
    }

    pub fn network_id(&self) -> u32 {
        match self {
            ContractTx::Import(tx) => tx.network_id,
            ContractTx::Export(tx) => tx.network_id,
        }
    }

    /// Signature slot counts, one per credential in wire order. Account
    /// debits always take exactly one signature.
    pub fn funding_sig_counts(&self) -> Vec<usize> {
        match self {
            ContractTx::Import(tx) => tx
                .imported_inputs
                .iter()
                .map(|i| i.sig_indices.len())
                .collect(),
            ContractTx::Export(tx) => vec![1; tx.inputs.len()],
        }
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    pub fn pack_unsigned(&self) -> Result<Vec<u8>, CodecError> {
        let mut packer = Packer::new();
        packer.pack_u16(CODEC_VERSION);
        packer.pack_u32(self.type_id());
        self.pack_body(&mut packer)?;
        Ok(packer.take())
    }

    pub fn pack_body(&self, packer: &mut Packer) -> Result<(), CodecError> {
        match self {
            ContractTx::Import(tx) => {
                packer.pack_u32(tx.network_id);
                packer.pack_id(&tx.blockchain_id);
                packer.pack_id(&tx.source_chain);
                packer.pack_u32(tx.imported_inputs.len() as u32);
                for input in &tx.imported_inputs {
                    input.pack(packer);
                }
                packer.pack_u32(tx.outputs.len() as u32);
                for out in &tx.outputs {
                    out.pack(packer);
                }
            }
            ContractTx::Export(tx) => {
                packer.pack_u32(tx.network_id);
                packer.pack_id(&tx.blockchain_id);
                packer.pack_id(&tx.destination_chain);
                packer.pack_u32(tx.inputs.len() as u32);
                for input in &tx.inputs {
                    input.pack(packer);
                }
                packer.pack_u32(tx.exported_outputs.len() as u32);
                for out in &tx.exported_outputs {
                    out.pack(packer);
                }
            }
        }
        Ok(())
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = unpacker.unpack_u16()?;
        if version != CODEC_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        let type_id = unpacker.unpack_u32()?;
        Self::unpack_body(type_id, unpacker)
    }

    pub fn unpack_body(type_id: u32, u: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        match type_id {
            CONTRACT_IMPORT_TX_ID => {
                let network_id = u.unpack_u32()?;
                let blockchain_id = u.unpack_id()?;
                let source_chain = u.unpack_id()?;
                let in_count = u.unpack_list_len(TransferableInput::MIN_WIRE_LEN)?;
                let mut imported_inputs = Vec::with_capacity(in_count);
                for _ in 0..in_count {
                    imported_inputs.push(TransferableInput::unpack(u)?);
                }
                let out_count = u.unpack_list_len(EvmOutput::WIRE_LEN)?;
                let mut outputs = Vec::with_capacity(out_count);
                for _ in 0..out_count {
                    outputs.push(EvmOutput::unpack(u)?);
                }
                Ok(ContractTx::Import(ContractImportTx {
                    network_id,
                    blockchain_id,
                    source_chain,
                    imported_inputs,
                    outputs,
                }))
            }
            CONTRACT_EXPORT_TX_ID => {
                let network_id = u.unpack_u32()?;
                let blockchain_id = u.unpack_id()?;
                let destination_chain = u.unpack_id()?;
                let in_count = u.unpack_list_len(EvmInput::WIRE_LEN)?;
                let mut inputs = Vec::with_capacity(in_count);
                for _ in 0..in_count {
                    inputs.push(EvmInput::unpack(u)?);
                }
                let out_count = u.unpack_list_len(TransferableOutput::MIN_WIRE_LEN)?;
                let mut exported_outputs = Vec::with_capacity(out_count);
                for _ in 0..out_count {
                    exported_outputs.push(TransferableOutput::unpack(u)?);
                }
                Ok(ContractTx::Export(ContractExportTx {
                    network_id,
                    blockchain_id,
                    destination_chain,
                    inputs,
                    exported_outputs,
                }))
            }
            other => Err(CodecError::UnknownTypeId(other)),
        }
    }
}
