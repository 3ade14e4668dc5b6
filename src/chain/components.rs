//! Shared transaction components
//!
//! The three chain formats reuse one feature-extension vocabulary for value
//! transfer: transferable inputs and outputs, output owners, and the common
//! base transaction body. Each component carries its own wire type id, so a
//! strict decoder can reject a body whose components disagree with the
//! container transaction.

use crate::codec::packer::{CodecError, Packer, Unpacker};
use crate::core::ids::{Address, Id, NodeId};

// =============================================================================
// Wire type ids shared across chains
// =============================================================================

/// Fund-spending input backed by signature indices
pub const TRANSFER_INPUT_TYPE_ID: u32 = 0x05;
/// Plain value output with owners
pub const TRANSFER_OUTPUT_TYPE_ID: u32 = 0x07;
/// Signature index list referencing a subnet's control keys
pub const SUBNET_AUTH_TYPE_ID: u32 = 0x0a;
/// Standalone owner set (threshold plus addresses)
pub const OUTPUT_OWNERS_TYPE_ID: u32 = 0x0b;

// =============================================================================
// Output owners
// =============================================================================

/// A threshold owner set: `threshold` of `addresses` must sign
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutputOwners {
    pub locktime: u64,
    pub threshold: u32,
    pub addresses: Vec<Address>,
}

impl OutputOwners {
    pub fn new(threshold: u32, addresses: Vec<Address>) -> Self {
        OutputOwners {
            locktime: 0,
            threshold,
            addresses,
        }
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(OUTPUT_OWNERS_TYPE_ID);
        self.pack_fields(packer);
    }

    /// Pack without the leading type id, for contexts that already carry one
    pub fn pack_fields(&self, packer: &mut Packer) {
        packer.pack_u64(self.locktime);
        packer.pack_u32(self.threshold);
        packer.pack_u32(self.addresses.len() as u32);
        for addr in &self.addresses {
            packer.pack_address(addr);
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        if type_id != OUTPUT_OWNERS_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        Self::unpack_fields(unpacker)
    }

    pub fn unpack_fields(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let locktime = unpacker.unpack_u64()?;
        let threshold = unpacker.unpack_u32()?;
        let count = unpacker.unpack_list_len(20)?;
        let mut addresses = Vec::with_capacity(count);
        for _ in 0..count {
            addresses.push(unpacker.unpack_address()?);
        }
        Ok(OutputOwners {
            locktime,
            threshold,
            addresses,
        })
    }
}

// =============================================================================
// Transferable outputs
// =============================================================================

/// Value plus the owner set that can spend it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutput {
    pub amount: u64,
    pub owners: OutputOwners,
}

/// An output bound to the asset it denominates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableOutput {
    pub asset_id: Id,
    pub output: TransferOutput,
}

impl TransferableOutput {
    /// Smallest possible encoding: asset id, type id, amount, locktime,
    /// threshold, empty address list
    pub const MIN_WIRE_LEN: usize = 32 + 4 + 8 + 8 + 4 + 4;

    pub fn new(asset_id: Id, amount: u64, owners: OutputOwners) -> Self {
        TransferableOutput {
            asset_id,
            output: TransferOutput { amount, owners },
        }
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_id(&self.asset_id);
        packer.pack_u32(TRANSFER_OUTPUT_TYPE_ID);
        packer.pack_u64(self.output.amount);
        self.output.owners.pack_fields(packer);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let asset_id = unpacker.unpack_id()?;
        let type_id = unpacker.unpack_u32()?;
        if type_id != TRANSFER_OUTPUT_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        let amount = unpacker.unpack_u64()?;
        let owners = OutputOwners::unpack_fields(unpacker)?;
        Ok(TransferableOutput {
            asset_id,
            output: TransferOutput { amount, owners },
        })
    }
}

// =============================================================================
// Transferable inputs
// =============================================================================

/// Pointer to the UTXO being spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtxoId {
    pub tx_id: Id,
    pub output_index: u32,
}

/// Spend of one UTXO, authorized by signature indices into its owner set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableInput {
    pub utxo_id: UtxoId,
    pub asset_id: Id,
    pub amount: u64,
    /// Positions in the UTXO's address list whose keys must sign. The
    /// matching credential carries one signature slot per entry, in order.
    pub sig_indices: Vec<u32>,
}

impl TransferableInput {
    /// Smallest possible encoding: utxo id, asset id, type id, amount,
    /// empty signature index list
    pub const MIN_WIRE_LEN: usize = 32 + 4 + 32 + 4 + 8 + 4;

    pub fn new(tx_id: Id, output_index: u32, asset_id: Id, amount: u64, sig_indices: Vec<u32>) -> Self {
        TransferableInput {
            utxo_id: UtxoId { tx_id, output_index },
            asset_id,
            amount,
            sig_indices,
        }
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_id(&self.utxo_id.tx_id);
        packer.pack_u32(self.utxo_id.output_index);
        packer.pack_id(&self.asset_id);
        packer.pack_u32(TRANSFER_INPUT_TYPE_ID);
        packer.pack_u64(self.amount);
        packer.pack_u32(self.sig_indices.len() as u32);
        for idx in &self.sig_indices {
            packer.pack_u32(*idx);
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let tx_id = unpacker.unpack_id()?;
        let output_index = unpacker.unpack_u32()?;
        let asset_id = unpacker.unpack_id()?;
        let type_id = unpacker.unpack_u32()?;
        if type_id != TRANSFER_INPUT_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        let amount = unpacker.unpack_u64()?;
        let count = unpacker.unpack_list_len(4)?;
        let mut sig_indices = Vec::with_capacity(count);
        for _ in 0..count {
            sig_indices.push(unpacker.unpack_u32()?);
        }
        Ok(TransferableInput {
            utxo_id: UtxoId { tx_id, output_index },
            asset_id,
            amount,
            sig_indices,
        })
    }
}

// =============================================================================
// Base transaction body
// =============================================================================

/// Fields common to every value-moving transaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: Id,
    pub outputs: Vec<TransferableOutput>,
    pub inputs: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl BaseTx {
    pub fn new(network_id: u32, blockchain_id: Id) -> Self {
        BaseTx {
            network_id,
            blockchain_id,
            ..Default::default()
        }
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(self.network_id);
        packer.pack_id(&self.blockchain_id);
        packer.pack_u32(self.outputs.len() as u32);
        for out in &self.outputs {
            out.pack(packer);
        }
        packer.pack_u32(self.inputs.len() as u32);
        for input in &self.inputs {
            input.pack(packer);
        }
        packer.pack_byte_list(&self.memo);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let network_id = unpacker.unpack_u32()?;
        let blockchain_id = unpacker.unpack_id()?;
        let out_count = unpacker.unpack_list_len(TransferableOutput::MIN_WIRE_LEN)?;
        let mut outputs = Vec::with_capacity(out_count);
        for _ in 0..out_count {
            outputs.push(TransferableOutput::unpack(unpacker)?);
        }
        let in_count = unpacker.unpack_list_len(TransferableInput::MIN_WIRE_LEN)?;
        let mut inputs = Vec::with_capacity(in_count);
        for _ in 0..in_count {
            inputs.push(TransferableInput::unpack(unpacker)?);
        }
        let memo = unpacker.unpack_byte_list()?.to_vec();
        Ok(BaseTx {
            network_id,
            blockchain_id,
            outputs,
            inputs,
            memo,
        })
    }
}

// =============================================================================
// Subnet auth
// =============================================================================

/// Reference into a subnet's control key list
///
/// Each entry names the position of a control key whose signature must
/// appear, in the same order, in the transaction's trailing credential.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubnetAuth {
    pub sig_indices: Vec<u32>,
}

impl SubnetAuth {
    pub fn new(sig_indices: Vec<u32>) -> Self {
        SubnetAuth { sig_indices }
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(SUBNET_AUTH_TYPE_ID);
        packer.pack_u32(self.sig_indices.len() as u32);
        for idx in &self.sig_indices {
            packer.pack_u32(*idx);
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        if type_id != SUBNET_AUTH_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        let count = unpacker.unpack_list_len(4)?;
        let mut sig_indices = Vec::with_capacity(count);
        for _ in 0..count {
            sig_indices.push(unpacker.unpack_u32()?);
        }
        Ok(SubnetAuth { sig_indices })
    }
}

// =============================================================================
// Validator
// =============================================================================

/// A staking period for one node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validator {
    pub node_id: NodeId,
    pub start_time: u64,
    pub end_time: u64,
    pub weight: u64,
}

impl Validator {
    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_node_id(&self.node_id);
        packer.pack_u64(self.start_time);
        packer.pack_u64(self.end_time);
        packer.pack_u64(self.weight);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Validator {
            node_id: unpacker.unpack_node_id()?,
            start_time: unpacker.unpack_u64()?,
            end_time: unpacker.unpack_u64()?,
            weight: unpacker.unpack_u64()?,
        })
    }
}
