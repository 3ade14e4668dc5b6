//! Asset chain transactions
//!
//! The asset chain shares the transferable input and output vocabulary with
//! the platform chain but registers its own transaction type ids, starting
//! at zero. Asset issuance adds typed initial-state outputs and mint
//! operations on top of the common base body.

use crate::chain::components::{
    BaseTx, OutputOwners, TransferOutput, TransferableInput, TransferableOutput, UtxoId,
    TRANSFER_OUTPUT_TYPE_ID,
};
use crate::codec::packer::{CodecError, Packer, Unpacker, CODEC_VERSION};
use crate::core::ids::Id;

// =============================================================================
// Wire type ids
// =============================================================================

pub const ASSET_BASE_TX_ID: u32 = 0x00;
pub const CREATE_ASSET_TX_ID: u32 = 0x01;
pub const OPERATION_TX_ID: u32 = 0x02;
pub const ASSET_IMPORT_TX_ID: u32 = 0x03;
pub const ASSET_EXPORT_TX_ID: u32 = 0x04;

/// Output that grants the right to mint more of an asset
pub const MINT_OUTPUT_TYPE_ID: u32 = 0x06;
/// Operation that consumes a mint output and issues new units
pub const MINT_OPERATION_TYPE_ID: u32 = 0x08;

// =============================================================================
// Asset issuance components
// =============================================================================

/// A typed output inside an asset's initial state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutput {
    Transfer(TransferOutput),
    Mint(OutputOwners),
}

impl AssetOutput {
    /// Smallest encoding: type id plus an empty mint owner set
    pub const MIN_WIRE_LEN: usize = 4 + 8 + 4 + 4;

    pub fn pack(&self, packer: &mut Packer) {
        match self {
            AssetOutput::Transfer(out) => {
                packer.pack_u32(TRANSFER_OUTPUT_TYPE_ID);
                packer.pack_u64(out.amount);
                out.owners.pack_fields(packer);
            }
            AssetOutput::Mint(owners) => {
                packer.pack_u32(MINT_OUTPUT_TYPE_ID);
                owners.pack_fields(packer);
            }
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        match type_id {
            TRANSFER_OUTPUT_TYPE_ID => {
                let amount = unpacker.unpack_u64()?;
                let owners = OutputOwners::unpack_fields(unpacker)?;
                Ok(AssetOutput::Transfer(TransferOutput { amount, owners }))
            }
            MINT_OUTPUT_TYPE_ID => Ok(AssetOutput::Mint(OutputOwners::unpack_fields(unpacker)?)),
            other => Err(CodecError::UnknownTypeId(other)),
        }
    }
}

/// Outputs registered under one feature extension at asset creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialState {
    pub fx_index: u32,
    pub outputs: Vec<AssetOutput>,
}

impl InitialState {
    pub const MIN_WIRE_LEN: usize = 4 + 4;

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(self.fx_index);
        packer.pack_u32(self.outputs.len() as u32);
        for out in &self.outputs {
            out.pack(packer);
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let fx_index = unpacker.unpack_u32()?;
        let count = unpacker.unpack_list_len(AssetOutput::MIN_WIRE_LEN)?;
        let mut outputs = Vec::with_capacity(count);
        for _ in 0..count {
            outputs.push(AssetOutput::unpack(unpacker)?);
        }
        Ok(InitialState { fx_index, outputs })
    }
}

/// Mints new units: spends the mint output named by the operation's UTXOs,
/// recreates a mint output, and issues a transfer output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOperation {
    /// Positions in the consumed mint output's address list that sign.
    /// The operation's credential carries one slot per entry.
    pub sig_indices: Vec<u32>,
    pub mint_owners: OutputOwners,
    pub transfer_output: TransferOutput,
}

impl MintOperation {
    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(MINT_OPERATION_TYPE_ID);
        packer.pack_u32(self.sig_indices.len() as u32);
        for idx in &self.sig_indices {
            packer.pack_u32(*idx);
        }
        self.mint_owners.pack_fields(packer);
        packer.pack_u64(self.transfer_output.amount);
        self.transfer_output.owners.pack_fields(packer);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        if type_id != MINT_OPERATION_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        let count = unpacker.unpack_list_len(4)?;
        let mut sig_indices = Vec::with_capacity(count);
        for _ in 0..count {
            sig_indices.push(unpacker.unpack_u32()?);
        }
        let mint_owners = OutputOwners::unpack_fields(unpacker)?;
        let amount = unpacker.unpack_u64()?;
        let owners = OutputOwners::unpack_fields(unpacker)?;
        Ok(MintOperation {
            sig_indices,
            mint_owners,
            transfer_output: TransferOutput { amount, owners },
        })
    }
}

/// An operation applied to UTXOs of one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferableOp {
    pub asset_id: Id,
    pub utxo_ids: Vec<UtxoId>,
    pub op: MintOperation,
}

impl TransferableOp {
    /// Smallest encoding: asset id, empty utxo list, minimal mint operation
    pub const MIN_WIRE_LEN: usize = 32 + 4 + 4 + 4 + 16 + 24;

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_id(&self.asset_id);
        packer.pack_u32(self.utxo_ids.len() as u32);
        for utxo in &self.utxo_ids {
            packer.pack_id(&utxo.tx_id);
            packer.pack_u32(utxo.output_index);
        }
        self.op.pack(packer);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let asset_id = unpacker.unpack_id()?;
        let count = unpacker.unpack_list_len(36)?;
        let mut utxo_ids = Vec::with_capacity(count);
        for _ in 0..count {
            utxo_ids.push(UtxoId {
                tx_id: unpacker.unpack_id()?,
                output_index: unpacker.unpack_u32()?,
            });
        }
        let op = MintOperation::unpack(unpacker)?;
        Ok(TransferableOp {
            asset_id,
            utxo_ids,
            op,
        })
    }
}

// =============================================================================
// Transaction variants
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAssetTx {
    pub base: BaseTx,
    pub name: String,
    pub symbol: String,
    pub denomination: u8,
    pub initial_states: Vec<InitialState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTx {
    pub base: BaseTx,
    pub ops: Vec<TransferableOp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetImportTx {
    pub base: BaseTx,
    pub source_chain: Id,
    pub imported_inputs: Vec<TransferableInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetExportTx {
    pub base: BaseTx,
    pub destination_chain: Id,
    pub exported_outputs: Vec<TransferableOutput>,
}

/// Any asset chain transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetTx {
    Base(BaseTx),
    CreateAsset(CreateAssetTx),
    Operation(OperationTx),
    Import(AssetImportTx),
    Export(AssetExportTx),
}

impl AssetTx {
    pub fn type_id(&self) -> u32 {
        match self {
            AssetTx::Base(_) => ASSET_BASE_TX_ID,
            AssetTx::CreateAsset(_) => CREATE_ASSET_TX_ID,
            AssetTx::Operation(_) => OPERATION_TX_ID,
            AssetTx::Import(_) => ASSET_IMPORT_TX_ID,
            AssetTx::Export(_) => ASSET_EXPORT_TX_ID,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AssetTx::Base(_) => "asset_base",
            AssetTx::CreateAsset(_) => "create_asset",
            AssetTx::Operation(_) => "asset_operation",
            AssetTx::Import(_) => "asset_import",
            AssetTx::Export(_) => "asset_export",
        }
    }

    pub fn base(&self) -> &BaseTx {
        match self {
            AssetTx::Base(tx) => tx,
            AssetTx::CreateAsset(tx) => &tx.base,
            AssetTx::Operation(tx) => &tx.base,
            AssetTx::Import(tx) => &tx.base,
            AssetTx::Export(tx) => &tx.base,
        }
    }

    pub fn network_id(&self) -> u32 {
        self.base().network_id
    }

    /// Signature slot counts, one per credential in wire order: base
    /// inputs, then imported inputs or operations where present
    pub fn funding_sig_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self
            .base()
            .inputs
            .iter()
            .map(|i| i.sig_indices.len())
            .collect();
        match self {
            AssetTx::Import(tx) => {
                counts.extend(tx.imported_inputs.iter().map(|i| i.sig_indices.len()));
            }
            AssetTx::Operation(tx) => {
                counts.extend(tx.ops.iter().map(|op| op.op.sig_indices.len()));
            }
            AssetTx::Base(_) => {}
            AssetTx::CreateAsset(_) => {}
            AssetTx::Export(_) => {}
        }
        counts
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
            AssetTx::Base(tx) => tx.pack(packer),
            AssetTx::CreateAsset(tx) => {
                tx.base.pack(packer);
                packer.pack_str(&tx.name)?;
                packer.pack_str(&tx.symbol)?;
                packer.pack_u8(tx.denomination);
                packer.pack_u32(tx.initial_states.len() as u32);
                for state in &tx.initial_states {
                    state.pack(packer);
                }
            }
            AssetTx::Operation(tx) => {
                tx.base.pack(packer);
                packer.pack_u32(tx.ops.len() as u32);
                for op in &tx.ops {
                    op.pack(packer);
                }
            }
            AssetTx::Import(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.source_chain);
                packer.pack_u32(tx.imported_inputs.len() as u32);
                for input in &tx.imported_inputs {
                    input.pack(packer);
                }
            }
            AssetTx::Export(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.destination_chain);
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
            ASSET_BASE_TX_ID => Ok(AssetTx::Base(BaseTx::unpack(u)?)),
            CREATE_ASSET_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let name = u.unpack_str()?;
                let symbol = u.unpack_str()?;
                let denomination = u.unpack_u8()?;
                let count = u.unpack_list_len(InitialState::MIN_WIRE_LEN)?;
                let mut initial_states = Vec::with_capacity(count);
                for _ in 0..count {
                    initial_states.push(InitialState::unpack(u)?);
                }
                Ok(AssetTx::CreateAsset(CreateAssetTx {
                    base,
                    name,
                    symbol,
                    denomination,
                    initial_states,
                }))
            }
            OPERATION_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let count = u.unpack_list_len(TransferableOp::MIN_WIRE_LEN)?;
                let mut ops = Vec::with_capacity(count);
                for _ in 0..count {
                    ops.push(TransferableOp::unpack(u)?);
                }
                Ok(AssetTx::Operation(OperationTx { base, ops }))
            }
            ASSET_IMPORT_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let source_chain = u.unpack_id()?;
                let count = u.unpack_list_len(TransferableInput::MIN_WIRE_LEN)?;
                let mut imported_inputs = Vec::with_capacity(count);
                for _ in 0..count {
                    imported_inputs.push(TransferableInput::unpack(u)?);
                }
                Ok(AssetTx::Import(AssetImportTx {
                    base,
                    source_chain,
                    imported_inputs,
                }))
            }
            ASSET_EXPORT_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let destination_chain = u.unpack_id()?;
                let count = u.unpack_list_len(TransferableOutput::MIN_WIRE_LEN)?;
                let mut exported_outputs = Vec::with_capacity(count);
                for _ in 0..count {
                    exported_outputs.push(TransferableOutput::unpack(u)?);
                }
                Ok(AssetTx::Export(AssetExportTx {
                    base,
                    destination_chain,
                    exported_outputs,
                }))
            }
            other => Err(CodecError::UnknownTypeId(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::Address;

    fn sample_base() -> BaseTx {
        let mut base = BaseTx::new(1, Id::from_slice(&[0x21; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[0x22; 32]),
            0,
            Id::from_slice(&[0x23; 32]),
            5_000,
            vec![0, 1],
        ));
        base
    }

    fn round_trip(tx: AssetTx) {
        let bytes = tx.pack_unsigned().unwrap();
        let mut u = Unpacker::new(&bytes);
        let back = AssetTx::unpack(&mut u).unwrap();
        u.expect_done().unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_base_round_trip() {
        round_trip(AssetTx::Base(sample_base()));
    }

    #[test]
    fn test_create_asset_round_trip() {
        round_trip(AssetTx::CreateAsset(CreateAssetTx {
            base: sample_base(),
            name: "Wrapped Token".to_string(),
            symbol: "WTK".to_string(),
            denomination: 9,
            initial_states: vec![InitialState {
                fx_index: 0,
                outputs: vec![
                    AssetOutput::Transfer(TransferOutput {
                        amount: 1_000_000,
                        owners: OutputOwners::new(1, vec![Address::from_slice(&[1; 20])]),
                    }),
                    AssetOutput::Mint(OutputOwners::new(2, vec![
                        Address::from_slice(&[2; 20]),
                        Address::from_slice(&[3; 20]),
                    ])),
                ],
            }],
        }));
    }

    #[test]
    fn test_operation_adds_op_credentials() {
        let tx = AssetTx::Operation(OperationTx {
            base: sample_base(),
            ops: vec![TransferableOp {
                asset_id: Id::from_slice(&[0x24; 32]),
                utxo_ids: vec![UtxoId {
                    tx_id: Id::from_slice(&[0x25; 32]),
                    output_index: 2,
                }],
                op: MintOperation {
                    sig_indices: vec![0],
                    mint_owners: OutputOwners::new(1, vec![Address::from_slice(&[4; 20])]),
                    transfer_output: TransferOutput {
                        amount: 500,
                        owners: OutputOwners::new(1, vec![Address::from_slice(&[5; 20])]),
                    },
                },
            }],
        });
        round_trip(tx.clone());
        // Base input wants two signatures, the mint op wants one
        assert_eq!(tx.funding_sig_counts(), vec![2, 1]);
    }

    #[test]
    fn test_import_export_round_trip() {
        round_trip(AssetTx::Import(AssetImportTx {
            base: sample_base(),
            source_chain: Id::from_slice(&[0x26; 32]),
            imported_inputs: vec![TransferableInput::new(
                Id::from_slice(&[0x27; 32]),
                1,
                Id::from_slice(&[0x23; 32]),
                250,
                vec![0],
            )],
        }));
        round_trip(AssetTx::Export(AssetExportTx {
            base: sample_base(),
            destination_chain: Id::from_slice(&[0x28; 32]),
            exported_outputs: vec![TransferableOutput::new(
                Id::from_slice(&[0x23; 32]),
                100,
                OutputOwners::new(1, vec![Address::from_slice(&[6; 20])]),
            )],
        }));
    }

    #[test]
    fn test_unknown_initial_state_output_rejected() {
        let mut p = Packer::new();
        p.pack_u32(0x42);
        let bytes = p.take();
        let mut u = Unpacker::new(&bytes);
        assert_eq!(
            AssetOutput::unpack(&mut u),
            Err(CodecError::UnknownTypeId(0x42))
        );
    }
}
