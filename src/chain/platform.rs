//! Platform chain transactions
//!
//! The platform chain carries validator and subnet governance. Every
//! variant starts with the common [`BaseTx`] funding body; the governance
//! variants additionally carry a subnet id plus a [`SubnetAuth`] whose
//! signatures land in a trailing credential.
//!
//! Accessors here match on every variant by name. Adding a transaction
//! type must not compile until each extraction site has handled it.

use crate::chain::components::{
    BaseTx, OutputOwners, SubnetAuth, TransferableInput, TransferableOutput, Validator,
};
use crate::codec::packer::{CodecError, Packer, Unpacker, CODEC_VERSION};
use crate::core::ids::{Address, Id, NodeId};

// =============================================================================
// Wire type ids
// =============================================================================

pub const ADD_VALIDATOR_TX_ID: u32 = 0x0c;
pub const ADD_SUBNET_VALIDATOR_TX_ID: u32 = 0x0d;
pub const ADD_DELEGATOR_TX_ID: u32 = 0x0e;
pub const CREATE_CHAIN_TX_ID: u32 = 0x0f;
pub const CREATE_SUBNET_TX_ID: u32 = 0x10;
pub const IMPORT_TX_ID: u32 = 0x11;
pub const EXPORT_TX_ID: u32 = 0x12;
pub const REMOVE_SUBNET_VALIDATOR_TX_ID: u32 = 0x17;
pub const TRANSFORM_SUBNET_TX_ID: u32 = 0x18;
pub const ADD_PERMISSIONLESS_VALIDATOR_TX_ID: u32 = 0x19;
pub const ADD_PERMISSIONLESS_DELEGATOR_TX_ID: u32 = 0x1a;
pub const TRANSFER_SUBNET_OWNERSHIP_TX_ID: u32 = 0x21;
pub const BASE_TX_ID: u32 = 0x22;
pub const CONVERT_SUBNET_TO_L1_TX_ID: u32 = 0x23;
pub const REGISTER_L1_VALIDATOR_TX_ID: u32 = 0x24;
pub const SET_L1_VALIDATOR_WEIGHT_TX_ID: u32 = 0x25;
pub const INCREASE_L1_VALIDATOR_BALANCE_TX_ID: u32 = 0x26;
pub const DISABLE_L1_VALIDATOR_TX_ID: u32 = 0x27;

/// Staking signer: absent, or a BLS proof of possession
pub const SIGNER_EMPTY_TYPE_ID: u32 = 0x1b;
pub const SIGNER_PROOF_OF_POSSESSION_TYPE_ID: u32 = 0x1c;

pub const BLS_PUBLIC_KEY_LEN: usize = 48;
pub const BLS_SIGNATURE_LEN: usize = 96;

// =============================================================================
// Auxiliary structures
// =============================================================================

/// BLS key attestation attached to permissionless validators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfPossession {
    pub public_key: [u8; BLS_PUBLIC_KEY_LEN],
    pub signature: [u8; BLS_SIGNATURE_LEN],
}

impl ProofOfPossession {
    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_bytes(&self.public_key);
        packer.pack_bytes(&self.signature);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(ProofOfPossession {
            public_key: unpacker.unpack_array::<BLS_PUBLIC_KEY_LEN>()?,
            signature: unpacker.unpack_array::<BLS_SIGNATURE_LEN>()?,
        })
    }
}

/// Optional staking signer, dispatched by type id on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakingSigner {
    Empty,
    ProofOfPossession(ProofOfPossession),
}

impl StakingSigner {
    pub fn pack(&self, packer: &mut Packer) {
        match self {
            StakingSigner::Empty => packer.pack_u32(SIGNER_EMPTY_TYPE_ID),
            StakingSigner::ProofOfPossession(pop) => {
                packer.pack_u32(SIGNER_PROOF_OF_POSSESSION_TYPE_ID);
                pop.pack(packer);
            }
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        match type_id {
            SIGNER_EMPTY_TYPE_ID => Ok(StakingSigner::Empty),
            SIGNER_PROOF_OF_POSSESSION_TYPE_ID => Ok(StakingSigner::ProofOfPossession(
                ProofOfPossession::unpack(unpacker)?,
            )),
            other => Err(CodecError::UnknownTypeId(other)),
        }
    }
}

/// Bare owner set used by L1 validator records. Unlike [`OutputOwners`]
/// there is no locktime and no wire type id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct L1Owner {
    pub threshold: u32,
    pub addresses: Vec<Address>,
}

impl L1Owner {
    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(self.threshold);
        packer.pack_u32(self.addresses.len() as u32);
        for addr in &self.addresses {
            packer.pack_address(addr);
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let threshold = unpacker.unpack_u32()?;
        let count = unpacker.unpack_list_len(20)?;
        let mut addresses = Vec::with_capacity(count);
        for _ in 0..count {
            addresses.push(unpacker.unpack_address()?);
        }
        Ok(L1Owner {
            threshold,
            addresses,
        })
    }
}

/// Initial validator record carried by a subnet-to-L1 conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L1Validator {
    pub node_id: Vec<u8>,
    pub weight: u64,
    pub balance: u64,
    pub signer: ProofOfPossession,
    pub remaining_balance_owner: L1Owner,
    pub deactivation_owner: L1Owner,
}

impl L1Validator {
    /// Smallest encoding: empty node id, weight, balance, proof of
    /// possession, two empty owner sets
    pub const MIN_WIRE_LEN: usize =
        4 + 8 + 8 + BLS_PUBLIC_KEY_LEN + BLS_SIGNATURE_LEN + 8 + 8;

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_byte_list(&self.node_id);
        packer.pack_u64(self.weight);
        packer.pack_u64(self.balance);
        self.signer.pack(packer);
        self.remaining_balance_owner.pack(packer);
        self.deactivation_owner.pack(packer);
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(L1Validator {
            node_id: unpacker.unpack_byte_list()?.to_vec(),
            weight: unpacker.unpack_u64()?,
            balance: unpacker.unpack_u64()?,
            signer: ProofOfPossession::unpack(unpacker)?,
            remaining_balance_owner: L1Owner::unpack(unpacker)?,
            deactivation_owner: L1Owner::unpack(unpacker)?,
        })
    }
}

// =============================================================================
// Transaction variants
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake_outputs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
    pub delegation_shares: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddSubnetValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: Id,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake_outputs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChainTx {
    pub base: BaseTx,
    pub subnet_id: Id,
    pub chain_name: String,
    pub vm_id: Id,
    pub fx_ids: Vec<Id>,
    pub genesis_data: Vec<u8>,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubnetTx {
    pub base: BaseTx,
    pub owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformImportTx {
    pub base: BaseTx,
    pub source_chain: Id,
    pub imported_inputs: Vec<TransferableInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformExportTx {
    pub base: BaseTx,
    pub destination_chain: Id,
    pub exported_outputs: Vec<TransferableOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveSubnetValidatorTx {
    pub base: BaseTx,
    pub node_id: NodeId,
    pub subnet_id: Id,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformSubnetTx {
    pub base: BaseTx,
    pub subnet_id: Id,
    pub asset_id: Id,
    pub initial_supply: u64,
    pub maximum_supply: u64,
    pub min_consumption_rate: u64,
    pub max_consumption_rate: u64,
    pub min_validator_stake: u64,
    pub max_validator_stake: u64,
    pub min_stake_duration: u32,
    pub max_stake_duration: u32,
    pub min_delegation_fee: u32,
    pub min_delegator_stake: u64,
    pub max_validator_weight_factor: u8,
    pub uptime_requirement: u32,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPermissionlessValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: Id,
    pub signer: StakingSigner,
    pub stake_outputs: Vec<TransferableOutput>,
    pub validator_rewards_owner: OutputOwners,
    pub delegator_rewards_owner: OutputOwners,
    pub delegation_shares: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPermissionlessDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: Id,
    pub stake_outputs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSubnetOwnershipTx {
    pub base: BaseTx,
    pub subnet_id: Id,
    pub subnet_auth: SubnetAuth,
    pub new_owner: OutputOwners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSubnetToL1Tx {
    pub base: BaseTx,
    pub subnet_id: Id,
    pub chain_id: Id,
    pub manager_address: Vec<u8>,
    pub validators: Vec<L1Validator>,
    pub subnet_auth: SubnetAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterL1ValidatorTx {
    pub base: BaseTx,
    pub balance: u64,
    pub proof_of_possession: [u8; BLS_SIGNATURE_LEN],
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetL1ValidatorWeightTx {
    pub base: BaseTx,
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreaseL1ValidatorBalanceTx {
    pub base: BaseTx,
    pub validation_id: Id,
    pub balance: u64,
}

/// Disables an L1 validator. Carries the owning subnet id alongside the
/// validation id so authorization resolves the same way as for the other
/// governance variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableL1ValidatorTx {
    pub base: BaseTx,
    pub subnet_id: Id,
    pub validation_id: Id,
    pub disable_auth: SubnetAuth,
}

// =============================================================================
// PlatformTx
// =============================================================================

/// Any platform chain transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformTx {
    AddValidator(AddValidatorTx),
    AddSubnetValidator(AddSubnetValidatorTx),
    AddDelegator(AddDelegatorTx),
    CreateChain(CreateChainTx),
    CreateSubnet(CreateSubnetTx),
    Import(PlatformImportTx),
    Export(PlatformExportTx),
    RemoveSubnetValidator(RemoveSubnetValidatorTx),
    TransformSubnet(TransformSubnetTx),
    AddPermissionlessValidator(AddPermissionlessValidatorTx),
    AddPermissionlessDelegator(AddPermissionlessDelegatorTx),
    TransferSubnetOwnership(TransferSubnetOwnershipTx),
    Base(BaseTx),
    ConvertSubnetToL1(ConvertSubnetToL1Tx),
    RegisterL1Validator(RegisterL1ValidatorTx),
    SetL1ValidatorWeight(SetL1ValidatorWeightTx),
    IncreaseL1ValidatorBalance(IncreaseL1ValidatorBalanceTx),
    DisableL1Validator(DisableL1ValidatorTx),
}

impl PlatformTx {
    pub fn type_id(&self) -> u32 {
        match self {
            PlatformTx::AddValidator(_) => ADD_VALIDATOR_TX_ID,
            PlatformTx::AddSubnetValidator(_) => ADD_SUBNET_VALIDATOR_TX_ID,
            PlatformTx::AddDelegator(_) => ADD_DELEGATOR_TX_ID,
            PlatformTx::CreateChain(_) => CREATE_CHAIN_TX_ID,
            PlatformTx::CreateSubnet(_) => CREATE_SUBNET_TX_ID,
            PlatformTx::Import(_) => IMPORT_TX_ID,
            PlatformTx::Export(_) => EXPORT_TX_ID,
            PlatformTx::RemoveSubnetValidator(_) => REMOVE_SUBNET_VALIDATOR_TX_ID,
            PlatformTx::TransformSubnet(_) => TRANSFORM_SUBNET_TX_ID,
            PlatformTx::AddPermissionlessValidator(_) => ADD_PERMISSIONLESS_VALIDATOR_TX_ID,
            PlatformTx::AddPermissionlessDelegator(_) => ADD_PERMISSIONLESS_DELEGATOR_TX_ID,
            PlatformTx::TransferSubnetOwnership(_) => TRANSFER_SUBNET_OWNERSHIP_TX_ID,
            PlatformTx::Base(_) => BASE_TX_ID,
            PlatformTx::ConvertSubnetToL1(_) => CONVERT_SUBNET_TO_L1_TX_ID,
            PlatformTx::RegisterL1Validator(_) => REGISTER_L1_VALIDATOR_TX_ID,
            PlatformTx::SetL1ValidatorWeight(_) => SET_L1_VALIDATOR_WEIGHT_TX_ID,
            PlatformTx::IncreaseL1ValidatorBalance(_) => INCREASE_L1_VALIDATOR_BALANCE_TX_ID,
            PlatformTx::DisableL1Validator(_) => DISABLE_L1_VALIDATOR_TX_ID,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            PlatformTx::AddValidator(_) => "add_validator",
            PlatformTx::AddSubnetValidator(_) => "add_subnet_validator",
            PlatformTx::AddDelegator(_) => "add_delegator",
            PlatformTx::CreateChain(_) => "create_chain",
            PlatformTx::CreateSubnet(_) => "create_subnet",
            PlatformTx::Import(_) => "platform_import",
            PlatformTx::Export(_) => "platform_export",
            PlatformTx::RemoveSubnetValidator(_) => "remove_subnet_validator",
            PlatformTx::TransformSubnet(_) => "transform_subnet",
            PlatformTx::AddPermissionlessValidator(_) => "add_permissionless_validator",
            PlatformTx::AddPermissionlessDelegator(_) => "add_permissionless_delegator",
            PlatformTx::TransferSubnetOwnership(_) => "transfer_subnet_ownership",
            PlatformTx::Base(_) => "platform_base",
            PlatformTx::ConvertSubnetToL1(_) => "convert_subnet_to_l1",
            PlatformTx::RegisterL1Validator(_) => "register_l1_validator",
            PlatformTx::SetL1ValidatorWeight(_) => "set_l1_validator_weight",
            PlatformTx::IncreaseL1ValidatorBalance(_) => "increase_l1_validator_balance",
            PlatformTx::DisableL1Validator(_) => "disable_l1_validator",
        }
    }

    pub fn base(&self) -> &BaseTx {
        match self {
            PlatformTx::AddValidator(tx) => &tx.base,
            PlatformTx::AddSubnetValidator(tx) => &tx.base,
            PlatformTx::AddDelegator(tx) => &tx.base,
            PlatformTx::CreateChain(tx) => &tx.base,
            PlatformTx::CreateSubnet(tx) => &tx.base,
            PlatformTx::Import(tx) => &tx.base,
            PlatformTx::Export(tx) => &tx.base,
            PlatformTx::RemoveSubnetValidator(tx) => &tx.base,
            PlatformTx::TransformSubnet(tx) => &tx.base,
            PlatformTx::AddPermissionlessValidator(tx) => &tx.base,
            PlatformTx::AddPermissionlessDelegator(tx) => &tx.base,
            PlatformTx::TransferSubnetOwnership(tx) => &tx.base,
            PlatformTx::Base(tx) => tx,
            PlatformTx::ConvertSubnetToL1(tx) => &tx.base,
            PlatformTx::RegisterL1Validator(tx) => &tx.base,
            PlatformTx::SetL1ValidatorWeight(tx) => &tx.base,
            PlatformTx::IncreaseL1ValidatorBalance(tx) => &tx.base,
            PlatformTx::DisableL1Validator(tx) => &tx.base,
        }
    }

    pub fn network_id(&self) -> u32 {
        self.base().network_id
    }

    /// The subnet id and auth reference for governance variants, None for
    /// everything else
    pub fn auth_reference(&self) -> Option<(&Id, &SubnetAuth)> {
        match self {
            PlatformTx::AddSubnetValidator(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::CreateChain(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::RemoveSubnetValidator(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::TransformSubnet(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::TransferSubnetOwnership(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::ConvertSubnetToL1(tx) => Some((&tx.subnet_id, &tx.subnet_auth)),
            PlatformTx::DisableL1Validator(tx) => Some((&tx.subnet_id, &tx.disable_auth)),
            PlatformTx::AddValidator(_) => None,
            PlatformTx::AddDelegator(_) => None,
            PlatformTx::CreateSubnet(_) => None,
            PlatformTx::Import(_) => None,
            PlatformTx::Export(_) => None,
            PlatformTx::AddPermissionlessValidator(_) => None,
            PlatformTx::AddPermissionlessDelegator(_) => None,
            PlatformTx::Base(_) => None,
            PlatformTx::RegisterL1Validator(_) => None,
            PlatformTx::SetL1ValidatorWeight(_) => None,
            PlatformTx::IncreaseL1ValidatorBalance(_) => None,
        }
    }

    /// Signature slot counts for the funding credentials, one entry per
    /// credential-bearing input in wire order
    pub fn funding_sig_counts(&self) -> Vec<usize> {
        let mut counts: Vec<usize> = self
            .base()
            .inputs
            .iter()
            .map(|i| i.sig_indices.len())
            .collect();
        if let PlatformTx::Import(tx) = self {
            counts.extend(tx.imported_inputs.iter().map(|i| i.sig_indices.len()));
        }
        counts
    }

    /// Slot count of the trailing authorization credential, if this
    /// variant carries one
    pub fn auth_sig_count(&self) -> Option<usize> {
        self.auth_reference().map(|(_, auth)| auth.sig_indices.len())
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    /// Codec version, type id, and body, with no credentials
    pub fn pack_unsigned(&self) -> Result<Vec<u8>, CodecError> {
        let mut packer = Packer::new();
        packer.pack_u16(CODEC_VERSION);
        packer.pack_u32(self.type_id());
        self.pack_body(&mut packer)?;
        Ok(packer.take())
    }

    pub fn pack_body(&self, packer: &mut Packer) -> Result<(), CodecError> {
        match self {
            PlatformTx::AddValidator(tx) => {
                tx.base.pack(packer);
                tx.validator.pack(packer);
                pack_outputs(packer, &tx.stake_outputs);
                tx.rewards_owner.pack(packer);
                packer.pack_u32(tx.delegation_shares);
            }
            PlatformTx::AddSubnetValidator(tx) => {
                tx.base.pack(packer);
                tx.validator.pack(packer);
                packer.pack_id(&tx.subnet_id);
                tx.subnet_auth.pack(packer);
            }
            PlatformTx::AddDelegator(tx) => {
                tx.base.pack(packer);
                tx.validator.pack(packer);
                pack_outputs(packer, &tx.stake_outputs);
                tx.rewards_owner.pack(packer);
            }
            PlatformTx::CreateChain(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.subnet_id);
                packer.pack_str(&tx.chain_name)?;
                packer.pack_id(&tx.vm_id);
                packer.pack_u32(tx.fx_ids.len() as u32);
                for fx in &tx.fx_ids {
                    packer.pack_id(fx);
                }
                packer.pack_byte_list(&tx.genesis_data);
                tx.subnet_auth.pack(packer);
            }
            PlatformTx::CreateSubnet(tx) => {
                tx.base.pack(packer);
                tx.owner.pack(packer);
            }
            PlatformTx::Import(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.source_chain);
                packer.pack_u32(tx.imported_inputs.len() as u32);
                for input in &tx.imported_inputs {
                    input.pack(packer);
                }
            }
            PlatformTx::Export(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.destination_chain);
                pack_outputs(packer, &tx.exported_outputs);
            }
            PlatformTx::RemoveSubnetValidator(tx) => {
                tx.base.pack(packer);
                packer.pack_node_id(&tx.node_id);
                packer.pack_id(&tx.subnet_id);
                tx.subnet_auth.pack(packer);
            }
            PlatformTx::TransformSubnet(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.subnet_id);
                packer.pack_id(&tx.asset_id);
                packer.pack_u64(tx.initial_supply);
                packer.pack_u64(tx.maximum_supply);
                packer.pack_u64(tx.min_consumption_rate);
                packer.pack_u64(tx.max_consumption_rate);
                packer.pack_u64(tx.min_validator_stake);
                packer.pack_u64(tx.max_validator_stake);
                packer.pack_u32(tx.min_stake_duration);
                packer.pack_u32(tx.max_stake_duration);
                packer.pack_u32(tx.min_delegation_fee);
                packer.pack_u64(tx.min_delegator_stake);
                packer.pack_u8(tx.max_validator_weight_factor);
                packer.pack_u32(tx.uptime_requirement);
                tx.subnet_auth.pack(packer);
            }
            PlatformTx::AddPermissionlessValidator(tx) => {
                tx.base.pack(packer);
                tx.validator.pack(packer);
                packer.pack_id(&tx.subnet_id);
                tx.signer.pack(packer);
                pack_outputs(packer, &tx.stake_outputs);
                tx.validator_rewards_owner.pack(packer);
                tx.delegator_rewards_owner.pack(packer);
                packer.pack_u32(tx.delegation_shares);
            }
            PlatformTx::AddPermissionlessDelegator(tx) => {
                tx.base.pack(packer);
                tx.validator.pack(packer);
                packer.pack_id(&tx.subnet_id);
                pack_outputs(packer, &tx.stake_outputs);
                tx.rewards_owner.pack(packer);
            }
            PlatformTx::TransferSubnetOwnership(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.subnet_id);
                tx.subnet_auth.pack(packer);
                tx.new_owner.pack(packer);
            }
            PlatformTx::Base(tx) => {
                tx.pack(packer);
            }
            PlatformTx::ConvertSubnetToL1(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.subnet_id);
                packer.pack_id(&tx.chain_id);
                packer.pack_byte_list(&tx.manager_address);
                packer.pack_u32(tx.validators.len() as u32);
                for validator in &tx.validators {
                    validator.pack(packer);
                }
                tx.subnet_auth.pack(packer);
            }
            PlatformTx::RegisterL1Validator(tx) => {
                tx.base.pack(packer);
                packer.pack_u64(tx.balance);
                packer.pack_bytes(&tx.proof_of_possession);
                packer.pack_byte_list(&tx.message);
            }
            PlatformTx::SetL1ValidatorWeight(tx) => {
                tx.base.pack(packer);
                packer.pack_byte_list(&tx.message);
            }
            PlatformTx::IncreaseL1ValidatorBalance(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.validation_id);
                packer.pack_u64(tx.balance);
            }
            PlatformTx::DisableL1Validator(tx) => {
                tx.base.pack(packer);
                packer.pack_id(&tx.subnet_id);
                packer.pack_id(&tx.validation_id);
                tx.disable_auth.pack(packer);
            }
        }
        Ok(())
    }

    /// Read the codec version, type id, and body. Stops at the credential
    /// boundary so the caller decides whether credentials follow.
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
            ADD_VALIDATOR_TX_ID => Ok(PlatformTx::AddValidator(AddValidatorTx {
                base: BaseTx::unpack(u)?,
                validator: Validator::unpack(u)?,
                stake_outputs: unpack_outputs(u)?,
                rewards_owner: OutputOwners::unpack(u)?,
                delegation_shares: u.unpack_u32()?,
            })),
            ADD_SUBNET_VALIDATOR_TX_ID => Ok(PlatformTx::AddSubnetValidator(AddSubnetValidatorTx {
                base: BaseTx::unpack(u)?,
                validator: Validator::unpack(u)?,
                subnet_id: u.unpack_id()?,
                subnet_auth: SubnetAuth::unpack(u)?,
            })),
            ADD_DELEGATOR_TX_ID => Ok(PlatformTx::AddDelegator(AddDelegatorTx {
                base: BaseTx::unpack(u)?,
                validator: Validator::unpack(u)?,
                stake_outputs: unpack_outputs(u)?,
                rewards_owner: OutputOwners::unpack(u)?,
            })),
            CREATE_CHAIN_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let subnet_id = u.unpack_id()?;
                let chain_name = u.unpack_str()?;
                let vm_id = u.unpack_id()?;
                let fx_count = u.unpack_list_len(32)?;
                let mut fx_ids = Vec::with_capacity(fx_count);
                for _ in 0..fx_count {
                    fx_ids.push(u.unpack_id()?);
                }
                let genesis_data = u.unpack_byte_list()?.to_vec();
                let subnet_auth = SubnetAuth::unpack(u)?;
                Ok(PlatformTx::CreateChain(CreateChainTx {
                    base,
                    subnet_id,
                    chain_name,
                    vm_id,
                    fx_ids,
                    genesis_data,
                    subnet_auth,
                }))
            }
            CREATE_SUBNET_TX_ID => Ok(PlatformTx::CreateSubnet(CreateSubnetTx {
                base: BaseTx::unpack(u)?,
                owner: OutputOwners::unpack(u)?,
            })),
            IMPORT_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let source_chain = u.unpack_id()?;
                let count = u.unpack_list_len(TransferableInput::MIN_WIRE_LEN)?;
                let mut imported_inputs = Vec::with_capacity(count);
                for _ in 0..count {
                    imported_inputs.push(TransferableInput::unpack(u)?);
                }
                Ok(PlatformTx::Import(PlatformImportTx {
                    base,
                    source_chain,
                    imported_inputs,
                }))
            }
            EXPORT_TX_ID => Ok(PlatformTx::Export(PlatformExportTx {
                base: BaseTx::unpack(u)?,
                destination_chain: u.unpack_id()?,
                exported_outputs: unpack_outputs(u)?,
            })),
            REMOVE_SUBNET_VALIDATOR_TX_ID => {
                Ok(PlatformTx::RemoveSubnetValidator(RemoveSubnetValidatorTx {
                    base: BaseTx::unpack(u)?,
                    node_id: u.unpack_node_id()?,
                    subnet_id: u.unpack_id()?,
                    subnet_auth: SubnetAuth::unpack(u)?,
                }))
            }
            TRANSFORM_SUBNET_TX_ID => Ok(PlatformTx::TransformSubnet(TransformSubnetTx {
                base: BaseTx::unpack(u)?,
                subnet_id: u.unpack_id()?,
                asset_id: u.unpack_id()?,
                initial_supply: u.unpack_u64()?,
                maximum_supply: u.unpack_u64()?,
                min_consumption_rate: u.unpack_u64()?,
                max_consumption_rate: u.unpack_u64()?,
                min_validator_stake: u.unpack_u64()?,
                max_validator_stake: u.unpack_u64()?,
                min_stake_duration: u.unpack_u32()?,
                max_stake_duration: u.unpack_u32()?,
                min_delegation_fee: u.unpack_u32()?,
                min_delegator_stake: u.unpack_u64()?,
                max_validator_weight_factor: u.unpack_u8()?,
                uptime_requirement: u.unpack_u32()?,
                subnet_auth: SubnetAuth::unpack(u)?,
            })),
            ADD_PERMISSIONLESS_VALIDATOR_TX_ID => Ok(PlatformTx::AddPermissionlessValidator(
                AddPermissionlessValidatorTx {
                    base: BaseTx::unpack(u)?,
                    validator: Validator::unpack(u)?,
                    subnet_id: u.unpack_id()?,
                    signer: StakingSigner::unpack(u)?,
                    stake_outputs: unpack_outputs(u)?,
                    validator_rewards_owner: OutputOwners::unpack(u)?,
                    delegator_rewards_owner: OutputOwners::unpack(u)?,
                    delegation_shares: u.unpack_u32()?,
                },
            )),
            ADD_PERMISSIONLESS_DELEGATOR_TX_ID => Ok(PlatformTx::AddPermissionlessDelegator(
                AddPermissionlessDelegatorTx {
                    base: BaseTx::unpack(u)?,
                    validator: Validator::unpack(u)?,
                    subnet_id: u.unpack_id()?,
                    stake_outputs: unpack_outputs(u)?,
                    rewards_owner: OutputOwners::unpack(u)?,
                },
            )),
            TRANSFER_SUBNET_OWNERSHIP_TX_ID => Ok(PlatformTx::TransferSubnetOwnership(
                TransferSubnetOwnershipTx {
                    base: BaseTx::unpack(u)?,
                    subnet_id: u.unpack_id()?,
                    subnet_auth: SubnetAuth::unpack(u)?,
                    new_owner: OutputOwners::unpack(u)?,
                },
            )),
            BASE_TX_ID => Ok(PlatformTx::Base(BaseTx::unpack(u)?)),
            CONVERT_SUBNET_TO_L1_TX_ID => {
                let base = BaseTx::unpack(u)?;
                let subnet_id = u.unpack_id()?;
                let chain_id = u.unpack_id()?;
                let manager_address = u.unpack_byte_list()?.to_vec();
                let count = u.unpack_list_len(L1Validator::MIN_WIRE_LEN)?;
                let mut validators = Vec::with_capacity(count);
                for _ in 0..count {
                    validators.push(L1Validator::unpack(u)?);
                }
                let subnet_auth = SubnetAuth::unpack(u)?;
                Ok(PlatformTx::ConvertSubnetToL1(ConvertSubnetToL1Tx {
                    base,
                    subnet_id,
                    chain_id,
                    manager_address,
                    validators,
                    subnet_auth,
                }))
            }
            REGISTER_L1_VALIDATOR_TX_ID => Ok(PlatformTx::RegisterL1Validator(
                RegisterL1ValidatorTx {
                    base: BaseTx::unpack(u)?,
                    balance: u.unpack_u64()?,
                    proof_of_possession: u.unpack_array::<BLS_SIGNATURE_LEN>()?,
                    message: u.unpack_byte_list()?.to_vec(),
                },
            )),
            SET_L1_VALIDATOR_WEIGHT_TX_ID => Ok(PlatformTx::SetL1ValidatorWeight(
                SetL1ValidatorWeightTx {
                    base: BaseTx::unpack(u)?,
                    message: u.unpack_byte_list()?.to_vec(),
                },
            )),
            INCREASE_L1_VALIDATOR_BALANCE_TX_ID => Ok(PlatformTx::IncreaseL1ValidatorBalance(
                IncreaseL1ValidatorBalanceTx {
                    base: BaseTx::unpack(u)?,
                    validation_id: u.unpack_id()?,
                    balance: u.unpack_u64()?,
                },
            )),
            DISABLE_L1_VALIDATOR_TX_ID => Ok(PlatformTx::DisableL1Validator(
                DisableL1ValidatorTx {
                    base: BaseTx::unpack(u)?,
                    subnet_id: u.unpack_id()?,
                    validation_id: u.unpack_id()?,
                    disable_auth: SubnetAuth::unpack(u)?,
                },
            )),
            other => Err(CodecError::UnknownTypeId(other)),
        }
    }
}

fn pack_outputs(packer: &mut Packer, outputs: &[TransferableOutput]) {
    packer.pack_u32(outputs.len() as u32);
    for out in outputs {
        out.pack(packer);
    }
}

fn unpack_outputs(u: &mut Unpacker<'_>) -> Result<Vec<TransferableOutput>, CodecError> {
    let count = u.unpack_list_len(TransferableOutput::MIN_WIRE_LEN)?;
    let mut outputs = Vec::with_capacity(count);
    for _ in 0..count {
        outputs.push(TransferableOutput::unpack(u)?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_base() -> BaseTx {
        let mut base = BaseTx::new(1, Id::from_slice(&[0x11; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[0x22; 32]),
            1,
            Id::from_slice(&[0x33; 32]),
            1_000_000,
            vec![0],
        ));
        base
    }

    fn round_trip(tx: PlatformTx) {
        let bytes = tx.pack_unsigned().unwrap();
        let mut u = Unpacker::new(&bytes);
        let back = PlatformTx::unpack(&mut u).unwrap();
        u.expect_done().unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_create_subnet_round_trip() {
        round_trip(PlatformTx::CreateSubnet(CreateSubnetTx {
            base: sample_base(),
            owner: OutputOwners::new(2, vec![Address::from_slice(&[1; 20]), Address::from_slice(&[2; 20])]),
        }));
    }

    #[test]
    fn test_create_chain_round_trip_and_auth() {
        let tx = PlatformTx::CreateChain(CreateChainTx {
            base: sample_base(),
            subnet_id: Id::from_slice(&[0x44; 32]),
            chain_name: "defi".to_string(),
            vm_id: Id::from_slice(&[0x55; 32]),
            fx_ids: vec![Id::from_slice(&[0x66; 32])],
            genesis_data: vec![1, 2, 3, 4],
            subnet_auth: SubnetAuth::new(vec![0, 2]),
        });
        round_trip(tx.clone());

        let (subnet_id, auth) = tx.auth_reference().unwrap();
        assert_eq!(*subnet_id, Id::from_slice(&[0x44; 32]));
        assert_eq!(auth.sig_indices, vec![0, 2]);
        assert_eq!(tx.auth_sig_count(), Some(2));
        assert_eq!(tx.funding_sig_counts(), vec![1]);
    }

    #[test]
    fn test_create_chain_name_past_prefix_cap_refused() {
        // A name the u16 prefix cannot describe must fail at encode
        // instead of producing bytes the decoder rejects
        let tx = PlatformTx::CreateChain(CreateChainTx {
            base: sample_base(),
            subnet_id: Id::from_slice(&[0x44; 32]),
            chain_name: "n".repeat(u16::MAX as usize + 1),
            vm_id: Id::from_slice(&[0x55; 32]),
            fx_ids: vec![],
            genesis_data: vec![],
            subnet_auth: SubnetAuth::new(vec![0]),
        });
        assert!(matches!(
            tx.pack_unsigned(),
            Err(CodecError::InvalidData(_))
        ));
    }

    #[test]
    fn test_add_subnet_validator_round_trip() {
        round_trip(PlatformTx::AddSubnetValidator(AddSubnetValidatorTx {
            base: sample_base(),
            validator: Validator {
                node_id: NodeId::from_slice(&[0x77; 20]),
                start_time: 100,
                end_time: 200,
                weight: 25,
            },
            subnet_id: Id::from_slice(&[0x88; 32]),
            subnet_auth: SubnetAuth::new(vec![1]),
        }));
    }

    #[test]
    fn test_import_counts_both_input_groups() {
        let tx = PlatformTx::Import(PlatformImportTx {
            base: sample_base(),
            source_chain: Id::from_slice(&[0x99; 32]),
            imported_inputs: vec![TransferableInput::new(
                Id::from_slice(&[0xaa; 32]),
                0,
                Id::from_slice(&[0x33; 32]),
                77,
                vec![0, 1],
            )],
        });
        round_trip(tx.clone());
        assert_eq!(tx.funding_sig_counts(), vec![1, 2]);
        assert_eq!(tx.auth_sig_count(), None);
    }

    #[test]
    fn test_permissionless_validator_with_bls_signer() {
        round_trip(PlatformTx::AddPermissionlessValidator(
            AddPermissionlessValidatorTx {
                base: sample_base(),
                validator: Validator {
                    node_id: NodeId::from_slice(&[0xbb; 20]),
                    start_time: 10,
                    end_time: 20,
                    weight: 2_000,
                },
                subnet_id: Id::EMPTY,
                signer: StakingSigner::ProofOfPossession(ProofOfPossession {
                    public_key: [0xcc; BLS_PUBLIC_KEY_LEN],
                    signature: [0xdd; BLS_SIGNATURE_LEN],
                }),
                stake_outputs: vec![],
                validator_rewards_owner: OutputOwners::new(1, vec![Address::from_slice(&[3; 20])]),
                delegator_rewards_owner: OutputOwners::new(1, vec![Address::from_slice(&[4; 20])]),
                delegation_shares: 20_000,
            },
        ));
    }

    #[test]
    fn test_convert_subnet_to_l1_round_trip() {
        round_trip(PlatformTx::ConvertSubnetToL1(ConvertSubnetToL1Tx {
            base: sample_base(),
            subnet_id: Id::from_slice(&[0x12; 32]),
            chain_id: Id::from_slice(&[0x13; 32]),
            manager_address: vec![0xde, 0xad, 0xbe, 0xef],
            validators: vec![L1Validator {
                node_id: vec![0x14; 20],
                weight: 100,
                balance: 1_000,
                signer: ProofOfPossession {
                    public_key: [0x15; BLS_PUBLIC_KEY_LEN],
                    signature: [0x16; BLS_SIGNATURE_LEN],
                },
                remaining_balance_owner: L1Owner {
                    threshold: 1,
                    addresses: vec![Address::from_slice(&[0x17; 20])],
                },
                deactivation_owner: L1Owner::default(),
            }],
            subnet_auth: SubnetAuth::new(vec![0]),
        }));
    }

    #[test]
    fn test_disable_l1_validator_carries_auth() {
        let tx = PlatformTx::DisableL1Validator(DisableL1ValidatorTx {
            base: sample_base(),
            subnet_id: Id::from_slice(&[0x18; 32]),
            validation_id: Id::from_slice(&[0x19; 32]),
            disable_auth: SubnetAuth::new(vec![0, 1]),
        });
        round_trip(tx.clone());
        assert!(tx.auth_reference().is_some());
        assert_eq!(tx.auth_sig_count(), Some(2));
    }

    #[test]
    fn test_unknown_type_id_rejected() {
        let mut p = Packer::new();
        p.pack_u16(CODEC_VERSION);
        p.pack_u32(0x99);
        let bytes = p.take();
        let mut u = Unpacker::new(&bytes);
        assert_eq!(
            PlatformTx::unpack(&mut u),
            Err(CodecError::UnknownTypeId(0x99))
        );
    }

    #[test]
    fn test_wrong_codec_version_rejected() {
        let mut p = Packer::new();
        p.pack_u16(1);
        p.pack_u32(BASE_TX_ID);
        let bytes = p.take();
        let mut u = Unpacker::new(&bytes);
        assert_eq!(
            PlatformTx::unpack(&mut u),
            Err(CodecError::UnsupportedVersion(1))
        );
    }
}
