//! Chain format detection
//!
//! Transaction bytes carry no chain marker, so the only way to tell which
//! chain a blob belongs to is to try every codec. A candidate counts as a
//! match when its decoder consumes the input completely, every type id is
//! registered, and any credential section is well formed. Exactly one
//! match names the chain. Zero matches or more than one match are both
//! `Undefined`: the overlapping type id ranges make cross-chain parses
//! possible, and a blob that two codecs accept cannot be attributed.
//!
//! Classification never fails. Callers that need a hard answer check for
//! [`ChainKind::Undefined`] themselves.

use log::debug;

use crate::chain::ChainKind;
use crate::core::signed::SignedTx;

/// Network id reported for bytes that do not classify
pub const UNKNOWN_NETWORK_ID: u32 = 0;

const CANDIDATES: [ChainKind; 3] = [ChainKind::Platform, ChainKind::Asset, ChainKind::Contract];

/// Classify transaction bytes by trial decoding
pub fn detect_chain(bytes: &[u8]) -> ChainKind {
    let mut matched: Option<ChainKind> = None;
    for kind in CANDIDATES {
        match SignedTx::from_bytes(kind, bytes) {
            Ok(_) => {
                if let Some(first) = matched {
                    debug!(
                        "chain detection ambiguous: {} bytes decode as both {} and {}",
                        bytes.len(),
                        first,
                        kind
                    );
                    return ChainKind::Undefined;
                }
                matched = Some(kind);
            }
            Err(e) => debug!("not a {} transaction: {}", kind, e),
        }
    }
    matched.unwrap_or(ChainKind::Undefined)
}

/// Classify and fully decode in one step. None when the bytes do not
/// classify to exactly one chain.
pub fn decode_transaction(bytes: &[u8]) -> Option<SignedTx> {
    match detect_chain(bytes) {
        ChainKind::Undefined => None,
        kind => SignedTx::from_bytes(kind, bytes).ok(),
    }
}

/// Pull the network id out of opaque transaction bytes
///
/// Bytes that cannot be attributed to one chain report
/// [`UNKNOWN_NETWORK_ID`]. This is total: feeding it garbage is fine.
pub fn extract_network_id(bytes: &[u8]) -> u32 {
    match decode_transaction(bytes) {
        Some(stx) => stx.tx.network_id(),
        None => UNKNOWN_NETWORK_ID,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::asset::{AssetExportTx, AssetImportTx, AssetTx, CreateAssetTx, OperationTx};
    use crate::chain::components::{
        BaseTx, OutputOwners, SubnetAuth, TransferableInput, TransferableOutput, Validator,
    };
    use crate::chain::contract::{
        ContractExportTx, ContractImportTx, ContractTx, EvmInput, EvmOutput,
    };
    use crate::chain::platform::{
        AddDelegatorTx, AddPermissionlessDelegatorTx, AddPermissionlessValidatorTx,
        AddSubnetValidatorTx, AddValidatorTx, ConvertSubnetToL1Tx, CreateChainTx, CreateSubnetTx,
        DisableL1ValidatorTx, IncreaseL1ValidatorBalanceTx, L1Owner, L1Validator,
        PlatformExportTx, PlatformImportTx, PlatformTx, ProofOfPossession, RegisterL1ValidatorTx,
        RemoveSubnetValidatorTx, SetL1ValidatorWeightTx, StakingSigner,
        TransferSubnetOwnershipTx, TransformSubnetTx, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN,
    };
    use crate::chain::ChainTx;
    use crate::core::credential::Signature;
    use crate::core::ids::{Address, Id, NodeId};
    use crate::crypto::keys::SIGNATURE_LEN;

    fn platform_tx(network_id: u32) -> ChainTx {
        let mut base = BaseTx::new(network_id, Id::from_slice(&[0x61; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[0x62; 32]),
            0,
            Id::from_slice(&[0x63; 32]),
            777,
            vec![0],
        ));
        ChainTx::Platform(PlatformTx::CreateSubnet(CreateSubnetTx {
            base,
            owner: OutputOwners::new(1, vec![Address::from_slice(&[0x64; 20])]),
        }))
    }

    /// A contract import engineered so its unsigned bytes also parse as an
    /// asset base transaction. Both chains register type id 0x00, and the
    /// asset decoder reads the contract source chain field as its output
    /// and input counts, then swallows the contract input's trailing
    /// fields as a 28-byte memo.
    fn ambiguous_contract_import() -> ContractImportTx {
        let mut source_chain = [0x51u8; 32];
        source_chain[..4].copy_from_slice(&[0, 0, 0, 0]);
        source_chain[4..8].copy_from_slice(&[0, 0, 0, 1]);

        let mut asset_id = [0x52u8; 32];
        asset_id[4..8].copy_from_slice(&[0, 0, 0, 5]);
        asset_id[16..20].copy_from_slice(&[0, 0, 0, 0]);
        asset_id[20..24].copy_from_slice(&[0, 0, 0, 28]);

        ContractImportTx {
            network_id: 42,
            blockchain_id: Id::from_slice(&[0x53; 32]),
            source_chain: Id::from_bytes(source_chain),
            imported_inputs: vec![TransferableInput::new(
                Id::from_slice(&[0x54; 32]),
                3,
                Id::from_bytes(asset_id),
                9_999,
                vec![],
            )],
            outputs: vec![],
        }
    }

    #[test]
    fn test_detects_each_chain() {
        let platform = platform_tx(1).pack_unsigned().unwrap();
        assert_eq!(detect_chain(&platform), ChainKind::Platform);

        let asset = ChainTx::Asset(AssetTx::Base({
            let mut base = BaseTx::new(1, Id::from_slice(&[0x65; 32]));
            base.inputs.push(TransferableInput::new(
                Id::from_slice(&[0x66; 32]),
                1,
                Id::from_slice(&[0x67; 32]),
                10,
                vec![0, 1],
            ));
            base
        }))
        .pack_unsigned()
        .unwrap();
        assert_eq!(detect_chain(&asset), ChainKind::Asset);

        let contract = ChainTx::Contract(ContractTx::Export(ContractExportTx {
            network_id: 1,
            blockchain_id: Id::from_slice(&[0x68; 32]),
            destination_chain: Id::from_slice(&[0x69; 32]),
            inputs: vec![EvmInput {
                address: Address::from_slice(&[0x6a; 20]),
                amount: 5,
                asset_id: Id::from_slice(&[0x6b; 32]),
                nonce: 1,
            }],
            exported_outputs: vec![],
        }))
        .pack_unsigned()
        .unwrap();
        assert_eq!(detect_chain(&contract), ChainKind::Contract);
    }

    #[test]
    fn test_garbage_is_undefined() {
        assert_eq!(detect_chain(&[]), ChainKind::Undefined);
        assert_eq!(detect_chain(&[0xff]), ChainKind::Undefined);
        assert_eq!(detect_chain(&[0u8; 3]), ChainKind::Undefined);
        assert_eq!(detect_chain(&[0xde, 0xad, 0xbe, 0xef, 0x01, 0x02]), ChainKind::Undefined);
    }

    #[test]
    fn test_truncated_transaction_is_undefined() {
        let bytes = platform_tx(1).pack_unsigned().unwrap();
        assert_eq!(detect_chain(&bytes[..bytes.len() - 5]), ChainKind::Undefined);
    }

    #[test]
    fn test_trailing_junk_is_undefined() {
        let mut bytes = platform_tx(1).pack_unsigned().unwrap();
        bytes.push(0);
        assert_eq!(detect_chain(&bytes), ChainKind::Undefined);
    }

    #[test]
    fn test_collision_between_two_codecs_is_undefined() {
        let tx = ContractTx::Import(ambiguous_contract_import());
        let bytes = tx.pack_unsigned().unwrap();

        // Both decoders accept the bytes in full
        assert!(SignedTx::from_bytes(ChainKind::Contract, &bytes).is_ok());
        assert!(SignedTx::from_bytes(ChainKind::Asset, &bytes).is_ok());
        // The platform chain registers no type id 0x00
        assert!(SignedTx::from_bytes(ChainKind::Platform, &bytes).is_err());

        assert_eq!(detect_chain(&bytes), ChainKind::Undefined);
        assert_eq!(extract_network_id(&bytes), UNKNOWN_NETWORK_ID);
    }

    #[test]
    fn test_signed_form_classifies_like_unsigned() {
        let mut stx = SignedTx::new(platform_tx(7));
        assert_eq!(detect_chain(&stx.to_bytes().unwrap()), ChainKind::Platform);

        stx.set_signature(0, 0, Signature([0x11; SIGNATURE_LEN])).unwrap();
        assert_eq!(detect_chain(&stx.to_bytes().unwrap()), ChainKind::Platform);
        assert_eq!(extract_network_id(&stx.to_bytes().unwrap()), 7);
    }

    #[test]
    fn test_extract_network_id() {
        assert_eq!(
            extract_network_id(&platform_tx(1337).pack_unsigned().unwrap()),
            1337
        );
        assert_eq!(extract_network_id(&[1, 2, 3]), UNKNOWN_NETWORK_ID);
    }

    #[test]
    fn test_decode_transaction_round_trip() {
        let bytes = platform_tx(5).pack_unsigned().unwrap();
        let stx = decode_transaction(&bytes).unwrap();
        assert_eq!(stx.tx.kind(), ChainKind::Platform);
        assert_eq!(stx.tx.type_name(), "create_subnet");
        assert!(decode_transaction(&[0xab, 0xcd]).is_none());
    }

    fn funded_base(network_id: u32) -> BaseTx {
        let mut base = BaseTx::new(network_id, Id::from_slice(&[0x41; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[0x42; 32]),
            0,
            Id::from_slice(&[0x43; 32]),
            2_500,
            vec![0],
        ));
        base
    }

    fn validator() -> Validator {
        Validator {
            node_id: NodeId::from_slice(&[0x46; 20]),
            start_time: 1_700_000_000,
            end_time: 1_731_536_000,
            weight: 2_000,
        }
    }

    fn reward_owners() -> OutputOwners {
        OutputOwners::new(1, vec![Address::from_slice(&[0x44; 20])])
    }

    fn stake() -> Vec<TransferableOutput> {
        vec![TransferableOutput::new(
            Id::from_slice(&[0x45; 32]),
            2_000,
            reward_owners(),
        )]
    }

    fn pop() -> ProofOfPossession {
        ProofOfPossession {
            public_key: [0x31; BLS_PUBLIC_KEY_LEN],
            signature: [0x32; BLS_SIGNATURE_LEN],
        }
    }

    fn l1_owner() -> L1Owner {
        L1Owner {
            threshold: 1,
            addresses: vec![Address::from_slice(&[0x33; 20])],
        }
    }

    /// One fixture per transaction variant, each with a distinct network
    /// id. Every 32-byte filler is nonzero: the asset and contract chains
    /// share type ids 0x00 and 0x01, and a cross-read lands a filler word
    /// in a list header where it fails the length bound.
    fn every_variant() -> Vec<ChainTx> {
        let subnet = Id::from_slice(&[0x47; 32]);
        let auth = SubnetAuth::new(vec![0]);

        let platform = vec![
            PlatformTx::AddValidator(AddValidatorTx {
                base: funded_base(101),
                validator: validator(),
                stake_outputs: stake(),
                rewards_owner: reward_owners(),
                delegation_shares: 20_000,
            }),
            PlatformTx::AddSubnetValidator(AddSubnetValidatorTx {
                base: funded_base(102),
                validator: validator(),
                subnet_id: subnet,
                subnet_auth: auth.clone(),
            }),
            PlatformTx::AddDelegator(AddDelegatorTx {
                base: funded_base(103),
                validator: validator(),
                stake_outputs: stake(),
                rewards_owner: reward_owners(),
            }),
            PlatformTx::CreateChain(CreateChainTx {
                base: funded_base(104),
                subnet_id: subnet,
                chain_name: "orderbook".to_string(),
                vm_id: Id::from_slice(&[0x48; 32]),
                fx_ids: vec![],
                genesis_data: vec![0xca, 0xfe],
                subnet_auth: auth.clone(),
            }),
            PlatformTx::CreateSubnet(CreateSubnetTx {
                base: funded_base(105),
                owner: reward_owners(),
            }),
            PlatformTx::Import(PlatformImportTx {
                base: funded_base(106),
                source_chain: Id::from_slice(&[0x49; 32]),
                imported_inputs: vec![TransferableInput::new(
                    Id::from_slice(&[0x4a; 32]),
                    1,
                    Id::from_slice(&[0x43; 32]),
                    700,
                    vec![0],
                )],
            }),
            PlatformTx::Export(PlatformExportTx {
                base: funded_base(107),
                destination_chain: Id::from_slice(&[0x4b; 32]),
                exported_outputs: stake(),
            }),
            PlatformTx::RemoveSubnetValidator(RemoveSubnetValidatorTx {
                base: funded_base(108),
                node_id: NodeId::from_slice(&[0x46; 20]),
                subnet_id: subnet,
                subnet_auth: auth.clone(),
            }),
            PlatformTx::TransformSubnet(TransformSubnetTx {
                base: funded_base(109),
                subnet_id: subnet,
                asset_id: Id::from_slice(&[0x4c; 32]),
                initial_supply: 1_000_000,
                maximum_supply: 2_000_000,
                min_consumption_rate: 100_000,
                max_consumption_rate: 120_000,
                min_validator_stake: 2_000,
                max_validator_stake: 3_000_000,
                min_stake_duration: 86_400,
                max_stake_duration: 31_536_000,
                min_delegation_fee: 20_000,
                min_delegator_stake: 25,
                max_validator_weight_factor: 5,
                uptime_requirement: 800_000,
                subnet_auth: auth.clone(),
            }),
            PlatformTx::AddPermissionlessValidator(AddPermissionlessValidatorTx {
                base: funded_base(110),
                validator: validator(),
                subnet_id: subnet,
                signer: StakingSigner::ProofOfPossession(pop()),
                stake_outputs: stake(),
                validator_rewards_owner: reward_owners(),
                delegator_rewards_owner: reward_owners(),
                delegation_shares: 20_000,
            }),
            PlatformTx::AddPermissionlessDelegator(AddPermissionlessDelegatorTx {
                base: funded_base(111),
                validator: validator(),
                subnet_id: subnet,
                stake_outputs: stake(),
                rewards_owner: reward_owners(),
            }),
            PlatformTx::TransferSubnetOwnership(TransferSubnetOwnershipTx {
                base: funded_base(112),
                subnet_id: subnet,
                subnet_auth: auth.clone(),
                new_owner: reward_owners(),
            }),
            PlatformTx::Base(funded_base(113)),
            PlatformTx::ConvertSubnetToL1(ConvertSubnetToL1Tx {
                base: funded_base(114),
                subnet_id: subnet,
                chain_id: Id::from_slice(&[0x4d; 32]),
                manager_address: vec![0x4e; 20],
                validators: vec![L1Validator {
                    node_id: vec![0x46; 20],
                    weight: 100,
                    balance: 1_000,
                    signer: pop(),
                    remaining_balance_owner: l1_owner(),
                    deactivation_owner: l1_owner(),
                }],
                subnet_auth: auth.clone(),
            }),
            PlatformTx::RegisterL1Validator(RegisterL1ValidatorTx {
                base: funded_base(115),
                balance: 1_000,
                proof_of_possession: [0x32; BLS_SIGNATURE_LEN],
                message: vec![0x4f; 16],
            }),
            PlatformTx::SetL1ValidatorWeight(SetL1ValidatorWeightTx {
                base: funded_base(116),
                message: vec![0x50; 16],
            }),
            PlatformTx::IncreaseL1ValidatorBalance(IncreaseL1ValidatorBalanceTx {
                base: funded_base(117),
                validation_id: Id::from_slice(&[0x5d; 32]),
                balance: 500,
            }),
            PlatformTx::DisableL1Validator(DisableL1ValidatorTx {
                base: funded_base(118),
                subnet_id: subnet,
                validation_id: Id::from_slice(&[0x5e; 32]),
                disable_auth: auth,
            }),
        ];

        let asset = vec![
            AssetTx::Base(funded_base(201)),
            AssetTx::CreateAsset(CreateAssetTx {
                base: funded_base(202),
                name: "Glacier Gold".to_string(),
                symbol: "GG".to_string(),
                denomination: 9,
                initial_states: vec![],
            }),
            AssetTx::Operation(OperationTx {
                base: funded_base(203),
                ops: vec![],
            }),
            AssetTx::Import(AssetImportTx {
                base: funded_base(204),
                source_chain: Id::from_slice(&[0x63; 32]),
                imported_inputs: vec![TransferableInput::new(
                    Id::from_slice(&[0x64; 32]),
                    2,
                    Id::from_slice(&[0x65; 32]),
                    900,
                    vec![0],
                )],
            }),
            AssetTx::Export(AssetExportTx {
                base: funded_base(205),
                destination_chain: Id::from_slice(&[0x66; 32]),
                exported_outputs: vec![TransferableOutput::new(
                    Id::from_slice(&[0x67; 32]),
                    450,
                    reward_owners(),
                )],
            }),
        ];

        let contract = vec![
            ContractTx::Import(ContractImportTx {
                network_id: 301,
                blockchain_id: Id::from_slice(&[0x51; 32]),
                source_chain: Id::from_slice(&[0x52; 32]),
                imported_inputs: vec![TransferableInput::new(
                    Id::from_slice(&[0x53; 32]),
                    0,
                    Id::from_slice(&[0x54; 32]),
                    5_000,
                    vec![0],
                )],
                outputs: vec![EvmOutput {
                    address: Address::from_slice(&[0x55; 20]),
                    amount: 5_000,
                    asset_id: Id::from_slice(&[0x54; 32]),
                }],
            }),
            ContractTx::Export(ContractExportTx {
                network_id: 302,
                blockchain_id: Id::from_slice(&[0x56; 32]),
                destination_chain: Id::from_slice(&[0x57; 32]),
                inputs: vec![EvmInput {
                    address: Address::from_slice(&[0x58; 20]),
                    amount: 800,
                    asset_id: Id::from_slice(&[0x59; 32]),
                    nonce: 7,
                }],
                exported_outputs: vec![TransferableOutput::new(
                    Id::from_slice(&[0x59; 32]),
                    800,
                    reward_owners(),
                )],
            }),
        ];

        platform
            .into_iter()
            .map(ChainTx::Platform)
            .chain(asset.into_iter().map(ChainTx::Asset))
            .chain(contract.into_iter().map(ChainTx::Contract))
            .collect()
    }

    #[test]
    fn test_every_variant_classifies_to_its_own_chain() {
        let fixtures = every_variant();
        assert_eq!(fixtures.len(), 25);

        let mut seen = std::collections::HashSet::new();
        for tx in fixtures {
            let bytes = tx.pack_unsigned().unwrap();
            assert_eq!(
                detect_chain(&bytes),
                tx.kind(),
                "{} did not classify to its own chain",
                tx.type_name()
            );
            assert_eq!(
                extract_network_id(&bytes),
                tx.network_id(),
                "{} lost its network id",
                tx.type_name()
            );
            assert!(
                seen.insert(tx.network_id()),
                "fixture network ids must be distinct"
            );
        }
    }
}
