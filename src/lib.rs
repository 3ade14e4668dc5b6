//! Multichain Wallet: software-key tooling for a multi-chain ledger
//!
//! This crate provides the offline half of subnet governance, featuring:
//! - Wire codecs for the platform, asset, and contract chain transaction formats
//! - Trial decoding that classifies opaque bytes among the three chains
//! - ECDSA recoverable signatures (secp256k1) over SHA-256 digests
//! - Multisig coordination against subnet control keys with an ownership cache
//! - Offline signature exchange through hex text files with deterministic merge
//! - Retrying transaction submission behind a pluggable backend trait
//! - Keyring persistence and a CLI for the full signing workflow
//!
//! # Example
//!
//! ```rust
//! use multichain_wallet::chain::ChainKind;
//! use multichain_wallet::codec::detect_chain;
//! use multichain_wallet::wallet::Keyring;
//!
//! // Keys live in a keyring and answer signing requests by address
//! let mut keyring = Keyring::new();
//! let address = keyring.generate(Some("ops"));
//! println!("Address: {}", address);
//!
//! // Opaque bytes classify as exactly one chain or as undefined
//! let kind = detect_chain(&[0xde, 0xad, 0xbe, 0xef]);
//! assert_eq!(kind, ChainKind::Undefined);
//! ```

pub mod chain;
pub mod cli;
pub mod codec;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod wallet;

// Re-export commonly used types
pub use chain::{ChainKind, ChainTx};
pub use codec::{decode_transaction, detect_chain, extract_network_id, CodecError};
pub use core::{Address, Credential, Id, SignedTx, TxSummary};
pub use crypto::KeyPair;
pub use multisig::{
    read_tx_file, write_tx_file, MultisigCoordinator, OwnershipResolver, RetryPolicy,
    SignOptions, StaticResolver, SubnetOwnership, TxSubmitter,
};
pub use wallet::Keyring;
