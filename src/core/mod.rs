//! Core transaction model
//!
//! This module contains the fundamental building blocks:
//! - Identifiers (32-byte ids, 20-byte addresses with Base58Check text)
//! - Credentials (positional 65-byte recoverable signature slots)
//! - Signed transactions (unsigned body plus credentials, content-derived
//!   ids, slot-wise merging of partially signed copies)

pub mod credential;
pub mod ids;
pub mod signed;

pub use credential::{Credential, Signature, CREDENTIAL_TYPE_ID};
pub use ids::{Address, Id, IdError, NodeId, ADDRESS_VERSION};
pub use signed::{CredentialSummary, SignedTx, SignedTxError, TxSummary};
