//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256 hashing and the short-address digest
//! - ECDSA key management with recoverable signatures (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, sha256, sha256_array, sha256_hex, sha256_ripemd160};
pub use keys::{
    public_key_from_hex, public_key_to_address, recover_address, recover_public_key,
    sign_digest_recoverable, KeyError, KeyPair, SIGNATURE_LEN,
};
