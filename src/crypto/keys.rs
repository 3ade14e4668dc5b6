//! ECDSA key management
//!
//! Provides key pair generation, recoverable signing, and verification
//! using the secp256k1 elliptic curve. Chain credentials carry 65-byte
//! recoverable signatures (64-byte compact form plus a recovery id), so
//! the address of a signer can be derived back from a filled slot.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::sha256_ripemd160;
use crate::core::ids::Address;

/// Length of a recoverable signature on the wire
pub const SIGNATURE_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid recovery id {0}")]
    InvalidRecoveryId(u8),
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Derive the 20-byte address for this key pair
    pub fn address(&self) -> Address {
        public_key_to_address(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a 65-byte recoverable signature
    pub fn sign_recoverable(&self, digest: &[u8; 32]) -> Result<[u8; SIGNATURE_LEN], KeyError> {
        sign_digest_recoverable(&self.secret_key, digest)
    }
}

/// Derive the short address from a public key: RIPEMD160(SHA256(compressed pubkey))
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    Address::from_bytes(sha256_ripemd160(&public_key.serialize()))
}

/// Parse a public key from a hex string
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a 32-byte digest with a secret key
///
/// Wire layout: 64-byte compact signature followed by the one-byte
/// recovery id.
pub fn sign_digest_recoverable(
    secret_key: &SecretKey,
    digest: &[u8; 32],
) -> Result<[u8; SIGNATURE_LEN], KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut out = [0u8; SIGNATURE_LEN];
    out[..64].copy_from_slice(&compact);
    out[64] = recovery_id.to_i32() as u8;
    Ok(out)
}

/// Recover the signing public key from a 65-byte recoverable signature
pub fn recover_public_key(
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<PublicKey, KeyError> {
    let secp = Secp256k1::new();
    let recovery_id = RecoveryId::from_i32(signature[64] as i32)
        .map_err(|_| KeyError::InvalidRecoveryId(signature[64]))?;
    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;
    let message = Message::from_digest_slice(digest)?;
    Ok(secp.recover_ecdsa(&message, &sig)?)
}

/// Recover the signer's address from a 65-byte recoverable signature
pub fn recover_address(
    digest: &[u8; 32],
    signature: &[u8; SIGNATURE_LEN],
) -> Result<Address, KeyError> {
    Ok(public_key_to_address(&recover_public_key(digest, signature)?))
}
