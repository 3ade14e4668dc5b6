//! Cryptographic hashing utilities
//!
//! Provides the SHA-256 based hashing used for transaction IDs and
//! signing digests, and the RIPEMD160(SHA256(pubkey)) digest used for
//! short addresses.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes SHA-256 and returns the fixed-width digest
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

/// Computes double SHA-256 (SHA-256 of SHA-256)
/// Used for the Base58Check address checksum
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Computes RIPEMD160(SHA256(data)), the 20-byte short-address digest
pub fn sha256_ripemd160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripemd.finalize());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let data = b"hello world";
        let hash = sha256(data);
        assert_eq!(hash.len(), 32);
        assert_eq!(
            sha256_hex(data),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_sha256_array_matches_vec() {
        let data = b"payload";
        assert_eq!(sha256(data), sha256_array(data).to_vec());
    }

    #[test]
    fn test_double_sha256() {
        let data = b"hello world";
        let hash = double_sha256(data);
        assert_eq!(hash.len(), 32);
        assert_ne!(hash, sha256(data));
    }

    #[test]
    fn test_short_digest_width() {
        assert_eq!(sha256_ripemd160(b"pubkey bytes").len(), 20);
    }
}
