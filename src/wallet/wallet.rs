//! Key storage for signers
//!
//! Holds the private keys one participant brings to a signing session and
//! answers the coordinator's slot-filling requests through [`SlotSigner`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::credential::Signature;
use crate::core::ids::Address;
use crate::core::signed::{SignedTx, SignedTxError};
use crate::crypto::keys::{KeyError, KeyPair, SIGNATURE_LEN};
use crate::multisig::coordinator::SlotSigner;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("No key for address {0}")]
    NoSuchKey(Address),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Transaction error: {0}")]
    SignedTx(#[from] SignedTxError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One held key with its bookkeeping
struct KeyEntry {
    key_pair: KeyPair,
    label: Option<String>,
    imported_at: DateTime<Utc>,
}

/// Serializable keyring contents for persistence
#[derive(Debug, Serialize, Deserialize)]
struct KeyringData {
    keys: Vec<KeyEntryData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyEntryData {
    private_key_hex: String,
    label: Option<String>,
    imported_at: DateTime<Utc>,
}

/// Public information about a held key (safe to share)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyInfo {
    pub address: Address,
    pub public_key: String,
    pub label: Option<String>,
    pub imported_at: DateTime<Utc>,
}

/// A participant's private keys, indexed by the address they control
#[derive(Default)]
pub struct Keyring {
    keys: HashMap<Address, KeyEntry>,
}

impl Keyring {
    pub fn new() -> Self {
        Keyring {
            keys: HashMap::new(),
        }
    }

    /// Generate a fresh key and keep it
    pub fn generate(&mut self, label: Option<&str>) -> Address {
        let key_pair = KeyPair::generate();
        let address = key_pair.address();
        self.keys.insert(
            address,
            KeyEntry {
                key_pair,
                label: label.map(|l| l.to_string()),
                imported_at: Utc::now(),
            },
        );
        info!("generated key for {}", address);
        address
    }

    /// Import a hex-encoded private key
    pub fn import_private_key(
        &mut self,
        private_key_hex: &str,
        label: Option<&str>,
    ) -> Result<Address, WalletError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        let address = key_pair.address();
        self.keys.insert(
            address,
            KeyEntry {
                key_pair,
                label: label.map(|l| l.to_string()),
                imported_at: Utc::now(),
            },
        );
        Ok(address)
    }

    /// Export the private key behind an address
    /// WARNING: Keep this secret!
    pub fn export_private_key(&self, address: &Address) -> Option<String> {
        self.keys.get(address).map(|e| e.key_pair.private_key_hex())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Held keys, sorted by address
    pub fn entries(&self) -> Vec<KeyInfo> {
        let mut infos: Vec<KeyInfo> = self
            .keys
            .iter()
            .map(|(address, entry)| KeyInfo {
                address: *address,
                public_key: entry.key_pair.public_key_hex(),
                label: entry.label.clone(),
                imported_at: entry.imported_at,
            })
            .collect();
        infos.sort_by_key(|i| i.address);
        infos
    }

    /// Sign a funding credential slot with the key behind `address`
    ///
    /// Funding inputs are signed by whoever owns the spent UTXOs, before
    /// the transaction goes out for governance signatures.
    pub fn sign_funding_slot(
        &self,
        stx: &mut SignedTx,
        credential: usize,
        slot: usize,
        address: &Address,
    ) -> Result<(), WalletError> {
        let entry = self
            .keys
            .get(address)
            .ok_or(WalletError::NoSuchKey(*address))?;
        let digest = stx.signing_digest()?;
        let sig = entry.key_pair.sign_recoverable(&digest)?;
        stx.set_signature(credential, slot, Signature::from_bytes(sig))?;
        Ok(())
    }

    /// Save the keyring to file
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let data = KeyringData {
            keys: self
                .entries()
                .iter()
                .map(|info| KeyEntryData {
                    private_key_hex: self.keys[&info.address].key_pair.private_key_hex(),
                    label: info.label.clone(),
                    imported_at: info.imported_at,
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a keyring from file
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let json = fs::read_to_string(path)?;
        let data: KeyringData = serde_json::from_str(&json)?;

        let mut keyring = Keyring::new();
        for entry in data.keys {
            let key_pair = KeyPair::from_private_key_hex(&entry.private_key_hex)?;
            keyring.keys.insert(
                key_pair.address(),
                KeyEntry {
                    key_pair,
                    label: entry.label,
                    imported_at: entry.imported_at,
                },
            );
        }
        Ok(keyring)
    }
}

impl SlotSigner for Keyring {
    fn addresses(&self) -> Vec<Address> {
        self.keys.keys().copied().collect()
    }

    fn sign_hash(
        &self,
        address: &Address,
        hash: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_LEN], KeyError> {
        let entry = self
            .keys
            .get(address)
            .ok_or(KeyError::InvalidPrivateKey)?;
        entry.key_pair.sign_recoverable(hash)
    }

    fn can_sign(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::components::{BaseTx, TransferableInput};
    use crate::chain::platform::PlatformTx;
    use crate::chain::ChainTx;
    use crate::core::ids::Id;
    use crate::crypto::keys::recover_address;

    #[test]
    fn test_generate_and_lookup() {
        let mut keyring = Keyring::new();
        let address = keyring.generate(Some("treasury"));

        assert!(keyring.contains(&address));
        assert_eq!(keyring.len(), 1);
        let entries = keyring.entries();
        assert_eq!(entries[0].address, address);
        assert_eq!(entries[0].label.as_deref(), Some("treasury"));
    }

    #[test]
    fn test_import_round_trip() {
        let mut keyring = Keyring::new();
        let address = keyring.generate(None);
        let exported = keyring.export_private_key(&address).unwrap();

        let mut other = Keyring::new();
        let imported = other.import_private_key(&exported, None).unwrap();
        assert_eq!(imported, address);
    }

    #[test]
    fn test_bad_private_key_rejected() {
        let mut keyring = Keyring::new();
        assert!(keyring.import_private_key("not hex", None).is_err());
        assert!(keyring.import_private_key("abcd", None).is_err());
    }

    #[test]
    fn test_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("keyring.json");

        let mut keyring = Keyring::new();
        let a = keyring.generate(Some("ops"));
        let b = keyring.generate(None);
        keyring.save(&path).unwrap();

        let loaded = Keyring::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&a));
        assert!(loaded.contains(&b));
        assert_eq!(
            loaded.export_private_key(&a),
            keyring.export_private_key(&a)
        );
    }

    #[test]
    fn test_sign_funding_slot() {
        let mut keyring = Keyring::new();
        let address = keyring.generate(None);

        let mut base = BaseTx::new(1, Id::from_slice(&[9; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[8; 32]),
            0,
            Id::from_slice(&[7; 32]),
            250,
            vec![0],
        ));
        let mut stx = SignedTx::new(ChainTx::Platform(PlatformTx::Base(base)));

        keyring.sign_funding_slot(&mut stx, 0, 0, &address).unwrap();
        assert!(stx.is_fully_signed());
        let recovered = stx.recover_signer_addresses().unwrap();
        assert_eq!(recovered[0][0], Some(address));

        let stranger = KeyPair::generate().address();
        assert!(matches!(
            keyring.sign_funding_slot(&mut stx, 0, 0, &stranger),
            Err(WalletError::NoSuchKey(_))
        ));
    }

    #[test]
    fn test_slot_signer_produces_recoverable_signature() {
        let mut keyring = Keyring::new();
        let address = keyring.generate(None);
        let digest = [7u8; 32];

        let sig = keyring.sign_hash(&address, &digest).unwrap();
        assert_eq!(recover_address(&digest, &sig).unwrap(), address);

        let stranger = KeyPair::generate().address();
        assert!(!keyring.can_sign(&stranger));
        assert!(keyring.sign_hash(&stranger, &digest).is_err());
    }
}
