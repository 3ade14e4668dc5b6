//! Offline signature exchange
//!
//! Signers who never share a machine pass a partially signed transaction
//! around as a text file: the canonical chain bytes, hex-encoded, with no
//! wrapper, header, or checksum of its own. The file can be pasted into a
//! chat, mailed, or checked into a ticket without binary corruption. Each
//! signer reads the file, fills their slots, and writes it back; copies
//! advanced independently are combined with [`SignedTx::merge`].

use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::chain::ChainKind;
use crate::core::signed::{SignedTx, SignedTxError};

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Transaction error: {0}")]
    SignedTx(#[from] SignedTxError),
}

/// Write the transaction as hex text
///
/// Partial signature state is preserved exactly: empty slots stay the
/// all-zero sentinel on the wire and decode back to empty.
pub fn write_tx_file(stx: &SignedTx, path: &Path) -> Result<(), ExchangeError> {
    let mut hex = stx.to_hex()?;
    hex.push('\n');
    fs::write(path, hex)?;
    debug!("wrote {} transaction to {}", stx.tx.type_name(), path.display());
    Ok(())
}

/// Read a transaction back from hex text
///
/// Surrounding ASCII whitespace is tolerated; anything else in the file
/// is an error.
pub fn read_tx_file(kind: ChainKind, path: &Path) -> Result<SignedTx, ExchangeError> {
    let text = fs::read_to_string(path)?;
    Ok(SignedTx::from_hex(kind, &text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::chain::components::{BaseTx, SubnetAuth, TransferableInput, Validator};
    use crate::chain::platform::{AddSubnetValidatorTx, PlatformTx};
    use crate::chain::ChainTx;
    use crate::core::credential::Signature;
    use crate::core::ids::Id;
    use crate::crypto::keys::KeyPair;

    fn governance_tx() -> SignedTx {
        let mut base = BaseTx::new(5, Id::from_slice(&[0x11; 32]));
        base.inputs.push(TransferableInput::new(
            Id::from_slice(&[0x12; 32]),
            1,
            Id::from_slice(&[0x13; 32]),
            500,
            vec![0],
        ));
        SignedTx::new(ChainTx::Platform(PlatformTx::AddSubnetValidator(
            AddSubnetValidatorTx {
                base,
                validator: Validator::default(),
                subnet_id: Id::from_slice(&[0x14; 32]),
                subnet_auth: SubnetAuth::new(vec![0, 1]),
            },
        )))
    }

    fn sign_slot(stx: &mut SignedTx, credential: usize, slot: usize) {
        let digest = stx.signing_digest().unwrap();
        let sig = KeyPair::generate().sign_recoverable(&digest).unwrap();
        stx.set_signature(credential, slot, Signature::from_bytes(sig))
            .unwrap();
    }

    #[test]
    fn test_file_round_trip_preserves_partial_state() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pending.tx");

        // Funding filled, one of two auth slots filled
        let mut stx = governance_tx();
        sign_slot(&mut stx, 0, 0);
        sign_slot(&mut stx, 1, 1);
        write_tx_file(&stx, &path).unwrap();

        let loaded = read_tx_file(ChainKind::Platform, &path).unwrap();
        assert_eq!(loaded, stx);
        assert!(loaded.credentials[1].signatures[0].is_empty());
        assert!(!loaded.credentials[1].signatures[1].is_empty());
    }

    #[test]
    fn test_read_tolerates_surrounding_whitespace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("padded.tx");

        let stx = governance_tx();
        fs::write(&path, format!("  \n{}\n\n", stx.to_hex().unwrap())).unwrap();

        let loaded = read_tx_file(ChainKind::Platform, &path).unwrap();
        assert_eq!(loaded, stx);
    }

    #[test]
    fn test_copies_signed_apart_merge_through_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path_a = temp_dir.path().join("copy_a.tx");
        let path_b = temp_dir.path().join("copy_b.tx");

        let mut funded = governance_tx();
        sign_slot(&mut funded, 0, 0);

        // Two signers each fill one auth slot of their own copy
        let mut copy_a = funded.clone();
        sign_slot(&mut copy_a, 1, 0);
        write_tx_file(&copy_a, &path_a).unwrap();
        let mut copy_b = funded;
        sign_slot(&mut copy_b, 1, 1);
        write_tx_file(&copy_b, &path_b).unwrap();

        let a = read_tx_file(ChainKind::Platform, &path_a).unwrap();
        let b = read_tx_file(ChainKind::Platform, &path_b).unwrap();
        let merged = a.merge(&b).unwrap();
        assert!(merged.is_fully_signed());
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("garbage.tx");
        fs::write(&path, "this is not hex").unwrap();

        assert!(read_tx_file(ChainKind::Platform, &path).is_err());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("absent.tx");

        assert!(matches!(
            read_tx_file(ChainKind::Platform, &path),
            Err(ExchangeError::Io(_))
        ));
    }
}
