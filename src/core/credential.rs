//! Signature credentials
//!
//! A credential carries one 65-byte recoverable ECDSA signature per slot.
//! Slots are positional: slot i answers the i-th entry of the matching
//! input's signature index list, so a credential is complete only when
//! every slot is non-zero. Unsigned transactions travel with zero-filled
//! slots that signers fill in place.

use std::fmt;

use crate::codec::packer::{CodecError, Packer, Unpacker};
use crate::crypto::keys::SIGNATURE_LEN;

/// Wire type id of a secp256k1 credential
pub const CREDENTIAL_TYPE_ID: u32 = 0x09;

/// A single 65-byte recoverable signature slot
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Signature {
    /// The zero-filled placeholder written into unsigned slots
    pub const EMPTY: Signature = Signature([0u8; SIGNATURE_LEN]);

    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Signature(bytes)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() != SIGNATURE_LEN {
            return Err(CodecError::InvalidData(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                data.len()
            )));
        }
        let mut bytes = [0u8; SIGNATURE_LEN];
        bytes.copy_from_slice(data);
        Ok(Signature(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// True for the all-zero placeholder
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Signature(empty)")
        } else {
            write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
        }
    }
}

/// An ordered list of signature slots for one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub signatures: Vec<Signature>,
}

impl Credential {
    /// A credential with `slots` zero-filled slots
    pub fn empty(slots: usize) -> Self {
        Credential {
            signatures: vec![Signature::EMPTY; slots],
        }
    }

    pub fn from_signatures(signatures: Vec<Signature>) -> Self {
        Credential { signatures }
    }

    pub fn num_slots(&self) -> usize {
        self.signatures.len()
    }

    pub fn filled_count(&self) -> usize {
        self.signatures.iter().filter(|s| !s.is_empty()).count()
    }

    /// True when no slot still holds the zero placeholder. A credential
    /// with no slots has nothing missing and counts as filled.
    pub fn is_fully_filled(&self) -> bool {
        self.signatures.iter().all(|s| !s.is_empty())
    }

    /// Indices of slots still holding the zero placeholder
    pub fn empty_slots(&self) -> Vec<usize> {
        self.signatures
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_empty())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn pack(&self, packer: &mut Packer) {
        packer.pack_u32(CREDENTIAL_TYPE_ID);
        packer.pack_u32(self.signatures.len() as u32);
        for sig in &self.signatures {
            packer.pack_bytes(sig.as_bytes());
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let type_id = unpacker.unpack_u32()?;
        if type_id != CREDENTIAL_TYPE_ID {
            return Err(CodecError::UnknownTypeId(type_id));
        }
        let count = unpacker.unpack_list_len(SIGNATURE_LEN)?;
        let mut signatures = Vec::with_capacity(count);
        for _ in 0..count {
            signatures.push(Signature(unpacker.unpack_array::<SIGNATURE_LEN>()?));
        }
        Ok(Credential { signatures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_credential_has_no_filled_slots() {
        let cred = Credential::empty(3);
        assert_eq!(cred.num_slots(), 3);
        assert_eq!(cred.filled_count(), 0);
        assert!(!cred.is_fully_filled());
        assert_eq!(cred.empty_slots(), vec![0, 1, 2]);
    }

    #[test]
    fn test_partial_fill_reports_missing_slots() {
        let mut cred = Credential::empty(3);
        cred.signatures[1] = Signature([0x11; SIGNATURE_LEN]);
        assert_eq!(cred.filled_count(), 1);
        assert!(!cred.is_fully_filled());
        assert_eq!(cred.empty_slots(), vec![0, 2]);

        cred.signatures[0] = Signature([0x22; SIGNATURE_LEN]);
        cred.signatures[2] = Signature([0x33; SIGNATURE_LEN]);
        assert!(cred.is_fully_filled());
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let cred = Credential::from_signatures(vec![
            Signature([0xab; SIGNATURE_LEN]),
            Signature::EMPTY,
        ]);
        let mut p = Packer::new();
        cred.pack(&mut p);
        let bytes = p.take();
        // type id + count + two signatures
        assert_eq!(bytes.len(), 4 + 4 + 2 * SIGNATURE_LEN);

        let mut u = Unpacker::new(&bytes);
        let back = Credential::unpack(&mut u).unwrap();
        u.expect_done().unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn test_unpack_rejects_wrong_type_id() {
        let mut p = Packer::new();
        p.pack_u32(0x05);
        p.pack_u32(0);
        let bytes = p.take();
        let mut u = Unpacker::new(&bytes);
        assert_eq!(
            Credential::unpack(&mut u),
            Err(CodecError::UnknownTypeId(0x05))
        );
    }
}
