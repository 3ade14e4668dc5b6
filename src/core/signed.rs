//! Signed transaction container
//!
//! A [`SignedTx`] is an unsigned transaction plus its credential list. The
//! credential shape is fixed by the transaction itself: one credential per
//! funding input in wire order, then one trailing credential when the
//! variant carries a subnet auth. Unsigned transactions travel with the
//! same shape, slots zero-filled, so partially signed copies of the same
//! transaction can be merged slot by slot.
//!
//! Identity is content-derived: the transaction id is the SHA-256 of the
//! full signed bytes, while signatures commit to the SHA-256 of only the
//! unsigned bytes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chain::{ChainKind, ChainTx};
use crate::codec::packer::{CodecError, Packer, Unpacker};
use crate::core::credential::{Credential, Signature};
use crate::core::ids::{Address, Id};
use crate::crypto::hash::sha256_array;
use crate::crypto::keys::{recover_address, KeyError};

/// Signed transaction handling errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignedTxError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Cannot merge: unsigned bytes differ")]
    UnsignedMismatch,
    #[error("Cannot merge: credential shapes differ")]
    ShapeMismatch,
    #[error("Conflicting signatures in credential {credential} slot {slot}")]
    SignatureConflict { credential: usize, slot: usize },
    #[error("Credential {credential} has no slot {slot}")]
    SlotOutOfRange { credential: usize, slot: usize },
}

/// An unsigned transaction with its ordered credential list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    pub tx: ChainTx,
    pub credentials: Vec<Credential>,
}

impl SignedTx {
    /// Wrap an unsigned transaction with zero-filled credentials in the
    /// shape the transaction demands
    pub fn new(tx: ChainTx) -> Self {
        let mut credentials: Vec<Credential> = tx
            .funding_sig_counts()
            .into_iter()
            .map(Credential::empty)
            .collect();
        if let Some(auth_slots) = tx.auth_sig_count() {
            credentials.push(Credential::empty(auth_slots));
        }
        SignedTx { tx, credentials }
    }

    pub fn from_parts(tx: ChainTx, credentials: Vec<Credential>) -> Self {
        SignedTx { tx, credentials }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    pub fn unsigned_bytes(&self) -> Result<Vec<u8>, SignedTxError> {
        Ok(self.tx.pack_unsigned()?)
    }

    /// The digest every signature slot commits to
    pub fn signing_digest(&self) -> Result<[u8; 32], SignedTxError> {
        Ok(sha256_array(&self.unsigned_bytes()?))
    }

    /// Content-derived id over the full signed bytes
    pub fn tx_id(&self) -> Result<Id, SignedTxError> {
        Ok(Id::from_bytes(sha256_array(&self.to_bytes()?)))
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    pub fn to_bytes(&self) -> Result<Vec<u8>, SignedTxError> {
        let mut packer = Packer::new();
        packer.pack_bytes(&self.unsigned_bytes()?);
        packer.pack_u32(self.credentials.len() as u32);
        for cred in &self.credentials {
            cred.pack(&mut packer);
        }
        Ok(packer.take())
    }

    pub fn to_hex(&self) -> Result<String, SignedTxError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    /// Decode `bytes` as a `kind` transaction. Accepts the unsigned-only
    /// form (nothing after the body, credentials come back zero-filled)
    /// and the signed form (credential section then end of input). Any
    /// leftover bytes are an error.
    pub fn from_bytes(kind: ChainKind, bytes: &[u8]) -> Result<Self, SignedTxError> {
        let mut unpacker = Unpacker::new(bytes);
        let tx = ChainTx::unpack_as(kind, &mut unpacker)?;
        if unpacker.is_done() {
            return Ok(SignedTx::new(tx));
        }
        let count = unpacker.unpack_list_len(8)?;
        let mut credentials = Vec::with_capacity(count);
        for _ in 0..count {
            credentials.push(Credential::unpack(&mut unpacker)?);
        }
        unpacker.expect_done()?;
        Ok(SignedTx { tx, credentials })
    }

    pub fn from_hex(kind: ChainKind, s: &str) -> Result<Self, SignedTxError> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| CodecError::InvalidData(format!("invalid hex: {e}")))?;
        Self::from_bytes(kind, &bytes)
    }

    // -------------------------------------------------------------------------
    // Credential shape
    // -------------------------------------------------------------------------

    /// Slot counts the transaction demands, funding first, auth last
    pub fn expected_shape(&self) -> Vec<usize> {
        let mut shape = self.tx.funding_sig_counts();
        if let Some(auth_slots) = self.tx.auth_sig_count() {
            shape.push(auth_slots);
        }
        shape
    }

    fn actual_shape(&self) -> Vec<usize> {
        self.credentials.iter().map(|c| c.num_slots()).collect()
    }

    pub fn has_expected_shape(&self) -> bool {
        self.actual_shape() == self.expected_shape()
    }

    pub fn num_funding_credentials(&self) -> usize {
        self.tx.funding_sig_counts().len()
    }

    /// The funding credentials, excluding any trailing auth credential.
    /// Empty when the credential list does not match the expected shape.
    pub fn funding_credentials(&self) -> &[Credential] {
        if !self.has_expected_shape() {
            return &[];
        }
        &self.credentials[..self.num_funding_credentials()]
    }

    /// The trailing authorization credential, when the variant carries
    /// one and the shape matches
    pub fn auth_credential(&self) -> Option<&Credential> {
        if self.tx.auth_sig_count().is_none() || !self.has_expected_shape() {
            return None;
        }
        self.credentials.last()
    }

    pub fn auth_credential_mut(&mut self) -> Option<&mut Credential> {
        if self.tx.auth_sig_count().is_none() || !self.has_expected_shape() {
            return None;
        }
        self.credentials.last_mut()
    }

    pub fn is_fully_signed(&self) -> bool {
        self.has_expected_shape() && self.credentials.iter().all(|c| c.is_fully_filled())
    }

    /// Write one signature into a slot
    pub fn set_signature(
        &mut self,
        credential: usize,
        slot: usize,
        signature: Signature,
    ) -> Result<(), SignedTxError> {
        let cred = self
            .credentials
            .get_mut(credential)
            .ok_or(SignedTxError::SlotOutOfRange { credential, slot })?;
        let entry = cred
            .signatures
            .get_mut(slot)
            .ok_or(SignedTxError::SlotOutOfRange { credential, slot })?;
        *entry = signature;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Merging
    // -------------------------------------------------------------------------

    /// Merge two partially signed copies of the same transaction
    ///
    /// Copies agree when their unsigned bytes and credential shapes are
    /// identical. Per slot, a filled signature beats an empty one; two
    /// different filled signatures in the same slot mean the copies were
    /// signed from diverging histories and the merge fails. Either input
    /// merged with the output reproduces the output, so signers can
    /// exchange copies in any order.
    pub fn merge(&self, other: &SignedTx) -> Result<SignedTx, SignedTxError> {
        if self.unsigned_bytes()? != other.unsigned_bytes()? {
            return Err(SignedTxError::UnsignedMismatch);
        }
        if self.actual_shape() != other.actual_shape() {
            return Err(SignedTxError::ShapeMismatch);
        }
        let mut merged = self.clone();
        for (ci, (ours, theirs)) in merged
            .credentials
            .iter_mut()
            .zip(other.credentials.iter())
            .enumerate()
        {
            for (si, (a, b)) in ours
                .signatures
                .iter_mut()
                .zip(theirs.signatures.iter())
                .enumerate()
            {
                if b.is_empty() || a == b {
                    continue;
                }
                if a.is_empty() {
                    *a = b.clone();
                } else {
                    return Err(SignedTxError::SignatureConflict {
                        credential: ci,
                        slot: si,
                    });
                }
            }
        }
        Ok(merged)
    }

    // -------------------------------------------------------------------------
    // Attribution
    // -------------------------------------------------------------------------

    /// Recover the signer address behind every filled slot
    ///
    /// Returns one entry per credential, one option per slot. Empty slots
    /// come back as None; a filled slot that does not recover to a valid
    /// public key is an error.
    pub fn recover_signer_addresses(&self) -> Result<Vec<Vec<Option<Address>>>, SignedTxError> {
        let digest = self.signing_digest()?;
        let mut out = Vec::with_capacity(self.credentials.len());
        for cred in &self.credentials {
            let mut slots = Vec::with_capacity(cred.num_slots());
            for sig in &cred.signatures {
                if sig.is_empty() {
                    slots.push(None);
                } else {
                    slots.push(Some(recover_address(&digest, sig.as_bytes())?));
                }
            }
            out.push(slots);
        }
        Ok(out)
    }

    /// Human-oriented view of the transaction and its signing progress
    pub fn summarize(&self) -> Result<TxSummary, SignedTxError> {
        let (subnet_id, auth_indices) = match self.tx.auth_reference() {
            Some((subnet_id, auth)) => (Some(*subnet_id), Some(auth.sig_indices.clone())),
            None => (None, None),
        };
        Ok(TxSummary {
            tx_id: self.tx_id()?,
            chain: self.tx.kind(),
            type_name: self.tx.type_name().to_string(),
            type_id: self.tx.type_id(),
            network_id: self.tx.network_id(),
            subnet_id,
            auth_indices,
            credentials: self
                .credentials
                .iter()
                .map(|c| CredentialSummary {
                    slots: c.num_slots(),
                    filled: c.filled_count(),
                })
                .collect(),
            fully_signed: self.is_fully_signed(),
        })
    }
}

/// Serializable signing-progress report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxSummary {
    pub tx_id: Id,
    pub chain: ChainKind,
    pub type_name: String,
    pub type_id: u32,
    pub network_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_indices: Option<Vec<u32>>,
    pub credentials: Vec<CredentialSummary>,
    pub fully_signed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub slots: usize,
    pub filled: usize,
}
