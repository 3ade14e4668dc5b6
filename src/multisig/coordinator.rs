//! Multisig signing coordination
//!
//! Governance transactions authorize themselves through a subnet auth:
//! index positions into the subnet's control key list, answered by the
//! transaction's trailing credential. The coordinator resolves those
//! indices to concrete addresses, reports which signatures are still
//! missing, fills the slots a local signer can cover, and submits once
//! every slot is filled.
//!
//! Coordination is leaderless. Any signer can run the same pass over a
//! received copy; copies merge slot by slot (see
//! [`crate::core::signed::SignedTx::merge`]), so there is no designated
//! collector and no ordering requirement between signers.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::credential::Signature;
use crate::core::ids::{Address, Id};
use crate::core::signed::{SignedTx, SignedTxError};
use crate::crypto::keys::{KeyError, SIGNATURE_LEN};
use crate::multisig::ownership::{OwnershipCache, OwnershipError, OwnershipResolver};
use crate::multisig::retry::{RetryPolicy, ACCEPTANCE_TIMEOUT};

/// Errors from transaction submission backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Not accepted within {waited:?}")]
    Timeout { waited: Duration },
}

/// Coordination errors
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Transaction type {type_name} carries no subnet authorization")]
    UnsupportedKind { type_name: &'static str },
    #[error("Ownership error: {0}")]
    Ownership(#[from] OwnershipError),
    #[error("Transaction error: {0}")]
    SignedTx(#[from] SignedTxError),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Expected {expected} credentials, found {found}")]
    CredentialCountMismatch { expected: usize, found: usize },
    #[error("Funding credential {credential} has {slots} slots, its input wants {expected}")]
    FundingSlotMismatch {
        credential: usize,
        slots: usize,
        expected: usize,
    },
    #[error("Funding credential {credential} is missing signatures")]
    UnfilledFundingCredential { credential: usize },
    #[error("Auth index {index} is out of range: subnet has {control_keys} control keys")]
    AuthIndexOutOfRange { index: u32, control_keys: usize },
    #[error("Auth credential has {slots} slots but the auth references {indices} indices")]
    AuthShapeMismatch { slots: usize, indices: usize },
    #[error("No key available for any of the {pending} outstanding auth slots")]
    NoUsableSigner { pending: usize },
    #[error("Transaction is not fully signed: {unfilled} slot(s) still empty")]
    NotFullySigned { unfilled: usize },
    #[error("Submission of transaction {tx_id} failed: {source}")]
    Submit {
        tx_id: Id,
        #[source]
        source: SubmitError,
    },
}

/// One auth slot resolved to the control key that must fill it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthSlot {
    /// Position in the trailing credential
    pub slot: usize,
    /// Index into the subnet's control key list
    pub key_index: u32,
    /// The control key itself
    pub address: Address,
}

/// Holder of private keys that can fill signature slots
pub trait SlotSigner {
    /// Addresses this signer holds keys for
    fn addresses(&self) -> Vec<Address>;

    /// Produce a recoverable signature over `hash` with the key behind
    /// `address`
    fn sign_hash(
        &self,
        address: &Address,
        hash: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_LEN], KeyError>;

    fn can_sign(&self, address: &Address) -> bool {
        self.addresses().contains(address)
    }
}

/// Submission backend, typically an HTTP client against a node
///
/// One call covers the whole round: issue the bytes and, when asked,
/// block until the transaction is accepted or `timeout` runs out. The
/// transaction id never crosses this boundary; it is derived from the
/// bytes on the caller's side.
pub trait TxSubmitter {
    fn submit(
        &self,
        signed_bytes: &[u8],
        timeout: Duration,
        wait_for_acceptance: bool,
    ) -> Result<(), SubmitError>;
}

/// Knobs for one signing pass
#[derive(Debug, Clone, Copy)]
pub struct SignOptions {
    /// Fail with [`CoordinatorError::NoUsableSigner`] before doing any
    /// signing when none of the outstanding slots match a local key
    pub check_auth_first: bool,
    /// Commit in the same pass when it ends with every slot filled and a
    /// submitter was provided
    pub commit_if_ready: bool,
    /// Wait for acceptance on such a commit
    pub wait_for_acceptance: bool,
}

impl Default for SignOptions {
    fn default() -> Self {
        SignOptions {
            check_auth_first: true,
            commit_if_ready: true,
            wait_for_acceptance: true,
        }
    }
}

/// What one signing pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOutcome {
    /// Every auth slot is now filled
    pub ready: bool,
    /// Slots filled by this pass
    pub newly_signed: usize,
    /// Content-derived id when the pass also committed
    pub committed: Option<Id>,
}

/// Drives one governance transaction from partially signed to committed
///
/// The coordinator owns the transaction for its whole life. Ownership
/// lookups are cached for that life; call
/// [`OwnershipCache::invalidate`] through [`cache_mut`] if control keys
/// change on chain mid-flight.
///
/// [`cache_mut`]: MultisigCoordinator::cache_mut
#[derive(Debug)]
pub struct MultisigCoordinator {
    stx: SignedTx,
    cache: OwnershipCache,
    retry: RetryPolicy,
    acceptance_timeout: Duration,
    committed: Option<Id>,
}

impl MultisigCoordinator {
    pub fn new(stx: SignedTx) -> Self {
        Self::with_cache(stx, OwnershipCache::new())
    }

    /// Coordinator over a pre-seeded ownership cache
    pub fn with_cache(stx: SignedTx, cache: OwnershipCache) -> Self {
        MultisigCoordinator {
            stx,
            cache,
            retry: RetryPolicy::default(),
            acceptance_timeout: ACCEPTANCE_TIMEOUT,
            committed: None,
        }
    }

    /// Coordinator with explicit retry and acceptance settings
    pub fn with_policy(stx: SignedTx, retry: RetryPolicy, acceptance_timeout: Duration) -> Self {
        MultisigCoordinator {
            stx,
            cache: OwnershipCache::new(),
            retry,
            acceptance_timeout,
            committed: None,
        }
    }

    pub fn tx(&self) -> &SignedTx {
        &self.stx
    }

    /// Give the transaction back, as when writing it out for the next
    /// signer
    pub fn into_tx(self) -> SignedTx {
        self.stx
    }

    /// The recorded id once a commit has succeeded
    pub fn committed(&self) -> Option<Id> {
        self.committed
    }

    pub fn cache(&self) -> &OwnershipCache {
        &self.cache
    }

    /// Mutable cache access, used to invalidate after an ownership change
    /// commits
    pub fn cache_mut(&mut self) -> &mut OwnershipCache {
        &mut self.cache
    }

    /// Absorb signatures gathered on another copy of the transaction
    pub fn merge_from(&mut self, other: &SignedTx) -> Result<(), SignedTxError> {
        self.stx = self.stx.merge(other)?;
        Ok(())
    }

    /// Resolve every auth index to the control key that must sign it
    ///
    /// An index past the end of the control key list means the
    /// transaction and the subnet's current ownership disagree; that is
    /// an error on the transaction, not a missing signer.
    pub fn auth_signers(
        &mut self,
        resolver: &dyn OwnershipResolver,
    ) -> Result<Vec<AuthSlot>, CoordinatorError> {
        let (subnet_id, auth) =
            self.stx
                .tx
                .auth_reference()
                .ok_or(CoordinatorError::UnsupportedKind {
                    type_name: self.stx.tx.type_name(),
                })?;
        let ownership = self.cache.get_or_resolve(subnet_id, resolver)?;
        if !ownership.is_satisfiable() {
            warn!(
                "subnet {} wants {} signatures but lists only {} control keys",
                subnet_id.short(),
                ownership.threshold,
                ownership.control_keys.len()
            );
        }
        let mut slots = Vec::with_capacity(auth.sig_indices.len());
        for (slot, &key_index) in auth.sig_indices.iter().enumerate() {
            let address =
                ownership
                    .signer_at(key_index)
                    .ok_or(CoordinatorError::AuthIndexOutOfRange {
                        index: key_index,
                        control_keys: ownership.control_keys.len(),
                    })?;
            slots.push(AuthSlot {
                slot,
                key_index,
                address: *address,
            });
        }
        Ok(slots)
    }

    /// The full auth roster and the part of it still waiting to sign
    ///
    /// Expects a well-formed bundle: one fully filled credential per
    /// funding input, then the auth credential with one slot per auth
    /// index. Anything else is reported as an error rather than as
    /// missing signers.
    pub fn remaining_auth_signers(
        &mut self,
        resolver: &dyn OwnershipResolver,
    ) -> Result<(Vec<AuthSlot>, Vec<AuthSlot>), CoordinatorError> {
        let required = self.auth_signers(resolver)?;

        let funding_shape = self.stx.tx.funding_sig_counts();
        if self.stx.credentials.len() != funding_shape.len() + 1 {
            return Err(CoordinatorError::CredentialCountMismatch {
                expected: funding_shape.len() + 1,
                found: self.stx.credentials.len(),
            });
        }
        for (i, (cred, expected_slots)) in self
            .stx
            .credentials
            .iter()
            .zip(funding_shape.iter())
            .enumerate()
        {
            if cred.num_slots() != *expected_slots {
                return Err(CoordinatorError::FundingSlotMismatch {
                    credential: i,
                    slots: cred.num_slots(),
                    expected: *expected_slots,
                });
            }
            if !cred.is_fully_filled() {
                return Err(CoordinatorError::UnfilledFundingCredential { credential: i });
            }
        }

        let auth_cred = &self.stx.credentials[funding_shape.len()];
        if auth_cred.num_slots() != required.len() {
            return Err(CoordinatorError::AuthShapeMismatch {
                slots: auth_cred.num_slots(),
                indices: required.len(),
            });
        }

        let missing = required
            .iter()
            .filter(|s| auth_cred.signatures[s.slot].is_empty())
            .copied()
            .collect();
        Ok((required, missing))
    }

    /// Fill every outstanding auth slot the signer holds a key for, then
    /// commit if that leaves the transaction ready
    ///
    /// When nothing is outstanding the pass signs nothing and goes
    /// straight to the commit decision. The submitter is never touched
    /// unless the transaction ends the pass fully signed.
    pub fn sign(
        &mut self,
        resolver: &dyn OwnershipResolver,
        signer: &dyn SlotSigner,
        options: &SignOptions,
        submitter: Option<&dyn TxSubmitter>,
    ) -> Result<SignOutcome, CoordinatorError> {
        let (_, missing) = self.remaining_auth_signers(resolver)?;
        if options.check_auth_first && !missing.is_empty() {
            let ours = signer.addresses();
            if !missing.iter().any(|s| ours.contains(&s.address)) {
                return Err(CoordinatorError::NoUsableSigner {
                    pending: missing.len(),
                });
            }
        }

        let digest = self.stx.signing_digest()?;
        let auth_credential = self.stx.credentials.len() - 1;
        let mut newly_signed = 0;
        for slot in &missing {
            if !signer.can_sign(&slot.address) {
                continue;
            }
            let sig = signer.sign_hash(&slot.address, &digest)?;
            self.stx
                .set_signature(auth_credential, slot.slot, Signature::from_bytes(sig))?;
            debug!("filled auth slot {} as {}", slot.slot, slot.address);
            newly_signed += 1;
        }

        let (_, outstanding) = self.remaining_auth_signers(resolver)?;
        let ready = outstanding.is_empty();
        info!(
            "signing pass on {}: {} new signature(s), {} outstanding",
            self.stx.tx.type_name(),
            newly_signed,
            outstanding.len()
        );

        let committed = match submitter {
            Some(submitter) if ready && options.commit_if_ready => {
                Some(self.commit(submitter, options.wait_for_acceptance)?)
            }
            _ => None,
        };

        Ok(SignOutcome {
            ready,
            newly_signed,
            committed,
        })
    }

    /// Submit the fully signed transaction, retrying per the
    /// coordinator's policy
    ///
    /// A transaction with any empty slot is refused before the submitter
    /// is contacted. Every submission failure burns an attempt, timeout
    /// and rejection alike; when all attempts are spent the last error
    /// comes back wrapped with the content-derived id, so the caller can
    /// look the transaction up even though the node never named it. A
    /// successful commit is recorded and further calls return the
    /// recorded id without contacting the node again.
    pub fn commit(
        &mut self,
        submitter: &dyn TxSubmitter,
        wait_for_acceptance: bool,
    ) -> Result<Id, CoordinatorError> {
        if let Some(tx_id) = self.committed {
            debug!("transaction {} already committed", tx_id.short());
            return Ok(tx_id);
        }
        if !self.stx.is_fully_signed() {
            let unfilled = self
                .stx
                .credentials
                .iter()
                .map(|c| c.num_slots() - c.filled_count())
                .sum();
            return Err(CoordinatorError::NotFullySigned { unfilled });
        }

        let bytes = self.stx.to_bytes()?;
        let tx_id = self.stx.tx_id()?;
        let mut last_error: Option<SubmitError> = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                self.retry.wait();
            }
            match submitter.submit(&bytes, self.acceptance_timeout, wait_for_acceptance) {
                Ok(()) => {
                    info!(
                        "transaction {} committed on attempt {}",
                        tx_id.short(),
                        attempt
                    );
                    self.committed = Some(tx_id);
                    return Ok(tx_id);
                }
                Err(e) => {
                    warn!(
                        "attempt {}/{} failed for {}: {}",
                        attempt,
                        self.retry.max_attempts,
                        tx_id.short(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(CoordinatorError::Submit {
            tx_id,
            source: last_error.unwrap_or_else(|| {
                SubmitError::Network("no submission attempts were made".to_string())
            }),
        })
    }
}
