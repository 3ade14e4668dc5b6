//! Multi-signature coordination for subnet governance
//!
//! Subnets are governed by M-of-N control keys. Changing a subnet means
//! getting a transaction signed by enough of those keys, usually held by
//! different people on different machines. This module resolves who has
//! to sign, tracks which signatures are still missing, carries partial
//! copies between signers, and submits the finished transaction.
//!
//! # Example
//!
//! ```ignore
//! use multichain_wallet::multisig::{MultisigCoordinator, SignOptions};
//!
//! let mut coordinator = MultisigCoordinator::new(stx);
//!
//! // Who still has to sign?
//! let (required, missing) = coordinator.remaining_auth_signers(&resolver)?;
//!
//! // Fill the slots our keyring covers, submit if that was the last one
//! let outcome = coordinator.sign(&resolver, &keyring, &SignOptions::default(), Some(&client))?;
//! ```

pub mod coordinator;
pub mod exchange;
pub mod ownership;
pub mod retry;

pub use coordinator::{
    AuthSlot, CoordinatorError, MultisigCoordinator, SignOptions, SignOutcome, SlotSigner,
    SubmitError, TxSubmitter,
};
pub use exchange::{read_tx_file, write_tx_file, ExchangeError};
pub use ownership::{
    OwnershipCache, OwnershipError, OwnershipResolver, StaticResolver, SubnetOwnership,
};
pub use retry::{RetryPolicy, ACCEPTANCE_TIMEOUT, REQUEST_TIMEOUT, SUBMIT_RETRY};
