//! Wallet module for key management and slot signing

pub mod wallet;

pub use wallet::{KeyInfo, Keyring, WalletError};
