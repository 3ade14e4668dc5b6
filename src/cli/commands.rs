//! CLI command implementations
//!
//! Commands print their own results and reserve `Err` for unexpected
//! failures; anything the user can fix on the spot is reported with a
//! message and a clean exit. Transactions travel between invocations as
//! hex text files (see [`crate::multisig::exchange`]).

use std::fs;
use std::path::{Path, PathBuf};

use crate::chain::ChainKind;
use crate::codec::{decode_transaction, detect_chain};
use crate::core::signed::SignedTx;
use crate::multisig::{
    read_tx_file, write_tx_file, CoordinatorError, MultisigCoordinator, SignOptions,
    StaticResolver,
};
use crate::wallet::{Keyring, WalletError};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn keyring_path(data_dir: &Path) -> PathBuf {
    data_dir.join("keyring.json")
}

fn parse_chain(s: &str) -> CliResult<ChainKind> {
    match s.to_lowercase().as_str() {
        "platform" | "p" => Ok(ChainKind::Platform),
        "asset" | "x" => Ok(ChainKind::Asset),
        "contract" | "c" => Ok(ChainKind::Contract),
        other => Err(format!(
            "unknown chain '{}', expected platform, asset, or contract",
            other
        )
        .into()),
    }
}

fn read_tx_hex(hex: Option<&str>, file: Option<&Path>) -> CliResult<String> {
    match (hex, file) {
        (Some(h), _) => Ok(h.trim().to_string()),
        (None, Some(path)) => Ok(fs::read_to_string(path)?.trim().to_string()),
        (None, None) => Err("provide --hex or --file".into()),
    }
}

fn detect_or_fail(bytes: &[u8]) -> CliResult<ChainKind> {
    match detect_chain(bytes) {
        ChainKind::Undefined => Err("could not identify the chain; pass --chain".into()),
        kind => Ok(kind),
    }
}

/// Load a transaction from `--hex` or `--file`, detecting the chain
/// unless `--chain` pins it
fn load_signed(
    hex: Option<&str>,
    file: Option<&Path>,
    chain: Option<&str>,
) -> CliResult<SignedTx> {
    let tx_hex = read_tx_hex(hex, file)?;
    let kind = match chain {
        Some(c) => parse_chain(c)?,
        None => {
            let bytes = hex::decode(&tx_hex)?;
            detect_or_fail(&bytes)?
        }
    };
    Ok(SignedTx::from_hex(kind, &tx_hex)?)
}

fn load_resolver(path: &Path) -> CliResult<StaticResolver> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn signature_progress(stx: &SignedTx) -> (usize, usize) {
    let filled = stx.credentials.iter().map(|c| c.filled_count()).sum();
    let slots = stx.credentials.iter().map(|c| c.num_slots()).sum();
    (filled, slots)
}

/// Generate or import a key into the local keyring
pub fn cmd_keygen(data_dir: &Path, label: Option<&str>, import: Option<&str>) -> CliResult<()> {
    fs::create_dir_all(data_dir)?;
    let keyring_file = keyring_path(data_dir);
    let mut keyring = if keyring_file.exists() {
        Keyring::load(&keyring_file)?
    } else {
        Keyring::new()
    };

    let address = match import {
        Some(private_key_hex) => match keyring.import_private_key(private_key_hex, label) {
            Ok(address) => address,
            Err(WalletError::Key(e)) => {
                println!("❌ Not a valid private key: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
        None => keyring.generate(label),
    };
    keyring.save(&keyring_file)?;

    println!("🔑 Key ready");
    println!("   ├─ Address: {}", address);
    if let Some(label) = label {
        println!("   ├─ Label: {}", label);
    }
    println!(
        "   └─ Keyring: {} ({} key(s))",
        keyring_file.display(),
        keyring.len()
    );
    Ok(())
}

/// Classify opaque transaction bytes
pub fn cmd_detect(hex: Option<&str>, file: Option<&Path>) -> CliResult<()> {
    let tx_hex = read_tx_hex(hex, file)?;
    let bytes = hex::decode(&tx_hex)?;

    println!("🔍 Chain detection");
    match decode_transaction(&bytes) {
        Some(stx) => {
            let (filled, slots) = signature_progress(&stx);
            println!("   ├─ Chain: {}", stx.tx.kind());
            println!(
                "   ├─ Type: {} (0x{:02x})",
                stx.tx.type_name(),
                stx.tx.type_id()
            );
            println!("   ├─ Network id: {}", stx.tx.network_id());
            println!("   ├─ Signatures: {}/{}", filled, slots);
            println!("   └─ Tx id: {}", stx.tx_id()?);
        }
        None => {
            println!("   └─ Chain: undefined (no single codec accepts these bytes)");
        }
    }
    Ok(())
}

/// Print the decoded transaction as JSON
pub fn cmd_inspect(hex: Option<&str>, file: Option<&Path>, chain: Option<&str>) -> CliResult<()> {
    let stx = load_signed(hex, file, chain)?;
    println!("{}", serde_json::to_string_pretty(&stx.summarize()?)?);
    Ok(())
}

/// Show the auth roster and who still has to sign
pub fn cmd_signers(
    hex: Option<&str>,
    file: Option<&Path>,
    chain: Option<&str>,
    subnets: &Path,
) -> CliResult<()> {
    let stx = load_signed(hex, file, chain)?;
    let resolver = load_resolver(subnets)?;

    let mut coordinator = MultisigCoordinator::new(stx);
    let (required, missing) = match coordinator.remaining_auth_signers(&resolver) {
        Ok(pair) => pair,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    };

    println!("🖋  Auth signers for {}", coordinator.tx().tx.type_name());
    for slot in &required {
        let state = if missing.iter().any(|m| m.slot == slot.slot) {
            "missing"
        } else {
            "signed"
        };
        println!(
            "   ├─ [{}] key #{} {} ({})",
            slot.slot, slot.key_index, slot.address, state
        );
    }
    println!(
        "   └─ Collected {}/{}",
        required.len() - missing.len(),
        required.len()
    );
    Ok(())
}

/// Fill the auth slots our keyring covers and write the result back out
pub fn cmd_sign(
    data_dir: &Path,
    hex: Option<&str>,
    file: Option<&Path>,
    chain: Option<&str>,
    subnets: &Path,
    out: Option<&Path>,
) -> CliResult<()> {
    let keyring_file = keyring_path(data_dir);
    if !keyring_file.exists() {
        println!(
            "❌ No keyring at {}. Run keygen first.",
            keyring_file.display()
        );
        return Ok(());
    }
    let keyring = Keyring::load(&keyring_file)?;
    let stx = load_signed(hex, file, chain)?;
    let resolver = load_resolver(subnets)?;

    let out_path: PathBuf = match (out, file) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => path.to_path_buf(),
        (None, None) => {
            println!("❌ Provide --out when signing from --hex");
            return Ok(());
        }
    };

    let mut coordinator = MultisigCoordinator::new(stx);
    let outcome = match coordinator.sign(&resolver, &keyring, &SignOptions::default(), None) {
        Ok(outcome) => outcome,
        Err(CoordinatorError::NoUsableSigner { pending }) => {
            println!(
                "❌ None of your keys can fill the {} outstanding slot(s)",
                pending
            );
            return Ok(());
        }
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    };

    let (required, missing) = coordinator.remaining_auth_signers(&resolver)?;
    let stx = coordinator.into_tx();
    write_tx_file(&stx, &out_path)?;

    println!("🖊  Signed {} slot(s)", outcome.newly_signed);
    if outcome.ready {
        println!("   ├─ All {} auth signatures collected", required.len());
        println!("   ├─ Tx id: {}", stx.tx_id()?);
    } else {
        for slot in &missing {
            println!("   ├─ Waiting on [{}] key #{} {}", slot.slot, slot.key_index, slot.address);
        }
    }
    println!("   └─ Wrote {}", out_path.display());
    Ok(())
}

/// Combine two copies of the same transaction signed independently
pub fn cmd_merge(
    first: &Path,
    second: &Path,
    chain: Option<&str>,
    out: &Path,
) -> CliResult<()> {
    let kind = match chain {
        Some(c) => parse_chain(c)?,
        None => {
            let text = fs::read_to_string(first)?;
            let bytes = hex::decode(text.trim())?;
            detect_or_fail(&bytes)?
        }
    };
    let a = read_tx_file(kind, first)?;
    let b = read_tx_file(kind, second)?;
    let merged = match a.merge(&b) {
        Ok(merged) => merged,
        Err(e) => {
            println!("❌ {}", e);
            return Ok(());
        }
    };
    write_tx_file(&merged, out)?;

    let (filled, slots) = signature_progress(&merged);
    println!("🔗 Merged copies");
    println!("   ├─ Signatures: {}/{}", filled, slots);
    if merged.is_fully_signed() {
        println!("   ├─ Ready to submit as {}", merged.tx_id()?);
    }
    println!("   └─ Wrote {}", out.display());
    Ok(())
}
