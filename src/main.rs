use clap::{Parser, Subcommand};
use std::path::PathBuf;

use multichain_wallet::cli;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(version = "0.1.0")]
#[command(about = "Multisig coordination and transaction inspection for a multi-chain ledger")]
struct Cli {
    /// Data directory for the keyring
    #[arg(long, default_value = ".wallet_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new key, or import one with --import
    Keygen {
        /// Human label stored alongside the key
        #[arg(long)]
        label: Option<String>,
        /// Hex private key to import instead of generating
        #[arg(long)]
        import: Option<String>,
    },
    /// Identify which chain a raw transaction belongs to
    Detect {
        /// Transaction bytes as hex
        #[arg(long)]
        hex: Option<String>,
        /// File holding the hex
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Decode a transaction and print its summary as JSON
    Inspect {
        #[arg(long)]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        /// platform, asset, or contract; detected when omitted
        #[arg(long)]
        chain: Option<String>,
    },
    /// List the control keys that must sign, and who already has
    Signers {
        #[arg(long)]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        chain: Option<String>,
        /// JSON file of subnet ownership records
        #[arg(long)]
        subnets: PathBuf,
    },
    /// Sign the auth slots our keyring covers
    Sign {
        #[arg(long)]
        hex: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        chain: Option<String>,
        /// JSON file of subnet ownership records
        #[arg(long)]
        subnets: PathBuf,
        /// Where to write the signed transaction; defaults to --file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge two independently signed copies of one transaction
    Merge {
        /// First copy
        #[arg(long)]
        file: PathBuf,
        /// Second copy
        #[arg(long)]
        with: PathBuf,
        #[arg(long)]
        chain: Option<String>,
        /// Where to write the combined transaction
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> cli::CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Keygen { label, import } => {
            cli::cmd_keygen(&cli.data_dir, label.as_deref(), import.as_deref())
        }
        Commands::Detect { hex, file } => cli::cmd_detect(hex.as_deref(), file.as_deref()),
        Commands::Inspect { hex, file, chain } => {
            cli::cmd_inspect(hex.as_deref(), file.as_deref(), chain.as_deref())
        }
        Commands::Signers {
            hex,
            file,
            chain,
            subnets,
        } => cli::cmd_signers(hex.as_deref(), file.as_deref(), chain.as_deref(), &subnets),
        Commands::Sign {
            hex,
            file,
            chain,
            subnets,
            out,
        } => cli::cmd_sign(
            &cli.data_dir,
            hex.as_deref(),
            file.as_deref(),
            chain.as_deref(),
            &subnets,
            out.as_deref(),
        ),
        Commands::Merge {
            file,
            with,
            chain,
            out,
        } => cli::cmd_merge(&file, &with, chain.as_deref(), &out),
    }
}
