//! Token Escrow CLI
//!
//! ## Usage
//!
//! ```bash
//! token_escrow_cli --config config/escrow_client.toml initialize \
//!     --initializer alice.json --holding <pubkey> --receiving <pubkey> --amount 5
//! token_escrow_cli exchange --taker bob.json --record <pubkey> \
//!     --sending <pubkey> --receiving <pubkey>
//! ```

use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};
use token_escrow_cli::{ClientConfig, EscrowClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "token_escrow_cli")]
#[command(about = "Ledger client for the token escrow program")]
struct Args {
    /// Path to client configuration file (default: config/escrow_client.toml or ESCROW_CLIENT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// RPC endpoint, overrides the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Escrow program id, overrides the config file
    #[arg(long)]
    program_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Allocate a record account and lock the holding account into a new escrow
    Initialize {
        /// Fee payer keypair file (defaults to the initializer)
        #[arg(long)]
        payer: Option<String>,
        /// Initializer keypair file
        #[arg(long)]
        initializer: String,
        /// Funded token account to lock
        #[arg(long)]
        holding: String,
        /// Initializer's token account that receives the taker's payment
        #[arg(long)]
        receiving: String,
        /// Amount the taker must pay
        #[arg(long)]
        amount: u64,
    },
    /// Complete an escrow as the taker
    Exchange {
        /// Fee payer keypair file (defaults to the taker)
        #[arg(long)]
        payer: Option<String>,
        /// Taker keypair file
        #[arg(long)]
        taker: String,
        /// Escrow record account
        #[arg(long)]
        record: String,
        /// Taker's token account that pays the initializer
        #[arg(long)]
        sending: String,
        /// Taker's token account that receives the held tokens
        #[arg(long)]
        receiving: String,
        /// Declared amount (defaults to the record's expected amount)
        #[arg(long)]
        amount: Option<u64>,
    },
    /// Print an escrow record
    GetEscrow {
        #[arg(long)]
        record: String,
    },
    /// Print an SPL token account balance
    GetTokenBalance {
        #[arg(long)]
        token_account: String,
    },
    /// Print the program-derived holding authority
    Authority,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("[token_escrow_cli] Error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config(&args)?;
    info!("Using endpoint {} and program {}", config.endpoint, config.program_id);
    let client = EscrowClient::new(&config)?;

    match args.command {
        Command::Initialize {
            payer,
            initializer,
            holding,
            receiving,
            amount,
        } => {
            let initializer = read_keypair(&initializer)?;
            let payer = match payer {
                Some(path) => read_keypair(&path)?,
                None => initializer.insecure_clone(),
            };
            let (signature, record) = client.initialize(
                &payer,
                &initializer,
                parse_pubkey(&holding)?,
                parse_pubkey(&receiving)?,
                amount,
            )?;
            println!("Initialize signature: {signature}");
            println!("Escrow record: {record}");
        }
        Command::Exchange {
            payer,
            taker,
            record,
            sending,
            receiving,
            amount,
        } => {
            let taker = read_keypair(&taker)?;
            let payer = match payer {
                Some(path) => read_keypair(&path)?,
                None => taker.insecure_clone(),
            };
            let signature = client.exchange(
                &payer,
                &taker,
                parse_pubkey(&record)?,
                parse_pubkey(&sending)?,
                parse_pubkey(&receiving)?,
                amount,
            )?;
            println!("Exchange signature: {signature}");
        }
        Command::GetEscrow { record } => {
            let record = parse_pubkey(&record)?;
            let escrow = client.get_escrow(record)?;
            println!("Escrow record: {record}");
            println!("Initializer: {}", escrow.initializer);
            println!("Active: {}", escrow.is_initialized());
            println!("Holding account: {}", escrow.holding_account);
            println!("Receiving account: {}", escrow.receiving_account);
            println!("Expected amount: {}", escrow.expected_amount);
        }
        Command::GetTokenBalance { token_account } => {
            let token_account = parse_pubkey(&token_account)?;
            let balance = client.token_balance(token_account)?;
            println!("Token account: {token_account}");
            println!("Balance: {balance}");
        }
        Command::Authority => {
            println!("Program authority: {}", client.program_authority());
        }
    }
    Ok(())
}

/// Config file values with command line overrides. When both overrides are
/// given the file is optional.
fn load_config(args: &Args) -> Result<ClientConfig> {
    let config = match (&args.endpoint, &args.program_id, &args.config) {
        (Some(endpoint), Some(program_id), None) => {
            ClientConfig::new(endpoint.clone(), program_id.clone())
        }
        _ => ClientConfig::load_from_path(args.config.as_deref())?
            .with_overrides(args.endpoint.clone(), args.program_id.clone()),
    };
    config.validate()?;
    Ok(config)
}

fn read_keypair(path: &str) -> Result<Keypair> {
    read_keypair_file(path).map_err(|e| anyhow::anyhow!("Failed to read keypair {}: {}", path, e))
}

fn parse_pubkey(value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid pubkey '{}'", value))
}
