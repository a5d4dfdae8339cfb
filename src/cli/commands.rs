use crate::config::Config;
use crate::core::Ledger;
use crate::crypto::keys::is_valid_address;
use crate::wallet::Wallets;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "powledger")]
#[command(about = "Single-node proof-of-work ledger with a UTXO transaction model")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Data directory")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable debug logging")]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a blockchain and send the genesis reward to ADDRESS
    #[command(name = "createblockchain")]
    CreateBlockchain {
        #[arg(long)]
        address: String,
    },

    /// Get the balance of ADDRESS
    #[command(name = "getbalance")]
    GetBalance {
        #[arg(long)]
        address: String,
    },

    /// Send AMOUNT from one address to another in a new block
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        amount: u64,
    },

    /// Print every block from the tip back to genesis
    #[command(name = "printchain")]
    PrintChain,

    /// Create a new key pair and print its address
    #[command(name = "createwallet")]
    CreateWallet,

    /// List the addresses in the wallet file
    #[command(name = "listaddresses")]
    ListAddresses,
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging once
    let default_filter = if cli.debug { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .try_init();

    let data_dir = cli.data_dir.unwrap_or_else(Config::default_data_dir);
    let config = Config::load(&data_dir)
        .with_context(|| format!("loading configuration from {}", data_dir.display()))?;

    match cli.command {
        Commands::CreateBlockchain { address } => create_blockchain(&config, &address),
        Commands::GetBalance { address } => get_balance(&config, &address),
        Commands::Send { from, to, amount } => send(&config, &from, &to, amount),
        Commands::PrintChain => print_chain(&config),
        Commands::CreateWallet => create_wallet(&config),
        Commands::ListAddresses => list_addresses(&config),
    }
}

fn warn_if_not_wallet_address(address: &str) {
    if !is_valid_address(address) {
        log::warn!("{} is not a wallet address; it will be used as a plain token", address);
    }
}

fn create_blockchain(config: &Config, address: &str) -> anyhow::Result<()> {
    warn_if_not_wallet_address(address);

    let ledger = Ledger::create(config, address)?;
    println!("Genesis block: {}", ledger.tip());
    println!("Finished creating chain");
    Ok(())
}

fn get_balance(config: &Config, address: &str) -> anyhow::Result<()> {
    let ledger = Ledger::open(config)?;
    let balance = ledger.balance(address)?;

    println!("Balance of {}: {}", address, balance);
    Ok(())
}

fn send(config: &Config, from: &str, to: &str, amount: u64) -> anyhow::Result<()> {
    warn_if_not_wallet_address(to);

    let mut ledger = Ledger::open(config)?;
    let block = ledger.send(from, to, amount)?;

    println!("Sent {} from {} to {}", amount, from, to);
    println!("New block: {}", block.hash);
    Ok(())
}

fn print_chain(config: &Config) -> anyhow::Result<()> {
    let ledger = Ledger::open(config)?;
    let pow = ledger.proof_of_work();

    for block in ledger.iter() {
        let block = block?;
        let valid = pow.validate(&block);
        if !valid {
            log::warn!("Block {} fails proof of work", block.hash);
        }

        print!("{}", block);
        println!("PoW: {}", valid);
        println!();
    }

    Ok(())
}

fn create_wallet(config: &Config) -> anyhow::Result<()> {
    let mut wallets = Wallets::load_or_default(config.wallet_path())?;
    let address = wallets.add_wallet()?;
    wallets.save()?;

    println!("New address is {}", address);
    Ok(())
}

fn list_addresses(config: &Config) -> anyhow::Result<()> {
    let wallets = Wallets::load_or_default(config.wallet_path())?;

    for address in wallets.addresses() {
        println!("{}", address);
    }
    Ok(())
}
