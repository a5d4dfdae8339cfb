//! PoW Ledger - a single-node proof-of-work blockchain
//!
//! This library implements:
//! - Blocks chained by hash and gated by a fixed-difficulty proof of work
//! - A UTXO transaction model with coinbase issuance
//! - Persistent chain storage on sled with tip-to-genesis traversal
//! - Balance queries and spend selection by scanning the chain
//! - Key-pair wallets and a command-line interface

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod error;
pub mod mining;
pub mod storage;
pub mod wallet;

pub use error::{LedgerError, Result};
