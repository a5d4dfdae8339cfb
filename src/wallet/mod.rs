//! Key-pair storage backing the `createwallet` and `listaddresses` commands

pub mod wallet;

pub use wallet::Wallets;
