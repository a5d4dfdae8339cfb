//! Core ledger components

pub mod block;
pub mod blockchain;
pub mod transaction;
pub mod utxo;

pub use block::Block;
pub use blockchain::{BlockIterator, Ledger};
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput};
pub use utxo::{SpendSelector, UtxoEntry, UtxoSet};
