use crate::core::Transaction;
use crate::crypto::hash::Hash256;
use crate::mining::ProofOfWork;
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub hash: Hash256,
    pub transactions: Vec<Transaction>,
    /// `None` marks the genesis block.
    pub prev_hash: Option<Hash256>,
    pub nonce: u64,
}

impl Block {
    /// Mines a new block on top of `prev_hash`. This is the only way blocks
    /// get their `hash` and `nonce`.
    pub fn create(
        transactions: Vec<Transaction>,
        prev_hash: Option<Hash256>,
        pow: &ProofOfWork,
    ) -> Result<Self> {
        if transactions.is_empty() {
            return Err(LedgerError::InvalidInput(
                "a block needs at least one transaction".to_string(),
            ));
        }

        let mut block = Self {
            hash: Hash256::zero(),
            transactions,
            prev_hash,
            nonce: 0,
        };

        let (nonce, hash) = pow.mine(&block)?;
        block.nonce = nonce;
        block.hash = hash;

        Ok(block)
    }

    pub fn create_genesis(coinbase: Transaction, pow: &ProofOfWork) -> Result<Self> {
        Self::create(vec![coinbase], None, pow)
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_none()
    }

    pub fn prev_hash_bytes(&self) -> &[u8] {
        match &self.prev_hash {
            Some(hash) => &hash.as_bytes()[..],
            None => &[],
        }
    }

    /// SHA-256 over the concatenated transaction ids, in block order.
    pub fn hash_transactions(&self) -> Hash256 {
        let ids: Vec<u8> = self
            .transactions
            .iter()
            .flat_map(|tx| tx.id.as_bytes().iter().copied())
            .collect();
        Hash256::hash(&ids)
    }

    pub fn get_coinbase_transaction(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| LedgerError::MalformedBlock(format!("Failed to serialize block: {}", e)))
    }

    /// Decodes stored bytes. Proof-of-work is not checked here.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| LedgerError::MalformedBlock(format!("Failed to deserialize block: {}", e)))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hash: {}", self.hash)?;
        match &self.prev_hash {
            Some(prev) => writeln!(f, "Previous hash: {}", prev)?,
            None => writeln!(f, "Previous hash: (genesis)")?,
        }
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Transactions: {}", self.transactions.len())?;

        for tx in &self.transactions {
            writeln!(f, "  Transaction {}{}", tx.id, if tx.is_coinbase() { " (coinbase)" } else { "" })?;
            for input in &tx.inputs {
                match &input.previous_output.txid {
                    Some(txid) => writeln!(f, "    in  {}:{} from {}", txid, input.previous_output.vout, input.signature)?,
                    None => writeln!(f, "    in  {}", input.signature)?,
                }
            }
            for (vout, output) in tx.outputs.iter().enumerate() {
                writeln!(f, "    out {}: {} to {}", vout, output.value, output.pub_key)?;
            }
        }

        Ok(())
    }
}
