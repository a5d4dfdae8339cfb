use crate::core::Block;
use crate::crypto::hash::Hash256;
use crate::{LedgerError, Result};
use sled::transaction::TransactionResult;
use sled::{Db, Transactional, Tree};
use std::path::Path;
use std::sync::Arc;

// Database tree names
const TREE_BLOCKS: &str = "blocks";
const TREE_CHAIN_STATE: &str = "chain_state";

/// Key of the current tip inside the chain state tree.
const TIP_KEY: &[u8] = b"lh";

#[derive(Debug, Clone)]
pub struct Database {
    db: Arc<Db>,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to open database: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn get_tree(&self, tree_name: &str) -> Result<Tree> {
        self.db.open_tree(tree_name).map_err(|e| {
            LedgerError::StoreUnavailable(format!("Failed to open tree {}: {}", tree_name, e))
        })
    }

    /// Returns `None` when the store has never been initialised.
    pub fn get_tip(&self) -> Result<Option<Hash256>> {
        let state_tree = self.get_tree(TREE_CHAIN_STATE)?;

        match state_tree
            .get(TIP_KEY)
            .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to get tip: {}", e)))?
        {
            Some(bytes) => Hash256::from_slice(&bytes)
                .map(Some)
                .ok_or_else(|| {
                    LedgerError::MalformedBlock(format!("stored tip has {} bytes, expected 32", bytes.len()))
                }),
            None => Ok(None),
        }
    }

    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>> {
        let blocks_tree = self.get_tree(TREE_BLOCKS)?;

        match blocks_tree
            .get(hash.as_bytes())
            .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to get block: {}", e)))?
        {
            Some(data) => Ok(Some(Block::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// Writes `block` under its hash and moves the tip to it in one transaction.
    pub fn commit_block(&self, block: &Block) -> Result<()> {
        let blocks_tree = self.get_tree(TREE_BLOCKS)?;
        let state_tree = self.get_tree(TREE_CHAIN_STATE)?;

        let key: &[u8] = block.hash.as_bytes();
        let data = block.serialize()?;

        let result: TransactionResult<()> = (&blocks_tree, &state_tree).transaction(|(blocks, state)| {
            blocks.insert(key, data.as_slice())?;
            state.insert(TIP_KEY, key)?;
            Ok(())
        });
        result.map_err(|e| LedgerError::StoreUnavailable(format!("Failed to commit block: {:?}", e)))?;

        self.flush()?;

        log::debug!("💾 Saved block {} as new tip", block.hash);
        Ok(())
    }

    /// Overwrites raw bytes stored for `hash`, bypassing encoding.
    #[cfg(test)]
    pub(crate) fn put_raw_block(&self, hash: &Hash256, data: &[u8]) -> Result<()> {
        self.get_tree(TREE_BLOCKS)?.insert(hash.as_bytes(), data)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn put_raw_tip(&self, data: &[u8]) -> Result<()> {
        self.get_tree(TREE_CHAIN_STATE)?.insert(TIP_KEY, data)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| LedgerError::StoreUnavailable(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}
