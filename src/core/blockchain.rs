use crate::config::Config;
use crate::core::utxo::UtxoSet;
use crate::core::{Block, Transaction};
use crate::crypto::hash::Hash256;
use crate::mining::ProofOfWork;
use crate::storage::Database;
use crate::{LedgerError, Result};
use std::iter::FusedIterator;

/// Handle on a persisted chain. Appends go through `&mut self`, so a single
/// handle is the single writer.
#[derive(Debug)]
pub struct Ledger {
    tip: Hash256,
    db: Database,
    pow: ProofOfWork,
}

impl Ledger {
    /// Loads the chain in `config`'s data directory, mining a genesis block
    /// that pays `reward_address` if the store is empty. An existing chain is
    /// returned as is.
    pub fn open_or_create(config: &Config, reward_address: &str) -> Result<Self> {
        let (db, pow) = Self::open_store(config)?;

        match db.get_tip()? {
            Some(tip) => {
                log::debug!("Loaded existing chain at tip {}", tip);
                Ok(Self { tip, db, pow })
            }
            None => Self::init_genesis(config, db, pow, reward_address),
        }
    }

    /// Like `open_or_create`, but fails if a chain already exists.
    pub fn create(config: &Config, reward_address: &str) -> Result<Self> {
        let (db, pow) = Self::open_store(config)?;

        if db.get_tip()?.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        Self::init_genesis(config, db, pow, reward_address)
    }

    /// Loads an existing chain, failing if none has been created.
    pub fn open(config: &Config) -> Result<Self> {
        let (db, pow) = Self::open_store(config)?;
        let tip = db.get_tip()?.ok_or(LedgerError::NotInitialized)?;

        Ok(Self { tip, db, pow })
    }

    fn open_store(config: &Config) -> Result<(Database, ProofOfWork)> {
        config.validate()?;
        let pow = ProofOfWork::from_config(&config.mining)?;

        std::fs::create_dir_all(&config.storage.data_dir)?;
        let db = Database::new(config.db_path())?;

        Ok((db, pow))
    }

    fn init_genesis(config: &Config, db: Database, pow: ProofOfWork, reward_address: &str) -> Result<Self> {
        if reward_address.is_empty() {
            return Err(LedgerError::InvalidInput("reward address is empty".to_string()));
        }

        let coinbase = Transaction::new_coinbase(
            reward_address,
            config.consensus.coinbase_reward,
            &config.consensus.genesis_message,
        );
        let genesis = Block::create_genesis(coinbase, &pow)?;
        db.commit_block(&genesis)?;

        log::info!("🌱 Genesis block {} created", genesis.hash);
        Ok(Self {
            tip: genesis.hash,
            db,
            pow,
        })
    }

    pub fn tip(&self) -> Hash256 {
        self.tip
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    /// Mines `transactions` into a block on the current tip, stores it, and
    /// makes it the new tip.
    pub fn append(&mut self, transactions: Vec<Transaction>) -> Result<Block> {
        let block = Block::create(transactions, Some(self.tip), &self.pow)?;
        self.db.commit_block(&block)?;
        self.tip = block.hash;

        log::info!("✅ Block {} added to chain", block.hash);
        Ok(block)
    }

    /// Builds a transfer from `from`'s unspent outputs and appends it in its
    /// own block. Nothing is written when funds are short.
    pub fn send(&mut self, from: &str, to: &str, amount: u64) -> Result<Block> {
        let tx = Transaction::new_transfer(from, to, amount, &UtxoSet::new(self))?;
        self.append(vec![tx])
    }

    pub fn balance(&self, address: &str) -> Result<u64> {
        UtxoSet::new(self).get_balance(address)
    }

    /// Blocks from the tip captured now back to genesis.
    pub fn iter(&self) -> BlockIterator<'_> {
        BlockIterator {
            current: Some(self.tip),
            db: &self.db,
        }
    }

    pub fn find_transaction(&self, id: &Hash256) -> Result<Option<Transaction>> {
        for block in self.iter() {
            if let Some(tx) = block?.transactions.into_iter().find(|tx| &tx.id == id) {
                return Ok(Some(tx));
            }
        }
        Ok(None)
    }

    /// Checks every block's proof of work back to genesis and returns the
    /// chain length. Genesis must open with its coinbase.
    pub fn verify_chain(&self) -> Result<usize> {
        let mut count = 0;

        for block in self.iter() {
            let block = block?;
            if !self.pow.validate(&block) {
                return Err(LedgerError::MalformedBlock(format!(
                    "block {} fails proof of work",
                    block.hash
                )));
            }
            if block.is_genesis() && block.get_coinbase_transaction().is_none() {
                return Err(LedgerError::MalformedBlock(format!(
                    "genesis block {} has no coinbase",
                    block.hash
                )));
            }
            count += 1;
        }

        Ok(count)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = Result<Block>;
    type IntoIter = BlockIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy tip-to-genesis walk holding only the next hash to fetch. Stops after
/// genesis, or after yielding the first error.
#[derive(Debug)]
pub struct BlockIterator<'a> {
    current: Option<Hash256>,
    db: &'a Database,
}

impl Iterator for BlockIterator<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current.take()?;

        let block = match self.db.get_block(&hash) {
            Ok(Some(block)) => block,
            Ok(None) => return Some(Err(LedgerError::BlockNotFound(hash))),
            Err(e) => return Some(Err(e)),
        };

        if block.hash != hash {
            return Some(Err(LedgerError::MalformedBlock(format!(
                "block stored under {} reports hash {}",
                hash, block.hash
            ))));
        }

        self.current = block.prev_hash;
        Some(Ok(block))
    }
}

impl FusedIterator for BlockIterator<'_> {}
