use crate::config::MiningConfig;
use crate::core::Block;
use crate::crypto::hash::{Hash256, Hashable};
use crate::{LedgerError, Result};
use std::time::Instant;

/// Fixed-difficulty hashcash puzzle. A block is valid when
/// `sha256(prev_hash || tx_digest || nonce || difficulty)`, read as a 256-bit
/// big-endian integer, is below `1 << (256 - difficulty)`.
#[derive(Debug, Clone)]
pub struct ProofOfWork {
    difficulty: u32,
    max_nonce: u64,
    target: Hash256,
}

impl ProofOfWork {
    pub fn new(difficulty: u32, max_nonce: u64) -> Result<Self> {
        if difficulty == 0 || difficulty >= 256 {
            return Err(LedgerError::Config(format!(
                "difficulty must be between 1 and 255, got {}",
                difficulty
            )));
        }

        Ok(Self {
            difficulty,
            max_nonce,
            target: Self::difficulty_to_target(difficulty),
        })
    }

    pub fn from_config(config: &MiningConfig) -> Result<Self> {
        Self::new(config.difficulty, config.max_nonce)
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target(&self) -> &Hash256 {
        &self.target
    }

    /// `1 << (256 - difficulty)` as 32 big-endian bytes.
    fn difficulty_to_target(difficulty: u32) -> Hash256 {
        let bit = (256 - difficulty) as usize;
        let mut target = [0u8; 32];
        target[31 - bit / 8] = 1 << (bit % 8);
        Hash256::new(target)
    }

    pub fn candidate_digest(&self, block: &Block, nonce: u64) -> Vec<u8> {
        let prev_hash = block.prev_hash_bytes();
        let tx_digest = block.hash_transactions();

        let mut data = Vec::with_capacity(prev_hash.len() + 32 + 16);
        data.extend_from_slice(prev_hash);
        data.extend_from_slice(tx_digest.as_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());
        data.extend_from_slice(&u64::from(self.difficulty).to_be_bytes());
        data
    }

    fn meets_target(&self, hash: &Hash256) -> bool {
        *hash < self.target
    }

    /// Searches nonces from zero upward and returns the first one whose hash
    /// meets the target. Fails once `max_nonce` has been tried.
    pub fn mine(&self, block: &Block) -> Result<(u64, Hash256)> {
        let started = Instant::now();
        log::debug!("⛏️  Mining block at difficulty {}", self.difficulty);

        for nonce in 0..=self.max_nonce {
            let hash = Hash256::hash(&self.candidate_digest(block, nonce));
            if self.meets_target(&hash) {
                log::debug!(
                    "Found nonce {} in {:.2}s: {}",
                    nonce,
                    started.elapsed().as_secs_f64(),
                    hash
                );
                return Ok((nonce, hash));
            }
        }

        Err(LedgerError::Mining(format!(
            "no nonce up to {} meets difficulty {}",
            self.max_nonce, self.difficulty
        )))
    }

    /// Recomputes the block's proof from its own fields. The transaction
    /// digest covers ids only, so each id must also match its content.
    pub fn validate(&self, block: &Block) -> bool {
        if block.transactions.iter().any(|tx| tx.id != tx.hash()) {
            return false;
        }

        let hash = Hash256::hash(&self.candidate_digest(block, block.nonce));
        hash == block.hash && self.meets_target(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transaction;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(8, u64::MAX).unwrap()
    }

    fn mined_block() -> Block {
        let coinbase = Transaction::new_coinbase("alice", 100, "test");
        Block::create(vec![coinbase], None, &pow()).unwrap()
    }

    #[test]
    fn test_target_has_single_bit() {
        let target = ProofOfWork::difficulty_to_target(1);
        assert_eq!(target.as_bytes()[0], 0x80);

        let target = ProofOfWork::difficulty_to_target(24);
        assert_eq!(&target.as_bytes()[..4], &[0, 0, 1, 0]);
        assert!(target.as_bytes()[4..].iter().all(|b| *b == 0));

        let target = ProofOfWork::difficulty_to_target(255);
        assert_eq!(target.as_bytes()[31], 0x02);
    }

    #[test]
    fn test_rejects_invalid_difficulty() {
        assert!(ProofOfWork::new(0, 10).is_err());
        assert!(ProofOfWork::new(256, 10).is_err());
    }

    #[test]
    fn test_mined_hash_meets_target() {
        let block = mined_block();
        let pow = pow();

        assert!(block.hash < *pow.target());
        assert_eq!(block.hash.as_bytes()[0], 0);
        assert!(pow.validate(&block));
    }

    #[test]
    fn test_digest_layout() {
        let block = mined_block();
        let digest = pow().candidate_digest(&block, 7);

        // Genesis has no prev hash: 32 digest bytes, then nonce and difficulty.
        assert_eq!(digest.len(), 32 + 8 + 8);
        assert_eq!(&digest[32..40], &7u64.to_be_bytes());
        assert_eq!(&digest[40..48], &8u64.to_be_bytes());
    }

    #[test]
    fn test_tampered_blocks_fail_validation() {
        let pow = pow();
        let block = mined_block();

        let mut nonce_flipped = block.clone();
        nonce_flipped.nonce ^= 1;
        assert!(!pow.validate(&nonce_flipped));

        let mut prev_flipped = block.clone();
        prev_flipped.prev_hash = Some(Hash256::hash(b"other"));
        assert!(!pow.validate(&prev_flipped));

        let mut tx_flipped = block.clone();
        tx_flipped.transactions[0].outputs[0].value ^= 1;
        tx_flipped.transactions[0].id = tx_flipped.transactions[0].hash();
        assert!(!pow.validate(&tx_flipped));
    }

    #[test]
    fn test_content_change_under_stale_id_fails_validation() {
        let pow = pow();
        let coinbase = Transaction::new_coinbase("alice", 100, "test");
        let genesis = Block::create(vec![coinbase.clone()], None, &pow).unwrap();
        let transfer = Transaction::new(
            vec![crate::core::TxInput {
                previous_output: crate::core::OutPoint::new(coinbase.id, 0),
                signature: "alice".to_string(),
            }],
            vec![crate::core::TxOutput { value: 30, pub_key: "bob".to_string() }],
        );
        let block = Block::create(vec![transfer], Some(genesis.hash), &pow).unwrap();
        assert!(pow.validate(&block));

        // The id, and so the digest, stays the same while the payee changes.
        let mut tampered = block.clone();
        tampered.transactions[0].outputs[0].value = 1_000;
        tampered.transactions[0].outputs[0].pub_key = "mallory".to_string();
        assert_eq!(tampered.hash_transactions(), block.hash_transactions());
        assert!(!pow.validate(&tampered));
    }

    #[test]
    fn test_validation_depends_on_difficulty() {
        let block = mined_block();
        let harder = ProofOfWork::new(9, u64::MAX).unwrap();

        // Difficulty is part of the digest, so the same nonce does not carry over.
        assert!(!harder.validate(&block));
    }

    #[test]
    fn test_exhausted_nonce_range() {
        let coinbase = Transaction::new_coinbase("alice", 100, "test");
        let pow = ProofOfWork::new(255, 3).unwrap();

        let result = Block::create(vec![coinbase], None, &pow);
        assert!(matches!(result, Err(LedgerError::Mining(_))));
    }
}
