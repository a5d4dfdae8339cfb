use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub mining: MiningConfig,
    pub consensus: ConsensusConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub db_name: String,
    pub wallet_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Required leading zero bits of a block hash.
    pub difficulty: u32,
    /// Last nonce tried before mining gives up.
    pub max_nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub coinbase_reward: u64,
    pub genesis_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_data_dir(Self::default_data_dir())
    }
}

impl Config {
    pub fn for_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
                db_name: "blocks".to_string(),
                wallet_file: "wallets.json".to_string(),
            },
            mining: MiningConfig {
                difficulty: 24,
                max_nonce: i64::MAX as u64,
            },
            consensus: ConsensusConfig {
                coinbase_reward: 100,
                genesis_message: "First transaction from Genesis".to_string(),
            },
        }
    }

    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.mining.difficulty = difficulty;
        self
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.db_name)
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.wallet_file)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mining.difficulty == 0 || self.mining.difficulty >= 256 {
            return Err(LedgerError::Config(format!(
                "difficulty must be between 1 and 255, got {}",
                self.mining.difficulty
            )));
        }

        if self.consensus.coinbase_reward == 0 {
            return Err(LedgerError::Config("coinbase reward must be positive".to_string()));
        }

        Ok(())
    }

    /// Loads `config.json` from `data_dir`, writing the defaults there on first use.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let mut config: Config = serde_json::from_str(&content)?;
            config.storage.data_dir = data_dir.to_path_buf();
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::for_data_dir(data_dir);
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(self.storage.data_dir.join(CONFIG_FILE), content)?;

        Ok(())
    }

    pub fn default_data_dir() -> PathBuf {
        let home_dir = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home_dir).join(".powledger")
    }
}
