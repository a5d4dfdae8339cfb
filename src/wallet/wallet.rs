use crate::crypto::keys::KeyPair;
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WalletAddress {
    private_key: String,
    public_key: String,
}

/// Key pairs indexed by address, persisted as a JSON file.
#[derive(Debug)]
pub struct Wallets {
    path: PathBuf,
    keys: BTreeMap<String, KeyPair>,
}

impl Wallets {
    /// Reads the wallet file at `path`, or starts empty if it does not exist.
    pub fn load_or_default<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            return Ok(Self {
                path,
                keys: BTreeMap::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let stored: BTreeMap<String, WalletAddress> = serde_json::from_str(&content)?;

        let mut keys = BTreeMap::new();
        for (address, entry) in stored {
            let secret = hex::decode(&entry.private_key)
                .map_err(|e| LedgerError::Wallet(format!("Invalid key for {}: {}", address, e)))?;
            let keypair = KeyPair::from_secret_bytes(&secret)?;

            if keypair.address() != address {
                return Err(LedgerError::Wallet(format!("Key does not match address {}", address)));
            }
            keys.insert(address, keypair);
        }

        Ok(Self { path, keys })
    }

    pub fn add_wallet(&mut self) -> Result<String> {
        let keypair = KeyPair::generate()?;
        let address = keypair.address();
        self.keys.insert(address.clone(), keypair);
        Ok(address)
    }

    pub fn get(&self, address: &str) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stored: BTreeMap<&String, WalletAddress> = self
            .keys
            .iter()
            .map(|(address, keypair)| {
                (
                    address,
                    WalletAddress {
                        private_key: hex::encode(keypair.secret_bytes()),
                        public_key: hex::encode(keypair.public_key_bytes()),
                    },
                )
            })
            .collect();

        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        log::debug!("💾 Saved {} wallet(s) to {}", self.keys.len(), self.path.display());
        Ok(())
    }
}
