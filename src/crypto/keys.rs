use crate::crypto::hash::{Hash160, Hash256};
use crate::{LedgerError, Result};
use rand::{rngs::OsRng, RngCore};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

const ADDRESS_VERSION: u8 = 0x00;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Result<Self> {
        let mut secret_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut secret_bytes);
        Self::from_secret_bytes(&secret_bytes)
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| LedgerError::Crypto(format!("Invalid private key: {}", e)))?;

        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self { secret_key, public_key })
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }

    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    /// Base58Check of the version byte and the public key's hash160.
    pub fn address(&self) -> String {
        let hash160 = Hash160::hash_sha256(&self.public_key_bytes());

        let mut data = Vec::with_capacity(1 + 20 + CHECKSUM_LEN);
        data.push(ADDRESS_VERSION);
        data.extend_from_slice(hash160.as_bytes());

        let checksum = Hash256::double_hash(&data);
        data.extend_from_slice(&checksum.as_bytes()[..CHECKSUM_LEN]);

        bs58::encode(data).into_string()
    }
}

pub fn is_valid_address(address: &str) -> bool {
    let decoded = match bs58::decode(address).into_vec() {
        Ok(decoded) => decoded,
        Err(_) => return false,
    };

    if decoded.len() != 1 + 20 + CHECKSUM_LEN || decoded[0] != ADDRESS_VERSION {
        return false;
    }

    let (payload, checksum) = decoded.split_at(1 + 20);
    &Hash256::double_hash(payload).as_bytes()[..CHECKSUM_LEN] == checksum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_address_is_valid() -> Result<()> {
        let keypair = KeyPair::generate()?;
        let address = keypair.address();

        assert!(is_valid_address(&address));
        assert!(!is_valid_address("invalid"));

        Ok(())
    }

    #[test]
    fn test_secret_roundtrip_keeps_address() -> Result<()> {
        let keypair = KeyPair::generate()?;
        let restored = KeyPair::from_secret_bytes(&keypair.secret_bytes())?;

        assert_eq!(keypair.address(), restored.address());
        Ok(())
    }

    #[test]
    fn test_rejects_corrupted_checksum() -> Result<()> {
        let address = KeyPair::generate()?.address();
        let mut decoded = bs58::decode(&address).into_vec().unwrap();
        let last = decoded.len() - 1;
        decoded[last] ^= 0x01;

        assert!(!is_valid_address(&bs58::encode(decoded).into_string()));
        Ok(())
    }
}
