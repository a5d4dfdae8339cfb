use crate::core::utxo::SpendSelector;
use crate::crypto::hash::{Hash256, Hashable};
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Output index carried by the single input of a coinbase transaction.
pub const COINBASE_VOUT: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Hash256,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    /// Unlock token. Holds the spender's address, or the memo for a coinbase.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    /// Lock token: the address allowed to spend this output.
    pub pub_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// `None` only for the coinbase sentinel.
    pub txid: Option<Hash256>,
    pub vout: i64,
}

impl Transaction {
    /// Builds a transaction and assigns its content id.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            id: Hash256::zero(),
            inputs,
            outputs,
        };
        tx.id = tx.hash();
        tx
    }

    pub fn new_coinbase(address: &str, value: u64, message: &str) -> Self {
        let message = if message.is_empty() {
            format!("Coins to {}", address)
        } else {
            message.to_string()
        };

        let input = TxInput {
            previous_output: OutPoint::null(),
            signature: message,
        };
        let output = TxOutput {
            value,
            pub_key: address.to_string(),
        };

        Self::new(vec![input], vec![output])
    }

    /// Spends enough of `from`'s outputs to pay `amount` to `to`, returning any
    /// surplus to `from` as change.
    pub fn new_transfer<S>(from: &str, to: &str, amount: u64, selector: &S) -> Result<Self>
    where
        S: SpendSelector + ?Sized,
    {
        if amount == 0 {
            return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
        }
        if to.is_empty() {
            return Err(LedgerError::InvalidInput("recipient address is empty".to_string()));
        }

        let (accumulated, selected) = selector.select_spendable(from, amount)?;
        if accumulated < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }

        let inputs = selected
            .iter()
            .map(|utxo| TxInput {
                previous_output: OutPoint::new(utxo.txid, i64::from(utxo.vout)),
                signature: from.to_string(),
            })
            .collect();

        let mut outputs = vec![TxOutput {
            value: amount,
            pub_key: to.to_string(),
        }];

        if accumulated > amount {
            outputs.push(TxOutput {
                value: accumulated - amount,
                pub_key: from.to_string(),
            });
        }

        Ok(Self::new(inputs, outputs))
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    /// `None` if the outputs add up to more than `u64::MAX`.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |total, output| total.checked_add(output.value))
    }

    /// Canonical bytes of everything except `id`.
    fn id_preimage(&self) -> Vec<u8> {
        let mut data = Vec::new();

        data.extend_from_slice(&(self.inputs.len() as u32).to_le_bytes());
        for input in &self.inputs {
            match &input.previous_output.txid {
                Some(txid) => {
                    data.push(1);
                    data.extend_from_slice(txid.as_bytes());
                }
                None => data.push(0),
            }
            data.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            data.extend_from_slice(&(input.signature.len() as u32).to_le_bytes());
            data.extend_from_slice(input.signature.as_bytes());
        }

        data.extend_from_slice(&(self.outputs.len() as u32).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            data.extend_from_slice(&(output.pub_key.len() as u32).to_le_bytes());
            data.extend_from_slice(output.pub_key.as_bytes());
        }

        data
    }
}

impl Hashable for Transaction {
    fn hash(&self) -> Hash256 {
        Hash256::hash(&self.id_preimage())
    }
}

// Ownership is plain string equality between the token and the address. A real
// signature check would slot in behind these two methods.
impl TxInput {
    pub fn can_unlock(&self, address: &str) -> bool {
        self.signature == address
    }
}

impl TxOutput {
    pub fn can_be_unlocked(&self, address: &str) -> bool {
        self.pub_key == address
    }
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: i64) -> Self {
        Self { txid: Some(txid), vout }
    }

    pub fn null() -> Self {
        Self {
            txid: None,
            vout: COINBASE_VOUT,
        }
    }

    pub fn is_null(&self) -> bool {
        self.txid.is_none() && self.vout == COINBASE_VOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utxo::UtxoEntry;

    struct FixedSelector(Vec<UtxoEntry>);

    impl SpendSelector for FixedSelector {
        fn select_spendable(&self, _address: &str, amount: u64) -> Result<(u64, Vec<UtxoEntry>)> {
            let mut accumulated = 0;
            let mut selected = Vec::new();
            for utxo in &self.0 {
                accumulated += utxo.output.value;
                selected.push(utxo.clone());
                if accumulated > amount {
                    break;
                }
            }
            Ok((accumulated, selected))
        }
    }

    fn utxo(seed: &[u8], vout: u32, value: u64, owner: &str) -> UtxoEntry {
        UtxoEntry {
            txid: Hash256::hash(seed),
            vout,
            output: TxOutput {
                value,
                pub_key: owner.to_string(),
            },
        }
    }

    #[test]
    fn test_coinbase_transaction() {
        let tx = Transaction::new_coinbase("alice", 100, "Genesis block");

        assert!(tx.is_coinbase());
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.outputs[0].value, 100);
        assert!(tx.outputs[0].can_be_unlocked("alice"));
        assert_eq!(tx.id, tx.hash());
    }

    #[test]
    fn test_coinbase_default_message() {
        let tx = Transaction::new_coinbase("alice", 100, "");
        assert_eq!(tx.inputs[0].signature, "Coins to alice");
    }

    #[test]
    fn test_coinbase_near_misses() {
        let sentinel = TxInput {
            previous_output: OutPoint::null(),
            signature: "memo".to_string(),
        };
        let output = TxOutput {
            value: 1,
            pub_key: "alice".to_string(),
        };

        let two_inputs = Transaction::new(vec![sentinel.clone(), sentinel.clone()], vec![output.clone()]);
        assert!(!two_inputs.is_coinbase());

        let real_txid = TxInput {
            previous_output: OutPoint::new(Hash256::hash(b"prev"), COINBASE_VOUT),
            signature: "memo".to_string(),
        };
        assert!(!Transaction::new(vec![real_txid], vec![output.clone()]).is_coinbase());

        let zero_index = TxInput {
            previous_output: OutPoint { txid: None, vout: 0 },
            signature: "memo".to_string(),
        };
        assert!(!Transaction::new(vec![zero_index], vec![output.clone()]).is_coinbase());

        assert!(!Transaction::new(vec![], vec![output]).is_coinbase());
    }

    #[test]
    fn test_id_is_deterministic_and_content_bound() {
        let a = Transaction::new_coinbase("alice", 100, "memo");
        let b = Transaction::new_coinbase("alice", 100, "memo");
        let c = Transaction::new_coinbase("alice", 101, "memo");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_unlock_predicates() {
        let input = TxInput {
            previous_output: OutPoint::new(Hash256::zero(), 0),
            signature: "alice".to_string(),
        };
        assert!(input.can_unlock("alice"));
        assert!(!input.can_unlock("bob"));
    }

    #[test]
    fn test_transfer_with_change() -> Result<()> {
        let selector = FixedSelector(vec![utxo(b"a", 0, 60, "alice"), utxo(b"b", 1, 50, "alice")]);
        let tx = Transaction::new_transfer("alice", "bob", 70, &selector)?;

        assert_eq!(tx.inputs.len(), 2);
        assert_eq!(tx.inputs[1].previous_output, OutPoint::new(Hash256::hash(b"b"), 1));
        assert!(tx.inputs.iter().all(|input| input.can_unlock("alice")));

        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].value, 70);
        assert!(tx.outputs[0].can_be_unlocked("bob"));
        assert_eq!(tx.outputs[1].value, 40);
        assert!(tx.outputs[1].can_be_unlocked("alice"));
        assert_eq!(tx.id, tx.hash());
        Ok(())
    }

    #[test]
    fn test_transfer_exact_amount_has_no_change() -> Result<()> {
        let selector = FixedSelector(vec![utxo(b"a", 0, 30, "alice")]);
        let tx = Transaction::new_transfer("alice", "bob", 30, &selector)?;

        assert_eq!(tx.outputs.len(), 1);
        assert_eq!(tx.total_output_value(), Some(30));
        Ok(())
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let selector = FixedSelector(vec![utxo(b"a", 0, 30, "alice")]);
        let result = Transaction::new_transfer("alice", "bob", 31, &selector);

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { required: 31, available: 30 })
        ));
    }

    #[test]
    fn test_transfer_rejects_zero_amount() {
        let selector = FixedSelector(vec![]);
        let result = Transaction::new_transfer("alice", "bob", 0, &selector);
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }
}
