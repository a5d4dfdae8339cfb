use crate::core::blockchain::Ledger;
use crate::core::transaction::TxOutput;
use crate::crypto::hash::Hash256;
use crate::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub txid: Hash256,
    pub vout: u32,
    pub output: TxOutput,
}

/// Source of spendable outputs for the transaction builder.
pub trait SpendSelector {
    /// Accumulates outputs owned by `address` until the total exceeds `amount`
    /// or the outputs run out. A shortfall is reported through the total, not
    /// as an error.
    fn select_spendable(&self, address: &str, amount: u64) -> Result<(u64, Vec<UtxoEntry>)>;
}

/// Unspent outputs recomputed from the chain on every query.
#[derive(Debug, Clone, Copy)]
pub struct UtxoSet<'a> {
    ledger: &'a Ledger,
}

impl<'a> UtxoSet<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Walks the chain tip to genesis. Inputs seen in later blocks mark the
    /// outputs they reference as spent before those outputs are reached.
    pub fn find_unspent_outputs(&self, address: &str) -> Result<Vec<UtxoEntry>> {
        let mut unspent = Vec::new();
        let mut spent: HashMap<Hash256, HashSet<i64>> = HashMap::new();

        for block in self.ledger.iter() {
            let block = block?;

            for tx in &block.transactions {
                let spent_here = spent.get(&tx.id);

                for (vout, output) in tx.outputs.iter().enumerate() {
                    let vout = vout as u32;
                    if spent_here.map_or(false, |indices| indices.contains(&i64::from(vout))) {
                        continue;
                    }

                    if output.can_be_unlocked(address) {
                        unspent.push(UtxoEntry {
                            txid: tx.id,
                            vout,
                            output: output.clone(),
                        });
                    }
                }

                if tx.is_coinbase() {
                    continue;
                }

                for input in &tx.inputs {
                    if !input.can_unlock(address) {
                        continue;
                    }
                    if let Some(txid) = input.previous_output.txid {
                        spent.entry(txid).or_default().insert(input.previous_output.vout);
                    }
                }
            }
        }

        Ok(unspent)
    }

    pub fn get_balance(&self, address: &str) -> Result<u64> {
        self.find_unspent_outputs(address)?
            .iter()
            .try_fold(0u64, |total, utxo| add_value(total, utxo.output.value, address))
    }
}

fn add_value(total: u64, value: u64, address: &str) -> Result<u64> {
    total.checked_add(value).ok_or_else(|| {
        LedgerError::ValueOverflow(format!("unspent outputs of {} exceed u64::MAX", address))
    })
}

impl SpendSelector for UtxoSet<'_> {
    fn select_spendable(&self, address: &str, amount: u64) -> Result<(u64, Vec<UtxoEntry>)> {
        let mut accumulated = 0u64;
        let mut selected = Vec::new();

        for utxo in self.find_unspent_outputs(address)? {
            accumulated = add_value(accumulated, utxo.output.value, address)?;
            selected.push(utxo);

            if accumulated > amount {
                break;
            }
        }

        Ok((accumulated, selected))
    }
}
