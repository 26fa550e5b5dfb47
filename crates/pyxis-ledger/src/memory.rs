//! In-memory ledger.
//!
//! Single-node backend where submission and confirmation coincide. Spent
//! outputs are tracked per outpoint; the second spend of any outpoint is
//! rejected with [`LedgerError::AlreadySpent`], which is what serializes
//! concurrent baton spends.

use std::collections::HashMap;

use pyxis_types::TxId;
use tracing::debug;

use crate::tx::{Outpoint, Owner, Transaction, TxOut};
use crate::{Ledger, LedgerError, Result};

/// In-memory [`Ledger`] implementation.
pub struct MemoryLedger {
    min_fee: u64,
    txs: HashMap<TxId, Transaction>,
    order: Vec<TxId>,
    /// outpoint -> txid of the spender.
    spent: HashMap<Outpoint, TxId>,
    faucet_counter: u64,
}

impl MemoryLedger {
    /// Create an empty ledger with the given minimum relay fee.
    pub fn new(min_fee: u64) -> Self {
        Self {
            min_fee,
            txs: HashMap::new(),
            order: Vec::new(),
            spent: HashMap::new(),
            faucet_counter: 0,
        }
    }

    /// Mint a spendable output out of thin air (genesis/testing faucet).
    ///
    /// The synthetic transaction has no inputs and a unique id derived
    /// from a counter, so repeated grants never collide.
    pub fn fund(&mut self, owner: Owner, value: u64) -> (Outpoint, TxOut) {
        self.faucet_counter += 1;
        let mut seed = [0u8; 40];
        seed[..32].copy_from_slice(b"pyxis-faucet-output-derivation!!");
        seed[32..].copy_from_slice(&self.faucet_counter.to_le_bytes());
        let txid = *blake3::hash(&seed).as_bytes();

        let out = TxOut { value, owner };
        let tx = Transaction {
            inputs: Vec::new(),
            outputs: vec![out.clone()],
            commit: None,
        };
        self.txs.insert(txid, tx);
        self.order.push(txid);
        debug!(txid = %hex::encode(txid), value, "faucet output minted");
        (Outpoint { txid, vout: 0 }, out)
    }

    /// Record an already-confirmed transaction without validation.
    ///
    /// Used when replaying a persisted ledger: spentness is reconstructed
    /// from the inputs, trusting the stored confirmation order.
    pub fn apply_confirmed(&mut self, txid: TxId, tx: Transaction) {
        for input in &tx.inputs {
            self.spent.insert(*input, txid);
        }
        self.txs.insert(txid, tx);
        self.order.push(txid);
    }

    fn validate(&self, tx: &Transaction) -> Result<()> {
        if tx.inputs.is_empty() {
            return Err(LedgerError::Malformed("no inputs"));
        }
        if tx.outputs.is_empty() {
            return Err(LedgerError::Malformed("no outputs"));
        }

        let mut input_value: u64 = 0;
        for input in &tx.inputs {
            let referenced = self
                .output(input)
                .ok_or(LedgerError::UnknownInput(*input))?;
            if self.spent.contains_key(input) {
                return Err(LedgerError::AlreadySpent(*input));
            }
            input_value = input_value
                .checked_add(referenced.value)
                .ok_or(LedgerError::ValueOverflow)?;
        }

        let mut output_value: u64 = 0;
        for output in &tx.outputs {
            output_value = output_value
                .checked_add(output.value)
                .ok_or(LedgerError::ValueOverflow)?;
        }

        if output_value > input_value {
            return Err(LedgerError::InsufficientValue(output_value - input_value));
        }
        let fee = input_value - output_value;
        if fee < self.min_fee {
            return Err(LedgerError::FeeTooLow {
                fee,
                min: self.min_fee,
            });
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn min_fee(&self) -> u64 {
        self.min_fee
    }

    fn submit(&mut self, tx: Transaction) -> Result<TxId> {
        let txid = tx.txid()?;
        if self.txs.contains_key(&txid) {
            // Idempotent retry of an already-confirmed transaction.
            return Ok(txid);
        }
        self.validate(&tx)?;
        for input in &tx.inputs {
            self.spent.insert(*input, txid);
        }
        self.txs.insert(txid, tx);
        self.order.push(txid);
        debug!(txid = %hex::encode(txid), "transaction confirmed");
        Ok(txid)
    }

    fn transaction(&self, txid: &TxId) -> Option<&Transaction> {
        self.txs.get(txid)
    }

    fn is_unspent(&self, outpoint: &Outpoint) -> bool {
        self.output(outpoint).is_some() && !self.spent.contains_key(outpoint)
    }

    fn unspent_outputs(&self) -> Vec<(Outpoint, TxOut)> {
        let mut result = Vec::new();
        for txid in &self.order {
            let Some(tx) = self.txs.get(txid) else {
                continue;
            };
            for (vout, out) in tx.outputs.iter().enumerate() {
                let outpoint = Outpoint {
                    txid: *txid,
                    vout: vout as u32,
                };
                if !self.spent.contains_key(&outpoint) {
                    result.push((outpoint, out.clone()));
                }
            }
        }
        result
    }

    fn confirmed(&self) -> Vec<(TxId, &Transaction)> {
        self.order
            .iter()
            .filter_map(|txid| self.txs.get(txid).map(|tx| (*txid, tx)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEE: u64 = 1_000;

    fn key(b: u8) -> Owner {
        Owner::Key([b; 32])
    }

    fn spend_to(input: Outpoint, value: u64, owner: Owner) -> Transaction {
        Transaction {
            inputs: vec![input],
            outputs: vec![TxOut { value, owner }],
            commit: None,
        }
    }

    #[test]
    fn test_fund_and_spend() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, out) = ledger.fund(key(1), 10_000);
        assert_eq!(out.value, 10_000);
        assert!(ledger.is_unspent(&outpoint));

        let txid = ledger
            .submit(spend_to(outpoint, 9_000, key(2)))
            .expect("spend");
        assert!(!ledger.is_unspent(&outpoint));
        assert!(ledger.is_unspent(&Outpoint { txid, vout: 0 }));
    }

    #[test]
    fn test_double_spend_rejected() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, _) = ledger.fund(key(1), 10_000);

        ledger
            .submit(spend_to(outpoint, 9_000, key(2)))
            .expect("first spend");
        let err = ledger
            .submit(spend_to(outpoint, 9_000, key(3)))
            .expect_err("second spend must fail");
        assert!(matches!(err, LedgerError::AlreadySpent(o) if o == outpoint));
    }

    #[test]
    fn test_idempotent_resubmit() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, _) = ledger.fund(key(1), 10_000);
        let tx = spend_to(outpoint, 9_000, key(2));

        let first = ledger.submit(tx.clone()).expect("first");
        let second = ledger.submit(tx).expect("retry");
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_input_rejected() {
        let mut ledger = MemoryLedger::new(FEE);
        let bogus = Outpoint {
            txid: [9u8; 32],
            vout: 0,
        };
        let err = ledger
            .submit(spend_to(bogus, 1_000, key(1)))
            .expect_err("unknown input");
        assert!(matches!(err, LedgerError::UnknownInput(_)));
    }

    #[test]
    fn test_fee_enforced() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, _) = ledger.fund(key(1), 10_000);
        // Outputs equal inputs: fee of zero.
        let err = ledger
            .submit(spend_to(outpoint, 10_000, key(2)))
            .expect_err("zero fee");
        assert!(matches!(err, LedgerError::FeeTooLow { fee: 0, min: FEE }));
    }

    #[test]
    fn test_outputs_exceeding_inputs_rejected() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, _) = ledger.fund(key(1), 10_000);
        let err = ledger
            .submit(spend_to(outpoint, 20_000, key(2)))
            .expect_err("overspend");
        assert!(matches!(err, LedgerError::InsufficientValue(10_000)));
    }

    #[test]
    fn test_repeated_fund_distinct_outpoints() {
        let mut ledger = MemoryLedger::new(FEE);
        let (a, _) = ledger.fund(key(1), 5_000);
        let (b, _) = ledger.fund(key(1), 5_000);
        assert_ne!(a, b);
        assert!(ledger.is_unspent(&a));
        assert!(ledger.is_unspent(&b));
    }

    #[test]
    fn test_unspent_outputs_in_confirmation_order() {
        let mut ledger = MemoryLedger::new(FEE);
        let (a, _) = ledger.fund(key(1), 5_000);
        let (b, _) = ledger.fund(key(2), 6_000);
        let unspent = ledger.unspent_outputs();
        assert_eq!(unspent.len(), 2);
        assert_eq!(unspent[0].0, a);
        assert_eq!(unspent[1].0, b);
    }

    #[test]
    fn test_apply_confirmed_marks_inputs_spent() {
        let mut ledger = MemoryLedger::new(FEE);
        let (outpoint, _) = ledger.fund(key(1), 10_000);
        let tx = spend_to(outpoint, 9_000, key(2));
        let txid = tx.txid().expect("txid");

        let mut replayed = MemoryLedger::new(FEE);
        for (id, body) in ledger.confirmed() {
            replayed.apply_confirmed(id, body.clone());
        }
        replayed.apply_confirmed(txid, tx);
        assert!(!replayed.is_unspent(&outpoint));
        assert!(replayed.is_unspent(&Outpoint { txid, vout: 0 }));
    }
}
