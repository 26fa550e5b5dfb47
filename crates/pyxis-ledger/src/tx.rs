//! Transactions, outputs, and ownership tags.

use std::fmt;

use pyxis_types::{OracleId, PubKey, TxId};
use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result};

/// Reference to one output of a confirmed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    /// Transaction that created the output.
    pub txid: TxId,
    /// Output index within that transaction.
    pub vout: u32,
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.txid), self.vout)
    }
}

/// Who may spend an output.
///
/// Signature checking is out of scope here; the tag records intent so the
/// protocol layer can locate batons, escrows, and markers by scanning
/// unspent outputs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    /// Pay to a plain key.
    Key(PubKey),
    /// The publication baton for one (oracle, publisher) registration.
    ///
    /// Exactly one unspent output with a given baton tag exists at any
    /// ledger state; spending it and emitting a successor is the only way
    /// a reading gets published.
    Baton {
        /// Oracle the registration is bound to.
        oracle: OracleId,
        /// Registered publisher key.
        publisher: PubKey,
    },
    /// Escrow deposited by a subscriber against an oracle.
    Escrow {
        /// Oracle the subscription funds.
        oracle: OracleId,
        /// Subscriber key (for reclaim, out of scope here).
        subscriber: PubKey,
    },
    /// Registry marker emitted by oracle creation.
    Marker,
}

/// One transaction output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    /// Value in base ledger units.
    pub value: u64,
    /// Spend authorization tag.
    pub owner: Owner,
}

/// A ledger transaction.
///
/// `commit` carries the protocol payload (the embedded data record); the
/// ledger itself treats it as opaque bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Outputs consumed.
    pub inputs: Vec<Outpoint>,
    /// Outputs created.
    pub outputs: Vec<TxOut>,
    /// Opaque protocol payload.
    pub commit: Option<Vec<u8>>,
}

impl Transaction {
    /// Compute this transaction's id: blake3 over the canonical (CBOR)
    /// encoding.
    pub fn txid(&self) -> Result<TxId> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(*blake3::hash(&buf).as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            inputs: vec![Outpoint {
                txid: [0x11; 32],
                vout: 0,
            }],
            outputs: vec![TxOut {
                value: 5_000,
                owner: Owner::Key([0x22; 32]),
            }],
            commit: Some(vec![1, 2, 3]),
        }
    }

    #[test]
    fn test_txid_deterministic() {
        let tx = sample_tx();
        assert_eq!(tx.txid().expect("txid"), tx.txid().expect("txid"));
    }

    #[test]
    fn test_txid_changes_with_content() {
        let tx = sample_tx();
        let mut other = sample_tx();
        other.outputs[0].value = 5_001;
        assert_ne!(tx.txid().expect("txid"), other.txid().expect("txid"));
    }

    #[test]
    fn test_outpoint_display() {
        let outpoint = Outpoint {
            txid: [0u8; 32],
            vout: 3,
        };
        assert!(outpoint.to_string().ends_with(":3"));
    }
}
