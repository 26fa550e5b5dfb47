//! Protocol payload records embedded in ledger transactions.
//!
//! Every protocol transaction carries exactly one `Commit` record in its
//! commit field, CBOR-encoded. Registry and history queries reconstruct
//! all feed state by decoding these records from confirmed transactions;
//! transactions whose commit does not decode are foreign and ignored.

use pyxis_ledger::Transaction;
use pyxis_types::{BatonId, OracleId, PubKey, RegistrationId};
use serde::{Deserialize, Serialize};

use crate::{FeedError, Result};

/// One protocol record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Commit {
    /// Defines a new oracle feed.
    CreateOracle {
        /// Feed name, at most 32 bytes.
        name: String,
        /// Feed description, at most 4096 bytes.
        description: String,
        /// Format spec string, validated at creation.
        format: String,
    },
    /// Binds a publisher to an oracle and mints the initial baton.
    Register {
        /// Target oracle.
        oracle: OracleId,
        /// Publisher key.
        publisher: PubKey,
        /// Fee charged per published reading.
        datafee: u64,
    },
    /// Deposits subscriber escrow against an oracle.
    Subscribe {
        /// Target oracle.
        oracle: OracleId,
        /// Subscriber key.
        subscriber: PubKey,
        /// Escrow deposited, in base ledger units.
        amount: u64,
    },
    /// One published reading; spends `prev_baton`'s output and mints the
    /// successor baton in the same transaction.
    DataPoint {
        /// Oracle the reading belongs to.
        oracle: OracleId,
        /// Registration that produced it.
        registration: RegistrationId,
        /// Transaction that created the consumed baton.
        prev_baton: BatonId,
        /// Raw reading bytes, encoded per the oracle's format spec.
        payload: Vec<u8>,
    },
}

impl Commit {
    /// Canonical (CBOR) encoding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| FeedError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Decode a commit record; `None` for foreign or malformed payloads.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        ciborium::de::from_reader(bytes).ok()
    }

    /// Extract the commit record of a transaction, if it carries one.
    pub fn from_tx(tx: &Transaction) -> Option<Self> {
        tx.commit.as_deref().and_then(Self::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let record = Commit::DataPoint {
            oracle: [1u8; 32],
            registration: [2u8; 32],
            prev_baton: [3u8; 32],
            payload: vec![0xff, 0x00],
        };
        let bytes = record.encode().expect("encode");
        assert_eq!(Commit::decode(&bytes), Some(record));
    }

    #[test]
    fn test_decode_foreign_payload() {
        assert_eq!(Commit::decode(b"not cbor at all"), None);
        assert_eq!(Commit::decode(&[]), None);
    }

    #[test]
    fn test_from_tx_without_commit() {
        let tx = Transaction {
            inputs: Vec::new(),
            outputs: Vec::new(),
            commit: None,
        };
        assert_eq!(Commit::from_tx(&tx), None);
    }
}
