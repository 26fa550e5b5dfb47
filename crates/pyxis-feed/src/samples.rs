//! Reading history queries.
//!
//! Data points form a chain: each publication spends its predecessor's
//! baton and records that baton's transaction id. Walking backward from
//! any baton id therefore yields the readings newest first, in the strict
//! total order the ledger imposed.

use pyxis_codec::{CodecError, FormatSpec};
use pyxis_ledger::Ledger;
use pyxis_types::{BatonId, OracleId, TxId};

use crate::commit::Commit;
use crate::{FeedClient, FeedError, Result};

/// One decoded reading from a feed's history.
#[derive(Debug)]
pub struct Sample {
    /// Transaction id of the data point.
    pub txid: TxId,
    /// Raw reading bytes as published.
    pub raw: Vec<u8>,
    /// Rendered field values, or the per-entry decode failure.
    ///
    /// A feed's format is fixed at creation, so failures should not occur
    /// in practice; decoding is defensive and never fails the whole query.
    pub values: std::result::Result<Vec<String>, CodecError>,
}

impl<L: Ledger> FeedClient<L> {
    /// The most recent `count` readings at or before `from_baton`, newest
    /// first.
    ///
    /// Returns fewer entries without error if the chain is shorter, and an
    /// empty vector if no data points exist yet.
    pub fn samples(
        &self,
        oracle: &OracleId,
        from_baton: &BatonId,
        count: usize,
    ) -> Result<Vec<Sample>> {
        if count == 0 {
            return Err(FeedError::Validation(
                "sample count must be at least 1".to_string(),
            ));
        }
        let oracle_record = self.info(oracle)?;

        let mut samples = Vec::new();
        let mut cursor = *from_baton;
        while samples.len() < count {
            let Some(tx) = self.ledger().transaction(&cursor) else {
                break;
            };
            match Commit::from_tx(tx) {
                Some(Commit::DataPoint {
                    oracle: o,
                    prev_baton,
                    payload,
                    ..
                }) if o == *oracle => {
                    let values = FormatSpec::parse(&oracle_record.format)
                        .and_then(|spec| spec.decode(&payload))
                        .map(|values| values.iter().map(ToString::to_string).collect());
                    samples.push(Sample {
                        txid: cursor,
                        raw: payload,
                        values,
                    });
                    cursor = prev_baton;
                }
                // Registration reached, or a foreign transaction: end of chain.
                _ => break,
            }
        }
        Ok(samples)
    }
}
