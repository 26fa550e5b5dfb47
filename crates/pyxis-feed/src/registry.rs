//! Oracle creation and lookup.

use pyxis_codec::FormatSpec;
use pyxis_ledger::{Ledger, Outpoint, Owner, TxOut};
use pyxis_types::{OracleId, MARKER_VALUE, MAX_ORACLE_DESCRIPTION_LEN, MAX_ORACLE_NAME_LEN};
use tracing::debug;

use crate::commit::Commit;
use crate::{FeedClient, FeedError, Prepared, Result};

/// A named, described, typed data-feed definition.
///
/// Identity is the transaction id that created it; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Oracle {
    /// Creating transaction id.
    pub id: OracleId,
    /// Feed name.
    pub name: String,
    /// Feed description.
    pub description: String,
    /// Format spec string, guaranteed to parse.
    pub format: String,
}

impl<L: Ledger> FeedClient<L> {
    /// Prepare an oracle-creation transaction.
    ///
    /// Validation happens before any template is built: oversize name or
    /// description and unparseable format specs leave no partial state.
    pub fn create(
        &self,
        funding: &Outpoint,
        name: &str,
        description: &str,
        format: &str,
    ) -> Result<Prepared> {
        if name.len() > MAX_ORACLE_NAME_LEN {
            return Err(FeedError::Validation(format!(
                "oracle name of {} bytes exceeds maximum {MAX_ORACLE_NAME_LEN}",
                name.len()
            )));
        }
        if description.len() > MAX_ORACLE_DESCRIPTION_LEN {
            return Err(FeedError::Validation(format!(
                "oracle description of {} bytes exceeds maximum {MAX_ORACLE_DESCRIPTION_LEN}",
                description.len()
            )));
        }
        FormatSpec::parse(format)?;

        let prepared = self.funded_template(
            funding,
            TxOut {
                value: MARKER_VALUE,
                owner: Owner::Marker,
            },
            Commit::CreateOracle {
                name: name.to_string(),
                description: description.to_string(),
                format: format.to_string(),
            },
        )?;
        debug!(oracle = %hex::encode(prepared.id), name, format, "oracle creation prepared");
        Ok(prepared)
    }

    /// Look up a confirmed oracle by id.
    pub fn info(&self, oracle: &OracleId) -> Result<Oracle> {
        let tx = self
            .ledger()
            .transaction(oracle)
            .ok_or_else(|| FeedError::NotFound(format!("oracle {}", hex::encode(oracle))))?;
        match Commit::from_tx(tx) {
            Some(Commit::CreateOracle {
                name,
                description,
                format,
            }) => Ok(Oracle {
                id: *oracle,
                name,
                description,
                format,
            }),
            _ => Err(FeedError::NotFound(format!(
                "oracle {}",
                hex::encode(oracle)
            ))),
        }
    }

    /// All confirmed oracles, in creation order. Empty on a fresh ledger.
    pub fn list(&self) -> Vec<Oracle> {
        self.ledger()
            .confirmed()
            .into_iter()
            .filter_map(|(txid, tx)| match Commit::from_tx(tx) {
                Some(Commit::CreateOracle {
                    name,
                    description,
                    format,
                }) => Some(Oracle {
                    id: txid,
                    name,
                    description,
                    format,
                }),
                _ => None,
            })
            .collect()
    }
}
