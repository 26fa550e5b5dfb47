//! Subscriber escrow deposits.
//!
//! A subscription binds a consumer's escrow deposit to an oracle. Escrow
//! only ever decreases, by exactly one datafee per consumed reading, and
//! never goes below zero; a subscription whose remaining balance cannot
//! cover another datafee stops funding publications.

use pyxis_ledger::{Ledger, Outpoint, Owner, TxOut};
use pyxis_types::{OracleId, PubKey, SubscriptionId};
use tracing::debug;

use crate::commit::Commit;
use crate::{FeedClient, FeedError, Prepared, Result};

/// A consumer's prepaid escrow funding future readings of an oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// Subscribing transaction id.
    pub id: SubscriptionId,
    /// Oracle the escrow funds.
    pub oracle: OracleId,
    /// Subscriber key.
    pub subscriber: PubKey,
    /// Escrow deposited at subscription time.
    pub amount: u64,
}

impl<L: Ledger> FeedClient<L> {
    /// Prepare a subscription transaction depositing `amount` escrow
    /// units against an oracle.
    pub fn subscribe(
        &self,
        funding: &Outpoint,
        oracle: &OracleId,
        subscriber: PubKey,
        amount: i64,
    ) -> Result<Prepared> {
        if amount <= 0 {
            return Err(FeedError::Validation(format!(
                "subscription amount must be positive, got {amount}"
            )));
        }
        self.info(oracle)?;

        let prepared = self.funded_template(
            funding,
            TxOut {
                value: amount as u64,
                owner: Owner::Escrow {
                    oracle: *oracle,
                    subscriber,
                },
            },
            Commit::Subscribe {
                oracle: *oracle,
                subscriber,
                amount: amount as u64,
            },
        )?;
        debug!(
            subscription = %hex::encode(prepared.id),
            oracle = %hex::encode(oracle),
            amount,
            "subscription prepared"
        );
        Ok(prepared)
    }

    /// Look up a confirmed subscription by id.
    pub fn subscription(&self, id: &SubscriptionId) -> Result<Subscription> {
        let tx = self
            .ledger()
            .transaction(id)
            .ok_or_else(|| FeedError::NotFound(format!("subscription {}", hex::encode(id))))?;
        match Commit::from_tx(tx) {
            Some(Commit::Subscribe {
                oracle,
                subscriber,
                amount,
            }) => Ok(Subscription {
                id: *id,
                oracle,
                subscriber,
                amount,
            }),
            _ => Err(FeedError::NotFound(format!(
                "subscription {}",
                hex::encode(id)
            ))),
        }
    }

    /// Total unspent escrow currently funding an oracle.
    pub fn escrow_balance(&self, oracle: &OracleId) -> u64 {
        self.unspent_escrows(oracle)
            .iter()
            .map(|(_, out)| out.value)
            .sum()
    }

    /// Unspent escrow outputs for an oracle, in confirmation order.
    pub(crate) fn unspent_escrows(&self, oracle: &OracleId) -> Vec<(Outpoint, TxOut)> {
        self.ledger()
            .unspent_outputs()
            .into_iter()
            .filter(|(_, out)| matches!(&out.owner, Owner::Escrow { oracle: o, .. } if o == oracle))
            .collect()
    }
}
