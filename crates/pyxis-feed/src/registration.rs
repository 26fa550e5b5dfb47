//! Publisher registration and baton tracking.
//!
//! Registering mints the initial baton output for the (oracle, publisher)
//! pair. The baton is the exclusive right to publish the next reading:
//! every publication spends the current baton and mints its successor, so
//! at most one unspent baton exists per registration at any ledger state.

use pyxis_ledger::{Ledger, Outpoint, Owner, TxOut};
use pyxis_types::{OracleId, PubKey, RegistrationId, BATON_VALUE};
use tracing::debug;

use crate::commit::Commit;
use crate::{FeedClient, FeedError, Prepared, Result};

/// Binding of a publisher to an oracle with a per-reading fee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Registering transaction id.
    pub id: RegistrationId,
    /// Oracle the publisher is bound to.
    pub oracle: OracleId,
    /// Publisher key.
    pub publisher: PubKey,
    /// Fee charged per published reading.
    pub datafee: u64,
}

impl<L: Ledger> FeedClient<L> {
    /// Prepare a registration transaction.
    ///
    /// # Errors
    ///
    /// - [`FeedError::NonPositiveFee`] for `datafee <= 0`
    /// - [`FeedError::FeeTooLow`] unless `datafee` strictly exceeds the
    ///   ledger minimum relay fee (the publisher nets the margin above it)
    /// - [`FeedError::NotFound`] for an unknown oracle
    /// - [`FeedError::AlreadyRegistered`] if the pair already registered
    pub fn register(
        &self,
        funding: &Outpoint,
        oracle: &OracleId,
        publisher: PubKey,
        datafee: i64,
    ) -> Result<Prepared> {
        if datafee <= 0 {
            return Err(FeedError::NonPositiveFee(datafee));
        }
        let datafee = datafee as u64;
        let min_fee = self.ledger().min_fee();
        if datafee <= min_fee {
            return Err(FeedError::FeeTooLow { datafee, min_fee });
        }
        self.info(oracle)?;
        if self
            .registrations(oracle)
            .iter()
            .any(|r| r.publisher == publisher)
        {
            return Err(FeedError::AlreadyRegistered);
        }

        let prepared = self.funded_template(
            funding,
            TxOut {
                value: BATON_VALUE,
                owner: Owner::Baton {
                    oracle: *oracle,
                    publisher,
                },
            },
            Commit::Register {
                oracle: *oracle,
                publisher,
                datafee,
            },
        )?;
        debug!(
            registration = %hex::encode(prepared.id),
            oracle = %hex::encode(oracle),
            datafee,
            "registration prepared"
        );
        Ok(prepared)
    }

    /// Look up a confirmed registration by id.
    pub fn registration(&self, id: &RegistrationId) -> Result<Registration> {
        let tx = self
            .ledger()
            .transaction(id)
            .ok_or_else(|| FeedError::NotFound(format!("registration {}", hex::encode(id))))?;
        match Commit::from_tx(tx) {
            Some(Commit::Register {
                oracle,
                publisher,
                datafee,
            }) => Ok(Registration {
                id: *id,
                oracle,
                publisher,
                datafee,
            }),
            _ => Err(FeedError::NotFound(format!(
                "registration {}",
                hex::encode(id)
            ))),
        }
    }

    /// All confirmed registrations for an oracle, in confirmation order.
    pub fn registrations(&self, oracle: &OracleId) -> Vec<Registration> {
        self.ledger()
            .confirmed()
            .into_iter()
            .filter_map(|(txid, tx)| match Commit::from_tx(tx) {
                Some(Commit::Register {
                    oracle: o,
                    publisher,
                    datafee,
                }) if o == *oracle => Some(Registration {
                    id: txid,
                    oracle: o,
                    publisher,
                    datafee,
                }),
                _ => None,
            })
            .collect()
    }

    /// The registration's current (unique unspent) baton outpoint.
    pub fn current_baton(&self, id: &RegistrationId) -> Result<Outpoint> {
        let registration = self.registration(id)?;
        let tag = Owner::Baton {
            oracle: registration.oracle,
            publisher: registration.publisher,
        };
        self.ledger()
            .unspent_outputs()
            .into_iter()
            .find(|(_, out)| out.owner == tag)
            .map(|(outpoint, _)| outpoint)
            .ok_or(FeedError::NoBaton)
    }
}
