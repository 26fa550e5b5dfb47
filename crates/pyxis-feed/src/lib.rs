//! # pyxis-feed
//!
//! The oracle data-feed protocol core.
//!
//! A publisher registers against an oracle with a per-reading fee,
//! consumers prepay escrow, and readings are published by spending the
//! registration's baton output and minting its successor. The ledger's
//! single-spend rule is the only synchronization: two publications racing
//! for one baton cannot both confirm.
//!
//! All operations live on [`FeedClient`], which threads an explicit ledger
//! reference; there is no ambient registry state. Mutating operations
//! return a [`Prepared`] transaction template; [`FeedClient::broadcast`]
//! submits it.
//!
//! ## Modules
//!
//! - [`commit`] — protocol payload records embedded in transactions
//! - [`registry`] — oracle creation and lookup
//! - [`registration`] — publisher registration and baton tracking
//! - [`subscription`] — subscriber escrow deposits
//! - [`publish`] — the publication engine
//! - [`samples`] — reading history queries

pub mod commit;
pub mod publish;
pub mod registration;
pub mod registry;
pub mod samples;
pub mod subscription;

pub use commit::Commit;
pub use registration::Registration;
pub use registry::Oracle;
pub use samples::Sample;
pub use subscription::Subscription;

use pyxis_codec::CodecError;
use pyxis_ledger::{Ledger, LedgerError, Outpoint, Owner, Transaction, TxOut};
use pyxis_types::{PubKey, TxId};

/// Error types for feed operations.
///
/// Every variant is recoverable by the caller; no partial ledger writes
/// occur on failure since each effectful operation is one atomic
/// transaction.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Malformed input rejected before any state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// Registration datafee was zero or negative.
    #[error("datafee must be positive, got {0}")]
    NonPositiveFee(i64),

    /// Registration datafee does not exceed the ledger minimum fee.
    #[error("datafee {datafee} must exceed the minimum relay fee {min_fee}")]
    FeeTooLow {
        /// Requested per-reading fee.
        datafee: u64,
        /// Ledger minimum relay fee.
        min_fee: u64,
    },

    /// No subscription escrow can fund another reading.
    #[error("no subscription with escrow balance >= {needed}")]
    InsufficientEscrow {
        /// The registration's datafee.
        needed: u64,
    },

    /// The registration has no unspent baton.
    #[error("no unspent baton for registration")]
    NoBaton,

    /// A concurrent publication already consumed the baton.
    ///
    /// Expected under concurrency: refresh state and rebuild against the
    /// new baton.
    #[error("baton was spent by a concurrent publication")]
    StaleBaton,

    /// Lookup miss for an oracle, registration, or subscription id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The (oracle, publisher) pair already has an active registration.
    #[error("publisher already registered for this oracle")]
    AlreadyRegistered,

    /// Payload does not satisfy the oracle's format spec.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Ledger rejected the transaction.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Canonical serialization of a commit record failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience result type for feed operations.
pub type Result<T> = std::result::Result<T, FeedError>;

/// A constructible-but-unconfirmed transaction template.
///
/// `id` is the deterministic transaction id; it becomes the oracle,
/// registration, subscription, or data-point id once confirmed.
#[derive(Clone, Debug)]
pub struct Prepared {
    /// Deterministic id of the template.
    pub id: TxId,
    /// The transaction to broadcast.
    pub tx: Transaction,
}

/// Client for all feed operations against one ledger.
pub struct FeedClient<L: Ledger> {
    ledger: L,
}

impl<L: Ledger> FeedClient<L> {
    /// Create a client over a ledger.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Read access to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Write access to the underlying ledger.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Broadcast a prepared template.
    ///
    /// A lost baton race surfaces as [`FeedError::StaleBaton`]; the caller
    /// must re-read state and rebuild against the new baton.
    pub fn broadcast(&mut self, prepared: &Prepared) -> Result<TxId> {
        match self.ledger.submit(prepared.tx.clone()) {
            Ok(txid) => Ok(txid),
            Err(LedgerError::AlreadySpent(outpoint)) if self.spends_baton(&outpoint) => {
                Err(FeedError::StaleBaton)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn spends_baton(&self, outpoint: &Outpoint) -> bool {
        matches!(
            self.ledger.output(outpoint),
            Some(TxOut {
                owner: Owner::Baton { .. },
                ..
            })
        )
    }

    /// Resolve a funding outpoint: must exist, be unspent, and be a plain
    /// key output (the change goes back to that key).
    pub(crate) fn funding(&self, outpoint: &Outpoint) -> Result<(u64, PubKey)> {
        let out = self
            .ledger
            .output(outpoint)
            .ok_or_else(|| FeedError::Validation(format!("funding output {outpoint} not found")))?;
        if !self.ledger.is_unspent(outpoint) {
            return Err(FeedError::Validation(format!(
                "funding output {outpoint} already spent"
            )));
        }
        match out.owner {
            Owner::Key(key) => Ok((out.value, key)),
            _ => Err(FeedError::Validation(
                "funding output must be a plain key output".to_string(),
            )),
        }
    }

    /// Build a single-input template: spend `funding`, emit `primary`,
    /// return the remainder to the funder after the relay fee.
    pub(crate) fn funded_template(
        &self,
        funding: &Outpoint,
        primary: TxOut,
        commit: Commit,
    ) -> Result<Prepared> {
        let (value, funder) = self.funding(funding)?;
        let needed = primary
            .value
            .checked_add(self.ledger.min_fee())
            .ok_or(LedgerError::ValueOverflow)?;
        if value < needed {
            return Err(FeedError::Validation(format!(
                "funding output holds {value}, need at least {needed}"
            )));
        }

        let mut outputs = vec![primary];
        let change = value - needed;
        if change > 0 {
            outputs.push(TxOut {
                value: change,
                owner: Owner::Key(funder),
            });
        }

        let tx = Transaction {
            inputs: vec![*funding],
            outputs,
            commit: Some(commit.encode()?),
        };
        let id = tx.txid()?;
        Ok(Prepared { id, tx })
    }
}
