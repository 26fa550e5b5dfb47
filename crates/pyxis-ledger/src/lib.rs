//! # pyxis-ledger
//!
//! UTXO-style ledger abstraction for the oracle data-feed protocol.
//!
//! The ledger is the sole synchronization primitive of the protocol: an
//! output is a single-owner, single-spend resource, and submission accepts
//! exactly one transaction spending a given output. Baton serialization
//! falls out of that rule with no extra locking.
//!
//! ## Modules
//!
//! - [`tx`] — transactions, outputs, ownership tags, transaction ids
//! - [`memory`] — in-memory [`Ledger`] implementation

pub mod memory;
pub mod tx;

pub use memory::MemoryLedger;
pub use tx::{Outpoint, Owner, Transaction, TxOut};

use pyxis_types::TxId;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An input references an output that does not exist.
    #[error("input not found: {0}")]
    UnknownInput(Outpoint),

    /// An input references an output that was already spent.
    ///
    /// Under concurrent submission this is the expected loser signal, not
    /// a corruption signal.
    #[error("input already spent: {0}")]
    AlreadySpent(Outpoint),

    /// A transaction has no inputs or no outputs.
    #[error("malformed transaction: {0}")]
    Malformed(&'static str),

    /// The implied fee is below the ledger minimum.
    #[error("transaction fee {fee} below minimum {min}")]
    FeeTooLow {
        /// Inputs minus outputs.
        fee: u64,
        /// Minimum relay fee.
        min: u64,
    },

    /// Input or output values overflow when summed.
    #[error("transaction value overflow")]
    ValueOverflow,

    /// Output values exceed input values.
    #[error("outputs exceed inputs by {0}")]
    InsufficientValue(u64),

    /// Canonical serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Read/write access to a confirmed ledger state.
///
/// `submit` covers both submission and confirmation for single-node
/// backends; implementations backed by a remote chain may confirm
/// asynchronously, but the observable contract is the same: a submitted
/// transaction either confirms wholly or not at all.
pub trait Ledger {
    /// Minimum relay fee per transaction.
    fn min_fee(&self) -> u64;

    /// Validate and confirm a transaction.
    ///
    /// Resubmitting an already-confirmed transaction is idempotent.
    fn submit(&mut self, tx: Transaction) -> Result<TxId>;

    /// Look up a confirmed transaction.
    fn transaction(&self, txid: &TxId) -> Option<&Transaction>;

    /// Whether an output exists and is unspent.
    fn is_unspent(&self, outpoint: &Outpoint) -> bool;

    /// All unspent outputs, in confirmation order.
    fn unspent_outputs(&self) -> Vec<(Outpoint, TxOut)>;

    /// All confirmed transactions, in confirmation order.
    fn confirmed(&self) -> Vec<(TxId, &Transaction)>;

    /// Look up a single output, spent or not.
    fn output(&self, outpoint: &Outpoint) -> Option<TxOut> {
        self.transaction(&outpoint.txid)
            .and_then(|tx| tx.outputs.get(outpoint.vout as usize))
            .cloned()
    }
}
