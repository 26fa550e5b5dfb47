//! # pyxis-types
//!
//! Shared domain types used across the Pyxis workspace.

/// Common type aliases.
pub type TxId = [u8; 32];
pub type OracleId = TxId;
pub type RegistrationId = TxId;
pub type SubscriptionId = TxId;
pub type BatonId = TxId;
pub type PubKey = [u8; 32];

/// Maximum oracle name length in bytes.
pub const MAX_ORACLE_NAME_LEN: usize = 32;

/// Maximum oracle description length in bytes.
pub const MAX_ORACLE_DESCRIPTION_LEN: usize = 4096;

/// Default minimum relay fee charged by the ledger per transaction.
pub const DEFAULT_MIN_RELAY_FEE: u64 = 1_000;

/// Nominal value carried by a baton output.
pub const BATON_VALUE: u64 = 1_000;

/// Nominal value carried by an oracle marker output.
pub const MARKER_VALUE: u64 = 1_000;

/// Render a transaction id as lowercase hex.
pub fn txid_hex(txid: &TxId) -> String {
    hex::encode(txid)
}

/// Parse a transaction id from lowercase hex.
///
/// Returns `None` for malformed input (wrong length or non-hex characters).
pub fn txid_from_hex(s: &str) -> Option<TxId> {
    let bytes = hex::decode(s).ok()?;
    let mut txid = [0u8; 32];
    if bytes.len() != 32 {
        return None;
    }
    txid.copy_from_slice(&bytes);
    Some(txid)
}
