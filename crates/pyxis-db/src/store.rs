//! Transaction persistence and ledger replay.

use pyxis_ledger::{MemoryLedger, Transaction};
use pyxis_types::TxId;
use rusqlite::Connection;

use crate::{DbError, Result};

/// Append a confirmed transaction.
///
/// Idempotent: re-storing a known txid is a no-op, matching the ledger's
/// idempotent submit.
pub fn store_transaction(conn: &Connection, txid: &TxId, tx: &Transaction) -> Result<()> {
    let mut body = Vec::new();
    ciborium::ser::into_writer(tx, &mut body)
        .map_err(|e| DbError::Corrupt(format!("encode transaction: {e}")))?;

    conn.execute(
        "INSERT OR IGNORE INTO transactions (txid, position, body)
         VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM transactions), ?2)",
        rusqlite::params![txid.as_slice(), body],
    )?;
    Ok(())
}

/// Number of stored transactions.
pub fn transaction_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Replay all stored transactions, in confirmation order, into a fresh
/// in-memory ledger.
pub fn load_ledger(conn: &Connection, min_fee: u64) -> Result<MemoryLedger> {
    let mut stmt =
        conn.prepare("SELECT txid, body FROM transactions ORDER BY position ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
    })?;

    let mut ledger = MemoryLedger::new(min_fee);
    let mut replayed = 0u64;
    for row in rows {
        let (txid_bytes, body) = row?;
        let mut txid = [0u8; 32];
        if txid_bytes.len() != 32 {
            return Err(DbError::Corrupt("txid is not 32 bytes".to_string()));
        }
        txid.copy_from_slice(&txid_bytes);
        let tx: Transaction = ciborium::de::from_reader(body.as_slice())
            .map_err(|e| DbError::Corrupt(format!("decode transaction: {e}")))?;
        ledger.apply_confirmed(txid, tx);
        replayed += 1;
    }
    tracing::info!(replayed, "ledger replayed from database");
    Ok(ledger)
}
