//! SQL schema definitions.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    txid BLOB PRIMARY KEY,
    position INTEGER NOT NULL UNIQUE,
    body BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_position
    ON transactions (position);
"#;
