//! Wallet command handlers: the dev faucet and funding selection.

use std::sync::Arc;

use pyxis_feed::FeedClient;
use pyxis_ledger::{Ledger, MemoryLedger, Outpoint, Owner};
use pyxis_types::PubKey;
use serde_json::Value;

use crate::commands::{i64_param, key_param};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Mint a faucet output for a key (single-node dev ledger only).
pub async fn fund(state: &Arc<DaemonState>, params: &Value) -> Result {
    let key = key_param(params, "key")?;
    let value = i64_param(params, "value")?;
    if value <= 0 {
        return Err(RpcError::invalid_params("value must be positive"));
    }

    // Held until the row is written so stored rows keep confirmation order.
    let mut feed = state.feed.lock().await;
    let (outpoint, _) = feed.ledger_mut().fund(Owner::Key(key), value as u64);
    let tx = feed
        .ledger()
        .transaction(&outpoint.txid)
        .cloned()
        .ok_or_else(|| RpcError::internal_error("faucet transaction missing"))?;

    let db = state.db.lock().await;
    pyxis_db::store::store_transaction(&db, &outpoint.txid, &tx)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    Ok(serde_json::json!({
        "txid": hex::encode(outpoint.txid),
        "vout": outpoint.vout,
    }))
}

/// Total unspent balance held by a key.
pub async fn balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let key = key_param(params, "key")?;
    let feed = state.feed.lock().await;
    let total: u64 = feed
        .ledger()
        .unspent_outputs()
        .iter()
        .filter(|(_, out)| out.owner == Owner::Key(key))
        .map(|(_, out)| out.value)
        .sum();

    Ok(serde_json::json!({ "balance": total }))
}

/// Pick an unspent key output holding at least `needed` units.
pub(crate) fn select_funding(
    feed: &FeedClient<MemoryLedger>,
    key: &PubKey,
    needed: u64,
) -> std::result::Result<Outpoint, RpcError> {
    feed.ledger()
        .unspent_outputs()
        .into_iter()
        .find(|(_, out)| out.owner == Owner::Key(*key) && out.value >= needed)
        .map(|(outpoint, _)| outpoint)
        .ok_or_else(|| {
            RpcError::invalid_params(&format!("no unspent output with at least {needed} units"))
        })
}
