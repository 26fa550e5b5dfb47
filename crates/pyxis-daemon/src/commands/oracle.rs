//! Oracle feed command handlers.
//!
//! Mutating commands build the protocol transaction, broadcast it against
//! the node's ledger, persist the confirmed result, and return the new id.

use std::sync::Arc;

use pyxis_feed::Prepared;
use pyxis_ledger::Ledger;
use pyxis_types::{BATON_VALUE, MARKER_VALUE};
use serde_json::Value;

use crate::commands::wallet::select_funding;
use crate::commands::{i64_param, id_param, key_param, str_param};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Broadcast a prepared template and persist the confirmed transaction.
///
/// The feed lock is held until the row is written: stored rows must land
/// in confirmation order or a replayed node's scan order diverges from
/// the live one.
async fn commit_prepared(state: &Arc<DaemonState>, prepared: &Prepared) -> Result {
    let mut feed = state.feed.lock().await;
    let txid = feed.broadcast(prepared).map_err(|e| RpcError::from_feed(&e))?;

    let db = state.db.lock().await;
    pyxis_db::store::store_transaction(&db, &txid, &prepared.tx)
        .map_err(|e| RpcError::internal_error(&format!("db error: {e}")))?;

    Ok(serde_json::json!({ "txid": hex::encode(txid) }))
}

/// Create an oracle feed definition.
pub async fn create(state: &Arc<DaemonState>, params: &Value) -> Result {
    let key = key_param(params, "key")?;
    let name = str_param(params, "name")?;
    let description = str_param(params, "description")?;
    let format = str_param(params, "format")?;

    let feed = state.feed.lock().await;
    let funding = select_funding(&feed, &key, MARKER_VALUE + feed.ledger().min_fee())?;
    let prepared = feed
        .create(&funding, name, description, format)
        .map_err(|e| RpcError::from_feed(&e))?;
    drop(feed);

    commit_prepared(state, &prepared).await
}

/// Register as publisher for an oracle.
pub async fn register(state: &Arc<DaemonState>, params: &Value) -> Result {
    let key = key_param(params, "key")?;
    let oracle = id_param(params, "oracle")?;
    let datafee = i64_param(params, "datafee")?;

    let feed = state.feed.lock().await;
    let funding = select_funding(&feed, &key, BATON_VALUE + feed.ledger().min_fee())?;
    let prepared = feed
        .register(&funding, &oracle, key, datafee)
        .map_err(|e| RpcError::from_feed(&e))?;
    drop(feed);

    commit_prepared(state, &prepared).await
}

/// Deposit subscriber escrow against an oracle.
pub async fn subscribe(state: &Arc<DaemonState>, params: &Value) -> Result {
    let key = key_param(params, "key")?;
    let oracle = id_param(params, "oracle")?;
    let amount = i64_param(params, "amount")?;

    let feed = state.feed.lock().await;
    let needed = u64::try_from(amount)
        .unwrap_or(0)
        .saturating_add(feed.ledger().min_fee());
    let funding = select_funding(&feed, &key, needed)?;
    let prepared = feed
        .subscribe(&funding, &oracle, key, amount)
        .map_err(|e| RpcError::from_feed(&e))?;
    drop(feed);

    commit_prepared(state, &prepared).await
}

/// Publish one reading against a registration.
pub async fn data(state: &Arc<DaemonState>, params: &Value) -> Result {
    let registration = id_param(params, "registration")?;
    let payload = hex::decode(str_param(params, "payload")?)
        .map_err(|_| RpcError::invalid_params("payload must be hex"))?;

    let feed = state.feed.lock().await;
    let prepared = feed
        .publish(&registration, &payload)
        .map_err(|e| RpcError::from_feed(&e))?;
    drop(feed);

    commit_prepared(state, &prepared).await
}

/// Query the most recent readings of a feed.
pub async fn samples(state: &Arc<DaemonState>, params: &Value) -> Result {
    let oracle = id_param(params, "oracle")?;
    let baton = id_param(params, "baton")?;
    let count = i64_param(params, "count")?;
    let count = usize::try_from(count)
        .map_err(|_| RpcError::invalid_params("count must be at least 1"))?;

    let feed = state.feed.lock().await;
    let samples = feed
        .samples(&oracle, &baton, count)
        .map_err(|e| RpcError::from_feed(&e))?;

    let rendered: Vec<Value> = samples
        .iter()
        .map(|sample| match &sample.values {
            Ok(values) => serde_json::json!({
                "txid": hex::encode(sample.txid),
                "values": values,
            }),
            Err(err) => serde_json::json!({
                "txid": hex::encode(sample.txid),
                "decode_error": err.to_string(),
            }),
        })
        .collect();

    Ok(serde_json::json!({ "samples": rendered }))
}

/// Look up one oracle definition.
pub async fn info(state: &Arc<DaemonState>, params: &Value) -> Result {
    let oracle = id_param(params, "oracle")?;
    let feed = state.feed.lock().await;
    let record = feed.info(&oracle).map_err(|e| RpcError::from_feed(&e))?;

    Ok(serde_json::json!({
        "oracle": hex::encode(record.id),
        "name": record.name,
        "description": record.description,
        "format": record.format,
        "registrations": feed
            .registrations(&oracle)
            .iter()
            .map(|r| serde_json::json!({
                "registration": hex::encode(r.id),
                "publisher": hex::encode(r.publisher),
                "datafee": r.datafee,
            }))
            .collect::<Vec<_>>(),
        "escrow_balance": feed.escrow_balance(&oracle),
    }))
}

/// List all oracle definitions.
pub async fn list(state: &Arc<DaemonState>) -> Result {
    let feed = state.feed.lock().await;
    let oracles: Vec<Value> = feed
        .list()
        .iter()
        .map(|o| {
            serde_json::json!({
                "oracle": hex::encode(o.id),
                "name": o.name,
                "format": o.format,
            })
        })
        .collect();

    Ok(serde_json::json!(oracles))
}
