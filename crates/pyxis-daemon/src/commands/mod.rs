//! RPC command handlers.
//!
//! Each submodule implements the commands for one category.

pub mod oracle;
pub mod wallet;

use pyxis_types::{PubKey, TxId};
use serde_json::Value;

use crate::rpc::RpcError;

/// Extract a required hex-encoded 32-byte id parameter.
pub(crate) fn id_param(params: &Value, name: &str) -> Result<TxId, RpcError> {
    let raw = params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))?;
    pyxis_types::txid_from_hex(raw)
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} must be 32 bytes of hex")))
}

/// Extract a required hex-encoded key parameter.
pub(crate) fn key_param(params: &Value, name: &str) -> Result<PubKey, RpcError> {
    // Keys share the 32-byte hex wire form with transaction ids.
    id_param(params, name)
}

/// Extract a required string parameter.
pub(crate) fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// Extract a required integer parameter.
pub(crate) fn i64_param(params: &Value, name: &str) -> Result<i64, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}
