//! pyxis-daemon: a single-node oracle data-feed daemon.
//!
//! Runs an in-memory UTXO ledger persisted to SQLite and exposes the feed
//! protocol over JSON-RPC on a Unix socket.

mod commands;
mod config;
mod rpc;

use std::sync::Arc;

use pyxis_feed::FeedClient;
use pyxis_ledger::MemoryLedger;
use tracing::{error, info};

use crate::config::DaemonConfig;
use crate::rpc::RpcServer;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// Feed client over the node's ledger.
    pub feed: tokio::sync::Mutex<FeedClient<MemoryLedger>>,
    /// Database connection.
    pub db: tokio::sync::Mutex<rusqlite::Connection>,
    /// Configuration.
    pub config: DaemonConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pyxis=info".parse()?),
        )
        .init();

    info!("Pyxis daemon starting");

    // 1. Load config
    let config = DaemonConfig::load()?;
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Open database and replay the confirmed ledger
    let db_path = data_dir.join("pyxis.db");
    let conn = pyxis_db::open(&db_path)?;
    let ledger = pyxis_db::store::load_ledger(&conn, config.ledger.min_relay_fee)?;

    // 3. Build daemon state
    let state = Arc::new(DaemonState {
        feed: tokio::sync::Mutex::new(FeedClient::new(ledger)),
        db: tokio::sync::Mutex::new(conn),
        config,
    });

    // 4. Start the RPC server
    let socket_path = data_dir.join("daemon.sock");
    let rpc_server = RpcServer::new(state, socket_path.clone());

    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}
