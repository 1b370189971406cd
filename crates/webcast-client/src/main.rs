//! Webcast feed client.
//!
//! Reads `webcast.yaml` (or the path given as the first argument), resolves
//! the room and follows its push feed until Ctrl-C, the end of the
//! broadcast, or until the retry budget is spent.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use webcast_client::bootstrap::TokenBootstrapper;
use webcast_client::config::{self, ClientConfig};
use webcast_client::connection::ConnectionManager;
use webcast_client::dispatch::{Dispatcher, HandlerRegistry};
use webcast_client::signer::CommandSigner;
use webcast_client::sink::CsvFileSink;
use webcast_client::state::SharedState;
use webcast_client::transport::WsConnector;
use webcast_core::error::Result;

const DEFAULT_CONFIG: &str = "webcast.yaml";

fn build(cfg: ClientConfig) -> Result<ConnectionManager> {
    let registry = HandlerRegistry::from_config(&cfg.handlers)?;
    let shared = Arc::new(SharedState::new(Arc::new(CsvFileSink::from_config(&cfg.records))));

    let signer = Arc::new(CommandSigner::from_config(&cfg.signer)?);
    let bootstrap = TokenBootstrapper::new(
        cfg.live_id.clone(),
        cfg.bootstrap.clone(),
        signer,
        cfg.signer.timeout(),
    )?;
    let connector = WsConnector::new(cfg.bootstrap.http_timeout());

    Ok(ConnectionManager::new(
        cfg.connection,
        Arc::new(bootstrap),
        Arc::new(connector),
        Dispatcher::new(registry, shared),
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let manager = match config::load_from_file(&path).and_then(|cfg| {
        tracing::info!(live_id = %cfg.live_id, config = %path, "webcast-client starting");
        build(cfg)
    }) {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(code = e.kind().as_str(), error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let stop = manager.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; stopping");
            stop.stop();
        }
    });

    match manager.run().await.into_result() {
        Ok(reason) => {
            let total = manager.dispatcher().shared().diamonds.get();
            tracing::info!(?reason, total_diamonds = total, "stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = e.kind().as_str(), error = %e, "gave up");
            ExitCode::FAILURE
        }
    }
}
