//! pubsub-bridge
//!
//! Accepts plain HTTP POSTs and turns them into publish and call operations
//! on a messaging session.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                      BRIDGE                          │
//!                        │                                                      │
//!   POST /pub, /call     │  ┌─────────┐   ┌────────────┐   ┌──────────────┐     │
//!   ─────────────────────┼─▶│  http   │──▶│ dispatcher │──▶│  validator   │     │
//!                        │  │ server  │   │  + body    │   │              │     │
//!                        │  └─────────┘   └────────────┘   └──────┬───────┘     │
//!                        │                                        │             │
//!                        │                                        ▼             │
//!   200 / 400 / 404      │  ┌─────────┐   ┌────────────┐   ┌──────────────┐     │
//!   ◀────────────────────┼──│response │◀──│ translator │◀──│   session    │◀────┼──▶ realm
//!                        │  └─────────┘   └────────────┘   └──────────────┘     │
//!                        │                                                      │
//!                        │  config · observability · lifecycle                  │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use pubsub_bridge::config::{load_config, validation::validate_config, BridgeConfig, ConfigError};
use pubsub_bridge::lifecycle::{signals, trigger_on_session_close, Shutdown};
use pubsub_bridge::observability::{logging, metrics};
use pubsub_bridge::{BridgeServer, LocalSession};

#[derive(Parser)]
#[command(name = "pubsub-bridge")]
#[command(about = "HTTP to publish/subscribe bridge", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability);
    tracing::info!("pubsub-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        realm = %config.session.realm,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address already checked by config validation.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let session = LocalSession::new(&config.session);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        });
    }
    trigger_on_session_close(session.clone(), shutdown.clone());

    let server = BridgeServer::new(config, Arc::new(session.clone()));
    server.run(listener, server_shutdown).await?;

    session.close();
    tracing::info!("Shutdown complete");
    Ok(())
}
