//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use pubsub_bridge::config::BridgeConfig;
use pubsub_bridge::{BridgeServer, LocalSession, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A bridge running on an ephemeral port, backed by a local session.
pub struct TestBridge {
    pub addr: SocketAddr,
    pub session: LocalSession,
    pub shutdown: Shutdown,
    pub server: Option<JoinHandle<Result<(), std::io::Error>>>,
}

impl TestBridge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a bridge with default configuration.
pub async fn start_bridge() -> TestBridge {
    start_bridge_with(BridgeConfig::default()).await
}

/// Start a bridge with the given configuration; the bind address is ignored.
pub async fn start_bridge_with(config: BridgeConfig) -> TestBridge {
    let session = LocalSession::new(&config.session);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = BridgeServer::new(config, Arc::new(session.clone()));
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestBridge {
        addr,
        session,
        shutdown,
        server: Some(handle),
    }
}

/// HTTP client that never goes through a system proxy or reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
