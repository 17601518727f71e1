//! HTTP → publish/subscribe bridge library.
//!
//! `POST /pub` publishes an event, `POST /call` invokes a remote procedure
//! and returns its result; everything else is `404 Not found`.

pub mod bridge;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod session;

pub use config::schema::BridgeConfig;
pub use http::BridgeServer;
pub use lifecycle::Shutdown;
pub use session::{LocalSession, Session};
