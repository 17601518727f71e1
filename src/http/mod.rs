//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: trace, request ID, timeout, body limit)
//!     → bridge::Dispatcher (route, validate, publish/call)
//!     → body.rs (incremental body capture)
//!     → response.rs (HttpOutcome → status, content type, body)
//!     → Send to client
//! ```

pub mod body;
pub mod request;
pub mod response;
pub mod server;

pub use body::{BodyAccumulator, BodyError};
pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::HttpOutcome;
pub use server::BridgeServer;
