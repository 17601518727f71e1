//! Messaging session capability.
//!
//! # Data Flow
//! ```text
//! dispatcher
//!     → Session::publish(PublishCommand)     fire-and-forget, no remote ack
//!     → Session::call(CallCommand)           BoxFuture<Result<CallOutcome, SessionError>>
//!
//! Session implementations:
//!     → local.rs (in-process realm used by the binary and tests)
//!     → any WAMP client that implements `Session`
//! ```
//!
//! # Design Decisions
//! - The session is injected as `Arc<dyn Session>`, never reached through ambient state
//! - Role availability is queried per request; a reconnecting session is picked up live
//! - A remote application error is a `CallOutcome::Failure`, not a `SessionError`

pub mod local;
pub mod outcome;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::bridge::command::{CallCommand, PublishCommand};

pub use local::{Event, Invocation, LocalSession};
pub use outcome::CallOutcome;

/// Faults raised by the session itself rather than by the remote peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session is closed or the requested role is not held.
    #[error("session closed")]
    Closed,

    /// The callee went away without producing a result.
    #[error("call abandoned before a result arrived")]
    Abandoned,

    /// Procedure already registered by a live callee.
    #[error("procedure already registered: {0}")]
    AlreadyRegistered(String),
}

/// The capability surface the bridge consumes from a messaging session.
pub trait Session: Send + Sync {
    /// Whether the session currently holds the publisher role.
    fn is_publisher_available(&self) -> bool;

    /// Whether the session currently holds the caller role.
    fn is_caller_available(&self) -> bool;

    /// Publish an event. Returns once the event is handed to the session.
    fn publish(&self, command: PublishCommand) -> Result<(), SessionError>;

    /// Invoke a remote procedure. The future resolves exactly once.
    fn call(&self, command: CallCommand) -> BoxFuture<'static, Result<CallOutcome, SessionError>>;
}
