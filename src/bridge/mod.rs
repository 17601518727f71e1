//! HTTP → publish/call translation pipeline.
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → dispatch.rs (route: POST /pub | POST /call, else 404)
//!     → http::body (BodyAccumulator: one buffer, resolved once)
//!     → validate.rs (JSON → PublishCommand | CallCommand, all violations collected)
//!     → Session::publish (fire-and-forget)  → 200 "pub"
//!     → Session::call (await CallOutcome)   → translate.rs → 200 JSON
//! ```
//!
//! # Design Decisions
//! - Commands can only be built by the validator
//! - No shared mutable state between requests
//! - No timeouts or concurrency limits here; those live at the HTTP boundary and in the session
//! - Publish failures are 400s, call failures are soft 200s (kept as observed upstream)

pub mod command;
pub mod dispatch;
pub mod translate;
pub mod uri;
pub mod validate;

pub use command::{CallCommand, Command, OperationKind, PublishCommand};
pub use dispatch::{Dispatcher, Stage};
pub use validate::{validate, Capabilities, ValidationError, Violation};
