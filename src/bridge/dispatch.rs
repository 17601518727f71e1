//! Per-request dispatch.
//!
//! # Responsibilities
//! - Select the operation from method + path
//! - Capture the body, validate it, and run publish or call
//! - Produce exactly one `HttpOutcome` on every path
//!
//! # State Machine
//! ```text
//! Received → BodyCapturing → Validating → PublishExecuting → ResponseSent
//!                                       → CallAwaiting     → ResponseSent
//! Received → ResponseSent (404, body never read)
//! ```
//!
//! # Error Mapping
//! | path    | body/validation fault         | session fault         |
//! |---------|-------------------------------|-----------------------|
//! | publish | 400 `Bad Request: <detail>`   | 400 `Bad Request: …`  |
//! | call    | 200 `No procedure set`        | 200 `Problem`         |
//!
//! A body stream error or an over-limit body is reported as `400` on the
//! publish path and as `Problem` on the call path. A panic inside the
//! session is mapped the same way as a session fault.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Method, Request};
use futures_util::FutureExt;

use crate::bridge::command::{CallCommand, Command, OperationKind, PublishCommand};
use crate::bridge::translate::translate;
use crate::bridge::validate::{validate, Capabilities};
use crate::http::body::BodyAccumulator;
use crate::http::request::request_id;
use crate::http::response::{panic_message, HttpOutcome};
use crate::observability::metrics;
use crate::session::Session;

/// Lifecycle stage of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    BodyCapturing,
    Validating,
    PublishExecuting,
    CallAwaiting,
    ResponseSent,
}

/// Exact-match route selection. Only `POST /pub` and `POST /call` are served.
pub fn select_route(method: &Method, path: &str) -> Option<OperationKind> {
    if *method != Method::POST {
        return None;
    }
    match path {
        "/pub" => Some(OperationKind::Publish),
        "/call" => Some(OperationKind::Call),
        _ => None,
    }
}

/// Turns HTTP requests into session operations.
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<dyn Session>,
    body_limit: Option<usize>,
}

impl Dispatcher {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self {
            session,
            body_limit: None,
        }
    }

    /// Reject bodies over `limit` bytes on the bridge routes.
    ///
    /// Applied only after a route matched, so unrouted requests stay `404`.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Handle one request from arrival to response.
    pub async fn dispatch(&self, request: Request<Body>) -> HttpOutcome {
        let start_time = Instant::now();
        let request_id = request_id(request.headers());
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            stage = ?Stage::Received,
            "Request received"
        );

        let Some(kind) = select_route(&method, &path) else {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "No route matched"
            );
            return self.respond(&request_id, "none", start_time, HttpOutcome::not_found());
        };

        tracing::trace!(request_id = %request_id, stage = ?Stage::BodyCapturing, "Capturing body");
        let (parts, body) = request.into_parts();
        let mut accumulator = BodyAccumulator::from_headers(&parts.headers);
        if let Some(limit) = self.body_limit {
            accumulator = accumulator.with_limit(limit);
        }

        let outcome = match accumulator.capture(body.into_data_stream()).await {
            Ok(raw) => self.execute(&request_id, kind, &raw).await,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    operation = %kind,
                    error = %e,
                    "Failed to read body"
                );
                match kind {
                    OperationKind::Publish => HttpOutcome::bad_request(e),
                    OperationKind::Call => HttpOutcome::problem(),
                }
            }
        };

        self.respond(&request_id, kind.as_str(), start_time, outcome)
    }

    async fn execute(&self, request_id: &str, kind: OperationKind, raw: &[u8]) -> HttpOutcome {
        tracing::trace!(request_id = %request_id, stage = ?Stage::Validating, "Validating");
        match validate(raw, kind, Capabilities::of(self.session.as_ref())) {
            Ok(Command::Publish(command)) => self.publish(request_id, command),
            Ok(Command::Call(command)) => self.call(request_id, command).await,
            Err(e) => {
                tracing::info!(
                    request_id = %request_id,
                    operation = %kind,
                    error = %e,
                    "Rejected request"
                );
                match kind {
                    OperationKind::Publish => HttpOutcome::bad_request(e),
                    OperationKind::Call => HttpOutcome::no_procedure(),
                }
            }
        }
    }

    fn publish(&self, request_id: &str, command: PublishCommand) -> HttpOutcome {
        tracing::debug!(
            request_id = %request_id,
            topic = %command.topic(),
            stage = ?Stage::PublishExecuting,
            "Publishing"
        );
        match panic::catch_unwind(AssertUnwindSafe(|| self.session.publish(command))) {
            Ok(Ok(())) => {
                metrics::record_publish();
                HttpOutcome::published()
            }
            Ok(Err(e)) => {
                tracing::warn!(request_id = %request_id, error = %e, "Session rejected publish");
                HttpOutcome::bad_request(e)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    request_id = %request_id,
                    panic = %message,
                    "Session panicked in publish"
                );
                HttpOutcome::bad_request(message)
            }
        }
    }

    async fn call(&self, request_id: &str, command: CallCommand) -> HttpOutcome {
        tracing::debug!(
            request_id = %request_id,
            procedure = %command.procedure(),
            stage = ?Stage::CallAwaiting,
            "Calling"
        );
        let call = AssertUnwindSafe(async move { self.session.call(command).await });
        match call.catch_unwind().await {
            Ok(result) => {
                metrics::record_call_outcome(match &result {
                    Ok(outcome) => outcome.label(),
                    Err(_) => "fault",
                });
                translate(&result)
            }
            Err(payload) => {
                tracing::error!(
                    request_id = %request_id,
                    panic = %panic_message(payload.as_ref()),
                    "Session panicked in call"
                );
                metrics::record_call_outcome("fault");
                HttpOutcome::problem()
            }
        }
    }

    fn respond(
        &self,
        request_id: &str,
        operation: &'static str,
        start_time: Instant,
        outcome: HttpOutcome,
    ) -> HttpOutcome {
        metrics::record_request(operation, outcome.status().as_u16(), start_time);
        tracing::debug!(
            request_id = %request_id,
            status = outcome.status().as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            stage = ?Stage::ResponseSent,
            "Response ready"
        );
        outcome
    }
}
