//! Call outcome → HTTP translation.
//!
//! Both remote success and remote failure are `200 application/json`: the
//! HTTP exchange worked, the payload says how the remote operation went.
//! Session faults degrade to the plain-text `Problem` reply.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::http::response::HttpOutcome;
use crate::session::{CallOutcome, SessionError};

#[derive(Serialize)]
struct SuccessBody<'a> {
    result: &'static str,
    args: &'a Option<Vec<Value>>,
    #[serde(rename = "argsKw")]
    args_kw: &'a Option<Map<String, Value>>,
    details: &'a Map<String, Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    result: &'static str,
    error_uri: &'a str,
    error_args: &'a Option<Vec<Value>>,
    error_argskw: &'a Option<Map<String, Value>>,
    error_details: &'a Map<String, Value>,
}

/// Translate the awaited result of a call into its HTTP response.
pub fn translate(result: &Result<CallOutcome, SessionError>) -> HttpOutcome {
    match result {
        Ok(outcome) => translate_outcome(outcome),
        Err(e) => {
            tracing::warn!(error = %e, "Call failed in the session");
            HttpOutcome::problem()
        }
    }
}

/// Translate a call outcome produced by the session.
pub fn translate_outcome(outcome: &CallOutcome) -> HttpOutcome {
    match outcome {
        CallOutcome::Success {
            args,
            args_kw,
            details,
        } => HttpOutcome::json(
            StatusCode::OK,
            &SuccessBody {
                result: "SUCCESS",
                args,
                args_kw,
                details,
            },
        ),
        CallOutcome::Failure {
            error_uri,
            error_args,
            error_args_kw,
            error_details,
        } => HttpOutcome::json(
            StatusCode::OK,
            &ErrorBody {
                result: "ERROR",
                error_uri,
                error_args,
                error_argskw: error_args_kw,
                error_details,
            },
        ),
    }
}
