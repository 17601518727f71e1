//! Request body validation.
//!
//! # Responsibilities
//! - Parse the buffered body as JSON
//! - Check field presence and types per operation kind
//! - Normalize and check the topic/procedure URI
//! - Fold session role availability into the same result
//!
//! # Design Decisions
//! - Returns every violation, not just the first
//! - Violation order is fixed: missing fields, wrong types, URI, roles
//! - `null` counts as missing; optional fields of the wrong type count as absent
//! - Option contents are opaque and passed through

use serde_json::{Map, Value};
use thiserror::Error;

use crate::bridge::command::{CallCommand, Command, OperationKind, PublishCommand};
use crate::bridge::uri::is_valid_uri;
use crate::session::Session;

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("no publisher available")]
    PublisherUnavailable,

    #[error("no caller available")]
    CallerUnavailable,
}

/// Why a body could not become a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The body is not a JSON document.
    #[error("JSON decoding failed: {0}")]
    MalformedJson(String),

    /// The document is JSON but breaks one or more rules.
    #[error("{}", join_violations(.0))]
    Invalid(Vec<Violation>),
}

impl ValidationError {
    /// Violations carried by this error; empty for malformed JSON.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ValidationError::MalformedJson(_) => &[],
            ValidationError::Invalid(violations) => violations,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Session roles relevant to validation, sampled once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub publisher: bool,
    pub caller: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        publisher: true,
        caller: true,
    };

    pub const NONE: Capabilities = Capabilities {
        publisher: false,
        caller: false,
    };

    /// Sample the roles a session currently holds.
    pub fn of(session: &dyn Session) -> Self {
        Self {
            publisher: session.is_publisher_available(),
            caller: session.is_caller_available(),
        }
    }
}

/// Validate `raw` as a command of the given kind.
pub fn validate(
    raw: &[u8],
    kind: OperationKind,
    capabilities: Capabilities,
) -> Result<Command, ValidationError> {
    match kind {
        OperationKind::Publish => validate_publish(raw, capabilities).map(Command::Publish),
        OperationKind::Call => validate_call(raw, capabilities).map(Command::Call),
    }
}

/// Validate a `/pub` body: `{topic, args, argsKw?, options?}`.
pub fn validate_publish(
    raw: &[u8],
    capabilities: Capabilities,
) -> Result<PublishCommand, ValidationError> {
    let mut doc = parse_document(raw)?;
    let mut violations = Vec::new();

    let topic = take_present(&mut doc, "topic");
    let args = take_present(&mut doc, "args");

    if topic.is_none() {
        violations.push(Violation::MissingField("topic"));
    }
    if args.is_none() {
        violations.push(Violation::MissingField("args"));
    }

    let topic = match topic {
        Some(Value::String(s)) => Some(s.to_lowercase()),
        Some(Value::Number(n)) => Some(n.to_string()),
        // Scalars take their plain-text form: `true` is "1", `false` is empty.
        Some(Value::Bool(true)) => Some("1".to_string()),
        Some(Value::Bool(false)) => Some(String::new()),
        Some(_) => {
            violations.push(Violation::WrongType {
                field: "topic",
                expected: "a scalar",
            });
            None
        }
        None => None,
    };

    let args = match args {
        Some(Value::Array(items)) => Some(items),
        Some(_) => {
            violations.push(Violation::WrongType {
                field: "args",
                expected: "an array",
            });
            None
        }
        None => None,
    };

    if let Some(topic) = &topic {
        if !is_valid_uri(topic) {
            violations.push(Violation::InvalidUri(topic.clone()));
        }
    }

    if !capabilities.publisher {
        violations.push(Violation::PublisherUnavailable);
    }

    let args_kw = take_object(&mut doc, "argsKw");
    let options = take_object(&mut doc, "options");

    match (topic, args) {
        (Some(topic), Some(args)) if violations.is_empty() => Ok(PublishCommand {
            topic,
            args,
            args_kw,
            options,
        }),
        _ => Err(ValidationError::Invalid(violations)),
    }
}

/// Validate a `/call` body: `{procedure, args?, argsKw?, options?}`.
pub fn validate_call(
    raw: &[u8],
    capabilities: Capabilities,
) -> Result<CallCommand, ValidationError> {
    let mut doc = parse_document(raw)?;
    let mut violations = Vec::new();

    let procedure = match take_present(&mut doc, "procedure") {
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            violations.push(Violation::WrongType {
                field: "procedure",
                expected: "a string",
            });
            None
        }
        None => {
            violations.push(Violation::MissingField("procedure"));
            None
        }
    };

    if let Some(procedure) = &procedure {
        if !is_valid_uri(procedure) {
            violations.push(Violation::InvalidUri(procedure.clone()));
        }
    }

    if !capabilities.caller {
        violations.push(Violation::CallerUnavailable);
    }

    let args = match doc.remove("args") {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    };
    let args_kw = take_object(&mut doc, "argsKw");
    let options = take_object(&mut doc, "options");

    match procedure {
        Some(procedure) if violations.is_empty() => Ok(CallCommand {
            procedure,
            args,
            args_kw,
            options,
        }),
        _ => Err(ValidationError::Invalid(violations)),
    }
}

/// Parse the body; a non-object document is treated as an object with no fields.
fn parse_document(raw: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
    Ok(match value {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn take_present(doc: &mut Map<String, Value>, key: &str) -> Option<Value> {
    doc.remove(key).filter(|v| !v.is_null())
}

fn take_object(doc: &mut Map<String, Value>, key: &str) -> Option<Map<String, Value>> {
    match doc.remove(key) {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    }
}
