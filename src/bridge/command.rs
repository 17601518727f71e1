//! Validated commands.
//!
//! Both types are only built by [`crate::bridge::validate`], so holding one
//! means every required field was present, typed, and URI-valid.

use serde_json::{Map, Value};

/// Operation selected by the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Publish,
    Call,
}

impl OperationKind {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Publish => "publish",
            OperationKind::Call => "call",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A publish request ready for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishCommand {
    pub(super) topic: String,
    pub(super) args: Vec<Value>,
    pub(super) args_kw: Option<Map<String, Value>>,
    pub(super) options: Option<Map<String, Value>>,
}

impl PublishCommand {
    /// Lowercased, URI-valid topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn args_kw(&self) -> Option<&Map<String, Value>> {
        self.args_kw.as_ref()
    }

    /// Publish options, passed through untouched (e.g. `exclude_me`).
    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.options.as_ref()
    }

    /// Consume the command into `(topic, args, args_kw, options)`.
    pub fn into_parts(
        self,
    ) -> (String, Vec<Value>, Option<Map<String, Value>>, Option<Map<String, Value>>) {
        (self.topic, self.args, self.args_kw, self.options)
    }
}

/// A call request ready for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CallCommand {
    pub(super) procedure: String,
    pub(super) args: Option<Vec<Value>>,
    pub(super) args_kw: Option<Map<String, Value>>,
    pub(super) options: Option<Map<String, Value>>,
}

impl CallCommand {
    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn args(&self) -> Option<&[Value]> {
        self.args.as_deref()
    }

    pub fn args_kw(&self) -> Option<&Map<String, Value>> {
        self.args_kw.as_ref()
    }

    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.options.as_ref()
    }

    /// Consume the command into `(procedure, args, args_kw, options)`.
    pub fn into_parts(
        self,
    ) -> (
        String,
        Option<Vec<Value>>,
        Option<Map<String, Value>>,
        Option<Map<String, Value>>,
    ) {
        (self.procedure, self.args, self.args_kw, self.options)
    }
}

/// Either validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Publish(PublishCommand),
    Call(CallCommand),
}

impl Command {
    pub fn kind(&self) -> OperationKind {
        match self {
            Command::Publish(_) => OperationKind::Publish,
            Command::Call(_) => OperationKind::Call,
        }
    }
}
