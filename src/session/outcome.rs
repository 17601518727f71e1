//! Call outcomes produced by the session.

use serde_json::{Map, Value};

/// URI reported when a call targets a procedure nobody registered.
pub const NO_SUCH_PROCEDURE: &str = "wamp.error.no_such_procedure";

/// Result of a remote procedure call, produced once per call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// The callee returned a result.
    Success {
        args: Option<Vec<Value>>,
        args_kw: Option<Map<String, Value>>,
        details: Map<String, Value>,
    },
    /// The callee (or the router) raised an application error.
    Failure {
        error_uri: String,
        error_args: Option<Vec<Value>>,
        error_args_kw: Option<Map<String, Value>>,
        error_details: Map<String, Value>,
    },
}

impl CallOutcome {
    /// Successful result carrying positional arguments only.
    pub fn success(args: Vec<Value>) -> Self {
        Self::Success {
            args: Some(args),
            args_kw: None,
            details: Map::new(),
        }
    }

    /// Application error with positional arguments only.
    pub fn error(uri: impl Into<String>, args: Vec<Value>) -> Self {
        Self::Failure {
            error_uri: uri.into(),
            error_args: Some(args),
            error_args_kw: None,
            error_details: Map::new(),
        }
    }

    pub fn no_such_procedure() -> Self {
        Self::Failure {
            error_uri: NO_SUCH_PROCEDURE.to_string(),
            error_args: None,
            error_args_kw: None,
            error_details: Map::new(),
        }
    }

    /// Attach keyword arguments to either variant.
    pub fn with_args_kw(mut self, kw: Map<String, Value>) -> Self {
        match &mut self {
            Self::Success { args_kw, .. } => *args_kw = Some(kw),
            Self::Failure { error_args_kw, .. } => *error_args_kw = Some(kw),
        }
        self
    }

    /// Replace the details object of either variant.
    pub fn with_details(mut self, new_details: Map<String, Value>) -> Self {
        match &mut self {
            Self::Success { details, .. } => *details = new_details,
            Self::Failure { error_details, .. } => *error_details = new_details,
        }
        self
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builders_target_the_right_variant() {
        let mut kw = Map::new();
        kw.insert("x".into(), json!("y"));

        let outcome =
            CallOutcome::error("my.custom.error", vec![json!(4)]).with_args_kw(kw.clone());
        match outcome {
            CallOutcome::Failure { error_uri, error_args_kw, .. } => {
                assert_eq!(error_uri, "my.custom.error");
                assert_eq!(error_args_kw, Some(kw));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn labels() {
        assert_eq!(CallOutcome::success(vec![]).label(), "success");
        assert_eq!(CallOutcome::no_such_procedure().label(), "error");
    }
}
