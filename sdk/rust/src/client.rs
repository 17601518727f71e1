use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Body of `POST /pub`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishRequest {
    pub topic: String,
    pub args: Vec<Value>,
    #[serde(rename = "argsKw", skip_serializing_if = "Option::is_none")]
    pub args_kw: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// Body of `POST /call`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CallRequest {
    pub procedure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    #[serde(rename = "argsKw", skip_serializing_if = "Option::is_none")]
    pub args_kw: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// JSON reply of `POST /call`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "result")]
pub enum CallResponse {
    #[serde(rename = "SUCCESS")]
    Success {
        args: Option<Vec<Value>>,
        #[serde(rename = "argsKw")]
        args_kw: Option<Map<String, Value>>,
        #[serde(default)]
        details: Map<String, Value>,
    },
    #[serde(rename = "ERROR")]
    Error {
        error_uri: String,
        error_args: Option<Vec<Value>>,
        error_argskw: Option<Map<String, Value>>,
        #[serde(default)]
        error_details: Map<String, Value>,
    },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge answered with something other than the expected reply,
    /// e.g. `400 Bad Request: …` for a publish or `No procedure set` for a call.
    #[error("bridge replied {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("invalid JSON reply: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct BridgeClient {
    client: Client,
    bridge_url: String,
}

impl BridgeClient {
    pub fn new(bridge_url: &str) -> Self {
        Self {
            client: Client::new(),
            bridge_url: bridge_url.trim_end_matches('/').to_string(),
        }
    }

    /// Publish an event through the bridge.
    pub async fn publish(&self, req: &PublishRequest) -> Result<(), ClientError> {
        let resp = self
            .client
            .post(format!("{}/pub", self.bridge_url))
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if status == StatusCode::OK && text == "pub" {
            Ok(())
        } else {
            Err(ClientError::Rejected { status, body: text })
        }
    }

    /// Call a procedure through the bridge.
    pub async fn call(&self, req: &CallRequest) -> Result<CallResponse, ClientError> {
        let resp = self
            .client
            .post(format!("{}/call", self.bridge_url))
            .json(req)
            .send()
            .await?;

        let status = resp.status();
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);
        let text = resp.text().await?;

        if !is_json {
            return Err(ClientError::Rejected { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }
}
