use std::fmt;

use serde::{Deserialize, Serialize};

/// Request body for the ask endpoint.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AskRequest<'a> {
    pub message: &'a str,
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AskReply {
    pub answer: String,
    pub truncated: bool,
}

/// Response envelope as sent by the server. Every field is optional so that
/// both the success and the failure shapes parse.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct AskEnvelope {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub truncated: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    /// FastAPI-style validation errors carry a string or a list here.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl AskEnvelope {
    /// The server-supplied failure text: `error` first, then `detail`.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(err) = self.error.as_deref().filter(|e| !e.trim().is_empty()) {
            return Some(err.to_string());
        }
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(serde_json::Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Errors that can end a turn's request.
#[derive(Debug, Clone, PartialEq)]
pub enum AskError {
    /// The request could not complete (connection refused, DNS, reset).
    Network(String),
    /// Non-success HTTP status, with the server's `error`/`detail` if present.
    Api { status: u16, message: Option<String> },
    /// 2xx response whose envelope says `ok: false`.
    Rejected { message: Option<String> },
    /// 2xx response that was not a readable envelope.
    Parse(String),
}

impl fmt::Display for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskError::Network(msg) => write!(f, "network error: {msg}"),
            AskError::Api { status, message } => match message {
                Some(m) => write!(f, "API error (HTTP {status}): {m}"),
                None => write!(f, "API error (HTTP {status})"),
            },
            AskError::Rejected { message } => match message {
                Some(m) => write!(f, "request rejected: {m}"),
                None => write!(f, "request rejected"),
            },
            AskError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for AskError {}
