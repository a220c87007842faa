//! HTTP client for the ask endpoint.
//!
//! One `POST {base_url}{ask_path}` per turn with `{ "message": ... }`.
//! The whole answer arrives in a single JSON envelope; no retries.

use async_trait::async_trait;
use log::{debug, info, warn};

use super::types::{AskEnvelope, AskError, AskReply, AskRequest};

#[async_trait]
pub trait AskClient: Send + Sync {
    /// Human-readable target, shown in the title bar.
    fn endpoint(&self) -> &str;

    /// Sends one question and waits for the complete answer.
    async fn ask(&self, message: &str) -> Result<AskReply, AskError>;
}

/// reqwest-backed client for a single endpoint URL.
pub struct HttpAskClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAskClient {
    /// Builds a client for `base_url` + `ask_path`.
    ///
    /// Fails when the joined URL does not parse or the HTTP client cannot be
    /// constructed; the caller disables the chat feature in that case.
    pub fn new(base_url: &str, ask_path: &str) -> Result<Self, AskError> {
        let endpoint = join_url(base_url, ask_path);
        reqwest::Url::parse(&endpoint)
            .map_err(|e| AskError::Network(format!("invalid endpoint {endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AskError::Network(e.to_string()))?;
        Ok(Self { endpoint, client })
    }
}

/// Joins a base URL and a path with exactly one `/` between them.
fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

#[async_trait]
impl AskClient for HttpAskClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn ask(&self, message: &str) -> Result<AskReply, AskError> {
        info!("Ask request: endpoint={}, message_len={}", self.endpoint, message.len());

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { message })
            .send()
            .await
            .map_err(|e| AskError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Ask response status: {}", status);

        let body = response
            .text()
            .await
            .map_err(|e| AskError::Network(e.to_string()))?;

        let envelope = serde_json::from_str::<AskEnvelope>(&body);

        if !status.is_success() {
            let message = envelope.ok().and_then(|env| env.failure_message());
            warn!("Ask API error: {} - {:?}", status.as_u16(), message);
            return Err(AskError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope.map_err(|e| {
            warn!("Unreadable ask envelope ({} bytes): {}", body.len(), e);
            AskError::Parse(e.to_string())
        })?;

        if envelope.ok != Some(true) {
            let message = envelope.failure_message();
            warn!("Ask rejected by server: {:?}", message);
            return Err(AskError::Rejected { message });
        }

        let reply = AskReply {
            answer: envelope.answer.unwrap_or_default(),
            truncated: envelope.truncated.unwrap_or(false),
        };
        info!(
            "Ask complete: answer_len={}, truncated={}",
            reply.answer.len(),
            reply.truncated
        );
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h:8000/", "/api/ask"), "http://h:8000/api/ask");
        assert_eq!(join_url("http://h:8000", "api/ask"), "http://h:8000/api/ask");
        assert_eq!(join_url("http://h:8000", ""), "http://h:8000");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = HttpAskClient::new("not a url", "/api/ask");
        assert!(matches!(result, Err(AskError::Network(_))));
    }

    #[test]
    fn test_endpoint_reports_joined_url() {
        let client = HttpAskClient::new("http://localhost:8000", "/api/chat/ask").unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8000/api/chat/ask");
    }
}
