//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ask::{AskClient, AskError, AskReply};
use crate::core::config::Messages;
use crate::core::state::App;

/// Answers from a fixed queue; records every question it is asked.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<AskReply, AskError>>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(replies: impl IntoIterator<Item = Result<AskReply, AskError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self::new([Ok(AskReply {
            answer: answer.to_string(),
            truncated: false,
        })])
    }
}

#[async_trait]
impl AskClient for ScriptedClient {
    fn endpoint(&self) -> &str {
        "scripted://ask"
    }

    async fn ask(&self, message: &str) -> Result<AskReply, AskError> {
        self.asked.lock().unwrap().push(message.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AskError::Network("script exhausted".into())))
    }
}

/// Creates a test App with a ScriptedClient that has nothing to say.
pub fn test_app() -> App {
    App::new(Arc::new(ScriptedClient::new([])), Messages::default())
}
