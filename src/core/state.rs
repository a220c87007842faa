//! # Application State
//!
//! Core business state for Parley. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── client: Option<Arc<dyn AskClient>>  // None = chat disabled
//! ├── endpoint: String                    // shown in the title bar
//! ├── store: MessageStore                 // conversation history
//! ├── turn: TurnState                     // where the current turn is
//! ├── lock: UiLock                        // one turn at a time
//! ├── messages: Messages                  // configured fixed texts
//! ├── disabled: Option<String>            // why chat is unavailable
//! ├── last_outcome: Option<TurnOutcome>   // how the last turn ended
//! └── status_message: String              // status bar text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use log::{error, info};

use crate::ask::{AskClient, HttpAskClient};
use crate::core::config::{Messages, ResolvedConfig};
use crate::core::message::MessageStore;
use crate::core::turn::{TurnOutcome, TurnState, UiLock};

pub struct App {
    pub client: Option<Arc<dyn AskClient>>,
    pub endpoint: String,
    pub store: MessageStore,
    pub turn: TurnState,
    pub lock: UiLock,
    pub messages: Messages,
    /// Set when the ask client could not be built. Input stays disabled;
    /// everything else keeps working.
    pub disabled: Option<String>,
    pub last_outcome: Option<TurnOutcome>,
    pub status_message: String,
}

impl App {
    pub fn new(client: Arc<dyn AskClient>, messages: Messages) -> Self {
        Self {
            endpoint: client.endpoint().to_string(),
            client: Some(client),
            store: MessageStore::new(),
            turn: TurnState::Idle,
            lock: UiLock::default(),
            messages,
            disabled: None,
            last_outcome: None,
            status_message: String::from("Welcome to Parley!"),
        }
    }

    pub fn disabled(endpoint: String, reason: String, messages: Messages) -> Self {
        error!("Chat disabled: {}", reason);
        Self {
            client: None,
            endpoint,
            store: MessageStore::new(),
            turn: TurnState::Idle,
            lock: UiLock::default(),
            messages,
            status_message: format!("Chat unavailable: {reason}"),
            disabled: Some(reason),
            last_outcome: None,
        }
    }

    /// Builds the HTTP client for the resolved profile, or a disabled app if
    /// that fails.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        match HttpAskClient::new(&config.base_url, &config.ask_path) {
            Ok(client) => {
                info!(
                    "Profile '{}' → {}",
                    config.profile,
                    client.endpoint()
                );
                Self::new(Arc::new(client), config.messages.clone())
            }
            Err(e) => Self::disabled(
                format!("{}{}", config.base_url, config.ask_path),
                e.to_string(),
                config.messages.clone(),
            ),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }

    /// True when a submit would start a turn (given non-blank text).
    pub fn accepts_input(&self) -> bool {
        self.disabled.is_none() && !self.lock.is_held()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CliOverrides, ParleyConfig, resolve_with_env};
    use crate::test_support::test_app;

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert_eq!(app.status_message, "Welcome to Parley!");
        assert!(!app.is_locked());
        assert!(app.accepts_input());
        assert_eq!(app.endpoint, "scripted://ask");
        assert!(app.store.is_empty());
    }

    #[test]
    fn test_invalid_base_url_disables_chat() {
        let cli = CliOverrides {
            profile: None,
            base_url: Some("not a url".to_string()),
        };
        let resolved = resolve_with_env(&ParleyConfig::default(), &cli, |_| None);
        let app = App::from_config(&resolved);
        assert!(app.client.is_none());
        assert!(app.disabled.is_some());
        assert!(!app.accepts_input());
    }

    #[test]
    fn test_valid_config_builds_client() {
        let resolved = resolve_with_env(&ParleyConfig::default(), &CliOverrides::default(), |_| None);
        let app = App::from_config(&resolved);
        assert!(app.client.is_some());
        assert_eq!(app.endpoint, "http://localhost:8000/api/chat/ask");
    }
}
