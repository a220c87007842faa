//! # Turn State
//!
//! One turn = one user message and the assistant reply it produces.
//!
//! ```text
//!  Idle ⇄ AwaitingInput ──Submit──▶ Sending ──AskSucceeded──▶ StreamingReply
//!   ▲                                  │                            │
//!   │                              AskFailed                  StreamFinished
//!   │                                  ▼                            │
//!   └────────── terminal step ◀──── Errored ◀───────────────────────┘
//! ```
//!
//! `Cancel` from `Sending` or `StreamingReply` goes straight back to `Idle`.

use crate::ask::AskError;
use crate::core::config::Messages;
use crate::core::message::MessageId;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum TurnState {
    #[default]
    Idle,
    /// The input box holds non-blank text.
    AwaitingInput,
    Sending {
        reply_id: MessageId,
    },
    StreamingReply {
        reply_id: MessageId,
        answer: String,
        truncated: bool,
    },
    Errored {
        reply_id: MessageId,
        message: String,
    },
}

impl TurnState {
    /// The assistant message id of the turn in flight, if any.
    pub fn reply_id(&self) -> Option<MessageId> {
        match self {
            TurnState::Sending { reply_id }
            | TurnState::StreamingReply { reply_id, .. }
            | TurnState::Errored { reply_id, .. } => Some(*reply_id),
            TurnState::Idle | TurnState::AwaitingInput => None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.reply_id().is_some()
    }
}

/// Held from submit until the turn's terminal step. While held, submits are
/// ignored and the input box is disabled.
#[derive(Debug, Default)]
pub struct UiLock {
    held: bool,
}

impl UiLock {
    /// Returns `false` if the lock was already held.
    pub fn acquire(&mut self) -> bool {
        !std::mem::replace(&mut self.held, true)
    }

    pub fn release(&mut self) {
        self.held = false;
    }

    pub fn is_held(&self) -> bool {
        self.held
    }
}

/// How the most recent turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered { truncated: bool },
    Failed { message: String },
    Cancelled,
}

/// The text shown in place of an answer when a request fails.
pub fn error_message(error: &AskError, messages: &Messages) -> String {
    match error {
        AskError::Api {
            message: Some(m), ..
        }
        | AskError::Rejected { message: Some(m) } => m.clone(),
        AskError::Api {
            status,
            message: None,
        } => messages
            .status_error
            .replace("{status}", &status.to_string()),
        AskError::Rejected { message: None } => messages.unknown_error.clone(),
        AskError::Network(_) | AskError::Parse(_) => messages.transport_error.clone(),
    }
}
