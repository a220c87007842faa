//! # Actions
//!
//! Everything that can happen in Parley becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The endpoint answers? That's `Action::AskSucceeded { .. }`.
//!
//! `update()` applies an action to the state and returns the `Effect` the
//! adapter must perform (start a request, start streaming, ...). No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::ask::AskError;
use crate::core::message::{MessageId, Role};
use crate::core::state::App;
use crate::core::turn::{TurnOutcome, TurnState, error_message};
use crate::stream::StreamOutcome;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// The input box changed; `empty` if it now holds only whitespace.
    InputEdited { empty: bool },
    Submit(String),
    AskSucceeded {
        reply_id: MessageId,
        answer: String,
        truncated: bool,
    },
    AskFailed {
        reply_id: MessageId,
        error: AskError,
    },
    StreamFinished {
        reply_id: MessageId,
        outcome: StreamOutcome,
    },
    /// Abandon the turn in flight.
    Cancel,
    Quit,
}

/// Side effect requested by `update`, performed by the adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Show the user message and a placeholder reply, then send `message`.
    BeginTurn {
        user_id: MessageId,
        reply_id: MessageId,
        message: String,
    },
    /// Reveal `text` progressively in the placeholder.
    StreamReply {
        reply_id: MessageId,
        text: String,
        truncated: bool,
    },
    /// Replace the placeholder with `message`; no streaming.
    ShowError { reply_id: MessageId, message: String },
    /// The reply is final; re-enable and refocus input.
    TurnFinished { reply_id: MessageId },
    /// Stop the request or stream for `reply_id`.
    CancelTurn { reply_id: MessageId },
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::InputEdited { empty } => {
            if !app.is_locked() && !app.turn.in_flight() {
                app.turn = if empty {
                    TurnState::Idle
                } else {
                    TurnState::AwaitingInput
                };
            }
            Effect::None
        }
        Action::Submit(text) => submit(app, &text),
        Action::AskSucceeded {
            reply_id,
            answer,
            truncated,
        } => {
            if app.turn != (TurnState::Sending { reply_id }) {
                debug!("Ignoring stale answer for {}", reply_id);
                return Effect::None;
            }
            let text = if answer.is_empty() {
                app.messages.empty_answer.clone()
            } else {
                answer
            };
            info!(
                "Turn {} answered: {} chars, truncated={}",
                reply_id,
                text.chars().count(),
                truncated
            );
            app.turn = TurnState::StreamingReply {
                reply_id,
                answer: text.clone(),
                truncated,
            };
            app.status_message = String::from("Receiving...");
            Effect::StreamReply {
                reply_id,
                text,
                truncated,
            }
        }
        Action::AskFailed { reply_id, error } => {
            if app.turn != (TurnState::Sending { reply_id }) {
                debug!("Ignoring stale failure for {}", reply_id);
                return Effect::None;
            }
            let message = error_message(&error, &app.messages);
            warn!("Turn {} failed: {}", reply_id, error);
            app.turn = TurnState::Errored {
                reply_id,
                message: message.clone(),
            };
            finish_turn(
                app,
                reply_id,
                message.clone(),
                false,
                TurnOutcome::Failed {
                    message: message.clone(),
                },
            );
            Effect::ShowError { reply_id, message }
        }
        Action::StreamFinished { reply_id, outcome } => {
            let TurnState::StreamingReply {
                reply_id: current,
                answer,
                truncated,
            } = &app.turn
            else {
                debug!("Ignoring stream end for {} (no stream in flight)", reply_id);
                return Effect::None;
            };
            if *current != reply_id {
                debug!("Ignoring stale stream end for {}", reply_id);
                return Effect::None;
            }
            match outcome {
                StreamOutcome::Completed => {
                    let (answer, truncated) = (answer.clone(), *truncated);
                    finish_turn(app, reply_id, answer, truncated, TurnOutcome::Answered { truncated });
                    Effect::TurnFinished { reply_id }
                }
                StreamOutcome::Cancelled { revealed } => {
                    info!("Stream {} stopped after {} chars", reply_id, revealed);
                    abandon_turn(app);
                    Effect::None
                }
            }
        }
        Action::Cancel => match &app.turn {
            TurnState::Sending { reply_id } | TurnState::StreamingReply { reply_id, .. } => {
                let reply_id = *reply_id;
                info!("Turn {} cancelled by user", reply_id);
                abandon_turn(app);
                Effect::CancelTurn { reply_id }
            }
            _ => Effect::None,
        },
        Action::Quit => Effect::Quit,
    }
}

fn submit(app: &mut App, text: &str) -> Effect {
    if let Some(reason) = &app.disabled {
        debug!("Submit ignored, chat disabled: {}", reason);
        return Effect::None;
    }
    if app.is_locked() {
        debug!("Submit ignored, turn in flight");
        return Effect::None;
    }
    let message = text.trim();
    if message.is_empty() {
        return Effect::None;
    }
    if !app.lock.acquire() {
        return Effect::None;
    }

    let user_id = app.store.append(Role::User, message);
    let reply_id = app.store.reserve_id();
    app.turn = TurnState::Sending { reply_id };
    app.status_message = String::from("Sending...");
    info!("Turn {} started: {} chars", reply_id, message.chars().count());

    Effect::BeginTurn {
        user_id,
        reply_id,
        message: message.to_string(),
    }
}

/// Terminal step: reconcile history with the final content, then unlock.
fn finish_turn(
    app: &mut App,
    reply_id: MessageId,
    content: String,
    truncated: bool,
    outcome: TurnOutcome,
) {
    app.store.patch(reply_id, content, truncated);
    app.lock.release();
    app.turn = TurnState::Idle;
    app.status_message = match &outcome {
        TurnOutcome::Answered { truncated: true } => String::from("Done (truncated)"),
        TurnOutcome::Answered { .. } => String::from("Done"),
        TurnOutcome::Failed { .. } => String::from("Request failed"),
        TurnOutcome::Cancelled => String::from("Cancelled"),
    };
    app.last_outcome = Some(outcome);
}

/// Unlocks without touching history.
fn abandon_turn(app: &mut App) {
    app.lock.release();
    app.turn = TurnState::Idle;
    app.status_message = String::from("Cancelled");
    app.last_outcome = Some(TurnOutcome::Cancelled);
}
