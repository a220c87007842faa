//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! translates keyboard events into core::Action values, and performs the
//! `Effect`s the reducer asks for (HTTP request, simulated stream).
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Tasks and channels
//!
//! The ask request and the streaming simulator run as tokio tasks. They
//! report back over a `std::sync::mpsc` channel of `Action`s, drained between
//! frames, so every state change is applied on this thread. The simulator
//! writes the reply body directly through a `SharedBody`; the list picks up
//! each write on the next frame.
//!
//! ## Redraw Strategy
//!
//! - **Turn in flight**: draws every ~30ms so revealed text and the typing
//!   indicator animate smoothly.
//! - **Idle**: sleeps up to 500ms, only redraws on events or resize.
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call, making blinking cursors appear erratic during continuous redraws.

mod component;
mod components;
mod event;
mod ui;

use std::io::stdout;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, info, warn};
use ratatui::style::Color;
use tokio_util::sync::CancellationToken;

use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::message::MessageId;
use crate::core::state::App;
use crate::render::{Markup, Renderer};
use crate::stream::{
    RenderTarget, ScrollController, SharedBody, StreamSettings, StreamingSimulator,
};
use crate::tui::component::EventHandler;
use crate::tui::components::{Disabled, InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const ACTIVE_POLL: Duration = Duration::from_millis(30);
const IDLE_POLL: Duration = Duration::from_millis(500);
/// Milliseconds per animation frame index.
const ANIMATION_STEP_MS: u128 = 50;

/// TUI-specific presentation state (not part of core business logic)
pub(crate) struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// The landing page goes away with the first message and stays away.
    landing_dismissed: bool,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            landing_dismissed: false,
        }
    }

    pub fn show_landing(&self) -> bool {
        !self.landing_dismissed && self.message_list.is_empty()
    }

    pub fn dismiss_landing(&mut self) {
        self.landing_dismissed = true;
    }

    /// Copies App state into component props.
    pub fn sync_props(&mut self, app: &App) {
        self.input_box.disabled = if app.disabled.is_some() {
            Some(Disabled::Unavailable)
        } else if app.is_locked() {
            Some(Disabled::Busy)
        } else {
            None
        };
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Enable Kitty keyboard protocol unconditionally (allows Shift+Enter detection)
        // Detection via supports_keyboard_enhancement() fails in WSL, but the protocol
        // is harmlessly ignored by terminals that don't support it
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Performs effects: owns the render pipeline, the scroll controller shared
/// with stream tasks, and the cancellation token of the turn in flight.
struct EffectRunner {
    renderer: Renderer,
    scroll: ScrollController,
    stream: StreamSettings,
    tx: mpsc::Sender<Action>,
    active: Option<CancellationToken>,
}

impl EffectRunner {
    /// Returns true when the loop should exit.
    fn apply(&mut self, effect: Effect, app: &App, tui: &mut TuiState) -> bool {
        match effect {
            Effect::None => {}
            Effect::BeginTurn {
                user_id,
                reply_id,
                message,
            } => {
                tui.dismiss_landing();
                tui.message_list.push_user(user_id, Markup::plain(&message));
                tui.message_list.push_placeholder(reply_id);
                tui.message_list.jump_to_bottom();
                self.spawn_ask(app, reply_id, message);
            }
            Effect::StreamReply {
                reply_id,
                text,
                truncated,
            } => {
                let Some(bubble) = tui.message_list.bubble_mut(reply_id) else {
                    warn!("No bubble for reply {}", reply_id);
                    return false;
                };
                bubble.truncated = truncated;
                let body = bubble.body.clone();
                self.spawn_stream(reply_id, text, body);
            }
            Effect::ShowError { reply_id, message } => {
                self.active = None;
                match tui.message_list.bubble_mut(reply_id) {
                    Some(bubble) => {
                        if let Err(e) = bubble.body.set_plain(&message) {
                            warn!("Showing error in {} failed: {}", reply_id, e);
                        }
                    }
                    None => warn!("No bubble for reply {}", reply_id),
                }
                self.scroll.scroll_to_bottom();
                self.scroll.scroll_to_input();
            }
            Effect::TurnFinished { reply_id } => {
                debug!(
                    "Turn {} finished ({} bottom scrolls so far)",
                    reply_id,
                    self.scroll.bottom_frames()
                );
                self.active = None;
                self.scroll.scroll_to_input();
            }
            Effect::CancelTurn { reply_id } => {
                if let Some(token) = self.active.take() {
                    token.cancel();
                }
                tui.message_list.mark_cancelled(reply_id);
            }
            Effect::Quit => return true,
        }
        false
    }

    fn spawn_ask(&mut self, app: &App, reply_id: MessageId, message: String) {
        let Some(client) = app.client.clone() else {
            warn!("Turn {} started without a client", reply_id);
            return;
        };
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        let tx = self.tx.clone();

        info!("Spawning ask request for {}", reply_id);
        tokio::spawn(async move {
            let action = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!("Ask for {} cancelled", reply_id);
                    return;
                }
                result = client.ask(&message) => match result {
                    Ok(reply) => Action::AskSucceeded {
                        reply_id,
                        answer: reply.answer,
                        truncated: reply.truncated,
                    },
                    Err(error) => Action::AskFailed { reply_id, error },
                },
            };
            if tx.send(action).is_err() {
                warn!("Failed to send ask result for {}: receiver dropped", reply_id);
            }
        });
    }

    fn spawn_stream(&mut self, reply_id: MessageId, text: String, mut body: SharedBody) {
        let token = self.active.get_or_insert_with(CancellationToken::new).clone();
        let renderer = self.renderer.clone();
        let scroll = self.scroll.clone();
        let settings = self.stream;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let mut simulator = StreamingSimulator::new(text, settings);
            let outcome = simulator.run(&renderer, &mut body, &scroll, &token).await;
            if tx.send(Action::StreamFinished { reply_id, outcome }).is_err() {
                warn!("Failed to send stream end for {}: receiver dropped", reply_id);
            }
        });
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut app = App::from_config(&config);
    let mut tui = TuiState::new();

    let (tx, rx) = mpsc::channel();
    let mut runner = EffectRunner {
        renderer: Renderer::from_settings(&config.render, Color::Reset),
        scroll: ScrollController::new(config.input_settle),
        stream: config.stream,
        tx,
        active: None,
    };

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true;
    let mut should_quit = false;

    while !should_quit {
        tui.sync_props(&app);

        let scroll_frame = runner.scroll.take_frame(tokio::time::Instant::now());
        if scroll_frame.bottom {
            tui.message_list.follow_newest();
        }
        if scroll_frame.input {
            let width = terminal.get_frame().area().width;
            tui.input_box.reveal_cursor(width);
        }

        let animating = app.turn.in_flight();
        if animating || scroll_frame.bottom || scroll_frame.input {
            needs_redraw = true;
        }

        if needs_redraw {
            let frame_index = (start_time.elapsed().as_millis() / ANIMATION_STEP_MS) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, frame_index))?;
            needs_redraw = false;
        }

        let timeout = if animating { ACTIVE_POLL } else { IDLE_POLL };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let action = match event {
                TuiEvent::Resize => None,
                TuiEvent::ForceQuit => Some(Action::Quit),
                TuiEvent::Escape if app.turn.in_flight() => Some(Action::Cancel),
                TuiEvent::Escape => None,
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown
                | TuiEvent::ScrollToBottom => {
                    tui.message_list.handle_event(&event);
                    None
                }
                _ => match tui.input_box.handle_event(&event) {
                    Some(InputEvent::Submit(text)) => Some(Action::Submit(text)),
                    Some(InputEvent::Changed { empty }) => Some(Action::InputEdited { empty }),
                    Some(InputEvent::CursorMoved) | None => None,
                },
            };
            if let Some(action) = action {
                let effect = update(&mut app, action);
                should_quit |= runner.apply(effect, &app, &mut tui);
                tui.sync_props(&app);
            }
        }

        // Results from background tasks
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            let effect = update(&mut app, action);
            should_quit |= runner.apply(effect, &app, &mut tui);
        }
    }

    if let Some(token) = runner.active.take() {
        token.cancel();
    }
    ratatui::restore();
    Ok(())
}
