//! Simulated streaming: reveals a complete answer one character per tick,
//! re-rendering the visible prefix at a throttled rate.
//!
//! [`StreamingSimulator::step`] is the whole algorithm and takes the clock as
//! an argument; [`StreamingSimulator::run`] is a thin tokio driver around it.

pub mod scroll;
pub mod target;

use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::render::Renderer;

pub use scroll::{ScrollController, ScrollFrame};
pub use target::{Body, RenderTarget, SharedBody, TargetError};

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Interval between revealed characters.
    pub tick: Duration,
    /// Minimum time between two renders of the prefix.
    pub render_throttle: Duration,
    /// Request an input-anchoring scroll every this many characters.
    pub input_scroll_every: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(20),
            render_throttle: Duration::from_millis(50),
            input_scroll_every: 10,
        }
    }
}

/// Result of one [`StreamingSimulator::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// One more character is visible; `rendered` says whether the target
    /// was rewritten on this tick.
    Revealed { revealed: usize, rendered: bool },
    /// The full text has been rendered; no further steps do anything.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled { revealed: usize },
}

pub struct StreamingSimulator {
    text: String,
    /// Byte offset just past each character, so prefixes never split UTF-8.
    char_ends: Vec<usize>,
    cursor: usize,
    last_render: Option<Instant>,
    finished: bool,
    settings: StreamSettings,
}

impl StreamingSimulator {
    pub fn new(text: impl Into<String>, settings: StreamSettings) -> Self {
        let text = text.into();
        let char_ends = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
        Self {
            text,
            char_ends,
            cursor: 0,
            last_render: None,
            finished: false,
            settings,
        }
    }

    /// Number of characters in the full text.
    pub fn len(&self) -> usize {
        self.char_ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.char_ends.is_empty()
    }

    /// Characters revealed so far.
    pub fn revealed(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Resets the simulator and empties the target.
    pub fn begin(&mut self, target: &mut dyn RenderTarget) {
        self.cursor = 0;
        self.last_render = None;
        self.finished = false;
        if let Err(e) = target.clear() {
            warn!("Stream target clear failed: {}", e);
        }
    }

    /// Advances the reveal by one character (or finishes), rendering into
    /// `target` when the throttle allows.
    pub fn step(
        &mut self,
        now: Instant,
        renderer: &Renderer,
        target: &mut dyn RenderTarget,
        scroll: &ScrollController,
    ) -> Step {
        if self.finished {
            return Step::Finished;
        }

        if self.cursor >= self.len() {
            self.render_into(&self.text, renderer, target);
            self.last_render = Some(now);
            self.finished = true;
            scroll.scroll_to_bottom();
            scroll.scroll_to_input();
            debug!("Stream finished: {} chars", self.len());
            return Step::Finished;
        }

        let due = match self.last_render {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.settings.render_throttle,
        };
        if due {
            let prefix = &self.text[..self.char_ends[self.cursor]];
            self.render_into(prefix, renderer, target);
            self.last_render = Some(now);
        }

        self.cursor += 1;
        scroll.scroll_to_bottom();
        let every = self.settings.input_scroll_every;
        if every > 0 && self.cursor % every == 0 {
            scroll.scroll_to_input();
        }

        Step::Revealed {
            revealed: self.cursor,
            rendered: due,
        }
    }

    fn render_into(&self, text: &str, renderer: &Renderer, target: &mut dyn RenderTarget) {
        let written = match renderer.try_render(text) {
            Ok(mut markup) => {
                renderer.highlight(&mut markup);
                target.set_markup(markup)
            }
            Err(e) => {
                debug!("Render failed at {} chars, showing plain: {}", self.cursor, e);
                target.set_plain(text)
            }
        };
        if let Err(e) = written {
            warn!("Stream target write failed: {}", e);
        }
    }

    /// Drives [`step`](Self::step) on a `tick` interval until the text is
    /// fully revealed or `cancel` fires.
    pub async fn run(
        &mut self,
        renderer: &Renderer,
        target: &mut dyn RenderTarget,
        scroll: &ScrollController,
        cancel: &CancellationToken,
    ) -> StreamOutcome {
        info!(
            "Stream start: {} chars, tick={:?}",
            self.len(),
            self.settings.tick
        );
        self.begin(target);
        let mut interval = tokio::time::interval(self.settings.tick.max(MIN_TICK));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Stream cancelled at {}/{} chars", self.cursor, self.len());
                    return StreamOutcome::Cancelled { revealed: self.cursor };
                }
                now = interval.tick() => {
                    if self.step(now, renderer, target, scroll) == Step::Finished {
                        return StreamOutcome::Completed;
                    }
                }
            }
        }
    }
}
