//! # MessageList Component
//!
//! Scrollable view of the conversation.
//!
//! ## Responsibilities
//!
//! - Own the bubbles shown on screen (user messages and assistant bodies)
//! - Manage scrolling and stick-to-bottom
//! - Perform efficient layout caching (bubble heights)
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) plus render props.
//!
//! Assistant bodies are written by the streaming task through a
//! [`SharedBody`]. Every write bumps the body's revision, so a bubble's height
//! is recomputed only when its revision, its badge, or the width changed.

use std::ops::Range;

use log::{debug, warn};
use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::message::{MessageId, Role};
use crate::render::Markup;
use crate::stream::SharedBody;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::{Bubble, MessageView};
use crate::tui::event::TuiEvent;

/// Badge shown on a reply the user stopped.
pub const STOPPED_BADGE: &str = "stopped";

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub bubbles: Vec<Bubble>,
    /// Scroll offset and view state
    pub scroll_state: ScrollViewState,
    /// Cached layout measurements
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Content changed below the viewport while detached from the bottom
    pub unseen_below: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            bubbles: Vec::new(),
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            unseen_below: false,
            viewport_height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Appends a finished user bubble.
    pub fn push_user(&mut self, id: MessageId, markup: Markup) {
        self.bubbles
            .push(Bubble::new(id, Role::User, SharedBody::with_markup(markup)));
    }

    /// Appends an empty assistant bubble and returns the handle its writer
    /// fills in.
    pub fn push_placeholder(&mut self, id: MessageId) -> SharedBody {
        let body = SharedBody::new();
        self.bubbles
            .push(Bubble::new(id, Role::Assistant, body.clone()));
        body
    }

    pub fn bubble(&self, id: MessageId) -> Option<&Bubble> {
        self.bubbles.iter().rev().find(|b| b.id == id)
    }

    pub fn bubble_mut(&mut self, id: MessageId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().rev().find(|b| b.id == id)
    }

    /// A stopped reply keeps whatever it revealed, badged. If it never
    /// revealed anything it is removed.
    pub fn mark_cancelled(&mut self, id: MessageId) {
        let Some(idx) = self.bubbles.iter().rposition(|b| b.id == id) else {
            return;
        };
        let pending = match self.bubbles[idx].body.with_body(|b| b.is_pending()) {
            Ok(pending) => pending,
            Err(e) => {
                warn!("Reading bubble {} failed: {}", id, e);
                true
            }
        };
        if pending {
            debug!("Removing empty bubble {}", id);
            self.bubbles.remove(idx);
            self.layout.invalidate_from(idx);
        } else {
            self.bubbles[idx].cancelled = true;
        }
    }

    /// Pins the view to the newest content, unless the user scrolled away.
    pub fn follow_newest(&mut self) {
        if self.stick_to_bottom {
            self.scroll_state.scroll_to_bottom();
        }
    }

    /// Re-attach to the bottom explicitly.
    pub fn jump_to_bottom(&mut self) {
        self.stick_to_bottom = true;
        self.unseen_below = false;
        self.scroll_state.scroll_to_bottom();
    }

    fn max_scroll(&self) -> u16 {
        self.layout
            .total_height()
            .saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Clamp scroll and re-engage auto-scroll if the user has reached the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_scroll();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.unseen_below = false;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub truncated_notice: &'a str,
    pub frame_index: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, truncated_notice: &'a str, frame_index: usize) -> Self {
        Self {
            state,
            truncated_notice,
            frame_index,
        }
    }

    fn badge(&self, bubble: &Bubble) -> Option<&'a str> {
        if bubble.cancelled {
            Some(STOPPED_BADGE)
        } else if bubble.truncated {
            Some(self.truncated_notice)
        } else {
            None
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Update layout cache
        let keys: Vec<LayoutKey> = self
            .state
            .bubbles
            .iter()
            .map(|b| LayoutKey {
                revision: b.body.revision(),
                badge: self.badge(b).is_some(),
            })
            .collect();
        let grew = {
            let bubbles = &self.state.bubbles;
            self.state.layout.update(&keys, content_width, |i| {
                match bubbles[i].body.with_body(|body| MessageView::calculate_height(body, content_width)) {
                    Ok(h) => h,
                    Err(e) => {
                        warn!("Measuring bubble {} failed: {}", bubbles[i].id, e);
                        1
                    }
                }
            })
        };
        if grew && !self.state.stick_to_bottom {
            self.state.unseen_below = true;
        }

        // 2. Clamp
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        // 3. Render visible bubbles into a ScrollView
        let total_height = self.state.layout.total_height();
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible = self.state.layout.visible_range(scroll_offset, area.height);
        for i in visible {
            let bubble = &self.state.bubbles[i];
            let top = self.state.layout.top_of(i);
            let rect = Rect::new(0, top, content_width, self.state.layout.heights[i]);
            let view_badge = self.badge(bubble);
            let drawn = bubble.body.with_body(|body| {
                scroll_view.render_widget(
                    MessageView {
                        role: bubble.role,
                        body,
                        badge: view_badge,
                        frame_index: self.frame_index,
                    },
                    rect,
                );
            });
            if let Err(e) = drawn {
                warn!("Drawing bubble {} failed: {}", bubble.id, e);
            }
        }

        self.state.follow_newest();
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Scrolling is handled on the persistent state, not on the per-frame
/// `MessageList`, because the offset must survive between frames.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => self.jump_to_bottom(),
            _ => {}
        }
        None
    }
}

/// What a cached height depends on besides the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutKey {
    pub revision: u64,
    pub badge: bool,
}

/// Cached layout measurements
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    keys: Vec<LayoutKey>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            keys: Vec::new(),
            content_width: 0,
        }
    }

    /// Drops cached heights from `idx` on (after a removal).
    pub fn invalidate_from(&mut self, idx: usize) {
        self.keys.truncate(idx);
        self.heights.truncate(idx);
        self.rebuild_prefix_heights();
    }

    /// Recomputes heights whose key changed and returns whether the total
    /// height grew.
    pub fn update(
        &mut self,
        keys: &[LayoutKey],
        content_width: u16,
        mut measure: impl FnMut(usize) -> u16,
    ) -> bool {
        let before = self.total_height();
        if content_width != self.content_width || keys.len() < self.keys.len() {
            self.keys.clear();
            self.heights.clear();
            self.content_width = content_width;
        }
        for (i, key) in keys.iter().enumerate() {
            if self.keys.get(i) == Some(key) {
                continue;
            }
            let height = measure(i);
            if i < self.keys.len() {
                self.keys[i] = *key;
                self.heights[i] = height;
            } else {
                self.keys.push(*key);
                self.heights.push(height);
            }
        }
        self.rebuild_prefix_heights();
        self.total_height() > before
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc = acc.saturating_add(h);
                Some(*acc)
            })
            .collect();
    }

    pub fn total_height(&self) -> u16 {
        self.prefix_heights.last().copied().unwrap_or(0)
    }

    pub fn top_of(&self, idx: usize) -> u16 {
        if idx == 0 {
            0
        } else {
            self.prefix_heights.get(idx - 1).copied().unwrap_or(0)
        }
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
