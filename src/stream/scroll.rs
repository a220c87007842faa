//! Coalesced scroll requests, consumed once per frame by the TUI.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

pub const DEFAULT_INPUT_SETTLE: Duration = Duration::from_millis(150);

/// What the next frame should do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollFrame {
    /// Pin the message list to its newest content.
    pub bottom: bool,
    /// Bring the input box (and its cursor line) into view.
    pub input: bool,
}

#[derive(Debug)]
struct Shared {
    bottom: AtomicBool,
    input_due: Mutex<Option<Instant>>,
    settle: Duration,
    /// Frames that carried a bottom scroll; logged when a turn finishes.
    bottom_frames: AtomicU64,
}

#[derive(Debug, Clone)]
pub struct ScrollController {
    shared: Arc<Shared>,
}

impl ScrollController {
    pub fn new(input_settle: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                bottom: AtomicBool::new(false),
                input_due: Mutex::new(None),
                settle: input_settle,
                bottom_frames: AtomicU64::new(0),
            }),
        }
    }

    /// Requests a scroll to the newest content on the next frame. Any number
    /// of calls before that frame collapse into one scroll.
    pub fn scroll_to_bottom(&self) {
        self.shared.bottom.store(true, Ordering::Release);
    }

    /// Requests that the input box be brought into view once layout has
    /// settled. A later call pushes the deadline out again.
    pub fn scroll_to_input(&self) {
        let due = Instant::now() + self.shared.settle;
        if let Ok(mut slot) = self.shared.input_due.lock() {
            *slot = Some(due);
        }
    }

    /// Drains the requests that are due at `now`.
    pub fn take_frame(&self, now: Instant) -> ScrollFrame {
        let bottom = self.shared.bottom.swap(false, Ordering::AcqRel);
        if bottom {
            self.shared.bottom_frames.fetch_add(1, Ordering::Relaxed);
        }
        let input = match self.shared.input_due.lock() {
            Ok(mut slot) => match *slot {
                Some(due) if due <= now => {
                    *slot = None;
                    true
                }
                _ => false,
            },
            Err(_) => false,
        };
        ScrollFrame { bottom, input }
    }

    pub fn bottom_frames(&self) -> u64 {
        self.shared.bottom_frames.load(Ordering::Relaxed)
    }
}

impl Default for ScrollController {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SETTLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn bottom_requests_coalesce_per_frame() {
        let scroll = ScrollController::default();
        for _ in 0..25 {
            scroll.scroll_to_bottom();
        }
        let now = Instant::now();
        assert!(scroll.take_frame(now).bottom);
        assert!(!scroll.take_frame(now).bottom);
        assert_eq!(scroll.bottom_frames(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn input_request_waits_for_settle() {
        let scroll = ScrollController::new(Duration::from_millis(150));
        scroll.scroll_to_input();
        assert!(!scroll.take_frame(Instant::now()).input);

        tokio::time::advance(Duration::from_millis(149)).await;
        assert!(!scroll.take_frame(Instant::now()).input);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(scroll.take_frame(Instant::now()).input);
        assert!(!scroll.take_frame(Instant::now()).input);
    }

    #[tokio::test(start_paused = true)]
    async fn clones_share_requests() {
        let scroll = ScrollController::default();
        let other = scroll.clone();
        other.scroll_to_bottom();
        assert_eq!(
            scroll.take_frame(Instant::now()),
            ScrollFrame {
                bottom: true,
                input: false
            }
        );
    }
}
