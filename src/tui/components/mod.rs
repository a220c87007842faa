//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Display components that receive all data as props (struct fields):
//! - `TitleBar`: endpoint, turn status, "↓ New" marker
//! - `LandingPage`: empty state before the first message
//! - `MessageView`: one conversation bubble
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `InputBox`: multi-line editor, disabled while a turn is in flight
//! - `MessageList`: scrollable conversation view with layout caching
//!
//! Each file holds the component's state types, event types, rendering,
//! event handling and tests.
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (Top status bar)
//! ├── landing.rs       (Empty state)
//! ├── message.rs       (Single bubble)
//! ├── message_list.rs  (Scrollable bubble container)
//! └── input_box/       (Text input)
//! ```

pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;
mod title_bar;

pub use input_box::{Disabled, InputBox, InputEvent};
pub use landing::LandingPage;
pub use message::{Bubble, MessageView};
pub use message_list::{MessageList, MessageListState};
pub use title_bar::TitleBar;
