pub mod client;
pub mod types;

pub use client::{AskClient, HttpAskClient};
pub use types::{AskError, AskReply, AskRequest};
