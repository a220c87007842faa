//! Parley library exports for the binary and integration tests

pub mod ask;
pub mod core;
pub mod render;
pub mod stream;
pub mod tui;

#[cfg(test)]
pub mod test_support;
