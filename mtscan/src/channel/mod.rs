//! Channel layer for terminal framing and prompt detection.
//!
//! This module turns the raw PTY byte stream into logical console lines
//! and recognizes the device prompt in them.

mod framer;
mod prompt;

pub use framer::LineFramer;
pub use prompt::{LineKind, PromptTracker};
