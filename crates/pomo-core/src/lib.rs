//! pomo-core - Shared functionality for the pomo interval timer
//!
//! Holds the pieces that are not part of the timer engine itself:
//! where files live and how time is rendered for a terminal.

pub mod format;
pub mod paths;

pub use format::{format_clock, progress_bar};
pub use paths::Paths;
