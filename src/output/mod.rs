//! Terminal output formatting for rtcounters.
//!
//! - [`messages`] - Error, warning, and info messages

pub mod messages;

/// ANSI codes for terminal output.
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const RED: &str = "\x1b[31m";
    /// Clear the screen and move the cursor home.
    pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
}

pub use colors::*;
pub use messages::{print_error, print_interrupted, print_warning};
