//! Basic message output functions.
//!
//! Diagnostics go to stderr so command output on stdout stays clean.

use super::colors::*;

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{RED}{BOLD}Error:{RESET} {}", msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{YELLOW}Warning:{RESET} {}", msg);
}

/// Print interruption message when the user presses Ctrl+C.
pub fn print_interrupted() {
    eprintln!();
    eprintln!("{YELLOW}Interrupted.{RESET} Session stopped.");
}
