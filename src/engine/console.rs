//! Plain-text console frame for `monitor`.

use super::CounterSample;
use crate::error::Result;
use crate::output::{BOLD, CLEAR_SCREEN, CYAN, DIM, RESET};
use std::io::Write;

/// Minimum width of the counter-name column.
const MIN_LABEL_WIDTH: usize = 40;

/// Redraw the console with one frame of samples, grouped by provider in the
/// order they were sampled.
pub fn render_samples(
    out: &mut dyn Write,
    process_name: &str,
    pid: u32,
    samples: &[CounterSample],
) -> Result<()> {
    let width = samples
        .iter()
        .map(|s| s.label().chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_LABEL_WIDTH);

    write!(out, "{CLEAR_SCREEN}")?;
    writeln!(out, "{DIM}Press Ctrl+C to exit.{RESET}")?;
    writeln!(out, "{BOLD}{}{RESET} (pid {})", process_name, pid)?;
    writeln!(out)?;

    if samples.is_empty() {
        writeln!(out, "    Waiting for counters...")?;
    }

    let mut current: Option<&str> = None;
    for sample in samples {
        if current != Some(sample.provider.as_str()) {
            writeln!(out, "{CYAN}[{}]{RESET}", sample.provider)?;
            current = Some(sample.provider.as_str());
        }
        writeln!(
            out,
            "    {:<width$} {:>14}",
            sample.label(),
            format_value(sample.value),
            width = width
        )?;
    }

    out.flush()?;
    Ok(())
}

/// Up to three decimals, without trailing zeros.
fn format_value(value: f64) -> String {
    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
