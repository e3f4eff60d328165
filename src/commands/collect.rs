//! Collect command handler.
//!
//! Like `monitor`, but writes every sample to a CSV or JSON file instead of
//! the console.

use super::CollectRequest;
use crate::engine::MonitoringEngine;
use crate::error::Result;
use crate::signal::SignalHandler;
use std::io::Write;
use tracing::info;

/// Run a collection session and return the engine's completion code.
pub fn collect_command(
    engine: &mut dyn MonitoringEngine,
    signal: &SignalHandler,
    request: &CollectRequest,
    console: &mut dyn Write,
) -> Result<i32> {
    let session = &request.session;
    info!(
        "Collecting {} as {} into '{}'",
        session.target, request.format, request.output
    );
    engine.collect(
        signal,
        &session.counters,
        console,
        &session.target,
        session.refresh_interval,
        request.format,
        &request.output,
    )
}
