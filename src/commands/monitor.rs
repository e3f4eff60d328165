//! Monitor command handler.
//!
//! Attaches to the target process and redraws its counters on the console
//! every refresh interval until the operator presses Ctrl+C or the process
//! exits.

use super::SessionRequest;
use crate::engine::MonitoringEngine;
use crate::error::Result;
use crate::signal::SignalHandler;
use std::io::Write;
use tracing::info;

/// Run a live monitoring session.
///
/// # Returns
///
/// * `Ok(0)` once the session has been cancelled or the target exited
/// * `Err(CountersError)` if the engine could not attach or sample
pub fn monitor_command(
    engine: &mut dyn MonitoringEngine,
    signal: &SignalHandler,
    request: &SessionRequest,
    console: &mut dyn Write,
) -> Result<i32> {
    info!(
        "Monitoring {} every {:?}",
        request.target, request.refresh_interval
    );
    engine.monitor(
        signal,
        &request.counters,
        console,
        &request.target,
        request.refresh_interval,
    )?;
    Ok(0)
}
