//! OS-observed counter session.
//!
//! Samples the counters that can be read from outside the runtime through
//! sysinfo: CPU usage, working set and virtual memory, plus the thread count
//! where the platform lists threads. The CPU figure needs two refreshes to be
//! meaningful, so the first frame reports zero.

use super::{CounterKind, CounterSample, CounterSource, ProcessTarget, DEFAULT_PROVIDER};
use crate::error::{CountersError, Result};
use crate::process::resolve_target;
use chrono::Local;
use std::thread;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Bytes per megabyte as the runtime reports memory counters.
const BYTES_PER_MB: f64 = 1_000_000.0;

/// A session attached to a process by pid.
pub struct ProcessSession {
    system: System,
    pid: Pid,
    name: String,
    cpu_count: f32,
}

impl ProcessSession {
    /// Attach to the target, resolving a name to its pid first.
    pub fn attach(target: &ProcessTarget) -> Result<Self> {
        let (pid, name) = resolve_target(target)?;
        let cpu_count = thread::available_parallelism()
            .map(|n| n.get() as f32)
            .unwrap_or(1.0);

        Ok(Self {
            system: System::new(),
            pid: Pid::from_u32(pid),
            name,
            cpu_count,
        })
    }
}

impl CounterSource for ProcessSession {
    fn process_id(&self) -> u32 {
        self.pid.as_u32()
    }

    fn process_name(&self) -> &str {
        &self.name
    }

    fn sample(&mut self) -> Result<Vec<CounterSample>> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[self.pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = self
            .system
            .process(self.pid)
            .ok_or(CountersError::ProcessExited)?;
        let timestamp = Local::now();

        let counter = |name: &str, display: &str, unit: &str, value: f64| CounterSample {
            provider: DEFAULT_PROVIDER.to_string(),
            name: name.to_string(),
            display_name: display.to_string(),
            unit: Some(unit.to_string()),
            kind: CounterKind::Mean,
            value,
            timestamp,
        };

        let mut samples = vec![
            counter(
                "cpu-usage",
                "CPU Usage",
                "%",
                f64::from(process.cpu_usage() / self.cpu_count),
            ),
            counter(
                "working-set",
                "Working Set",
                "MB",
                process.memory() as f64 / BYTES_PER_MB,
            ),
            counter(
                "virtual-memory",
                "Virtual Memory",
                "MB",
                process.virtual_memory() as f64 / BYTES_PER_MB,
            ),
        ];

        // Only Linux lists a process's threads.
        if let Some(tasks) = process.tasks().filter(|t| !t.is_empty()) {
            samples.push(CounterSample {
                unit: None,
                ..counter("thread-count", "Thread Count", "", tasks.len() as f64)
            });
        }

        Ok(samples)
    }
}
