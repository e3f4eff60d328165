//! Monitoring engine.
//!
//! The command layer talks to a [`MonitoringEngine`]; the default
//! [`CounterEngine`] attaches a [`CounterSource`] session to the target
//! process, samples it once per refresh interval, and either renders the
//! values to the console or hands them to an exporter.

mod console;
mod export;
mod session;

pub use console::render_samples;
pub use export::{export_path, CounterExporter, CsvExporter, ExportFormat, JsonExporter};
pub use session::ProcessSession;

use crate::counter_spec::{parse_all, CounterSpec};
use crate::error::{CountersError, Result};
use crate::signal::SignalHandler;
use chrono::{DateTime, Local};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Provider monitored when no counters are selected at all.
pub const DEFAULT_PROVIDER: &str = "System.Runtime";

/// The process a session attaches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTarget {
    Pid(u32),
    Name(String),
}

impl fmt::Display for ProcessTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessTarget::Pid(pid) => write!(f, "process {}", pid),
            ProcessTarget::Name(name) => write!(f, "process '{}'", name),
        }
    }
}

/// How a counter's value should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// A point-in-time or averaged measurement.
    Mean,
    /// A delta accumulated over the refresh interval.
    Increment,
}

impl CounterKind {
    pub fn label(&self) -> &'static str {
        match self {
            CounterKind::Mean => "Metric",
            CounterKind::Increment => "Rate",
        }
    }
}

/// One counter value read from a session.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterSample {
    pub provider: String,
    pub name: String,
    pub display_name: String,
    pub unit: Option<String>,
    pub kind: CounterKind,
    pub value: f64,
    pub timestamp: DateTime<Local>,
}

impl CounterSample {
    /// Display name with the unit appended, e.g. `CPU Usage (%)`.
    pub fn label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{} ({})", self.display_name, unit),
            None => self.display_name.clone(),
        }
    }
}

/// A live connection to a monitored process.
pub trait CounterSource {
    fn process_id(&self) -> u32;

    fn process_name(&self) -> &str;

    /// Read the current value of every counter the session exposes.
    ///
    /// Returns [`CountersError::ProcessExited`] once the target is gone.
    fn sample(&mut self) -> Result<Vec<CounterSample>>;
}

/// Attach/collect/export, as seen by the command layer.
pub trait MonitoringEngine {
    /// Render counters to `console` until `signal` is cancelled.
    fn monitor(
        &mut self,
        signal: &SignalHandler,
        counters: &[String],
        console: &mut dyn Write,
        target: &ProcessTarget,
        refresh_interval: Duration,
    ) -> Result<()>;

    /// Export counters to `output` until `signal` is cancelled or the target
    /// exits. Returns the completion code.
    #[allow(clippy::too_many_arguments)]
    fn collect(
        &mut self,
        signal: &SignalHandler,
        counters: &[String],
        console: &mut dyn Write,
        target: &ProcessTarget,
        refresh_interval: Duration,
        format: ExportFormat,
        output: &str,
    ) -> Result<i32>;
}

/// Opens a session for a target.
pub type Connector = Box<dyn Fn(&ProcessTarget) -> Result<Box<dyn CounterSource>>>;

/// The default engine: a polling loop over a [`CounterSource`].
pub struct CounterEngine {
    connect: Connector,
}

impl CounterEngine {
    pub fn new(connect: Connector) -> Self {
        Self { connect }
    }

    /// An engine that attaches to processes through the operating system.
    pub fn process() -> Self {
        Self::new(Box::new(|target| {
            ProcessSession::attach(target).map(|s| Box::new(s) as Box<dyn CounterSource>)
        }))
    }

    /// Validate the selection and open a session for `target`.
    fn attach(
        &self,
        counters: &[String],
        target: &ProcessTarget,
    ) -> Result<(Vec<CounterSpec>, Box<dyn CounterSource>)> {
        let specs = selection(counters)?;
        let session = (self.connect)(target)?;
        info!(
            "Attached to {} (pid {})",
            session.process_name(),
            session.process_id()
        );
        Ok((specs, session))
    }

    /// Drive the sampling loop, calling `emit` with the selected samples on
    /// every tick. Target exit ends the loop cleanly.
    fn drive<F>(
        signal: &SignalHandler,
        specs: &[CounterSpec],
        session: &mut dyn CounterSource,
        refresh_interval: Duration,
        mut emit: F,
    ) -> Result<()>
    where
        F: FnMut(&dyn CounterSource, &[CounterSample]) -> Result<()>,
    {
        while !signal.is_shutdown_requested() {
            let samples = match session.sample() {
                Ok(samples) => samples,
                Err(CountersError::ProcessExited) => {
                    info!("Process {} exited", session.process_id());
                    break;
                }
                Err(e) => return Err(e),
            };

            let selected = select(specs, samples);
            debug!("Sampled {} counters", selected.len());
            emit(&*session, &selected)?;

            if signal.wait(refresh_interval) {
                break;
            }
        }

        info!("Session with pid {} stopped", session.process_id());
        Ok(())
    }
}

impl MonitoringEngine for CounterEngine {
    fn monitor(
        &mut self,
        signal: &SignalHandler,
        counters: &[String],
        console: &mut dyn Write,
        target: &ProcessTarget,
        refresh_interval: Duration,
    ) -> Result<()> {
        let (specs, mut session) = self.attach(counters, target)?;
        Self::drive(signal, &specs, &mut *session, refresh_interval, |session, samples| {
            render_samples(&mut *console, session.process_name(), session.process_id(), samples)
        })
    }

    fn collect(
        &mut self,
        signal: &SignalHandler,
        counters: &[String],
        console: &mut dyn Write,
        target: &ProcessTarget,
        refresh_interval: Duration,
        format: ExportFormat,
        output: &str,
    ) -> Result<i32> {
        // Nothing is written until the target is attached, so a bad pid or
        // name leaves an earlier export untouched.
        let (specs, mut session) = self.attach(counters, target)?;

        let path = export_path(output, format);
        let export_error = |e: CountersError| CountersError::Export(path.clone(), e.to_string());
        let file = File::create(&path)
            .map_err(|e| CountersError::Export(path.clone(), e.to_string()))?;
        let mut exporter = format
            .exporter(BufWriter::new(file), session.process_name(), Local::now())
            .map_err(export_error)?;

        writeln!(console, "Starting counter collection. Output: {}", path.display())?;
        writeln!(console, "Press Ctrl+C to stop.")?;

        let result = Self::drive(signal, &specs, &mut *session, refresh_interval, |_, samples| {
            exporter.write_samples(samples)
        });

        // The file is finalized whether the session ended cleanly or not.
        let finished = exporter.finish().map_err(export_error);

        result?;
        finished?;
        writeln!(console, "File saved to {}", path.display())?;
        Ok(0)
    }
}

/// Parse the requested counters, falling back to the default provider.
fn selection(counters: &[String]) -> Result<Vec<CounterSpec>> {
    if counters.is_empty() {
        debug!("No counters selected; defaulting to {}", DEFAULT_PROVIDER);
        return Ok(vec![CounterSpec::provider(DEFAULT_PROVIDER)]);
    }
    parse_all(counters)
}

fn select(specs: &[CounterSpec], samples: Vec<CounterSample>) -> Vec<CounterSample> {
    samples
        .into_iter()
        .filter(|sample| {
            specs
                .iter()
                .any(|spec| spec.provider == sample.provider && spec.includes(&sample.name))
        })
        .collect()
}
