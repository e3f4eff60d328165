//! CLI command handlers for rtcounters.
//!
//! Each command has its own module with a handler function returning the
//! process exit code. The argument structs here are flattened into the clap
//! definitions in `main.rs`; their `resolve` methods fill in anything the
//! operator left out from [`DefaultValues`], calling a default only when the
//! option is absent.
//!
//! # Commands
//!
//! - [`monitor`] - Live console view of a process's counters
//! - [`collect`] - Export counters to CSV or JSON
//! - [`list`] - Show well-known counters for a runtime version
//! - [`process_status`] - List processes that can be monitored

mod collect;
mod list;
mod monitor;
mod process_status;

pub use collect::collect_command;
pub use list::list_command;
pub use monitor::monitor_command;
pub use process_status::process_status_command;

use crate::counter_spec::parse_all;
use crate::defaults::DefaultValues;
use crate::engine::{ExportFormat, ProcessTarget};
use crate::error::{CountersError, Result};
use crate::resolver::ResolvedCounters;
use clap::Args;
use std::time::Duration;
use tracing::debug;

/// Options shared by `monitor` and `collect`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionArgs {
    /// Counters to monitor, e.g. `System.Runtime[cpu-usage,working-set]`.
    /// Defaults to the counters selected in the configuration.
    #[arg(value_name = "COUNTERS")]
    pub counters: Vec<String>,

    /// The ID of the process to monitor
    #[arg(short = 'p', long = "process-id", conflicts_with = "name")]
    pub process_id: Option<u32>,

    /// Seconds between counter updates (default: counters.refresh-interval, else 1)
    #[arg(long = "refresh-interval", value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_interval: Option<u64>,

    /// The name of the process to monitor (default: counters.name)
    #[arg(short = 'n', long)]
    pub name: Option<String>,
}

/// A fully resolved `monitor` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub counters: Vec<String>,
    pub target: ProcessTarget,
    pub refresh_interval: Duration,
}

impl SessionArgs {
    /// Apply defaults for every option that was not given.
    ///
    /// Explicit counters are validated and merged to one canonical entry per
    /// provider, the same way configured ones are. A process id always wins over a name, so the configured
    /// name is only consulted when neither was passed.
    pub fn resolve(self, defaults: &dyn DefaultValues) -> Result<SessionRequest> {
        let counters = if self.counters.is_empty() {
            defaults.counters()
        } else {
            let mut resolved = ResolvedCounters::default();
            for spec in parse_all(&self.counters)? {
                resolved.include(spec);
            }
            resolved.into_tokens()
        };

        let target = match (self.process_id, self.name) {
            (Some(pid), _) => ProcessTarget::Pid(pid),
            (None, Some(name)) => ProcessTarget::Name(name),
            (None, None) => defaults
                .name()
                .map(ProcessTarget::Name)
                .ok_or(CountersError::MissingTarget)?,
        };

        let seconds = self
            .refresh_interval
            .unwrap_or_else(|| defaults.refresh_interval());

        let request = SessionRequest {
            counters,
            target,
            refresh_interval: Duration::from_secs(seconds),
        };
        debug!("Resolved session: {:?}", request);
        Ok(request)
    }
}

/// Options for `collect`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// The format of exported counter data (default: counters.format, else csv)
    #[arg(long, value_enum, ignore_case = true)]
    pub format: Option<ExportFormat>,

    /// The output file name, extension added if missing (default: counters.output, else "counter")
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

/// A fully resolved `collect` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectRequest {
    pub session: SessionRequest,
    pub format: ExportFormat,
    pub output: String,
}

impl CollectArgs {
    pub fn resolve(self, defaults: &dyn DefaultValues) -> Result<CollectRequest> {
        Ok(CollectRequest {
            session: self.session.resolve(defaults)?,
            format: self.format.unwrap_or_else(|| defaults.format()),
            output: self.output.unwrap_or_else(|| defaults.output()),
        })
    }
}

/// Options for `list`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListArgs {
    /// Runtime version to show counters for: 3.0, 3.1 or 5.0 (default: counters.runtimeVersion, else 3.1)
    #[arg(short = 'r', long = "runtime-version")]
    pub runtime_version: Option<String>,
}

impl ListArgs {
    pub fn resolve(self, defaults: &dyn DefaultValues) -> String {
        self.runtime_version
            .unwrap_or_else(|| defaults.runtime_version())
    }
}
