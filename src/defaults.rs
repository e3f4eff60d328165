//! Configuration-derived defaults for command options.
//!
//! Every option that can come from configuration has a method here. The
//! command layer calls a method only when the option was not given on the
//! command line, so explicit input never touches the store.

use crate::config::ConfigStore;
use crate::engine::ExportFormat;
use crate::resolver::{resolve_default_counters, COUNTERS_SECTION};
use tracing::warn;

/// Refresh interval in seconds when nothing is configured.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 1;

/// Output file name (before extension) when nothing is configured.
pub const DEFAULT_OUTPUT: &str = "counter";

/// Runtime version for `list` when nothing is configured.
pub const DEFAULT_RUNTIME_VERSION: &str = "3.1";

/// Lazily evaluated option defaults.
pub trait DefaultValues {
    fn counters(&self) -> Vec<String>;
    fn refresh_interval(&self) -> u64;
    fn name(&self) -> Option<String>;
    fn format(&self) -> ExportFormat;
    fn output(&self) -> String;
    fn runtime_version(&self) -> String;
}

/// Defaults read from the `counters` section of a [`ConfigStore`].
pub struct ConfigDefaults<'a> {
    config: &'a ConfigStore,
}

impl<'a> ConfigDefaults<'a> {
    pub fn new(config: &'a ConfigStore) -> Self {
        Self { config }
    }

    fn string(&self, variable: &str) -> Option<String> {
        self.config
            .get_string(COUNTERS_SECTION, None, variable)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl DefaultValues for ConfigDefaults<'_> {
    fn counters(&self) -> Vec<String> {
        resolve_default_counters(self.config)
    }

    fn refresh_interval(&self) -> u64 {
        match self.config.get_number(COUNTERS_SECTION, None, "refresh-interval") {
            Some(n) if n >= 1 => n as u64,
            Some(n) => {
                warn!(
                    "Ignoring counters.refresh-interval = {}: must be at least 1 second",
                    n
                );
                DEFAULT_REFRESH_INTERVAL
            }
            None => DEFAULT_REFRESH_INTERVAL,
        }
    }

    fn name(&self) -> Option<String> {
        self.string("name")
    }

    fn format(&self) -> ExportFormat {
        let Some(raw) = self.string("format") else {
            return ExportFormat::default();
        };
        ExportFormat::parse(&raw).unwrap_or_else(|| {
            warn!(
                "Ignoring counters.format = '{}': expected 'csv' or 'json'; using csv",
                raw
            );
            ExportFormat::default()
        })
    }

    fn output(&self) -> String {
        self.string("output")
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string())
    }

    fn runtime_version(&self) -> String {
        self.string("runtimeVersion")
            .unwrap_or_else(|| DEFAULT_RUNTIME_VERSION.to_string())
    }
}
