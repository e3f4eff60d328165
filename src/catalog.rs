//! Well-known counter metadata for the `list` command.

/// Runtime versions the built-in catalog knows about.
pub const SUPPORTED_RUNTIME_VERSIONS: [&str; 3] = ["3.0", "3.1", "5.0"];

/// A provider and its counters, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub name: String,
    /// `(counter name, description)` pairs.
    pub counters: Vec<(String, String)>,
}

impl ProviderProfile {
    fn new(name: &str, counters: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            counters: counters
                .iter()
                .map(|(n, d)| (n.to_string(), d.to_string()))
                .collect(),
        }
    }
}

/// Source of provider metadata for a runtime version.
pub trait CounterCatalog {
    fn providers(&self, runtime_version: &str) -> Vec<ProviderProfile>;
}

/// The catalog compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownCounters;

const RUNTIME_COUNTERS: &[(&str, &str)] = &[
    ("cpu-usage", "The percent of process' CPU usage relative to all of the system CPU resources [0-100]"),
    ("working-set", "Amount of working set used by the process (MB)"),
    ("gc-heap-size", "Total heap size reported by the GC (MB)"),
    ("gen-0-gc-count", "Number of Gen 0 GCs between update intervals"),
    ("gen-1-gc-count", "Number of Gen 1 GCs between update intervals"),
    ("gen-2-gc-count", "Number of Gen 2 GCs between update intervals"),
    ("time-in-gc", "% time in GC since the last GC"),
    ("gen-0-size", "Gen 0 Heap Size"),
    ("gen-1-size", "Gen 1 Heap Size"),
    ("gen-2-size", "Gen 2 Heap Size"),
    ("loh-size", "LOH Size"),
    ("alloc-rate", "Number of bytes allocated in the managed heap between update intervals"),
    ("assembly-count", "Number of Assemblies Loaded"),
    ("exception-count", "Number of Exceptions / sec"),
    ("threadpool-thread-count", "Number of ThreadPool Threads"),
    ("monitor-lock-contention-count", "Number of times there were contention when trying to take the monitor lock between update intervals"),
    ("threadpool-queue-length", "ThreadPool Work Items Queue Length"),
    ("threadpool-completed-items-count", "ThreadPool Completed Work Items Count"),
    ("active-timer-count", "Number of timers that are currently active"),
];

const RUNTIME_COUNTERS_5_0: &[(&str, &str)] = &[
    ("poh-size", "Pinned Object Heap Size"),
    ("gc-fragmentation", "GC Heap Fragmentation"),
    ("il-bytes-jitted", "Total IL bytes jitted"),
    ("methods-jitted-count", "Number of methods jitted"),
];

const HOSTING_COUNTERS: &[(&str, &str)] = &[
    ("requests-per-second", "Number of requests between update intervals"),
    ("total-requests", "Total number of requests"),
    ("current-requests", "Current number of requests"),
    ("failed-requests", "Failed number of requests"),
];

impl CounterCatalog for KnownCounters {
    fn providers(&self, runtime_version: &str) -> Vec<ProviderProfile> {
        let mut runtime: Vec<(&str, &str)> = RUNTIME_COUNTERS.to_vec();
        match runtime_version {
            "3.0" | "3.1" => {}
            "5.0" => runtime.extend_from_slice(RUNTIME_COUNTERS_5_0),
            _ => return Vec::new(),
        }

        vec![
            ProviderProfile::new("System.Runtime", &runtime),
            ProviderProfile::new("Microsoft.AspNetCore.Hosting", HOSTING_COUNTERS),
        ]
    }
}
