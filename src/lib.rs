pub mod catalog;
pub mod commands;
pub mod completion;
pub mod config;
pub mod counter_spec;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod output;
pub mod process;
pub mod resolver;
pub mod signal;

pub use config::ConfigStore;
pub use counter_spec::CounterSpec;
pub use error::{CountersError, Result};
pub use resolver::resolve_default_counters;
