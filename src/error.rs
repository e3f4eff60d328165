use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CountersError {
    #[error("Invalid counter specification '{0}': {1}")]
    InvalidCounterSpec(String, String),

    #[error("A target process is required: pass --process-id or --name, or set counters.name in the configuration")]
    MissingTarget,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse config file at {0:?}: {1}")]
    ConfigParse(PathBuf, String),

    #[error("No process found with id {0}")]
    ProcessNotFound(u32),

    #[error("No process found with name '{0}'")]
    ProcessNameNotFound(String),

    #[error("Multiple processes named '{0}' are running ({1}); use --process-id instead")]
    AmbiguousProcessName(String, String),

    #[error("Target process exited")]
    ProcessExited,

    #[error("Failed to write export file {0:?}: {1}")]
    Export(PathBuf, String),

    #[error("Shell completion error: {0}")]
    ShellCompletion(String),

    #[error("Failed to register signal handler: {0}")]
    SignalHandler(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CountersError>;
