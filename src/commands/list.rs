//! List command handler.
//!
//! Shows the well-known counters of each provider for a runtime version.
//!
//! The exit codes are inverted from the usual convention and kept that way
//! for compatibility with existing scripts: an unsupported version returns 0,
//! a successful listing returns 1.

use crate::catalog::{CounterCatalog, SUPPORTED_RUNTIME_VERSIONS};
use crate::error::Result;
use std::io::Write;

/// Exit code when the version is not supported.
pub const LIST_INVALID_VERSION: i32 = 0;

/// Exit code after a successful listing.
pub const LIST_SUCCESS: i32 = 1;

/// Print the known counters for `runtime_version`.
pub fn list_command(
    runtime_version: &str,
    catalog: &dyn CounterCatalog,
    out: &mut dyn Write,
) -> Result<i32> {
    if !SUPPORTED_RUNTIME_VERSIONS.contains(&runtime_version) {
        writeln!(
            out,
            "Runtime version {} is not a valid version string or a supported runtime version.",
            runtime_version
        )?;
        writeln!(
            out,
            "Supported version strings: {}",
            SUPPORTED_RUNTIME_VERSIONS.join(", ")
        )?;
        return Ok(LIST_INVALID_VERSION);
    }

    let providers = catalog.providers(runtime_version);
    let provider_width = providers
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0);

    writeln!(
        out,
        "Showing well-known counters for runtime version {} only. Specific processes may support additional counters.",
        runtime_version
    )?;

    for provider in &providers {
        let counter_width = provider
            .counters
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        writeln!(out, "{:<width$}", provider.name, width = provider_width)?;
        for (name, description) in &provider.counters {
            writeln!(
                out,
                "    {:<width$}    {}",
                name,
                description,
                width = counter_width
            )?;
        }
        writeln!(out)?;
    }

    Ok(LIST_SUCCESS)
}
