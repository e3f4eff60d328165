//! Shell completion scripts.
//!
//! Scripts are generated from the same clap definition the binary parses
//! with, so they never drift from the real command surface.
//!
//! ```ignore
//! let shell = ShellType::from_name("zsh")?;
//! print!("{}", generate_completion_script(shell, &mut Cli::command(), "rtcounters"));
//! ```

use crate::error::{CountersError, Result};
use clap::Command;
use clap_complete::{generate, Shell};

/// Shell names accepted by `completions`.
pub const SUPPORTED_SHELLS: [&str; 3] = ["bash", "zsh", "fish"];

/// Supported shell types for completion scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

impl ShellType {
    /// Convert to the `clap_complete::Shell` type.
    pub fn to_clap_shell(self) -> Shell {
        match self {
            ShellType::Bash => Shell::Bash,
            ShellType::Zsh => Shell::Zsh,
            ShellType::Fish => Shell::Fish,
        }
    }

    /// Get the display name of the shell.
    pub fn name(&self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
        }
    }

    /// Parse a shell name (`bash`, `zsh`, `fish`) or a path ending in one.
    pub fn from_name(name: &str) -> Result<Self> {
        let base = name.rsplit('/').next().unwrap_or(name);
        match base.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellType::Bash),
            "zsh" => Ok(ShellType::Zsh),
            "fish" => Ok(ShellType::Fish),
            _ => Err(CountersError::ShellCompletion(format!(
                "Unsupported shell: '{}'. Supported shells: {}",
                base,
                SUPPORTED_SHELLS.join(", ")
            ))),
        }
    }
}

impl std::fmt::Display for ShellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Generate the completion script for `cmd`.
pub fn generate_completion_script(shell: ShellType, cmd: &mut Command, bin_name: &str) -> String {
    let mut buf = Vec::new();
    generate(shell.to_clap_shell(), cmd, bin_name, &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cli() -> Command {
        Command::new("rtcounters")
            .subcommand(Command::new("monitor"))
            .subcommand(Command::new("list"))
    }

    #[test]
    fn test_from_name_accepts_names_and_paths() {
        assert_eq!(ShellType::from_name("bash").unwrap(), ShellType::Bash);
        assert_eq!(ShellType::from_name("/usr/bin/zsh").unwrap(), ShellType::Zsh);
        assert_eq!(ShellType::from_name("FISH").unwrap(), ShellType::Fish);
    }

    #[test]
    fn test_from_name_unsupported_lists_supported() {
        let err = ShellType::from_name("/bin/tcsh").unwrap_err().to_string();
        assert!(err.contains("tcsh"));
        for shell in SUPPORTED_SHELLS {
            assert!(err.contains(shell));
        }
    }

    #[test]
    fn test_generated_script_mentions_subcommands() {
        for shell in [ShellType::Bash, ShellType::Zsh, ShellType::Fish] {
            let script = generate_completion_script(shell, &mut sample_cli(), "rtcounters");
            assert!(script.contains("rtcounters"), "{} script", shell);
            assert!(script.contains("monitor"), "{} script", shell);
        }
    }
}
