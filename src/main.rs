//! rtcounters CLI entry point.
//!
//! Parses command-line arguments, loads the configuration snapshot once, and
//! dispatches to exactly one command handler. The handler's return value
//! becomes the process exit code.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use rtcounters::catalog::KnownCounters;
use rtcounters::commands::{
    collect_command, list_command, monitor_command, process_status_command, CollectArgs,
    ListArgs, SessionArgs,
};
use rtcounters::completion::{generate_completion_script, ShellType};
use rtcounters::defaults::ConfigDefaults;
use rtcounters::engine::CounterEngine;
use rtcounters::output::{print_error, print_interrupted, print_warning};
use rtcounters::signal::SignalHandler;
use rtcounters::{ConfigStore, CountersError, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rtcounters")]
#[command(
    version,
    about = "Monitor and export live performance counters from a running process",
    after_help = "EXAMPLES:
    # Watch the default runtime counters of process 1234
    rtcounters monitor -p 1234

    # Watch selected counters of a process by name
    rtcounters monitor -n webapp 'System.Runtime[cpu-usage,working-set]'

    # Export to trace.json every 5 seconds
    rtcounters collect -p 1234 --refresh-interval 5 --format json -o trace

    # Show well-known counters for runtime 5.0
    rtcounters list -r 5.0

CONFIG FILES:
    Global: ~/.config/rtcounters/config.toml
    Local:  ./.rtcounters.toml

    Later files take precedence. Options left off the command line are read
    from the [counters] section; see README.md for the keys."
)]
struct Cli {
    /// Enable debug logging on stderr (-vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Read configuration from this file on top of the global and local ones
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start monitoring a process's counters
    #[command(after_help = "EXAMPLES:
    rtcounters monitor -p 1234
    rtcounters monitor -n webapp System.Runtime 'Microsoft.AspNetCore.Hosting[requests-per-second]'")]
    Monitor(SessionArgs),

    /// Export a process's counters to a CSV or JSON file
    #[command(after_help = "EXAMPLES:
    rtcounters collect -p 1234                       # writes counter.csv
    rtcounters collect -p 1234 --format json -o run  # writes run.json")]
    Collect(CollectArgs),

    /// Show well-known counters for a runtime version
    List(ListArgs),

    /// List processes that can be monitored
    #[command(name = "process-status", visible_alias = "ps")]
    ProcessStatus,

    /// Output shell completion script to stdout (hidden utility command)
    #[command(hide = true)]
    Completions {
        /// Shell type to generate completions for (bash, zsh, or fish)
        shell: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ConfigStore::load(cli.config.as_deref());

    let code = match run(cli.command, &config) {
        Ok(code) => code,
        // Surfaced like any other missing argument, with usage.
        Err(e @ CountersError::MissingTarget) => Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e.to_string())
            .exit(),
        Err(e) => {
            print_error(&e.to_string());
            1
        }
    };

    std::process::exit(code);
}

fn run(command: Commands, config: &ConfigStore) -> Result<i32> {
    let defaults = ConfigDefaults::new(config);
    let stdout = io::stdout();
    let mut console = stdout.lock();

    match command {
        Commands::Monitor(args) => {
            let request = args.resolve(&defaults)?;
            let signal = signal_handler();
            let code = monitor_command(
                &mut CounterEngine::process(),
                &signal,
                &request,
                &mut console,
            )?;
            if signal.is_shutdown_requested() {
                print_interrupted();
            }
            Ok(code)
        }

        Commands::Collect(args) => {
            let request = args.resolve(&defaults)?;
            let signal = signal_handler();
            collect_command(
                &mut CounterEngine::process(),
                &signal,
                &request,
                &mut console,
            )
        }

        Commands::List(args) => {
            let version = args.resolve(&defaults);
            list_command(&version, &KnownCounters, &mut console)
        }

        Commands::ProcessStatus => process_status_command(&mut console),

        Commands::Completions { shell } => {
            let shell = ShellType::from_name(&shell)?;
            let script = generate_completion_script(shell, &mut Cli::command(), "rtcounters");
            console.write_all(script.as_bytes())?;
            Ok(0)
        }
    }
}

/// Ctrl+C handler for long-running sessions. If registration fails the
/// session still runs but can only end when the target exits.
fn signal_handler() -> SignalHandler {
    SignalHandler::new().unwrap_or_else(|e| {
        print_warning(&e.to_string());
        SignalHandler::detached()
    })
}

/// Initializes the tracing subscriber on stderr.
/// Default level is WARN; `-v` enables DEBUG and `-vv` TRACE. Without `-v`,
/// `RUST_LOG` is honoured.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
    } else {
        EnvFilter::new(format!("rtcounters={}", level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
