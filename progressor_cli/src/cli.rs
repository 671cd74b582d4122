//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub const DEFAULT_CONFIG: &str = "etc/progressor.toml";

#[derive(Parser, Debug)]
#[command(
    name = "progressor",
    version,
    about = "Progressor force-gauge peripheral emulator"
)]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log as JSON lines and print notifications as JSON objects
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the emulator, driven by console lines on stdin
    #[command(long_about = "Run the emulator, driven by console lines on stdin.\n\nAccepted lines:\n  connect          a central connects\n  disconnect       the central goes away\n  write <hex>      control-point write, e.g. `write 65` to start measuring\n  quit             stop the emulator\n\nNotifications are printed to stdout, one per line.")]
    Run {
        /// Stop after this many engine steps
        #[arg(long, value_name = "N")]
        max_steps: Option<u64>,
        /// Replay a weight profile CSV (`t_ms,kg`) instead of the configured signal
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
    },
    /// Build the engine from config and read the sensor once
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
