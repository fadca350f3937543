//! Command-line interface for callscope
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Customer call analysis from recorded audio
#[derive(Parser, Debug)]
#[command(
    name = "callscope",
    version,
    about = "Analyze recorded customer-service calls"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress log output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a call recording and print the result as JSON
    Analyze {
        /// Audio file to analyze (.mp3, .wav, or .m4a, under 25 MiB)
        file: PathBuf,

        /// Pretty-print the result JSON
        #[arg(long)]
        pretty: bool,

        /// Transcription timeout override (default: 60s). Examples: 90s, 2m
        #[arg(long, value_name = "DURATION", value_parser = parse_duration_secs)]
        timeout: Option<u64>,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

/// Parse a duration string into seconds.
///
/// Supports any format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}
