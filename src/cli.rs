//! Command-line interface for echolog
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Always-on audio capture with remote transcription and summarization
#[derive(Parser, Debug)]
#[command(name = "echolog", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture audio, transcribe and summarize it chunk by chunk
    Run {
        /// WAV file to capture from (reads WAV data from stdin when omitted)
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Ask a natural-language question about recorded transcripts
    Ask {
        /// The question, e.g. "what happened in the last hour"
        question: String,
    },

    /// List stored transcripts, newest first
    History {
        /// Case-insensitive keyword over transcription or summary
        #[arg(long, value_name = "WORD")]
        keyword: Option<String>,

        /// Earliest date, YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        date_from: Option<String>,

        /// Latest date, YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        date_to: Option<String>,

        /// Earliest time of day, HH:MM or HH:MM:SS
        #[arg(long, value_name = "TIME")]
        time_from: Option<String>,

        /// Latest time of day, HH:MM or HH:MM:SS
        #[arg(long, value_name = "TIME")]
        time_to: Option<String>,

        /// Only records from the trailing window. Examples: 30s, 5m, 1h30m
        #[arg(long, value_name = "DURATION", value_parser = parse_window_secs)]
        last: Option<u64>,

        /// Maximum number of records to print
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Delete all stored transcripts
    Clear,
}

/// Parse a trailing-window duration string into seconds.
///
/// Supports any format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_window_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}
