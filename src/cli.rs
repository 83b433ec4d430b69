//! Command-line interface for pianosheet
//!
//! Provides argument parsing using clap derive macros.

use crate::config::parse_duration_secs;
use crate::locale::Locale;
use crate::session::SourceChoice;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Turn an audio file or a YouTube link into piano sheet music
#[derive(Parser, Debug)]
#[command(
    name = "pianosheet",
    version,
    about = "Turn an audio file or a YouTube link into piano sheet music"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Backend base URL override (e.g., http://localhost:8000/api)
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Language for generated messages (en, ja)
    #[arg(long, global = true, value_name = "LANG")]
    pub locale: Option<Locale>,

    /// Whole-request timeout. Examples: 600, 90s, 10m
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_duration_secs)]
    pub timeout: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an audio file or a YouTube URL into three arrangements
    Convert {
        /// Path to an .mp3/.wav file, or a YouTube URL
        input: String,

        /// Answer the source prompt up front when no piano covers are found
        #[arg(long, value_enum, value_name = "SOURCE")]
        source: Option<SourceArg>,

        /// Directory for the exported .abc files
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,

        /// File name stem for the exported files (default: derived from the input)
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Print the scores to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Look up a video and list the piano covers the backend finds
    Analyze {
        /// YouTube URL
        url: String,
    },

    /// Check that the backend is reachable and whether separation is available
    Status,

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Pre-selected answer to the source prompt
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// Transcribe the original audio as-is
    Original,
    /// Isolate the piano part first
    Separated,
}

impl From<SourceArg> for SourceChoice {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Original => SourceChoice::UseOriginal,
            SourceArg::Separated => SourceChoice::SeparateThenTranscribe,
        }
    }
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file, environment and flags applied)
    Show,
    /// Print the configuration file path
    Path,
    /// Dump a commented configuration template
    Dump,
}
