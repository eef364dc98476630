//! CLI argument parsing for zonetrace

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for stack analyses
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "zonetrace")]
#[command(version)]
#[command(about = "Report where a captured call stack entered and left code zones", long_about = None)]
pub struct Cli {
    /// TOML file with [[zone]] definitions (default: embedded Rust zone pack)
    #[arg(short = 'z', long = "zones", value_name = "FILE")]
    pub zones: Option<PathBuf>,

    /// Stack trace to analyze (default: read from stdin)
    #[arg(short = 't', long = "trace", value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Restrict the analysis to these zones, in this order (repeatable)
    #[arg(long = "zone", value_name = "NAME")]
    pub zone: Vec<String>,

    /// Print the entry point of this zone (repeatable)
    #[arg(short = 'e', long = "entry", value_name = "NAME")]
    pub entry: Vec<String>,

    /// Print a failure summary instead of the full transition list
    #[arg(short = 's', long = "summary")]
    pub summary: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
