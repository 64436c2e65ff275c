//! Command line argument parsing for the quarry CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Quarry - query an index defined in a JSON file
#[derive(Parser, Debug, Clone)]
#[command(name = "quarry")]
#[command(about = "Build an index from a JSON definition and run queries against it")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct QuarryArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl QuarryArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }

    /// Default tracing directive for the verbosity level.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a query against an index definition
    Search(SearchArgs),

    /// Show index statistics
    Stats(StatsArgs),
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Index definition file (JSON)
    #[arg(value_name = "INDEX_FILE")]
    pub index_file: PathBuf,

    /// Query string
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of results to print
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Scoring function
    #[arg(short, long, default_value = "TFIDF")]
    pub scorer: String,

    /// Query language used for stemming
    #[arg(long, default_value = "english")]
    pub language: String,

    /// Do not expand query terms
    #[arg(long)]
    pub verbatim: bool,
}

/// Arguments for showing statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Index definition file (JSON)
    #[arg(value_name = "INDEX_FILE")]
    pub index_file: PathBuf,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args() {
        let args = QuarryArgs::parse_from([
            "quarry",
            "-vv",
            "--format",
            "json",
            "search",
            "index.json",
            "@title:shoes",
            "--limit",
            "5",
            "--verbatim",
        ]);

        assert_eq!(args.verbosity(), 2);
        assert_eq!(args.log_directive(), "info");
        assert_eq!(args.output_format, OutputFormat::Json);
        match args.command {
            Command::Search(search) => {
                assert_eq!(search.query, "@title:shoes");
                assert_eq!(search.limit, 5);
                assert_eq!(search.scorer, "TFIDF");
                assert!(search.verbatim);
            }
            _ => panic!("Expected search command"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = QuarryArgs::parse_from(["quarry", "-q", "-vvv", "stats", "index.json"]);
        assert_eq!(args.verbosity(), 0);
        assert_eq!(args.log_directive(), "error");
    }
}
