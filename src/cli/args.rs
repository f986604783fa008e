//! Command-line argument parsing for supportrag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// supportrag - Answer customer questions from past support emails
#[derive(Parser, Debug)]
#[command(name = "supportrag")]
#[command(version)]
#[command(about = "Retrieval-augmented answers from a history of support emails", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Index a JSON array of question/answer records
    Ingest {
        /// Path to the records file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Answer a single question
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Number of past emails used as context
        #[arg(short = 'k', long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,
    },

    /// Show ranked matches with their scores
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short = 'k', long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        top_k: Option<usize>,
    },

    /// Number of indexed documents
    Count,

    /// Delete every indexed document
    Reset,

    /// Chat with the support bot in the terminal
    Chat,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Default tracing filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "supportrag=info,warn",
            Verbosity::Verbose => "supportrag=debug,info",
            Verbosity::VeryVerbose => "supportrag=trace,debug",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
