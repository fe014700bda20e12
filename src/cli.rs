mod help_text;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Incremental MD5 manifest maintenance for OPenn archive trees
#[derive(Parser, Debug)]
#[command(
    name = "openn-manifest",
    version,
    about,
    long_about = help_text::ROOT_LONG_ABOUT
)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Archive root. Defaults to the OPENN_ROOT environment variable.
    #[arg(long, value_name = "PATH", global = true)]
    pub root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(
        long,
        value_name = "LEVEL",
        value_enum,
        conflicts_with = "verbose",
        global = true
    )]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Update the MD5 manifest of the TEI manuscript descriptions
    #[command(long_about = help_text::MANIFEST_LONG_ABOUT)]
    Manifest {
        /// Compute the new manifest but do not write it
        #[arg(long)]
        dry_run: bool,
    },

    /// Regenerate the Walters contents CSV
    #[command(long_about = help_text::CONTENTS_LONG_ABOUT)]
    Contents {
        /// Generate the CSV but do not write it
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
