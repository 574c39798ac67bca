mod help_text;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Maintain per-directory SHA-256 checksum files across a tree
#[derive(Parser, Debug)]
#[command(
    name = "sumtree",
    version,
    about,
    long_about = help_text::ROOT_LONG_ABOUT
)]
pub struct Cli {
    /// Change to DIRECTORY before doing anything
    #[arg(short = 'C', value_name = "DIRECTORY", global = true)]
    pub directory: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Set the log level explicitly
    #[arg(
        long,
        value_name = "LEVEL",
        global = true,
        conflicts_with = "verbose",
        long_help = help_text::LOG_LEVEL_LONG_HELP
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
    /// Record checksums for files that have none yet
    #[command(long_about = help_text::CREATE_LONG_ABOUT)]
    Create {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Like create, and also re-hash files modified after their checksum file
    #[command(long_about = help_text::REFRESH_LONG_ABOUT)]
    Refresh {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Discard existing checksum files and re-hash everything
    #[command(long_about = help_text::RESET_LONG_ABOUT)]
    Reset {
        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Re-hash recorded files and report mismatches, never writing anything
    #[command(long_about = help_text::VERIFY_LONG_ABOUT)]
    Verify {
        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Root of the tree to process
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Also process hidden directories and files
    #[arg(long)]
    pub include_hidden: bool,

    /// Additional directory name pattern to exclude (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude_dir: Vec<String>,

    /// Additional file name pattern to exclude (repeatable)
    #[arg(long, value_name = "PATTERN")]
    pub exclude_file: Vec<String>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Report what would change without writing checksum files
    #[arg(long)]
    pub dry_run: bool,

    /// Leave written checksum files writable and visible
    #[arg(long)]
    pub no_protect: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
