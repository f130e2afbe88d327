use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use memo_core::LogId;

#[derive(Parser)]
#[command(name = "memo")]
#[command(about = "Back up, restore and merge Memo logs between devices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional engine config file (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export logs as a snapshot file
    Export {
        /// Only export these log ids
        #[arg(long, value_delimiter = ',', value_name = "IDS", conflicts_with = "focus")]
        ids: Vec<LogId>,
        /// Never export these log ids
        #[arg(long, value_delimiter = ',', value_name = "IDS")]
        exclude: Vec<LogId>,
        /// Export the scope around this log (single log or whole thread)
        #[arg(long, value_name = "ID")]
        focus: Option<LogId>,
        /// Output file or directory (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Merge a snapshot file into the local store
    Import {
        /// Snapshot file to read
        path: PathBuf,
        /// How to settle logs that changed on both sides
        #[arg(long, value_enum, default_value_t = ImportStrategy::Auto)]
        strategy: ImportStrategy,
        /// List conflicts without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show what an export would carry
    Scope {
        /// Log to focus on
        #[arg(long, value_name = "ID")]
        focus: Option<LogId>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent logs
    List {
        /// Number of logs to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ImportStrategy {
    /// Last write wins, no questions asked
    Auto,
    Local,
    Remote,
    Both,
    /// Prompt for every conflict
    Ask,
}
