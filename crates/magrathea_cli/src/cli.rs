//! Command-line arguments for the smoke binary.

use clap::Parser;
use std::path::PathBuf;

/// Opens a database through a repository facade and prints its schema.
#[derive(Debug, Parser)]
#[command(name = "magrathea_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Database file; an in-memory database is used when omitted
    #[arg(value_name = "DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Print the schema catalog as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list tables
    #[arg(long)]
    pub tables_only: bool,

    /// Directory for rolling log files; logging stays off when omitted
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error); defaults by build mode
    #[arg(long, requires = "log_dir")]
    pub log_level: Option<String>,
}
