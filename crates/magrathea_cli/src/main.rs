//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `magrathea_core` wiring end to end: open a database, build a
//!   repository facade, run sync and async queries through it.
//! - Keep output deterministic for quick local sanity checks.

mod cli;

use clap::Parser;
use cli::Cli;
use magrathea_core::operation::{schema_catalog, schema_version};
use magrathea_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, LoggingConfig,
    OpenOptions, Repository, SchemaObject, SqliteRepository,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("magrathea_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(&LoggingConfig::new(level, absolute(log_dir)?))?;
    }

    let options = OpenOptions::default();
    let context = match &cli.db_path {
        Some(path) => open_db(path, &options)?,
        None => open_db_in_memory(&options)?,
    };
    let repo = SqliteRepository::try_new(context)?;

    let mut objects = repo.find(&schema_catalog())?;
    if cli.tables_only {
        objects.retain(SchemaObject::is_table);
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&objects)?);
        return Ok(());
    }

    println!("magrathea_core version={}", core_version());
    println!("schema_version={}", repo.find_scalar(&schema_version())?);
    for object in &objects {
        println!("object type={} name={}", object.kind, object.name);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()?;
    let async_objects = runtime.block_on(async { repo.find_async(schema_catalog()).await })?;
    println!("async_objects={}", async_objects.len());

    Ok(())
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
