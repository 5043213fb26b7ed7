use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Settings;
use crate::error::TalusError;
use crate::source::JsonFileStore;

pub mod exec;
pub mod result;

#[derive(Debug, Parser)]
#[command(name = "talus")]
#[command(about = "Query and export results from a talus result store")]
#[command(
    long_about = "Query and export results. Search terms are --field value pairs; a single result is addressed by id, by name or tag, or git-style with +N (the N-th most recent match)."
)]
pub struct Cli {
    #[arg(
        long,
        value_name = "PATH",
        help = "Result store JSON file (default: $TALUS_STORE, then $TALUS_HOME/results.json)"
    )]
    pub store: Option<PathBuf>,
    #[arg(
        long,
        value_name = "NAME",
        help = "Current user; results are limited to theirs unless --all (default: $TALUS_USER, then $USER)"
    )]
    pub user: Option<String>,
    #[arg(short, long, help = "Log resolution steps to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "List or export results")]
    Result(result::ResultArgs),
    #[command(about = "Run one raw command line, e.g. \"result export --tags IE +2\"")]
    Exec(exec::ExecArgs),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    List(result::ListResponse),
    Export(result::ExportResponse),
}

pub fn run(cli: Cli) -> Result<CommandOutput, TalusError> {
    let settings = Settings::resolve(cli.store, cli.user)?;
    let store = JsonFileStore::open(&settings.store)?;

    match cli.command {
        Commands::Result(args) => result::run_result(args, &store, settings.user),
        Commands::Exec(args) => exec::run_exec(args, &store, settings.user),
    }
}
