//! bankflow CLI - refresh the local Brazilian bank list

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, logs, run};

/// bankflow - fetch the bank list from BrasilAPI and store it in DuckDB
#[derive(Parser)]
#[command(name = "bankflow", version, about, long_about = None)]
struct Cli {
    /// Runs the pipeline when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, transform and load the bank list once
    Run {
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage pipeline run logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        None => run::run(false),
        Some(Commands::Run { json }) => run::run(json),
        Some(Commands::Config { command }) => config::run(command),
        Some(Commands::Logs { command }) => logs::run(command),
    }
}
