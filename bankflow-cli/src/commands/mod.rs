//! CLI command implementations

pub mod config;
pub mod logs;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bankflow_core::{BankflowContext, LoggingService};

/// Data directory holding settings, the bank database and the run log
pub fn get_data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".bankflow"))
}

pub fn ensure_data_dir() -> Result<PathBuf> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
    Ok(data_dir)
}

/// Build the bankflow context from the data directory
pub fn get_context() -> Result<BankflowContext> {
    let data_dir = ensure_data_dir()?;
    BankflowContext::new(&data_dir, env!("CARGO_PKG_VERSION"))
        .with_context(|| format!("Failed to initialize bankflow in {:?}", data_dir))
}

pub fn get_logging_service() -> Result<LoggingService> {
    let data_dir = ensure_data_dir()?;
    LoggingService::new(&data_dir, env!("CARGO_PKG_VERSION"))
        .context("Failed to open the run log")
}
