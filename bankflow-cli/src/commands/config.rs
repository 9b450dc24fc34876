//! Config command - view and change settings.json

use anyhow::Result;
use bankflow_core::config::{Config, SETTINGS_FILE};
use clap::Subcommand;
use colored::Colorize;

use super::ensure_data_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one setting and save it
    Set {
        /// Setting name (sourceUrl, databaseFile, cacheTtlHours, requestTimeoutSecs, malformedRecords)
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = ensure_data_dir()?;
    let mut config = Config::load(&data_dir)?;

    match command {
        ConfigCommands::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            println!("{}", "Settings".bold());
            println!("  Source URL: {}", config.source_url);
            println!("  Database file: {}", config.database_file);
            println!("  Cache TTL: {} hours", config.cache_ttl_hours);
            println!("  Request timeout: {} s", config.request_timeout_secs);
            println!(
                "  Malformed records: {}",
                serde_json::to_value(config.malformed_records)?
                    .as_str()
                    .unwrap_or("fail")
            );
            println!(
                "  File: {}",
                data_dir.join(SETTINGS_FILE).display().to_string().dimmed()
            );
        }
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config.save(&data_dir)?;
            output::success(&format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}
