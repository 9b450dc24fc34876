//! Logs command - view and manage pipeline run logs

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_logging_service;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only failures
        #[arg(long)]
        errors: bool,
        /// Show all entries of one run
        #[arg(long)]
        run_id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: i64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            errors,
            run_id,
            json,
        } => list(limit, errors, run_id.as_deref(), json),
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => clear(older_than_days, force, json),
        LogsCommands::Stats { json } => stats(json),
    }
}

fn list(limit: usize, errors: bool, run_id: Option<&str>, json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let entries = match run_id {
        Some(id) => service.get_run(id)?,
        None if errors => service.get_errors(limit)?,
        None => service.get_recent(limit)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries found.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Run", "Stage", "Error"]);

    for entry in &entries {
        // First uuid group is enough to tell runs apart
        let short_run = entry
            .run_id
            .as_deref()
            .and_then(|id| id.split('-').next())
            .unwrap_or("");

        table.add_row(vec![
            output::format_timestamp_ms(entry.timestamp),
            entry.event.clone(),
            short_run.to_string(),
            entry.stage.clone().unwrap_or_default(),
            entry.error_message.clone().unwrap_or_default(),
        ]);
    }

    println!("{}", table);

    if !errors && run_id.is_none() {
        let recent_errors = service.get_errors(3)?;
        if !recent_errors.is_empty() {
            println!();
            println!("{}", "Recent Errors:".red().bold());
            for err in &recent_errors {
                println!(
                    "  {} [{}]: {}",
                    output::format_timestamp_ms(err.timestamp).dimmed(),
                    err.stage.as_deref().unwrap_or(&err.event),
                    err.error_message.as_deref().unwrap_or("Unknown error")
                );
            }
        }
    }

    Ok(())
}

fn clear(older_than_days: i64, force: bool, json: bool) -> Result<()> {
    if older_than_days < 0 {
        anyhow::bail!("--older-than-days must not be negative");
    }

    let service = get_logging_service()?;
    let cutoff_ms = (Utc::now() - Duration::days(older_than_days)).timestamp_millis();

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete logs older than {} days?", older_than_days))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = service.delete_before(cutoff_ms)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        output::success(&format!("Deleted {} log entries", deleted));
    }

    Ok(())
}

fn stats(json: bool) -> Result<()> {
    let service = get_logging_service()?;
    let total = service.count()?;
    let errors = service.get_errors(1000)?.len();
    let db_path = service.db_path().to_path_buf();
    let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "total_entries": total,
                "error_count": errors,
                "database_path": db_path.to_string_lossy(),
                "database_size_bytes": size_bytes
            })
        );
    } else {
        println!("{}", "Log Statistics".bold());
        println!("  Total entries: {}", total);
        println!("  Failures: {}", errors);
        println!("  Database: {}", db_path.display());
        println!("  Size: {}", output::format_size(size_bytes));
    }

    Ok(())
}
