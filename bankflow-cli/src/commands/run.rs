//! Run command - execute the pipeline once

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;

    if !json {
        output::info(&format!("Fetching banks from {}", ctx.config.source_url));
    }

    let report = ctx.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::success(&format!("Loaded {} banks", report.loaded));
    println!("  Run: {}", report.run_id.to_string().dimmed());
    println!("  Fetched: {}", report.fetched);
    println!("  Without code: {} (dropped)", report.dropped);
    if report.skipped > 0 {
        output::warning(&format!("  Malformed: {} (skipped)", report.skipped));
    }
    println!(
        "  Finished: {} ({} ms)",
        output::format_datetime(&report.finished_at),
        (report.finished_at - report.started_at).num_milliseconds()
    );
    if let Some(db_path) = ctx.repository.db_path() {
        println!("  Database: {}", db_path.display());
    }

    Ok(())
}
