// System status display — shows DB stats, record counts, last run time.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `soot init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    // Source records
    let comments = db.comment_count().await?;
    if comments == 0 {
        println!("Comments: none imported yet");
        println!("  Run `soot import <file.json>` to load records");
    } else {
        println!("Comments: {comments}");
    }

    // Insights (Elevated tier starts at risk index 0.5)
    let insights = db.insight_count().await?;
    if insights == 0 {
        println!("Insights: none yet");
        println!("  Run `soot analyze` to enrich the imported comments");
    } else {
        let elevated_plus = db
            .ranked_insights(0.5)
            .await
            .map(|list| list.len())
            .unwrap_or(0);
        println!("Insights: {insights} total, {elevated_plus} elevated+");
    }

    // Last analyze run
    match db.get_run_state("last_analyze_at").await? {
        Some(last_run) => {
            println!("Last analyze: {last_run}");
            if let (Some(total), Some(analyzed)) = (
                db.get_run_state("last_total_records").await?,
                db.get_run_state("last_analyzed_records").await?,
            ) {
                println!("  {analyzed}/{total} records analyzed");
            }
        }
        None => {
            println!("Last analyze: never");
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
