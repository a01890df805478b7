// Colored terminal output for run summaries and insight reports.
//
// This module handles all terminal-specific formatting: colors, tables,
// summaries. The main.rs display calls delegate here.

use colored::Colorize;

use crate::db::models::{Insight, RiskTier};
use crate::pipeline::runner::RunReport;

/// Display the outcome of an analyze run.
pub fn display_run_summary(report: &RunReport) {
    println!("\n{}", "Analysis complete.".bold());
    println!("  Total records:    {}", report.total_records);
    println!("  Analyzed records: {}", report.analyzed_records);

    if report.analyzed_records < report.total_records {
        let skipped = report.total_records - report.analyzed_records;
        println!(
            "  {} {} record(s) skipped during assembly — see the log for details",
            "Warning:".yellow(),
            skipped
        );
    }
}

/// Display a ranked insight report.
pub fn display_insight_table(insights: &[Insight]) {
    if insights.is_empty() {
        println!("No insights stored yet. Run `soot analyze` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Risk Report ({} comments) ===", insights.len()).bold()
    );
    println!();

    // Header
    println!(
        "  {:>4}  {:<40} {:>6}  {:<9}  {:<9}  {:>5}",
        "Rank".dimmed(),
        "Comment".dimmed(),
        "Risk".dimmed(),
        "Tier".dimmed(),
        "Sentiment".dimmed(),
        "Tox".dimmed(),
    );
    println!("  {}", "-".repeat(84).dimmed());

    for (i, insight) in insights.iter().enumerate() {
        let preview = super::truncate_chars(&insight.comment, 38);
        println!(
            "  {:>4}. {:<40} {:>6.4}  {:<9}  {:<9}  {:>.2}",
            i + 1,
            preview,
            insight.risk_index,
            colorize_tier(insight.risk_tier),
            insight.sentiment.as_str(),
            insight.toxicity_score,
        );
    }

    println!();

    // Summary
    let critical = insights
        .iter()
        .filter(|i| i.risk_tier == RiskTier::Critical)
        .count();
    let elevated = insights
        .iter()
        .filter(|i| i.risk_tier == RiskTier::Elevated)
        .count();
    let guarded = insights
        .iter()
        .filter(|i| i.risk_tier == RiskTier::Guarded)
        .count();

    if critical > 0 {
        println!("  {} {} critical comments", "!!".red().bold(), critical);
    }
    if elevated > 0 {
        println!("  {} {} elevated comments", "!".bright_red(), elevated);
    }
    if guarded > 0 {
        println!("  {} {} guarded comments", "~".yellow(), guarded);
    }
}

/// Display a single insight in full.
pub fn display_insight_detail(insight: &Insight) {
    println!("\n{}", "=== Insight ===".bold());

    let preview = super::truncate_chars(&insight.comment, 140);
    println!("  Comment: \"{}\"", preview);
    if let Some(username) = &insight.username {
        println!("  Author: @{username}");
    }
    if let Some(platform) = &insight.platform {
        println!("  Platform: {platform}");
    }

    println!(
        "\n  Risk index: {:.4} ({})",
        insight.risk_index,
        colorize_tier(insight.risk_tier)
    );
    println!(
        "  Sentiment: {} (polarity {:+.3}, score {:.3})",
        insight.sentiment, insight.polarity, insight.sentiment_score
    );
    println!("  Emotion: {}", insight.emotion);
    if !insight.emotion_scores.is_empty() {
        let top: Vec<String> = insight
            .emotion_scores
            .iter()
            .take(3)
            .map(|e| format!("{} {:.4}", e.emotion, e.score))
            .collect();
        println!("    {}", top.join("  |  ").dimmed());
    }
    println!(
        "  Intent: {} ({:.3})",
        insight.intent, insight.intent_confidence
    );
    println!("  Language: {}", insight.language);
    println!(
        "  Toxicity: {} ({:.3})",
        insight.toxicity, insight.toxicity_score
    );
    println!(
        "  Sarcasm: {} ({:.3})",
        insight.sarcasm, insight.sarcasm_score
    );

    if !insight.topics.is_empty() {
        println!("  Topics: {}", insight.topics.join(", "));
    }
    if !insight.entities.is_empty() {
        println!("  Entities: {}", insight.entities.join(", "));
    }
}

/// Colorize a risk tier.
fn colorize_tier(tier: RiskTier) -> colored::ColoredString {
    match tier {
        RiskTier::Critical => tier.as_str().red().bold(),
        RiskTier::Elevated => tier.as_str().bright_red(),
        RiskTier::Guarded => tier.as_str().yellow(),
        RiskTier::Low => tier.as_str().green(),
    }
}
