use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use tracing::info;

use soot::classify::registry::ClassifierRegistry;
use soot::classify::stages::build_stages;
use soot::config::Config;
use soot::db::models::CommentRecord;
use soot::pipeline::assemble::assemble;
use soot::pipeline::runner;
use soot::pipeline::scheduler::StageScheduler;
use soot::scoring::risk::RiskWeights;

/// soot: batch insight enrichment for social media comments.
///
/// Enriches imported comments with sentiment, emotion, intent, language,
/// toxicity, sarcasm, topics, and entities, and derives a composite risk
/// index per comment.
#[derive(Parser)]
#[command(name = "soot", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Import comments from a JSON file into the source table
    Import {
        /// Path to a JSON array of {id?, username?, platform?, brand?, comment?}
        file: String,
    },

    /// Enrich imported comments and store the insights
    Analyze {
        /// Max comments to analyze (default: all)
        #[arg(long)]
        limit: Option<u32>,

        /// Records per pipeline chunk (default: from config)
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Batch-size hint for classifier calls (default: from config)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Worker-pool width for concurrent stages (default: from config)
        #[arg(long)]
        workers: Option<usize>,

        /// Run stages sequentially instead of on the worker pool
        #[arg(long)]
        sequential: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Enrich a single text without touching the database
    Score {
        /// The text to analyze
        text: String,
    },

    /// Show stored insights ranked by risk index
    Report {
        /// Only include insights at or above this risk index
        #[arg(long, default_value = "0.0")]
        min_risk: f64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show system status (DB stats, record counts, last run)
    Status,
}

/// Shape of one record in an import file. Everything is optional — rows
/// with no id get one generated on insert.
#[derive(Deserialize)]
struct ImportComment {
    #[serde(default)]
    id: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    comment: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("soot=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing soot database...");
            let config = Config::load()?;
            let db = soot::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nsoot is ready. Next step: set up your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen run: soot import comments.json");
        }

        Commands::Import { file } => {
            let config = Config::load()?;
            let db = soot::db::open_sqlite(&config.db_path)?;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file))?;
            let imported: Vec<ImportComment> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of comments", file))?;

            let records: Vec<CommentRecord> = imported
                .into_iter()
                .map(|c| CommentRecord {
                    id: c.id,
                    username: c.username,
                    platform: c.platform,
                    brand: c.brand,
                    comment: c.comment,
                })
                .collect();

            let written = db.insert_comments(&records).await?;
            println!("Imported {written} comments from {file}");
            println!("\nNext: run `soot analyze` to enrich them.");
        }

        Commands::Analyze {
            limit,
            chunk_size,
            batch_size,
            workers,
            sequential,
            json,
        } => {
            let config = Config::load()?;
            config.require_classifiers()?;
            let db = soot::db::open_sqlite(&config.db_path)?;

            let records = db.fetch_comments(limit).await?;
            if records.is_empty() {
                println!("No comments to analyze. Run `soot import <file.json>` first.");
                return Ok(());
            }

            println!("Analyzing {} comments...", records.len());

            let registry = ClassifierRegistry::from_config(&config)?;
            let stages = build_stages(&registry);

            let scheduler = if sequential {
                StageScheduler::sequential()
            } else {
                StageScheduler::concurrent(workers.unwrap_or(config.workers))
            };

            let weights = RiskWeights::default();
            let report = runner::run(
                &records,
                &stages,
                &scheduler,
                chunk_size.unwrap_or(config.chunk_size),
                batch_size.unwrap_or(config.batch_size),
                &weights,
            )
            .await;

            // Persistence is the one fatal path: classification failures
            // degrade to fallbacks above, but a failed upsert fails the run.
            db.upsert_insights(&report.insights).await?;

            let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
            db.set_run_state("last_analyze_at", &now).await?;
            db.set_run_state("last_total_records", &report.total_records.to_string())
                .await?;
            db.set_run_state(
                "last_analyzed_records",
                &report.analyzed_records.to_string(),
            )
            .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                soot::output::terminal::display_run_summary(&report);
                println!(
                    "{}",
                    "Run `soot report` to see the ranked insights.".dimmed()
                );
            }
        }

        Commands::Score { text } => {
            let config = Config::load()?;
            config.require_classifiers()?;

            let registry = ClassifierRegistry::from_config(&config)?;
            let stages = build_stages(&registry);

            // Single-item mode: stage failures degrade to fallbacks locally.
            let scheduler = StageScheduler::sequential();
            let outputs = scheduler.run_single(Some(text.as_str()), &stages).await;

            let record = CommentRecord {
                id: "ad-hoc".to_string(),
                username: None,
                platform: None,
                brand: None,
                comment: Some(text),
            };
            let insights = assemble(
                std::slice::from_ref(&record),
                outputs,
                &RiskWeights::default(),
            );

            match insights.first() {
                Some(insight) => soot::output::terminal::display_insight_detail(insight),
                None => println!("Could not assemble an insight for this text."),
            }
        }

        Commands::Report { min_risk, json } => {
            let config = Config::load()?;
            let db = soot::db::open_sqlite(&config.db_path)?;

            let insights = db.ranked_insights(min_risk).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
            } else {
                soot::output::terminal::display_insight_table(&insights);
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = soot::db::open_sqlite(&config.db_path)?;
            soot::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}
