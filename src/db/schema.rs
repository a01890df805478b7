// Database schema — table creation and migrations.
//
// We use a simple version-based migration approach: a `schema_version` table
// tracks which migrations have run, and each migration is a function that
// executes SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent — safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Source comments awaiting enrichment
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            username TEXT,
            platform TEXT,
            brand TEXT,
            comment TEXT,                      -- nullable: some sources ship empty rows
            created_date TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Enriched insights, one row per analyzed comment
        CREATE TABLE IF NOT EXISTS comment_insights (
            id TEXT PRIMARY KEY,               -- generated row id
            comment_id TEXT NOT NULL UNIQUE,   -- stable source identity (upsert key)
            username TEXT,
            platform TEXT,
            brand TEXT,
            comment TEXT NOT NULL,
            sentiment TEXT NOT NULL,
            sentiment_score REAL NOT NULL,
            polarity REAL NOT NULL,            -- -1.0 to 1.0
            emotion TEXT NOT NULL,
            emotion_scores TEXT,               -- JSON array of {emotion, score}, descending
            intent TEXT NOT NULL,
            intent_confidence REAL NOT NULL,
            language TEXT NOT NULL,
            toxicity TEXT NOT NULL,            -- safe / toxic
            toxicity_score REAL NOT NULL,
            sarcasm TEXT NOT NULL,             -- sarcastic / not_sarcastic
            sarcasm_score REAL NOT NULL,
            topics TEXT,                       -- JSON array of topic labels
            entities TEXT,                     -- JSON array of entity surfaces
            risk_index REAL NOT NULL,          -- 0.0 to 1.0
            risk_tier TEXT NOT NULL,           -- low / guarded / elevated / critical
            created_date TEXT NOT NULL DEFAULT (datetime('now')),
            last_modified_date TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Run state — last-run timestamps and counters
        CREATE TABLE IF NOT EXISTS run_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Index for ranked risk reports
        CREATE INDEX IF NOT EXISTS idx_insights_risk
            ON comment_insights(risk_index);

        -- Index for fetching comments in insertion order
        CREATE INDEX IF NOT EXISTS idx_comments_created
            ON comments(created_date);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Run a migration if it hasn't been applied yet.
/// The migration function receives the connection and should execute its SQL.
#[allow(dead_code)]
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;

    if !already_applied {
        migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [version],
        )?;
    }

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
