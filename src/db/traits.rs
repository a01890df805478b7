// Database trait — backend-agnostic async interface for all DB operations.
//
// The SQLite backend wraps rusqlite behind this trait; all methods are
// async so a natively-async backend can sit behind the same interface.
// The trait mirrors the queries.rs function signatures, so callers hold an
// `Arc<dyn Database>` and never see rusqlite.
//
// This is both the record source ("fetch ordered comments") and the
// persistence sink ("upsert insight by comment id") of the pipeline.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{CommentRecord, Insight};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Run state ---

    /// Get a run state value by key (e.g., "last_analyze_at").
    async fn get_run_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a run state value (upsert).
    async fn set_run_state(&self, key: &str, value: &str) -> Result<()>;

    // --- Source comments ---

    /// Insert or refresh source comments; returns the number written.
    async fn insert_comments(&self, records: &[CommentRecord]) -> Result<usize>;

    /// Fetch source comments in insertion order, optionally limited.
    async fn fetch_comments(&self, limit: Option<u32>) -> Result<Vec<CommentRecord>>;

    async fn comment_count(&self) -> Result<i64>;

    // --- Insights ---

    /// Insert or update one insight, keyed by comment id.
    async fn upsert_insight(&self, insight: &Insight) -> Result<()>;

    /// Upsert a batch of insights in one transaction.
    async fn upsert_insights(&self, insights: &[Insight]) -> Result<()>;

    async fn insight_count(&self) -> Result<i64>;

    /// Get insights at or above a minimum risk index, ranked descending.
    async fn ranked_insights(&self, min_risk: f64) -> Result<Vec<Insight>>;
}
