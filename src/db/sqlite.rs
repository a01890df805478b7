// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points — Rust enforces this because
// MutexGuard is !Send.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{CommentRecord, Insight};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_run_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_run_state(&conn, key)
    }

    async fn set_run_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_run_state(&conn, key, value)
    }

    async fn insert_comments(&self, records: &[CommentRecord]) -> Result<usize> {
        let conn = self.conn.lock().await;
        super::queries::insert_comments(&conn, records)
    }

    async fn fetch_comments(&self, limit: Option<u32>) -> Result<Vec<CommentRecord>> {
        let conn = self.conn.lock().await;
        super::queries::fetch_comments(&conn, limit)
    }

    async fn comment_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::comment_count(&conn)
    }

    async fn upsert_insight(&self, insight: &Insight) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_insight(&conn, insight)
    }

    async fn upsert_insights(&self, insights: &[Insight]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_insights(&conn, insights)
    }

    async fn insight_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insight_count(&conn)
    }

    async fn ranked_insights(&self, min_risk: f64) -> Result<Vec<Insight>> {
        let conn = self.conn.lock().await;
        super::queries::ranked_insights(&conn, min_risk)
    }
}
