// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust
// interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::models::{
    CommentRecord, EmotionScore, Insight, RiskTier, SarcasmLabel, SentimentLabel, ToxicityLabel,
};

// --- Run state ---

/// Get a run state value by key (e.g., "last_analyze_at").
pub fn get_run_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM run_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a run state value (upsert).
pub fn set_run_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO run_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Comments (source records) ---

/// Insert or refresh source comments. Records without an id get one
/// generated. Returns the number of rows written.
pub fn insert_comments(conn: &Connection, records: &[CommentRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut written = 0;
    for record in records {
        let id = if record.id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            record.id.clone()
        };
        tx.execute(
            "INSERT INTO comments (id, username, platform, brand, comment)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                username = ?2,
                platform = ?3,
                brand = ?4,
                comment = ?5",
            params![
                id,
                record.username,
                record.platform,
                record.brand,
                record.comment,
            ],
        )?;
        written += 1;
    }
    tx.commit()?;
    Ok(written)
}

/// Fetch source comments in insertion order, optionally limited.
pub fn fetch_comments(conn: &Connection, limit: Option<u32>) -> Result<Vec<CommentRecord>> {
    let sql = match limit {
        Some(_) => {
            "SELECT id, username, platform, brand, comment FROM comments
             ORDER BY created_date ASC, rowid ASC LIMIT ?1"
        }
        None => {
            "SELECT id, username, platform, brand, comment FROM comments
             ORDER BY created_date ASC, rowid ASC"
        }
    };

    let mut stmt = conn.prepare(sql)?;
    let map_row = |row: &rusqlite::Row<'_>| {
        Ok(CommentRecord {
            id: row.get(0)?,
            username: row.get(1)?,
            platform: row.get(2)?,
            brand: row.get(3)?,
            comment: row.get(4)?,
        })
    };

    let rows = match limit {
        Some(n) => stmt.query_map(params![n], map_row)?,
        None => stmt.query_map([], map_row)?,
    };

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub fn comment_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM comments", [], |row| row.get(0))?;
    Ok(count)
}

// --- Insights ---

/// Insert or update an insight, keyed by the stable comment id. An update
/// refreshes every derived field and bumps last_modified_date; the row id
/// and created_date survive.
pub fn upsert_insight(conn: &Connection, insight: &Insight) -> Result<()> {
    let emotion_scores_json = serde_json::to_string(&insight.emotion_scores)?;
    let topics_json = serde_json::to_string(&insight.topics)?;
    let entities_json = serde_json::to_string(&insight.entities)?;

    conn.execute(
        "INSERT INTO comment_insights (
            id, comment_id, username, platform, brand, comment,
            sentiment, sentiment_score, polarity, emotion, emotion_scores,
            intent, intent_confidence, language,
            toxicity, toxicity_score, sarcasm, sarcasm_score,
            topics, entities, risk_index, risk_tier,
            created_date, last_modified_date
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                 ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                 datetime('now'), datetime('now'))
         ON CONFLICT(comment_id) DO UPDATE SET
            username = ?3,
            platform = ?4,
            brand = ?5,
            comment = ?6,
            sentiment = ?7,
            sentiment_score = ?8,
            polarity = ?9,
            emotion = ?10,
            emotion_scores = ?11,
            intent = ?12,
            intent_confidence = ?13,
            language = ?14,
            toxicity = ?15,
            toxicity_score = ?16,
            sarcasm = ?17,
            sarcasm_score = ?18,
            topics = ?19,
            entities = ?20,
            risk_index = ?21,
            risk_tier = ?22,
            last_modified_date = datetime('now')",
        params![
            Uuid::new_v4().to_string(),
            insight.comment_id,
            insight.username,
            insight.platform,
            insight.brand,
            insight.comment,
            insight.sentiment.as_str(),
            insight.sentiment_score,
            insight.polarity,
            insight.emotion,
            emotion_scores_json,
            insight.intent,
            insight.intent_confidence,
            insight.language,
            insight.toxicity.as_str(),
            insight.toxicity_score,
            insight.sarcasm.as_str(),
            insight.sarcasm_score,
            topics_json,
            entities_json,
            insight.risk_index,
            insight.risk_tier.as_str(),
        ],
    )?;
    Ok(())
}

/// Upsert a batch of insights inside one transaction, so a re-run either
/// lands fully or not at all.
pub fn upsert_insights(conn: &Connection, insights: &[Insight]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for insight in insights {
        let emotion_scores_json = serde_json::to_string(&insight.emotion_scores)?;
        let topics_json = serde_json::to_string(&insight.topics)?;
        let entities_json = serde_json::to_string(&insight.entities)?;

        tx.execute(
            "INSERT INTO comment_insights (
                id, comment_id, username, platform, brand, comment,
                sentiment, sentiment_score, polarity, emotion, emotion_scores,
                intent, intent_confidence, language,
                toxicity, toxicity_score, sarcasm, sarcasm_score,
                topics, entities, risk_index, risk_tier,
                created_date, last_modified_date
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                     ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                     datetime('now'), datetime('now'))
             ON CONFLICT(comment_id) DO UPDATE SET
                username = ?3,
                platform = ?4,
                brand = ?5,
                comment = ?6,
                sentiment = ?7,
                sentiment_score = ?8,
                polarity = ?9,
                emotion = ?10,
                emotion_scores = ?11,
                intent = ?12,
                intent_confidence = ?13,
                language = ?14,
                toxicity = ?15,
                toxicity_score = ?16,
                sarcasm = ?17,
                sarcasm_score = ?18,
                topics = ?19,
                entities = ?20,
                risk_index = ?21,
                risk_tier = ?22,
                last_modified_date = datetime('now')",
            params![
                Uuid::new_v4().to_string(),
                insight.comment_id,
                insight.username,
                insight.platform,
                insight.brand,
                insight.comment,
                insight.sentiment.as_str(),
                insight.sentiment_score,
                insight.polarity,
                insight.emotion,
                emotion_scores_json,
                insight.intent,
                insight.intent_confidence,
                insight.language,
                insight.toxicity.as_str(),
                insight.toxicity_score,
                insight.sarcasm.as_str(),
                insight.sarcasm_score,
                topics_json,
                entities_json,
                insight.risk_index,
                insight.risk_tier.as_str(),
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn insight_count(conn: &Connection) -> Result<i64> {
    let count: i64 =
        conn.query_row("SELECT COUNT(*) FROM comment_insights", [], |row| row.get(0))?;
    Ok(count)
}

/// Get insights at or above a minimum risk index, ranked descending.
pub fn ranked_insights(conn: &Connection, min_risk: f64) -> Result<Vec<Insight>> {
    let mut stmt = conn.prepare(
        "SELECT comment_id, username, platform, brand, comment,
                sentiment, sentiment_score, polarity, emotion, emotion_scores,
                intent, intent_confidence, language,
                toxicity, toxicity_score, sarcasm, sarcasm_score,
                topics, entities, risk_index
         FROM comment_insights
         WHERE risk_index >= ?1
         ORDER BY risk_index DESC",
    )?;

    let rows = stmt.query_map(params![min_risk], |row| {
        let sentiment: String = row.get(5)?;
        let emotion_scores_json: Option<String> = row.get(9)?;
        let toxicity: String = row.get(13)?;
        let sarcasm: String = row.get(15)?;
        let topics_json: Option<String> = row.get(17)?;
        let entities_json: Option<String> = row.get(18)?;
        let risk_index: f64 = row.get(19)?;

        let emotion_scores: Vec<EmotionScore> = emotion_scores_json
            .as_deref()
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default();
        let topics: Vec<String> = topics_json
            .as_deref()
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default();
        let entities: Vec<String> = entities_json
            .as_deref()
            .and_then(|j| serde_json::from_str(j).ok())
            .unwrap_or_default();

        Ok(Insight {
            comment_id: row.get(0)?,
            username: row.get(1)?,
            platform: row.get(2)?,
            brand: row.get(3)?,
            comment: row.get(4)?,
            sentiment: SentimentLabel::from_label(&sentiment),
            sentiment_score: row.get(6)?,
            polarity: row.get(7)?,
            emotion: row.get(8)?,
            emotion_scores,
            intent: row.get(10)?,
            intent_confidence: row.get(11)?,
            language: row.get(12)?,
            toxicity: ToxicityLabel::from_label(&toxicity),
            toxicity_score: row.get(14)?,
            sarcasm: SarcasmLabel::from_label(&sarcasm),
            sarcasm_score: row.get(16)?,
            topics,
            entities,
            risk_index,
            // Recalculate the tier from the stored index so threshold
            // changes take effect without re-analyzing.
            risk_tier: RiskTier::from_index(risk_index),
        })
    })?;

    let mut insights = Vec::new();
    for row in rows {
        insights.push(row?);
    }
    Ok(insights)
}
