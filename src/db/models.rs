// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// A raw comment record fetched from the source table. Immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub username: Option<String>,
    pub platform: Option<String>,
    pub brand: Option<String>,
    /// The comment text. NULL in the source maps to None and is treated as
    /// empty downstream.
    pub comment: Option<String>,
}

/// Sentiment label derived from the sentiment classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    /// Parse a stored label; anything unrecognized reads back as neutral.
    pub fn from_label(label: &str) -> Self {
        match label {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Toxicity label: either the classifier flagged the text or it didn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxicityLabel {
    Safe,
    Toxic,
}

impl ToxicityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToxicityLabel::Safe => "safe",
            ToxicityLabel::Toxic => "toxic",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "toxic" => ToxicityLabel::Toxic,
            _ => ToxicityLabel::Safe,
        }
    }
}

impl std::fmt::Display for ToxicityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SarcasmLabel {
    Sarcastic,
    NotSarcastic,
}

impl SarcasmLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SarcasmLabel::Sarcastic => "sarcastic",
            SarcasmLabel::NotSarcastic => "not_sarcastic",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "sarcastic" => SarcasmLabel::Sarcastic,
            _ => SarcasmLabel::NotSarcastic,
        }
    }
}

impl std::fmt::Display for SarcasmLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One (emotion, score) pair, kept in descending score order on the insight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionScore {
    pub emotion: String,
    pub score: f64,
}

/// Risk tier derived from the composite risk index — these thresholds are
/// reporting conveniences, not part of the scoring formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Guarded,
    Elevated,
    Critical,
}

impl RiskTier {
    /// Determine the tier from a risk index (0.0 to 1.0).
    pub fn from_index(index: f64) -> Self {
        match index {
            i if i >= 0.75 => RiskTier::Critical,
            i if i >= 0.5 => RiskTier::Elevated,
            i if i >= 0.25 => RiskTier::Guarded,
            _ => RiskTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Guarded => "guarded",
            RiskTier::Elevated => "elevated",
            RiskTier::Critical => "critical",
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "critical" => RiskTier::Critical,
            "elevated" => RiskTier::Elevated,
            "guarded" => RiskTier::Guarded,
            _ => RiskTier::Low,
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fully assembled, per-record enriched output. One per input record
/// per run; never mutated after assembly; superseded (not merged) when the
/// same comment is analyzed again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub comment_id: String,
    pub username: Option<String>,
    pub platform: Option<String>,
    pub brand: Option<String>,
    pub comment: String,
    pub sentiment: SentimentLabel,
    pub sentiment_score: f64,
    /// Signed sentiment polarity in [-1, 1].
    pub polarity: f64,
    pub emotion: String,
    pub emotion_scores: Vec<EmotionScore>,
    pub intent: String,
    pub intent_confidence: f64,
    pub language: String,
    pub toxicity: ToxicityLabel,
    pub toxicity_score: f64,
    pub sarcasm: SarcasmLabel,
    pub sarcasm_score: f64,
    pub topics: Vec<String>,
    pub entities: Vec<String>,
    /// Composite risk index in [0, 1].
    pub risk_index: f64,
    pub risk_tier: RiskTier,
}
