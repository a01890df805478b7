// Sentiment stage — single-label sentiment mapped to a signed polarity.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::TextClassifier;
use crate::db::models::SentimentLabel;
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, SentimentResult, StageOutput};

pub struct SentimentStage {
    classifier: Arc<dyn TextClassifier>,
}

impl SentimentStage {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for SentimentStage {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Sentiment(vec![SentimentResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self.classifier.classify_batch(&texts, batch_size).await?;
        let derived: Vec<SentimentResult> = raw
            .iter()
            .map(|r| derive_sentiment(&r.label, r.score))
            .collect();

        Ok(StageOutput::Sentiment(scatter(
            batch.len(),
            SentimentResult::default(),
            &indices,
            &derived,
        )))
    }
}

/// Map a raw classifier label to the sentiment result. Positive carries the
/// score as polarity, negative negates it, anything else is neutral with
/// zero polarity.
pub fn derive_sentiment(label: &str, score: f64) -> SentimentResult {
    match label.to_lowercase().as_str() {
        "positive" => SentimentResult {
            label: SentimentLabel::Positive,
            polarity: score,
            score,
        },
        "negative" => SentimentResult {
            label: SentimentLabel::Negative,
            polarity: -score,
            score,
        },
        _ => SentimentResult {
            label: SentimentLabel::Neutral,
            polarity: 0.0,
            score,
        },
    }
}
