// Emotion stage — full label distribution, sorted by score descending.
//
// The top entry becomes the scalar emotion on the insight; the whole sorted
// distribution is kept as evidence.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::{LabelScore, MultiLabelClassifier};
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, EmotionResult, StageOutput};

pub struct EmotionStage {
    classifier: Arc<dyn MultiLabelClassifier>,
}

impl EmotionStage {
    pub fn new(classifier: Arc<dyn MultiLabelClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for EmotionStage {
    fn name(&self) -> &'static str {
        "emotion"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Emotion(vec![EmotionResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self
            .classifier
            .classify_all_batch(&texts, batch_size)
            .await?;
        let derived: Vec<EmotionResult> = raw.into_iter().map(derive_emotion).collect();

        Ok(StageOutput::Emotion(scatter(
            batch.len(),
            EmotionResult::default(),
            &indices,
            &derived,
        )))
    }
}

/// Sort the distribution by score descending; the top label becomes the
/// scalar emotion. An empty distribution falls back to neutral.
pub fn derive_emotion(mut scores: Vec<LabelScore>) -> EmotionResult {
    for entry in &mut scores {
        entry.label = entry.label.to_lowercase();
    }
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    match scores.first() {
        Some(top) => EmotionResult {
            emotion: top.label.clone(),
            scores,
        },
        None => EmotionResult::default(),
    }
}
