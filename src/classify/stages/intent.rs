// Intent stage — zero-shot classification over a fixed candidate set.
//
// The candidate list is closed: the classifier can only ever answer with
// one of these labels (or the "unknown" fallback). The risk scorer's
// intent weights key off this same set.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::ZeroShotClassifier;
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, IntentResult, StageOutput};

/// Candidate intent labels, in prompt order.
pub const INTENT_LABELS: [&str; 5] = ["complaint", "question", "request", "praise", "statement"];

pub struct IntentStage {
    classifier: Arc<dyn ZeroShotClassifier>,
}

impl IntentStage {
    pub fn new(classifier: Arc<dyn ZeroShotClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for IntentStage {
    fn name(&self) -> &'static str {
        "intent"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Intent(vec![IntentResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self
            .classifier
            .classify_with_labels(&texts, &INTENT_LABELS, false, batch_size)
            .await?;

        // Single-label mode: the first (label, score) pair is the winner.
        let derived: Vec<IntentResult> = raw
            .iter()
            .map(|scores| match scores.first() {
                Some(top) => IntentResult {
                    intent: top.label.to_lowercase(),
                    confidence: top.score,
                },
                None => IntentResult::default(),
            })
            .collect();

        Ok(StageOutput::Intent(scatter(
            batch.len(),
            IntentResult::default(),
            &indices,
            &derived,
        )))
    }
}
