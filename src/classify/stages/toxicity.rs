// Toxicity stage — binary safe/toxic with label-relative confidence.
//
// Toxicity models differ in how they name the positive class ("toxic",
// "LABEL_1"). The derivation normalizes both, and flips the score for the
// safe side so the stored score always expresses confidence in the
// *reported* label rather than the raw model output.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::TextClassifier;
use crate::db::models::ToxicityLabel;
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, StageOutput, ToxicityResult};

pub struct ToxicityStage {
    classifier: Arc<dyn TextClassifier>,
}

impl ToxicityStage {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for ToxicityStage {
    fn name(&self) -> &'static str {
        "toxicity"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Toxicity(vec![ToxicityResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self.classifier.classify_batch(&texts, batch_size).await?;
        let derived: Vec<ToxicityResult> = raw
            .iter()
            .map(|r| derive_toxicity(&r.label, r.score))
            .collect();

        Ok(StageOutput::Toxicity(scatter(
            batch.len(),
            ToxicityResult::default(),
            &indices,
            &derived,
        )))
    }
}

/// Normalize a raw toxicity label. "toxic" or the positional "label_1"
/// marker (case-insensitive) means toxic with the raw score; everything
/// else is safe with the complement.
pub fn derive_toxicity(label: &str, score: f64) -> ToxicityResult {
    let normalized = label.to_lowercase();
    if normalized == "toxic" || normalized == "label_1" {
        ToxicityResult {
            label: ToxicityLabel::Toxic,
            score,
        }
    } else {
        ToxicityResult {
            label: ToxicityLabel::Safe,
            score: 1.0 - score,
        }
    }
}
