// Sarcasm stage — substring label match, score passed through unchanged.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::TextClassifier;
use crate::db::models::SarcasmLabel;
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, SarcasmResult, StageOutput};

pub struct SarcasmStage {
    classifier: Arc<dyn TextClassifier>,
}

impl SarcasmStage {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for SarcasmStage {
    fn name(&self) -> &'static str {
        "sarcasm"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Sarcasm(vec![SarcasmResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self.classifier.classify_batch(&texts, batch_size).await?;
        let derived: Vec<SarcasmResult> = raw
            .iter()
            .map(|r| derive_sarcasm(&r.label, r.score))
            .collect();

        Ok(StageOutput::Sarcasm(scatter(
            batch.len(),
            SarcasmResult::default(),
            &indices,
            &derived,
        )))
    }
}

/// A label containing "sarcasm" (case-insensitive) means sarcastic; the
/// score is the model's and is not flipped for either side.
pub fn derive_sarcasm(label: &str, score: f64) -> SarcasmResult {
    let label = if label.to_lowercase().contains("sarcasm") {
        SarcasmLabel::Sarcastic
    } else {
        SarcasmLabel::NotSarcastic
    };
    SarcasmResult { label, score }
}
