// Language stage — detected language code per text, "unknown" fallback.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::TextClassifier;
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, StageOutput};

pub const UNKNOWN_LANGUAGE: &str = "unknown";

pub struct LanguageStage {
    classifier: Arc<dyn TextClassifier>,
}

impl LanguageStage {
    pub fn new(classifier: Arc<dyn TextClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl ClassificationStage for LanguageStage {
    fn name(&self) -> &'static str {
        "language"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Language(vec![UNKNOWN_LANGUAGE.to_string(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let raw = self.classifier.classify_batch(&texts, batch_size).await?;
        let codes: Vec<String> = raw.iter().map(|r| r.label.to_lowercase()).collect();

        Ok(StageOutput::Language(scatter(
            batch.len(),
            UNKNOWN_LANGUAGE.to_string(),
            &indices,
            &codes,
        )))
    }
}
