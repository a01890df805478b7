// Classification stages — one per capability, uniform batch contract.
//
// A stage wraps a capability behind a shared shape: take a sanitized batch,
// classify the valid positions, scatter the derived results back to their
// original indices, and emit the stage's declared fallback everywhere else.
// Stage outputs are tagged variants with typed fields, so nothing
// downstream does stringly-typed lookups.
//
// Failure policy: a whole-batch capability failure propagates out of
// `run_batch`; the scheduler decides what to substitute, and the failure
// stays visible in the logs. Single-item mode (`run_one`) absorbs the
// failure locally and returns the fallback.

pub mod emotion;
pub mod intent;
pub mod language;
pub mod sarcasm;
pub mod sentiment;
pub mod topics;
pub mod toxicity;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::classify::registry::ClassifierRegistry;
use crate::classify::traits::LabelScore;
use crate::db::models::{SarcasmLabel, SentimentLabel, ToxicityLabel};
use crate::sanitize::{sanitize, SanitizedBatch};

/// Derived sentiment for one text: label plus signed polarity.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    /// Signed polarity in [-1, 1]: +score for positive, -score for
    /// negative, 0.0 for neutral.
    pub polarity: f64,
    pub score: f64,
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            polarity: 0.0,
            score: 0.0,
        }
    }
}

/// Derived emotion for one text: the top label plus the full distribution
/// sorted by score descending.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionResult {
    pub emotion: String,
    pub scores: Vec<LabelScore>,
}

impl Default for EmotionResult {
    fn default() -> Self {
        Self {
            emotion: "neutral".to_string(),
            scores: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntentResult {
    pub intent: String,
    pub confidence: f64,
}

impl Default for IntentResult {
    fn default() -> Self {
        Self {
            intent: "unknown".to_string(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToxicityResult {
    pub label: ToxicityLabel,
    /// Confidence in the *reported* label: the raw model score when toxic,
    /// 1 - raw score when safe.
    pub score: f64,
}

impl Default for ToxicityResult {
    fn default() -> Self {
        Self {
            label: ToxicityLabel::Safe,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SarcasmResult {
    pub label: SarcasmLabel,
    pub score: f64,
}

impl Default for SarcasmResult {
    fn default() -> Self {
        Self {
            label: SarcasmLabel::NotSarcastic,
            score: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicEntityResult {
    pub topics: Vec<String>,
    pub entities: Vec<String>,
}

/// One stage's output for a whole batch. Every variant holds exactly one
/// entry per input position, so callers never index out of range.
#[derive(Debug, Clone)]
pub enum StageOutput {
    Sentiment(Vec<SentimentResult>),
    Emotion(Vec<EmotionResult>),
    Language(Vec<String>),
    Intent(Vec<IntentResult>),
    Toxicity(Vec<ToxicityResult>),
    Sarcasm(Vec<SarcasmResult>),
    Topics(Vec<TopicEntityResult>),
}

impl StageOutput {
    pub fn len(&self) -> usize {
        match self {
            StageOutput::Sentiment(v) => v.len(),
            StageOutput::Emotion(v) => v.len(),
            StageOutput::Language(v) => v.len(),
            StageOutput::Intent(v) => v.len(),
            StageOutput::Toxicity(v) => v.len(),
            StageOutput::Sarcasm(v) => v.len(),
            StageOutput::Topics(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The uniform batch contract every stage implements.
#[async_trait]
pub trait ClassificationStage: Send + Sync {
    fn name(&self) -> &'static str;

    /// The stage's declared fallback output for a batch of the given
    /// length. Used for invalid positions, failed stages, and short
    /// results.
    fn fallback(&self, len: usize) -> StageOutput;

    /// Classify the valid positions of the batch. A whole-batch capability
    /// failure propagates; the caller decides whether to substitute the
    /// fallback.
    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput>;

    /// Single-item mode: classify one nullable text, absorbing any
    /// capability failure into the fallback.
    async fn run_one(&self, text: Option<&str>) -> StageOutput {
        let batch = sanitize(&[text]);
        match self.run_batch(&batch, 1).await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    stage = self.name(),
                    error = %e,
                    "Stage failed for single text, substituting fallback"
                );
                self.fallback(1)
            }
        }
    }
}

/// Scatter per-valid-text results back to their original batch positions.
/// Positions without a result (invalid input, or a capability that returned
/// fewer results than texts) keep the fallback value.
pub(crate) fn scatter<T: Clone>(
    len: usize,
    fallback: T,
    indices: &[usize],
    values: &[T],
) -> Vec<T> {
    let mut out = vec![fallback; len];
    for (slot, &idx) in indices.iter().enumerate() {
        if let Some(value) = values.get(slot) {
            out[idx] = value.clone();
        }
    }
    out
}

/// Build the full stage set from a capability registry, in the order the
/// insights are assembled. Each stage holds its own capability handle;
/// intent and topics share the zero-shot classifier.
pub fn build_stages(registry: &Arc<ClassifierRegistry>) -> Vec<Arc<dyn ClassificationStage>> {
    vec![
        Arc::new(sentiment::SentimentStage::new(registry.sentiment.clone())),
        Arc::new(emotion::EmotionStage::new(registry.emotion.clone())),
        Arc::new(language::LanguageStage::new(registry.language.clone())),
        Arc::new(intent::IntentStage::new(registry.zero_shot.clone())),
        Arc::new(toxicity::ToxicityStage::new(registry.toxicity.clone())),
        Arc::new(sarcasm::SarcasmStage::new(registry.sarcasm.clone())),
        Arc::new(topics::TopicEntityStage::new(
            registry.zero_shot.clone(),
            registry.ner.clone(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_places_values_at_indices() {
        let out = scatter(4, 0u32, &[1, 3], &[10, 30]);
        assert_eq!(out, vec![0, 10, 0, 30]);
    }

    #[test]
    fn test_scatter_tolerates_short_values() {
        // Capability returned fewer results than valid texts — the missing
        // position keeps the fallback.
        let out = scatter(3, -1i64, &[0, 2], &[7]);
        assert_eq!(out, vec![7, -1, -1]);
    }

    #[test]
    fn test_scatter_empty_indices() {
        let out = scatter(2, "x", &[], &[]);
        assert_eq!(out, vec!["x", "x"]);
    }
}
