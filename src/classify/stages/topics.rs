// Topic and entity stage — the one stage backed by two capabilities.
//
// Topics come from multi-label zero-shot classification against a fixed
// candidate list with a confidence floor. Entities come from a token
// classification model; sub-word continuation markers are stripped and the
// surfaces deduplicated in first-seen order. If either capability call
// fails the whole stage fails — the scheduler substitutes the fallback.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::traits::{EntitySpan, LabelScore, TokenClassifier, ZeroShotClassifier};
use crate::sanitize::SanitizedBatch;

use super::{scatter, ClassificationStage, StageOutput, TopicEntityResult};

/// Candidate topic labels for the zero-shot classifier.
pub const TOPIC_LABELS: [&str; 8] = [
    "product issue",
    "pricing",
    "usability",
    "support",
    "delivery",
    "feature request",
    "praise",
    "other",
];

/// Minimum zero-shot confidence for a topic label to be retained.
pub const TOPIC_CONFIDENCE_FLOOR: f64 = 0.25;

pub struct TopicEntityStage {
    zero_shot: Arc<dyn ZeroShotClassifier>,
    ner: Arc<dyn TokenClassifier>,
}

impl TopicEntityStage {
    pub fn new(zero_shot: Arc<dyn ZeroShotClassifier>, ner: Arc<dyn TokenClassifier>) -> Self {
        Self { zero_shot, ner }
    }
}

#[async_trait]
impl ClassificationStage for TopicEntityStage {
    fn name(&self) -> &'static str {
        "topics"
    }

    fn fallback(&self, len: usize) -> StageOutput {
        StageOutput::Topics(vec![TopicEntityResult::default(); len])
    }

    async fn run_batch(&self, batch: &SanitizedBatch, batch_size: usize) -> Result<StageOutput> {
        let (indices, texts) = batch.valid_entries();
        if indices.is_empty() {
            return Ok(self.fallback(batch.len()));
        }

        let topic_raw = self
            .zero_shot
            .classify_with_labels(&texts, &TOPIC_LABELS, true, batch_size)
            .await?;
        let entity_raw = self.ner.extract_batch(&texts, batch_size).await?;

        let derived: Vec<TopicEntityResult> = texts
            .iter()
            .enumerate()
            .map(|(slot, _)| TopicEntityResult {
                topics: topic_raw.get(slot).map(|s| filter_topics(s)).unwrap_or_default(),
                entities: entity_raw
                    .get(slot)
                    .map(|s| merge_entities(s))
                    .unwrap_or_default(),
            })
            .collect();

        Ok(StageOutput::Topics(scatter(
            batch.len(),
            TopicEntityResult::default(),
            &indices,
            &derived,
        )))
    }
}

/// Keep candidate labels at or above the confidence floor, lower-cased.
pub fn filter_topics(scores: &[LabelScore]) -> Vec<String> {
    scores
        .iter()
        .filter(|s| s.score >= TOPIC_CONFIDENCE_FLOOR)
        .map(|s| s.label.to_lowercase())
        .collect()
}

/// Merge token-classification spans into clean entity surfaces: strip the
/// "##" sub-word continuation marker and deduplicate preserving first-seen
/// order.
pub fn merge_entities(spans: &[EntitySpan]) -> Vec<String> {
    let mut entities: Vec<String> = Vec::new();
    for span in spans {
        let cleaned = span.word.replace("##", "");
        if cleaned.is_empty() {
            continue;
        }
        if !entities.contains(&cleaned) {
            entities.push(cleaned);
        }
    }
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_confidence_floor() {
        let topics = filter_topics(&[
            LabelScore::new("Pricing", 0.8),
            LabelScore::new("support", 0.25),
            LabelScore::new("delivery", 0.24),
        ]);
        assert_eq!(topics, vec!["pricing".to_string(), "support".to_string()]);
    }

    #[test]
    fn test_entity_merge_strips_subword_markers() {
        let spans = vec![
            EntitySpan {
                word: "Acme".to_string(),
                label: "ORG".to_string(),
                score: 0.99,
            },
            EntitySpan {
                word: "##Corp".to_string(),
                label: "ORG".to_string(),
                score: 0.97,
            },
        ];
        assert_eq!(
            merge_entities(&spans),
            vec!["Acme".to_string(), "Corp".to_string()]
        );
    }

    #[test]
    fn test_entity_dedup_preserves_first_seen_order() {
        let mk = |w: &str| EntitySpan {
            word: w.to_string(),
            label: "MISC".to_string(),
            score: 0.9,
        };
        let spans = vec![mk("Berlin"), mk("Acme"), mk("Berlin")];
        assert_eq!(
            merge_entities(&spans),
            vec!["Berlin".to_string(), "Acme".to_string()]
        );
    }
}
