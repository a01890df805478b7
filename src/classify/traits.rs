// Classification capability traits — the swap-ready abstractions.
//
// Each trait covers one kind of model call. Providers (Hugging Face
// Inference API, local ONNX) implement these; the pipeline stages only ever
// see the traits. All methods are async because most providers are HTTP
// calls, and batch methods take a batch-size hint the provider may use to
// bound its internal request or tensor sizes.
//
// Batch methods return one result per input text, in input order. Callers
// are responsible for only passing texts worth classifying.

use anyhow::Result;
use async_trait::async_trait;

/// A single label with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// An entity span from a token-classification model, already aggregated to
/// a surface word.
#[derive(Debug, Clone)]
pub struct EntitySpan {
    pub word: String,
    pub label: String,
    pub score: f64,
}

/// Single-label text classification (sentiment, language, toxicity,
/// sarcasm): the top label and its score per text.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    /// Classify a single text.
    async fn classify(&self, text: &str) -> Result<LabelScore> {
        let mut results = self.classify_batch(&[text.to_string()], 1).await?;
        if results.is_empty() {
            anyhow::bail!("classifier returned no result for single text");
        }
        Ok(results.remove(0))
    }

    /// Classify multiple texts, returning results in the same order.
    async fn classify_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<LabelScore>>;
}

/// Multi-label classification returning every label with its score
/// (emotion models emit the full distribution).
#[async_trait]
pub trait MultiLabelClassifier: Send + Sync {
    /// Classify multiple texts; each result holds all labels with scores,
    /// in whatever order the model emits them.
    async fn classify_all_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>>;
}

/// Zero-shot classification against caller-supplied candidate labels
/// (intent, topics). With `multi_label` false the scores form a
/// distribution over the candidates; with it true each candidate is scored
/// independently.
#[async_trait]
pub trait ZeroShotClassifier: Send + Sync {
    async fn classify_with_labels(
        &self,
        texts: &[String],
        candidate_labels: &[&str],
        multi_label: bool,
        batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>>;
}

/// Token classification (NER): entity spans per text.
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    async fn extract_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<EntitySpan>>>;
}
