// Hugging Face Inference API provider.
//
// One thin client, one wrapper struct per capability trait. Requests are
// chunked client-side by the batch-size hint so a large run never ships a
// multi-megabyte payload in one POST. The API returns nested arrays for
// array inputs; we always send arrays, even for a single text.
//
// API docs: https://huggingface.co/docs/api-inference

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    EntitySpan, LabelScore, MultiLabelClassifier, TextClassifier, TokenClassifier,
    ZeroShotClassifier,
};

pub const DEFAULT_API_URL: &str = "https://api-inference.huggingface.co/models";

// Default model per capability — the models the enrichment pipeline was
// tuned against.
pub const SENTIMENT_MODEL: &str = "siebert/sentiment-roberta-large-english";
pub const EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";
pub const LANGUAGE_MODEL: &str = "papluca/xlm-roberta-base-language-detection";
pub const ZERO_SHOT_MODEL: &str = "facebook/bart-large-mnli";
pub const TOXICITY_MODEL: &str = "unitary/toxic-bert";
pub const SARCASM_MODEL: &str = "helinivan/english-sarcasm-detector";
pub const NER_MODEL: &str = "dslim/bert-base-NER";

/// Shared HTTP client for all Inference API calls.
pub struct HfApi {
    client: Client,
    base_url: String,
    token: String,
}

impl HfApi {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// POST a JSON body to a model endpoint and decode the JSON response.
    async fn post<B: Serialize, T: DeserializeOwned>(&self, model: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}", self.base_url, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to call inference API for {model}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned {} for {}: {}", status, model, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse inference API response for {model}"))
    }
}

fn chunks(texts: &[String], batch_size: usize) -> std::slice::Chunks<'_, String> {
    texts.chunks(batch_size.max(1))
}

// --- Request/response types ---

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
    options: RequestOptions,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a [String],
    parameters: ZeroShotParameters,
    options: RequestOptions,
}

#[derive(Serialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<String>,
    multi_label: bool,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            wait_for_model: true,
        }
    }
}

#[derive(Deserialize)]
struct ApiLabelScore {
    label: String,
    score: f64,
}

#[derive(Deserialize)]
struct ApiZeroShotResult {
    labels: Vec<String>,
    scores: Vec<f64>,
}

#[derive(Deserialize)]
struct ApiEntity {
    #[serde(default)]
    entity_group: Option<String>,
    word: String,
    score: f64,
}

// --- Capability wrappers ---

/// Single-label text classification (the API returns all labels per input,
/// sorted by score descending; the first is the winner).
pub struct HfTextClassifier {
    api: Arc<HfApi>,
    model: String,
}

impl HfTextClassifier {
    pub fn new(api: Arc<HfApi>, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextClassifier for HfTextClassifier {
    async fn classify_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<LabelScore>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in chunks(texts, batch_size) {
            let request = ClassifyRequest {
                inputs: chunk,
                options: RequestOptions::default(),
            };
            let response: Vec<Vec<ApiLabelScore>> = self.api.post(&self.model, &request).await?;
            debug!(model = %self.model, inputs = chunk.len(), "Classified chunk");
            for per_text in response {
                let top = per_text
                    .into_iter()
                    .next()
                    .with_context(|| format!("{} returned an empty label list", self.model))?;
                results.push(LabelScore::new(top.label, top.score));
            }
        }
        Ok(results)
    }
}

/// Full-distribution classification (emotion models).
pub struct HfMultiLabelClassifier {
    api: Arc<HfApi>,
    model: String,
}

impl HfMultiLabelClassifier {
    pub fn new(api: Arc<HfApi>, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl MultiLabelClassifier for HfMultiLabelClassifier {
    async fn classify_all_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in chunks(texts, batch_size) {
            let request = ClassifyRequest {
                inputs: chunk,
                options: RequestOptions::default(),
            };
            let response: Vec<Vec<ApiLabelScore>> = self.api.post(&self.model, &request).await?;
            for per_text in response {
                results.push(
                    per_text
                        .into_iter()
                        .map(|ls| LabelScore::new(ls.label, ls.score))
                        .collect(),
                );
            }
        }
        Ok(results)
    }
}

/// Zero-shot classification against caller-supplied candidate labels.
pub struct HfZeroShotClassifier {
    api: Arc<HfApi>,
    model: String,
}

impl HfZeroShotClassifier {
    pub fn new(api: Arc<HfApi>, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for HfZeroShotClassifier {
    async fn classify_with_labels(
        &self,
        texts: &[String],
        candidate_labels: &[&str],
        multi_label: bool,
        batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in chunks(texts, batch_size) {
            let request = ZeroShotRequest {
                inputs: chunk,
                parameters: ZeroShotParameters {
                    candidate_labels: candidate_labels.iter().map(|l| l.to_string()).collect(),
                    multi_label,
                },
                options: RequestOptions::default(),
            };
            let response: Vec<ApiZeroShotResult> = self.api.post(&self.model, &request).await?;
            for per_text in response {
                results.push(
                    per_text
                        .labels
                        .into_iter()
                        .zip(per_text.scores)
                        .map(|(label, score)| LabelScore::new(label, score))
                        .collect(),
                );
            }
        }
        Ok(results)
    }
}

/// Token classification with aggregated entity groups.
pub struct HfTokenClassifier {
    api: Arc<HfApi>,
    model: String,
}

impl HfTokenClassifier {
    pub fn new(api: Arc<HfApi>, model: &str) -> Self {
        Self {
            api,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TokenClassifier for HfTokenClassifier {
    async fn extract_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<EntitySpan>>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in chunks(texts, batch_size) {
            let request = ClassifyRequest {
                inputs: chunk,
                options: RequestOptions::default(),
            };
            let response: Vec<Vec<ApiEntity>> = self.api.post(&self.model, &request).await?;
            for per_text in response {
                results.push(
                    per_text
                        .into_iter()
                        .map(|e| EntitySpan {
                            word: e.word,
                            label: e.entity_group.unwrap_or_default(),
                            score: e.score,
                        })
                        .collect(),
                );
            }
        }
        Ok(results)
    }
}
