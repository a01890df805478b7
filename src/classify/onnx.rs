// Local ONNX single-label text classifier.
//
// Runs entirely on the local CPU — no API calls, no rate limits, no network
// dependency. One classifier instance wraps one exported sequence
// classification model. A model directory holds three files:
//
//   model.onnx       (or model_quantized.onnx)
//   tokenizer.json
//   labels.json      — JSON array of output labels, in logit order
//
// Output logits go through softmax; the argmax label and its probability
// become the LabelScore.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::debug;

use super::traits::{LabelScore, TextClassifier};

const MODEL_FILES: [&str; 2] = ["model.onnx", "model_quantized.onnx"];
const TOKENIZER_FILE: &str = "tokenizer.json";
const LABELS_FILE: &str = "labels.json";

/// Returns the default base directory for storing model files.
/// Uses the platform data directory: ~/.local/share/soot/models/ on Linux.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("soot")
        .join("models")
}

/// Subdirectory within the base model dir for one capability
/// ("sentiment", "language", "toxicity", "sarcasm").
pub fn capability_model_dir(base: &Path, capability: &str) -> PathBuf {
    base.join(capability)
}

/// Check whether a capability's model files are all present.
pub fn model_files_present(dir: &Path) -> bool {
    let model = MODEL_FILES.iter().any(|f| dir.join(f).exists());
    model && dir.join(TOKENIZER_FILE).exists() && dir.join(LABELS_FILE).exists()
}

/// Local ONNX-based single-label classifier. Holds the session behind
/// Arc<Mutex> so inference can be offloaded to spawn_blocking without
/// blocking the async runtime; the tokenizer and label table are shared
/// read-only.
pub struct OnnxTextClassifier {
    // Arc+Mutex because ort::Session::run takes &mut self, spawn_blocking
    // requires 'static, and the TextClassifier trait needs Send+Sync.
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
    pad_id: i64,
}

impl OnnxTextClassifier {
    /// Load the model, tokenizer, and label table from the given directory.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = MODEL_FILES
            .iter()
            .map(|f| model_dir.join(f))
            .find(|p| p.exists())
            .with_context(|| {
                format!(
                    "No model.onnx or model_quantized.onnx in {}",
                    model_dir.display()
                )
            })?;

        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        let labels_path = model_dir.join(LABELS_FILE);
        let labels_json = std::fs::read_to_string(&labels_path)
            .with_context(|| format!("Labels file not found: {}", labels_path.display()))?;
        let labels: Vec<String> = serde_json::from_str(&labels_json)
            .with_context(|| format!("Failed to parse {}", labels_path.display()))?;
        if labels.is_empty() {
            anyhow::bail!("{} lists no labels", labels_path.display());
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        // Models disagree on the pad token; fall back to 0 if the tokenizer
        // knows neither convention.
        let pad_id = tokenizer
            .token_to_id("<pad>")
            .or_else(|| tokenizer.token_to_id("[PAD]"))
            .unwrap_or(0) as i64;

        debug!(
            model = %model_path.display(),
            labels = labels.len(),
            "Loaded ONNX classifier"
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
            pad_id,
        })
    }

    /// One forward pass over a chunk of texts. CPU-bound tokenization and
    /// inference run inside spawn_blocking so the async runtime stays
    /// responsive.
    async fn run_chunk(&self, texts: Vec<String>) -> Result<Vec<LabelScore>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let pad_id = self.pad_id;

        tokio::task::spawn_blocking(move || {
            let encodings: Vec<_> = texts
                .iter()
                .map(|t| {
                    tokenizer
                        .encode(t.as_str(), true)
                        .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
                })
                .collect::<Result<Vec<_>>>()?;

            let batch_size = encodings.len();
            let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

            // Flat input tensors, right-padded to max_len. Shape: [batch, max_len]
            let mut input_ids_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);
            let mut attention_mask_flat: Vec<i64> = Vec::with_capacity(batch_size * max_len);

            for enc in &encodings {
                let ids = enc.get_ids();
                let mask = enc.get_attention_mask();
                let seq_len = ids.len();

                for &id in ids {
                    input_ids_flat.push(id as i64);
                }
                for &m in mask {
                    attention_mask_flat.push(m as i64);
                }
                for _ in seq_len..max_len {
                    input_ids_flat.push(pad_id);
                    attention_mask_flat.push(0);
                }
            }

            let shape = [batch_size as i64, max_len as i64];

            let input_ids_tensor = Tensor::from_array((shape, input_ids_flat))
                .context("Failed to create input_ids tensor")?;
            let attention_mask_tensor = Tensor::from_array((shape, attention_mask_flat))
                .context("Failed to create attention_mask tensor")?;

            let logits_data = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids_tensor,
                        "attention_mask" => attention_mask_tensor
                    })
                    .context("ONNX inference failed")?;

                // Output shape: [batch, num_labels] — raw logits
                let (_out_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;

                data.to_vec()
            };

            let num_labels = labels.len();
            let mut results = Vec::with_capacity(batch_size);
            for i in 0..batch_size {
                let offset = i * num_labels;
                let row = &logits_data[offset..offset + num_labels];
                let probs = softmax(row);

                let (best_idx, best_prob) = probs
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                    .unwrap_or((0, &0.0));

                results.push(LabelScore::new(labels[best_idx].clone(), *best_prob));
            }

            Ok(results)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

#[async_trait]
impl TextClassifier for OnnxTextClassifier {
    async fn classify_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<LabelScore>> {
        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(batch_size.max(1)) {
            results.extend(self.run_chunk(chunk.to_vec()).await?);
        }
        Ok(results)
    }
}

/// Softmax over a logit row: maps to probabilities summing to 1.
/// Shifted by the row max for numerical stability.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| ((l as f64) - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 {
        return vec![0.0; logits.len()];
    }
    exps.iter().map(|e| e / sum).collect()
}
