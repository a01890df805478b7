use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Which classification backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierBackend {
    /// Hugging Face Inference API (default) — needs HF_API_TOKEN, no local models
    HfApi,
    /// Local ONNX models for the single-label capabilities; the rest stay on the API
    Onnx,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Which classification backend to use (default: HfApi)
    pub backend: ClassifierBackend,
    /// Base URL of the Inference API (overridable for self-hosted endpoints)
    pub hf_api_url: String,
    pub hf_api_token: String,
    /// Base directory containing per-capability ONNX model subdirectories
    pub model_dir: PathBuf,
    /// Records per pipeline chunk
    pub chunk_size: usize,
    /// Batch-size hint passed through to classifier calls
    pub batch_size: usize,
    /// Worker-pool width for concurrent stage execution
    pub workers: usize,
}

const DEFAULT_CHUNK_SIZE: usize = 100;
const DEFAULT_BATCH_SIZE: usize = 16;
const DEFAULT_WORKERS: usize = 4;

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let backend = match env::var("SOOT_BACKEND").as_deref() {
            Ok("onnx") => ClassifierBackend::Onnx,
            // "hf" or unset both default to the Inference API
            _ => ClassifierBackend::HfApi,
        };

        let model_dir = env::var("SOOT_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::classify::onnx::default_model_dir());

        Ok(Self {
            db_path: env::var("SOOT_DB_PATH").unwrap_or_else(|_| "./soot.db".to_string()),
            backend,
            hf_api_url: env::var("HF_API_URL")
                .unwrap_or_else(|_| crate::classify::hf::DEFAULT_API_URL.to_string()),
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            model_dir,
            chunk_size: parse_env_usize("SOOT_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            batch_size: parse_env_usize("SOOT_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            workers: parse_env_usize("SOOT_WORKERS", DEFAULT_WORKERS),
        })
    }

    /// Check that the Inference API token is configured.
    pub fn require_hf_token(&self) -> Result<()> {
        if self.hf_api_token.is_empty() {
            anyhow::bail!(
                "HF_API_TOKEN not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that the local model directories exist for the ONNX backend.
    pub fn require_local_models(&self) -> Result<()> {
        for capability in ["sentiment", "language", "toxicity", "sarcasm"] {
            let dir = crate::classify::onnx::capability_model_dir(&self.model_dir, capability);
            if !crate::classify::onnx::model_files_present(&dir) {
                anyhow::bail!(
                    "ONNX model files for '{}' not found in {}\n\
                     Each capability directory needs model.onnx (or model_quantized.onnx),\n\
                     tokenizer.json, and labels.json.\n\
                     Or set SOOT_BACKEND=hf to use the Inference API instead.",
                    capability,
                    dir.display()
                );
            }
        }
        Ok(())
    }

    /// Validate that the chosen backend has what it needs. The ONNX backend
    /// still needs the API token, since emotion, zero-shot, and NER calls
    /// stay remote.
    pub fn require_classifiers(&self) -> Result<()> {
        match self.backend {
            ClassifierBackend::HfApi => self.require_hf_token(),
            ClassifierBackend::Onnx => {
                self.require_local_models()?;
                self.require_hf_token()
            }
        }
    }
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}
