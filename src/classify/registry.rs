// Classifier registry — explicitly constructed capability bundle.
//
// Built once per process from config, then shared via Arc. Stages receive
// their capability handles at construction time; nothing reaches for a
// hidden global. The zero-shot handle is shared by the intent and topic
// stages, which prompt the same model with different candidate labels.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{ClassifierBackend, Config};

use super::hf::{
    HfApi, HfMultiLabelClassifier, HfTextClassifier, HfTokenClassifier, HfZeroShotClassifier,
};
use super::onnx::{capability_model_dir, OnnxTextClassifier};
use super::traits::{
    MultiLabelClassifier, TextClassifier, TokenClassifier, ZeroShotClassifier,
};

pub struct ClassifierRegistry {
    pub sentiment: Arc<dyn TextClassifier>,
    pub emotion: Arc<dyn MultiLabelClassifier>,
    pub language: Arc<dyn TextClassifier>,
    pub zero_shot: Arc<dyn ZeroShotClassifier>,
    pub toxicity: Arc<dyn TextClassifier>,
    pub sarcasm: Arc<dyn TextClassifier>,
    pub ner: Arc<dyn TokenClassifier>,
}

impl ClassifierRegistry {
    /// Build the registry for the configured backend.
    ///
    /// The ONNX backend covers the four single-label capabilities with
    /// local models; emotion, zero-shot, and NER stay on the Inference API
    /// either way (no local export for those model heads).
    pub fn from_config(config: &Config) -> Result<Arc<Self>> {
        let api = Arc::new(HfApi::new(&config.hf_api_url, &config.hf_api_token));

        let registry = match config.backend {
            ClassifierBackend::HfApi => {
                info!("Using Hugging Face Inference API for all capabilities");
                Self {
                    sentiment: Arc::new(HfTextClassifier::new(
                        api.clone(),
                        super::hf::SENTIMENT_MODEL,
                    )),
                    emotion: Arc::new(HfMultiLabelClassifier::new(
                        api.clone(),
                        super::hf::EMOTION_MODEL,
                    )),
                    language: Arc::new(HfTextClassifier::new(
                        api.clone(),
                        super::hf::LANGUAGE_MODEL,
                    )),
                    zero_shot: Arc::new(HfZeroShotClassifier::new(
                        api.clone(),
                        super::hf::ZERO_SHOT_MODEL,
                    )),
                    toxicity: Arc::new(HfTextClassifier::new(
                        api.clone(),
                        super::hf::TOXICITY_MODEL,
                    )),
                    sarcasm: Arc::new(HfTextClassifier::new(api.clone(), super::hf::SARCASM_MODEL)),
                    ner: Arc::new(HfTokenClassifier::new(api, super::hf::NER_MODEL)),
                }
            }
            ClassifierBackend::Onnx => {
                info!("Using local ONNX classifiers for single-label capabilities");
                Self {
                    sentiment: Arc::new(OnnxTextClassifier::load(&capability_model_dir(
                        &config.model_dir,
                        "sentiment",
                    ))?),
                    emotion: Arc::new(HfMultiLabelClassifier::new(
                        api.clone(),
                        super::hf::EMOTION_MODEL,
                    )),
                    language: Arc::new(OnnxTextClassifier::load(&capability_model_dir(
                        &config.model_dir,
                        "language",
                    ))?),
                    zero_shot: Arc::new(HfZeroShotClassifier::new(
                        api.clone(),
                        super::hf::ZERO_SHOT_MODEL,
                    )),
                    toxicity: Arc::new(OnnxTextClassifier::load(&capability_model_dir(
                        &config.model_dir,
                        "toxicity",
                    ))?),
                    sarcasm: Arc::new(OnnxTextClassifier::load(&capability_model_dir(
                        &config.model_dir,
                        "sarcasm",
                    ))?),
                    ner: Arc::new(HfTokenClassifier::new(api, super::hf::NER_MODEL)),
                }
            }
        };

        Ok(Arc::new(registry))
    }
}
