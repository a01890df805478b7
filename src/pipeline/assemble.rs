// Insight assembly — joins records with stage outputs by index.
//
// The scheduler guarantees every stage output is batch-length, but assembly
// doesn't trust it: short or missing outputs are padded with the stage's
// fallback rather than panicking. A record that fails to assemble is
// skipped and logged; one malformed row must not abort the batch.
//
// Assembly is the single rounding point: score/confidence fields to 3
// decimals, emotion sub-scores to 4, risk index to 4.

use std::collections::HashMap;

use anyhow::Result;
use tracing::warn;

use crate::classify::stages::language::UNKNOWN_LANGUAGE;
use crate::classify::stages::{
    EmotionResult, IntentResult, SarcasmResult, SentimentResult, StageOutput, TopicEntityResult,
    ToxicityResult,
};
use crate::db::models::{CommentRecord, EmotionScore, Insight, RiskTier};
use crate::scoring::risk::{compute_risk_index, RiskWeights};

/// All stage outputs for one chunk, unpacked into typed, batch-length
/// vectors. Missing or short outputs have already been padded.
struct ChunkOutputs {
    sentiment: Vec<SentimentResult>,
    emotion: Vec<EmotionResult>,
    language: Vec<String>,
    intent: Vec<IntentResult>,
    toxicity: Vec<ToxicityResult>,
    sarcasm: Vec<SarcasmResult>,
    topics: Vec<TopicEntityResult>,
}

impl ChunkOutputs {
    fn from_map(mut outputs: HashMap<&'static str, StageOutput>, len: usize) -> Self {
        let mut chunk = Self {
            sentiment: vec![SentimentResult::default(); len],
            emotion: vec![EmotionResult::default(); len],
            language: vec![UNKNOWN_LANGUAGE.to_string(); len],
            intent: vec![IntentResult::default(); len],
            toxicity: vec![ToxicityResult::default(); len],
            sarcasm: vec![SarcasmResult::default(); len],
            topics: vec![TopicEntityResult::default(); len],
        };

        for (name, output) in outputs.drain() {
            match output {
                StageOutput::Sentiment(v) => {
                    chunk.sentiment = padded(v, len, SentimentResult::default(), name)
                }
                StageOutput::Emotion(v) => {
                    chunk.emotion = padded(v, len, EmotionResult::default(), name)
                }
                StageOutput::Language(v) => {
                    chunk.language = padded(v, len, UNKNOWN_LANGUAGE.to_string(), name)
                }
                StageOutput::Intent(v) => {
                    chunk.intent = padded(v, len, IntentResult::default(), name)
                }
                StageOutput::Toxicity(v) => {
                    chunk.toxicity = padded(v, len, ToxicityResult::default(), name)
                }
                StageOutput::Sarcasm(v) => {
                    chunk.sarcasm = padded(v, len, SarcasmResult::default(), name)
                }
                StageOutput::Topics(v) => {
                    chunk.topics = padded(v, len, TopicEntityResult::default(), name)
                }
            }
        }

        chunk
    }
}

/// Pad a stage result to batch length with the stage fallback. Should never
/// trigger given the scheduler's invariant, but a ragged result must
/// degrade to fallbacks, not a panic.
fn padded<T: Clone>(mut values: Vec<T>, len: usize, fill: T, stage: &str) -> Vec<T> {
    if values.len() < len {
        warn!(
            stage,
            have = values.len(),
            want = len,
            "Stage result shorter than batch, padding with fallback"
        );
        values.resize(len, fill);
    }
    values.truncate(len);
    values
}

/// Assemble one insight per record. Records that fail to assemble are
/// skipped and logged, so the returned list may be shorter than the input.
pub fn assemble(
    records: &[CommentRecord],
    outputs: HashMap<&'static str, StageOutput>,
    weights: &RiskWeights,
) -> Vec<Insight> {
    let outs = ChunkOutputs::from_map(outputs, records.len());

    let mut insights = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match build_insight(record, &outs, idx, weights) {
            Ok(insight) => insights.push(insight),
            Err(e) => {
                warn!(
                    record = %record.id,
                    index = idx,
                    error = %e,
                    "Failed to assemble insight, skipping record"
                );
            }
        }
    }
    insights
}

fn build_insight(
    record: &CommentRecord,
    outs: &ChunkOutputs,
    idx: usize,
    weights: &RiskWeights,
) -> Result<Insight> {
    if record.id.trim().is_empty() {
        anyhow::bail!("record has no identity");
    }

    let sentiment = &outs.sentiment[idx];
    let emotion = &outs.emotion[idx];
    let intent = &outs.intent[idx];
    let toxicity = &outs.toxicity[idx];
    let sarcasm = &outs.sarcasm[idx];
    let topics = &outs.topics[idx];

    // Risk is computed from the raw values; rounding happens on the way out.
    let risk_index = round4(compute_risk_index(
        sentiment.polarity,
        toxicity.score,
        &intent.intent,
        sarcasm.label,
        sarcasm.score,
        weights,
    ));

    let emotion_scores: Vec<EmotionScore> = emotion
        .scores
        .iter()
        .map(|ls| EmotionScore {
            emotion: ls.label.clone(),
            score: round4(ls.score),
        })
        .collect();

    Ok(Insight {
        comment_id: record.id.clone(),
        username: record.username.clone(),
        platform: record.platform.clone(),
        brand: record.brand.clone(),
        comment: record.comment.clone().unwrap_or_default(),
        sentiment: sentiment.label,
        sentiment_score: round3(sentiment.score),
        polarity: round3(sentiment.polarity),
        emotion: emotion.emotion.clone(),
        emotion_scores,
        intent: intent.intent.clone(),
        intent_confidence: round3(intent.confidence),
        language: outs.language[idx].clone(),
        toxicity: toxicity.label,
        toxicity_score: round3(toxicity.score),
        sarcasm: sarcasm.label,
        sarcasm_score: round3(sarcasm.score),
        topics: topics.topics.clone(),
        entities: topics.entities.clone(),
        risk_index,
        risk_tier: RiskTier::from_index(risk_index),
    })
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

pub fn round4(value: f64) -> f64 {
    (value * 10000.0).round() / 10000.0
}
