// Composition tests — verifying that pure functions chain together
// correctly.
//
// These tests exercise the data flow between modules:
//   sanitize -> label derivation -> risk index -> tier
// without any network calls, database access, or async machinery.

use soot::classify::stages::sarcasm::derive_sarcasm;
use soot::classify::stages::sentiment::derive_sentiment;
use soot::classify::stages::topics::{filter_topics, merge_entities};
use soot::classify::stages::toxicity::derive_toxicity;
use soot::classify::traits::{EntitySpan, LabelScore};
use soot::db::models::{RiskTier, SarcasmLabel, SentimentLabel, ToxicityLabel};
use soot::sanitize::{sanitize, MAX_CLASSIFIER_CHARS};
use soot::scoring::risk::{compute_risk_index, RiskWeights};

// ============================================================
// Chain: classifier output -> derivation tables
// ============================================================

#[test]
fn sentiment_mapping_table() {
    let positive = derive_sentiment("positive", 0.8);
    assert_eq!(positive.label, SentimentLabel::Positive);
    assert!((positive.polarity - 0.8).abs() < 1e-10);

    let negative = derive_sentiment("negative", 0.6);
    assert_eq!(negative.label, SentimentLabel::Negative);
    assert!((negative.polarity + 0.6).abs() < 1e-10);

    let neutral = derive_sentiment("neutral", 0.9);
    assert_eq!(neutral.label, SentimentLabel::Neutral);
    assert!((neutral.polarity - 0.0).abs() < 1e-10);
}

#[test]
fn toxicity_mapping_table() {
    let toxic = derive_toxicity("toxic", 0.9);
    assert_eq!(toxic.label, ToxicityLabel::Toxic);
    assert!((toxic.score - 0.9).abs() < 1e-10);

    let safe = derive_toxicity("non-toxic", 0.9);
    assert_eq!(safe.label, ToxicityLabel::Safe);
    assert!((safe.score - 0.1).abs() < 1e-10);

    let other = derive_toxicity("OK", 0.7);
    assert_eq!(other.label, ToxicityLabel::Safe);
    assert!((other.score - 0.3).abs() < 1e-10);
}

// ============================================================
// Chain: derivations -> risk index -> tier
// ============================================================

#[test]
fn hostile_comment_lands_in_critical_tier() {
    let weights = RiskWeights::default();
    let sentiment = derive_sentiment("negative", 0.95);
    let toxicity = derive_toxicity("toxic", 0.92);
    let sarcasm = derive_sarcasm("sarcasm", 0.8);

    let risk = compute_risk_index(
        sentiment.polarity,
        toxicity.score,
        "complaint",
        sarcasm.label,
        sarcasm.score,
        &weights,
    );
    // 0.4*0.95 + 0.3*0.92 + 0.2*1.0 + 0.1*0.8 = 0.936
    assert!((risk - 0.936).abs() < 1e-10, "Expected 0.936, got {risk}");
    assert_eq!(RiskTier::from_index(risk), RiskTier::Critical);
}

#[test]
fn friendly_comment_lands_in_low_tier() {
    let weights = RiskWeights::default();
    let sentiment = derive_sentiment("positive", 0.98);
    let toxicity = derive_toxicity("non-toxic", 0.99);
    let sarcasm = derive_sarcasm("normal", 0.95);

    let risk = compute_risk_index(
        sentiment.polarity,
        toxicity.score,
        "praise",
        sarcasm.label,
        sarcasm.score,
        &weights,
    );
    // 0.3*0.01 + 0.2*0.3 = 0.063
    assert!((risk - 0.063).abs() < 1e-10, "Expected 0.063, got {risk}");
    assert_eq!(RiskTier::from_index(risk), RiskTier::Low);
}

#[test]
fn fallback_values_produce_the_intent_floor() {
    // A fully invalid record: neutral sentiment, safe 0.0 toxicity,
    // unknown intent, not sarcastic. Only the intent floor contributes.
    let weights = RiskWeights::default();
    let risk = compute_risk_index(0.0, 0.0, "unknown", SarcasmLabel::NotSarcastic, 0.0, &weights);
    assert!((risk - 0.08).abs() < 1e-10, "Expected 0.08, got {risk}");
    assert_eq!(RiskTier::from_index(risk), RiskTier::Low);
}

// ============================================================
// Chain: sanitize -> derivation inputs
// ============================================================

#[test]
fn sanitized_batch_feeds_only_valid_texts_downstream() {
    let long: String = "a".repeat(MAX_CLASSIFIER_CHARS + 50);
    let texts: Vec<Option<&str>> = vec![Some("short"), None, Some(""), Some(long.as_str())];
    let batch = sanitize(&texts);

    assert_eq!(batch.len(), 4);
    let (indices, valid) = batch.valid_entries();
    assert_eq!(indices, vec![0, 3]);
    assert_eq!(valid[0], "short");
    assert_eq!(valid[1].chars().count(), MAX_CLASSIFIER_CHARS);
}

// ============================================================
// Chain: topic filtering + entity merging
// ============================================================

#[test]
fn topic_floor_and_entity_dedup_chain() {
    let topics = filter_topics(&[
        LabelScore::new("Product Issue", 0.81),
        LabelScore::new("pricing", 0.249),
        LabelScore::new("support", 0.33),
    ]);
    assert_eq!(
        topics,
        vec!["product issue".to_string(), "support".to_string()]
    );

    let span = |w: &str| EntitySpan {
        word: w.to_string(),
        label: "ORG".to_string(),
        score: 0.95,
    };
    let entities = merge_entities(&[span("Acme"), span("##Co"), span("Acme"), span("##")]);
    assert_eq!(entities, vec!["Acme".to_string(), "Co".to_string()]);
}
