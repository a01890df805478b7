// Pipeline tests — the full enrichment flow against scripted capability
// fakes. No network calls, no models, no database: every classifier is a
// deterministic in-memory lookup, which is what makes the idempotence and
// fallback assertions meaningful.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use soot::classify::stages::{
    emotion::EmotionStage, intent::IntentStage, language::LanguageStage, sarcasm::SarcasmStage,
    sentiment::SentimentStage, topics::TopicEntityStage, toxicity::ToxicityStage,
    ClassificationStage, StageOutput,
};
use soot::classify::traits::{
    EntitySpan, LabelScore, MultiLabelClassifier, TextClassifier, TokenClassifier,
    ZeroShotClassifier,
};
use soot::db::models::{CommentRecord, SarcasmLabel, SentimentLabel, ToxicityLabel};
use soot::pipeline::runner;
use soot::pipeline::scheduler::StageScheduler;
use soot::sanitize::sanitize;
use soot::scoring::risk::RiskWeights;

// ============================================================
// Scripted capability fakes
// ============================================================

/// Single-label classifier with canned responses keyed by text. Records
/// every text it was asked to classify.
struct ScriptedTextClassifier {
    responses: HashMap<String, LabelScore>,
    default: LabelScore,
    texts_seen: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedTextClassifier {
    fn new(responses: Vec<(&str, &str, f64)>, default: LabelScore) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(text, label, score)| (text.to_string(), LabelScore::new(label, score)))
                .collect(),
            default,
            texts_seen: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn neutral(responses: Vec<(&str, &str, f64)>) -> Self {
        Self::new(responses, LabelScore::new("neutral", 0.5))
    }
}

#[async_trait]
impl TextClassifier for ScriptedTextClassifier {
    async fn classify_batch(&self, texts: &[String], _batch_size: usize) -> Result<Vec<LabelScore>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts
            .iter()
            .map(|t| self.responses.get(t).cloned().unwrap_or(self.default.clone()))
            .collect())
    }
}

struct ScriptedMultiLabelClassifier {
    responses: HashMap<String, Vec<LabelScore>>,
}

impl ScriptedMultiLabelClassifier {
    fn new(responses: Vec<(&str, Vec<(&str, f64)>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(text, scores)| {
                    (
                        text.to_string(),
                        scores
                            .into_iter()
                            .map(|(l, s)| LabelScore::new(l, s))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MultiLabelClassifier for ScriptedMultiLabelClassifier {
    async fn classify_all_batch(
        &self,
        texts: &[String],
        _batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>> {
        Ok(texts
            .iter()
            .map(|t| self.responses.get(t).cloned().unwrap_or_default())
            .collect())
    }
}

struct ScriptedZeroShotClassifier {
    responses: HashMap<String, Vec<LabelScore>>,
}

impl ScriptedZeroShotClassifier {
    fn new(responses: Vec<(&str, Vec<(&str, f64)>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(text, scores)| {
                    (
                        text.to_string(),
                        scores
                            .into_iter()
                            .map(|(l, s)| LabelScore::new(l, s))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ZeroShotClassifier for ScriptedZeroShotClassifier {
    async fn classify_with_labels(
        &self,
        texts: &[String],
        _candidate_labels: &[&str],
        _multi_label: bool,
        _batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>> {
        Ok(texts
            .iter()
            .map(|t| self.responses.get(t).cloned().unwrap_or_default())
            .collect())
    }
}

/// Zero-shot classifier that always fails — simulates a whole-batch model
/// failure.
struct FailingZeroShotClassifier;

#[async_trait]
impl ZeroShotClassifier for FailingZeroShotClassifier {
    async fn classify_with_labels(
        &self,
        _texts: &[String],
        _candidate_labels: &[&str],
        _multi_label: bool,
        _batch_size: usize,
    ) -> Result<Vec<Vec<LabelScore>>> {
        anyhow::bail!("zero-shot model unavailable")
    }
}

struct ScriptedTokenClassifier {
    responses: HashMap<String, Vec<EntitySpan>>,
}

impl ScriptedTokenClassifier {
    fn new(responses: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            responses: responses
                .into_iter()
                .map(|(text, words)| {
                    (
                        text.to_string(),
                        words
                            .into_iter()
                            .map(|w| EntitySpan {
                                word: w.to_string(),
                                label: "MISC".to_string(),
                                score: 0.9,
                            })
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    fn empty() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }
}

#[async_trait]
impl TokenClassifier for ScriptedTokenClassifier {
    async fn extract_batch(
        &self,
        texts: &[String],
        _batch_size: usize,
    ) -> Result<Vec<Vec<EntitySpan>>> {
        Ok(texts
            .iter()
            .map(|t| self.responses.get(t).cloned().unwrap_or_default())
            .collect())
    }
}

// ============================================================
// Fixture builders
// ============================================================

fn record(id: &str, text: Option<&str>) -> CommentRecord {
    CommentRecord {
        id: id.to_string(),
        username: Some(format!("user-{id}")),
        platform: Some("forum".to_string()),
        brand: Some("acme".to_string()),
        comment: text.map(|t| t.to_string()),
    }
}

/// A full deterministic stage set for the three-comment scenario.
fn scripted_stages() -> Vec<Arc<dyn ClassificationStage>> {
    let sentiment = ScriptedTextClassifier::neutral(vec![
        ("I love this!", "positive", 0.95),
        ("This is broken and awful", "negative", 0.85),
    ]);
    let emotion = ScriptedMultiLabelClassifier::new(vec![
        ("I love this!", vec![("joy", 0.9), ("surprise", 0.1)]),
        (
            "This is broken and awful",
            vec![("anger", 0.7), ("disgust", 0.25)],
        ),
    ]);
    let language = ScriptedTextClassifier::new(vec![], LabelScore::new("en", 0.99));
    let intent_zero_shot = ScriptedZeroShotClassifier::new(vec![
        ("I love this!", vec![("praise", 0.88), ("statement", 0.12)]),
        (
            "This is broken and awful",
            vec![("complaint", 0.9), ("statement", 0.1)],
        ),
    ]);
    let toxicity = ScriptedTextClassifier::new(vec![], LabelScore::new("non-toxic", 0.97));
    let sarcasm = ScriptedTextClassifier::new(vec![], LabelScore::new("normal", 0.9));
    let topic_zero_shot = ScriptedZeroShotClassifier::new(vec![
        (
            "This is broken and awful",
            vec![("product issue", 0.81), ("pricing", 0.1)],
        ),
        ("I love this!", vec![("praise", 0.7)]),
    ]);
    let ner = ScriptedTokenClassifier::empty();

    vec![
        Arc::new(SentimentStage::new(Arc::new(sentiment))),
        Arc::new(EmotionStage::new(Arc::new(emotion))),
        Arc::new(LanguageStage::new(Arc::new(language))),
        Arc::new(IntentStage::new(Arc::new(intent_zero_shot))),
        Arc::new(ToxicityStage::new(Arc::new(toxicity))),
        Arc::new(SarcasmStage::new(Arc::new(sarcasm))),
        Arc::new(TopicEntityStage::new(
            Arc::new(topic_zero_shot),
            Arc::new(ner),
        )),
    ]
}

fn scenario_records() -> Vec<CommentRecord> {
    vec![
        record("r0", Some("I love this!")),
        record("r1", Some("")),
        record("r2", Some("This is broken and awful")),
    ]
}

// ============================================================
// Enrichment scenarios
// ============================================================

#[tokio::test]
async fn sentiment_scenario_with_empty_middle_record() {
    let stages = scripted_stages();
    let scheduler = StageScheduler::sequential();
    let records = scenario_records();

    let report = runner::run(
        &records,
        &stages,
        &scheduler,
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(report.total_records, 3);
    assert_eq!(report.analyzed_records, 3);

    let insights = &report.insights;
    assert_eq!(insights[0].sentiment, SentimentLabel::Positive);
    assert!((insights[0].polarity - 0.95).abs() < 1e-10);

    // The empty record falls back to neutral without a classifier call
    assert_eq!(insights[1].sentiment, SentimentLabel::Neutral);
    assert!((insights[1].polarity - 0.0).abs() < 1e-10);
    assert_eq!(insights[1].language, "unknown");
    assert_eq!(insights[1].intent, "unknown");

    assert_eq!(insights[2].sentiment, SentimentLabel::Negative);
    assert!((insights[2].polarity + 0.85).abs() < 1e-10);
    assert_eq!(insights[2].intent, "complaint");
    assert_eq!(insights[2].topics, vec!["product issue".to_string()]);
}

#[tokio::test]
async fn empty_text_never_reaches_the_classifier() {
    let sentiment = ScriptedTextClassifier::neutral(vec![("hello", "positive", 0.9)]);
    let texts_seen = sentiment.texts_seen.clone();
    let calls = sentiment.calls.clone();

    let stage = SentimentStage::new(Arc::new(sentiment));
    let batch = sanitize(&[Some("hello"), Some(""), None, Some("   ")]);
    let output = stage.run_batch(&batch, 8).await.unwrap();

    assert_eq!(output.len(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*texts_seen.lock().unwrap(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn all_invalid_batch_makes_no_capability_call() {
    let sentiment = ScriptedTextClassifier::neutral(vec![]);
    let calls = sentiment.calls.clone();

    let stage = SentimentStage::new(Arc::new(sentiment));
    let batch = sanitize::<&str>(&[Some(""), None]);
    let output = stage.run_batch(&batch, 8).await.unwrap();

    assert_eq!(output.len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn whole_batch_stage_failure_degrades_to_fallback() {
    // The topic stage fails for the entire batch; every other stage is
    // healthy. All five insights must still be assembled, with the topic
    // fallback, and the failure must not leak into the counts.
    let mut stages = scripted_stages();
    stages[6] = Arc::new(TopicEntityStage::new(
        Arc::new(FailingZeroShotClassifier),
        Arc::new(ScriptedTokenClassifier::empty()),
    ));

    let records: Vec<CommentRecord> = (0..5)
        .map(|i| record(&format!("r{i}"), Some("This is broken and awful")))
        .collect();

    let scheduler = StageScheduler::concurrent(4);
    let report = runner::run(
        &records,
        &stages,
        &scheduler,
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(report.total_records, 5);
    assert_eq!(report.analyzed_records, 5);
    for insight in &report.insights {
        assert!(insight.topics.is_empty());
        assert!(insight.entities.is_empty());
        // The healthy stages still produced real values
        assert_eq!(insight.sentiment, SentimentLabel::Negative);
        assert_eq!(insight.intent, "complaint");
    }
}

#[tokio::test]
async fn stage_failure_does_not_corrupt_other_stages() {
    let mut stages = scripted_stages();
    stages[3] = Arc::new(IntentStage::new(Arc::new(FailingZeroShotClassifier)));

    let records = scenario_records();
    let scheduler = StageScheduler::concurrent(4);
    let report = runner::run(
        &records,
        &stages,
        &scheduler,
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(report.analyzed_records, 3);
    // Intent fell back for everyone...
    for insight in &report.insights {
        assert_eq!(insight.intent, "unknown");
        assert!((insight.intent_confidence - 0.0).abs() < 1e-10);
    }
    // ...but sentiment and topics are untouched
    assert_eq!(report.insights[0].sentiment, SentimentLabel::Positive);
    assert_eq!(
        report.insights[2].topics,
        vec!["product issue".to_string()]
    );
}

// ============================================================
// Determinism and ordering
// ============================================================

#[tokio::test]
async fn pipeline_is_idempotent() {
    let scheduler = StageScheduler::concurrent(4);
    let records = scenario_records();

    let first = runner::run(
        &records,
        &scripted_stages(),
        &scheduler,
        2,
        8,
        &RiskWeights::default(),
    )
    .await;
    let second = runner::run(
        &records,
        &scripted_stages(),
        &scheduler,
        2,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(first.total_records, second.total_records);
    assert_eq!(first.analyzed_records, second.analyzed_records);
    assert_eq!(
        serde_json::to_string(&first.insights).unwrap(),
        serde_json::to_string(&second.insights).unwrap(),
    );
}

#[tokio::test]
async fn sequential_and_concurrent_agree() {
    let records = scenario_records();

    let sequential = runner::run(
        &records,
        &scripted_stages(),
        &StageScheduler::sequential(),
        10,
        8,
        &RiskWeights::default(),
    )
    .await;
    let concurrent = runner::run(
        &records,
        &scripted_stages(),
        &StageScheduler::concurrent(4),
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(
        serde_json::to_string(&sequential.insights).unwrap(),
        serde_json::to_string(&concurrent.insights).unwrap(),
    );
}

#[tokio::test]
async fn chunked_run_preserves_global_order() {
    // 7 records, chunk size 3: chunk boundaries must not reorder or drop
    let records: Vec<CommentRecord> = (0..7)
        .map(|i| record(&format!("r{i}"), Some("I love this!")))
        .collect();

    let report = runner::run(
        &records,
        &scripted_stages(),
        &StageScheduler::concurrent(2),
        3,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(report.total_records, 7);
    assert_eq!(report.analyzed_records, 7);
    let ids: Vec<&str> = report
        .insights
        .iter()
        .map(|i| i.comment_id.as_str())
        .collect();
    assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "r4", "r5", "r6"]);
}

#[tokio::test]
async fn analyzed_never_exceeds_total() {
    // One record with a blank identity is skipped at assembly
    let mut records = scenario_records();
    records.push(record("", Some("orphan comment")));

    let report = runner::run(
        &records,
        &scripted_stages(),
        &StageScheduler::sequential(),
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    assert_eq!(report.total_records, 4);
    assert_eq!(report.analyzed_records, 3);
    assert!(report.analyzed_records <= report.total_records);
}

// ============================================================
// Stage output invariants
// ============================================================

#[tokio::test]
async fn every_stage_output_matches_batch_length() {
    let stages = scripted_stages();
    let batch = sanitize(&[Some("I love this!"), None, Some("x"), Some("")]);
    let scheduler = StageScheduler::concurrent(3);

    let outputs = scheduler.run_stages(&batch, &stages, 8).await;
    assert_eq!(outputs.len(), stages.len());
    for (name, output) in &outputs {
        assert_eq!(
            output.len(),
            batch.len(),
            "stage {name} broke the length invariant"
        );
    }
}

#[tokio::test]
async fn single_item_mode_absorbs_stage_failure() {
    let stage = IntentStage::new(Arc::new(FailingZeroShotClassifier));
    let output = stage.run_one(Some("is this thing on?")).await;
    match output {
        StageOutput::Intent(results) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results[0].intent, "unknown");
        }
        other => panic!("unexpected stage output: {other:?}"),
    }
}

// ============================================================
// Risk wiring
// ============================================================

#[tokio::test]
async fn risk_index_combines_stage_outputs() {
    let sentiment = ScriptedTextClassifier::neutral(vec![("bad product", "negative", 0.85)]);
    let emotion = ScriptedMultiLabelClassifier::new(vec![("bad product", vec![("anger", 0.9)])]);
    let language = ScriptedTextClassifier::new(vec![], LabelScore::new("en", 0.99));
    let intent = ScriptedZeroShotClassifier::new(vec![("bad product", vec![("complaint", 0.9)])]);
    let toxicity = ScriptedTextClassifier::new(vec![("bad product", "toxic", 0.9)], LabelScore::new("non-toxic", 0.9));
    let sarcasm = ScriptedTextClassifier::new(
        vec![("bad product", "sarcasm", 0.6)],
        LabelScore::new("normal", 0.9),
    );
    let topic = ScriptedZeroShotClassifier::new(vec![]);
    let ner = ScriptedTokenClassifier::new(vec![("bad product", vec!["Acme"])]);

    let stages: Vec<Arc<dyn ClassificationStage>> = vec![
        Arc::new(SentimentStage::new(Arc::new(sentiment))),
        Arc::new(EmotionStage::new(Arc::new(emotion))),
        Arc::new(LanguageStage::new(Arc::new(language))),
        Arc::new(IntentStage::new(Arc::new(intent))),
        Arc::new(ToxicityStage::new(Arc::new(toxicity))),
        Arc::new(SarcasmStage::new(Arc::new(sarcasm))),
        Arc::new(TopicEntityStage::new(Arc::new(topic), Arc::new(ner))),
    ];

    let records = vec![record("r0", Some("bad product"))];
    let report = runner::run(
        &records,
        &stages,
        &StageScheduler::sequential(),
        10,
        8,
        &RiskWeights::default(),
    )
    .await;

    let insight = &report.insights[0];
    assert_eq!(insight.toxicity, ToxicityLabel::Toxic);
    assert_eq!(insight.sarcasm, SarcasmLabel::Sarcastic);
    assert_eq!(insight.entities, vec!["Acme".to_string()]);

    // 0.4*0.85 + 0.3*0.9 + 0.2*1.0 + 0.1*0.6 = 0.87
    assert!(
        (insight.risk_index - 0.87).abs() < 1e-10,
        "Expected 0.87, got {}",
        insight.risk_index
    );
}
