// Composite risk index formula.
//
// The index combines four signals: negative sentiment polarity, toxicity,
// intent, and sarcasm. Of the two formulas that have circulated for this
// score, this is the weighted multi-factor one (the other, a flat-bonus
// variant keyed on intent values like "threat" that the intent classifier
// never produces, is a dead branch and is not implemented — see DESIGN.md).

use crate::db::models::SarcasmLabel;

/// Configurable weights for the risk formula.
///
/// `risk = sentiment_weight · max(0, -polarity)
///       + toxicity_weight  · clamp(toxicity, 0, 1)
///       + intent_weight    · intent_weight_of(intent)
///       + sarcasm_weight   · sarcasm_risk`
///
/// clamped to [0, 1].
pub struct RiskWeights {
    /// Weight of the negative-polarity term (default 0.4)
    pub sentiment_weight: f64,
    /// Weight of the toxicity term (default 0.3)
    pub toxicity_weight: f64,
    /// Weight of the intent term (default 0.2)
    pub intent_weight: f64,
    /// Weight of the sarcasm term (default 0.1)
    pub sarcasm_weight: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            sentiment_weight: 0.4,
            toxicity_weight: 0.3,
            intent_weight: 0.2,
            sarcasm_weight: 0.1,
        }
    }
}

/// Per-intent weight inside the intent term. Complaints carry the most
/// risk; praise the least; unrecognized intents sit just above praise.
pub fn intent_weight_of(intent: &str) -> f64 {
    match intent.to_lowercase().as_str() {
        "complaint" => 1.0,
        "request" => 0.8,
        "question" => 0.6,
        "praise" => 0.3,
        _ => 0.4,
    }
}

/// Compute the composite risk index. Pure function; always in [0, 1] for
/// polarity ∈ [-1, 1], toxicity ∈ [0, 1], sarcasm score ∈ [0, 1].
pub fn compute_risk_index(
    polarity: f64,
    toxicity_score: f64,
    intent: &str,
    sarcasm: SarcasmLabel,
    sarcasm_score: f64,
    weights: &RiskWeights,
) -> f64 {
    let sentiment_risk = (-polarity).max(0.0);
    let toxicity_risk = toxicity_score.clamp(0.0, 1.0);
    let sarcasm_risk = if sarcasm == SarcasmLabel::Sarcastic {
        sarcasm_score
    } else {
        0.0
    };

    let risk = weights.sentiment_weight * sentiment_risk
        + weights.toxicity_weight * toxicity_risk
        + weights.intent_weight * intent_weight_of(intent)
        + weights.sarcasm_weight * sarcasm_risk;

    risk.clamp(0.0, 1.0)
}
