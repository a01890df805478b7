// Input sanitization — the first step of every pipeline run.
//
// Raw comment text arrives as nullable strings. Sanitization replaces null
// with empty, truncates to the classifier character budget, and marks which
// positions are worth sending to a classifier at all. The batch keeps its
// input length and order; the index is the join key for every downstream
// stage.

/// Maximum number of characters passed to any classifier call.
/// Truncation applies to the classification copy only; the original text
/// on the record is untouched.
pub const MAX_CLASSIFIER_CHARS: usize = 512;

/// One sanitized entry: the (possibly truncated) text and whether it is
/// non-blank after trimming.
#[derive(Debug, Clone)]
pub struct SanitizedText {
    pub text: String,
    pub is_valid: bool,
}

/// A sanitized input batch. Always the same length as the input it was
/// built from, in the same order.
#[derive(Debug, Clone, Default)]
pub struct SanitizedBatch {
    entries: Vec<SanitizedText>,
}

impl SanitizedBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SanitizedText> {
        self.entries.get(index)
    }

    /// The positions that hold classifiable text, paired with the truncated
    /// texts at those positions. Stages send only these to a capability and
    /// scatter the outputs back by the returned indices.
    pub fn valid_entries(&self) -> (Vec<usize>, Vec<String>) {
        let mut indices = Vec::new();
        let mut texts = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.is_valid {
                indices.push(idx);
                texts.push(entry.text.clone());
            }
        }
        (indices, texts)
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid).count()
    }
}

/// Sanitize a sequence of nullable texts. Total function: never fails,
/// always returns a batch of the same length as the input.
pub fn sanitize<S: AsRef<str>>(texts: &[Option<S>]) -> SanitizedBatch {
    let entries = texts
        .iter()
        .map(|text| {
            let raw = text.as_ref().map(|t| t.as_ref()).unwrap_or("");
            SanitizedText {
                text: truncate_for_classifier(raw),
                is_valid: !raw.trim().is_empty(),
            }
        })
        .collect();
    SanitizedBatch { entries }
}

/// Truncate to the classifier budget on character boundaries. Byte slicing
/// would panic mid-codepoint on emoji-heavy comments.
fn truncate_for_classifier(text: &str) -> String {
    if text.chars().count() <= MAX_CLASSIFIER_CHARS {
        text.to_string()
    } else {
        text.chars().take(MAX_CLASSIFIER_CHARS).collect()
    }
}
