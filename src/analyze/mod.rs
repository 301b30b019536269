// src/analyze/mod.rs
//! Scoring pipeline entry: normalize -> tokenize -> polarity -> decision ->
//! confidence -> keywords.
//!
//! Everything here is a pure function of the input and a read-only
//! [`LexiconStore`]; nothing is carried between calls, so any number of workers
//! can run it concurrently without locking.

pub mod confidence;
pub mod keywords;
pub mod normalize;
pub mod polarity;
pub mod tokenize;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lexicon::LexiconStore;

// Re-export convenient types.
pub use crate::analyze::confidence::{confidence_scores, ConfidenceScores, SMOOTHING};
pub use crate::analyze::keywords::{extract_keywords, DEFAULT_KEYWORD_LIMIT};
pub use crate::analyze::normalize::normalize;
pub use crate::analyze::polarity::{decide, score_tokens, PolarityTally, Sentiment};
pub use crate::analyze::tokenize::tokenize;

/// Outcome of one analysis. Returned by value; never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    /// Signed polarity in [-1, 1].
    pub score: f64,
    pub confidence_scores: ConfidenceScores,
    pub keywords: Vec<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// One unit of work as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Opaque correlation id, echoed back untouched.
    #[serde(default)]
    pub request_id: String,
    pub text: String,
    #[serde(default = "default_language")]
    pub language: String,
}

/// `request_id` plus the flattened result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub request_id: String,
    #[serde(flatten)]
    pub result: SentimentResult,
}

/// Analyze with the default keyword limit.
pub fn analyze(store: &LexiconStore, text: &str, language: &str) -> SentimentResult {
    analyze_with_limit(store, text, language, DEFAULT_KEYWORD_LIMIT)
}

/// Full pipeline. Never fails: unsupported languages fall back to the store default,
/// and empty or punctuation-only text comes out neutral with no keywords.
pub fn analyze_with_limit(
    store: &LexiconStore,
    text: &str,
    language: &str,
    keyword_limit: usize,
) -> SentimentResult {
    let resolved = store.resolve(language);
    if resolved.fell_back {
        warn!(
            target: "sentiment",
            requested = %language,
            fallback = %resolved.language,
            "language not supported, using default"
        );
        counter!("sentiment_language_fallback_total").increment(1);
    }
    let lexicon = resolved.lexicon;

    let normalized = normalize(text);
    let tokens = tokenize(&normalized, lexicon.is_logographic());

    let tally = score_tokens(&tokens, lexicon);
    let (sentiment, score) = decide(tally);

    SentimentResult {
        sentiment,
        score,
        confidence_scores: confidence_scores(tally),
        keywords: extract_keywords(&tokens, lexicon, keyword_limit),
    }
}

/// Short, non-reversible id for a text so logs never carry the raw input.
pub(crate) fn text_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LexiconStore {
        LexiconStore::builtin().unwrap()
    }

    #[test]
    fn empty_text_is_neutral() {
        let r = analyze(&store(), "", "en");
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.score, 0.0);
        assert!(r.keywords.is_empty());
        assert!((r.confidence_scores.neutral - 1.0).abs() < 1e-9);
    }

    #[test]
    fn punctuation_only_is_neutral() {
        let r = analyze(&store(), "?!... ,,", "en");
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert!(r.keywords.is_empty());
    }

    #[test]
    fn unsupported_language_uses_default() {
        let s = store();
        let fr = analyze(&s, "great product", "fr-FR");
        let en = analyze(&s, "great product", "en");
        assert_eq!(fr, en);
    }

    #[test]
    fn keyword_limit_is_honoured() {
        let r = analyze_with_limit(&store(), "alpha beta gamma delta", "en", 2);
        assert_eq!(r.keywords, vec!["alpha", "beta"]);
    }

    #[test]
    fn request_defaults_language_to_en() {
        let req: AnalysisRequest = serde_json::from_str(r#"{"request_id":"r1","text":"hi"}"#).unwrap();
        assert_eq!(req.language, "en");
    }

    #[test]
    fn response_flattens_result() {
        let resp = AnalysisResponse {
            request_id: "abc".into(),
            result: analyze(&store(), "good", "en"),
        };
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["request_id"], "abc");
        assert_eq!(v["sentiment"], "positive");
        assert!(v["confidence_scores"]["neutral"].is_number());
        assert_eq!(v["keywords"][0], "good");
    }

    #[test]
    fn text_id_is_short_hex() {
        let id = text_id("hello");
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, text_id("hello"));
    }
}
