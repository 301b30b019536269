// tests/pipeline_properties.rs
// End-to-end properties of the scoring pipeline, independent of the HTTP layer.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sentiment_service::{analyze, LexiconStore, Sentiment, SentimentResult};

fn store() -> LexiconStore {
    LexiconStore::builtin().expect("bundled lexicon")
}

fn assert_well_formed(r: &SentimentResult, input: &str) {
    let c = &r.confidence_scores;
    for v in [c.positive, c.negative, c.neutral] {
        assert!((0.0..=1.0).contains(&v), "confidence out of range for {input:?}: {c:?}");
    }
    assert!(
        (c.positive + c.negative + c.neutral - 1.0).abs() < 1e-6,
        "confidences must sum to 1 for {input:?}: {c:?}"
    );
    assert!((-1.0..=1.0).contains(&r.score), "score out of range for {input:?}");
    assert!(r.keywords.len() <= 5);
}

#[test]
fn positive_english_review() {
    let r = analyze(&store(), "I love this product! It's amazing and works great.", "en");
    assert_eq!(r.sentiment, Sentiment::Positive);
    assert!(r.score > 0.0);
    let allowed = ["love", "product", "amazing", "works", "great"];
    assert!(!r.keywords.is_empty());
    assert!(r.keywords.iter().all(|k| allowed.contains(&k.as_str())), "{:?}", r.keywords);
}

#[test]
fn negative_english_review() {
    let r = analyze(
        &store(),
        "This is terrible. I hate it and it doesn't work at all.",
        "en",
    );
    assert_eq!(r.sentiment, Sentiment::Negative);
    assert!(r.score < 0.0);
}

#[test]
fn negated_negative_leans_positive() {
    let r = analyze(&store(), "This is not bad at all, I actually quite like it.", "en");
    assert_ne!(r.sentiment, Sentiment::Negative);
    assert!(r.score >= 0.0);
    assert_eq!(r.sentiment, Sentiment::Positive);
}

#[test]
fn chinese_character_tokenization() {
    let r = analyze(&store(), "这个产品非常好，我很喜欢！", "zh");
    assert_eq!(r.sentiment, Sentiment::Positive);
    assert!(r.score > 0.0);
    // every token is a single character, so none qualify as keywords
    assert!(r.keywords.is_empty());
}

#[test]
fn empty_input_is_neutral() {
    for lang in ["en", "zh", "xx", ""] {
        let r = analyze(&store(), "", lang);
        assert_eq!(r.sentiment, Sentiment::Neutral);
        assert_eq!(r.score, 0.0);
        assert!(r.keywords.is_empty());
        assert_well_formed(&r, "");
    }
}

#[test]
fn urls_and_emails_do_not_score() {
    let r = analyze(
        &store(),
        "contact great@bad.com or visit https://awful.example/good",
        "en",
    );
    assert_eq!(r.sentiment, Sentiment::Neutral);
    assert!(!r.keywords.iter().any(|k| k.contains("great") || k.contains("awful")));
}

#[test]
fn keywords_never_include_stopwords_or_single_chars() {
    let r = analyze(
        &store(),
        "The a an and I x y z is was the product the product works",
        "en",
    );
    for k in &r.keywords {
        assert!(k.chars().count() > 1, "short keyword {k:?}");
        assert!(!["the", "an", "and", "is", "was"].contains(&k.as_str()));
    }
    assert_eq!(r.keywords.first().map(String::as_str), Some("product"));
}

#[test]
fn analysis_is_idempotent() {
    let s = store();
    let text = "Not good, not terrible either. Great support, awful docs.";
    assert_eq!(analyze(&s, text, "en"), analyze(&s, text, "en"));
}

#[test]
fn random_inputs_are_always_well_formed() {
    const VOCAB: &[&str] = &[
        "good", "bad", "not", "never", "love", "hate", "the", "product", "!", "...",
        "don't", "https://x.io/a", "me@mail.com", "好", "差", "不", "喜欢", "  ", "\n",
        "great", "awful", "ok", "café", "😀",
    ];
    let s = store();
    let mut rng = StdRng::seed_from_u64(0x5e17);

    for _ in 0..500 {
        let n = rng.random_range(0..30);
        let text: Vec<&str> = (0..n).map(|_| VOCAB[rng.random_range(0..VOCAB.len())]).collect();
        let text = text.join(" ");
        let lang = ["en", "zh", "fr", "EN-gb"][rng.random_range(0..4)];

        let r = analyze(&s, &text, lang);
        assert_well_formed(&r, &text);
        assert_eq!(r, analyze(&s, &text, lang));
    }
}
