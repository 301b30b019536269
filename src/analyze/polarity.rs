//! Lexicon polarity accumulation with negation, and the label/score decision.

use serde::{Deserialize, Serialize};

use crate::lexicon::{Lexicon, WordClass};

/// Weight a negated negative word contributes to the positive side.
pub const NEGATED_NEGATIVE_WEIGHT: f64 = 0.5;

/// Raw evidence for one text. Both sides are >= 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolarityTally {
    pub positive: f64,
    pub negative: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Single left-to-right pass over the tokens.
///
/// A negation word arms negation and scores nothing. The next positive word then
/// counts as negative (1.0) and the next negative word as weak positive
/// ([`NEGATED_NEGATIVE_WEIGHT`]); either one disarms it. Unknown words leave the
/// negation state alone, so there is no distance-based decay.
pub fn score_tokens<S: AsRef<str>>(tokens: &[S], lexicon: &Lexicon) -> PolarityTally {
    let mut tally = PolarityTally::default();
    let mut negated = false;

    for token in tokens {
        match lexicon.classify(token.as_ref()) {
            WordClass::Negation => negated = true,
            WordClass::Positive => {
                if negated {
                    tally.negative += 1.0;
                } else {
                    tally.positive += 1.0;
                }
                negated = false;
            }
            WordClass::Negative => {
                if negated {
                    tally.positive += NEGATED_NEGATIVE_WEIGHT;
                } else {
                    tally.negative += 1.0;
                }
                negated = false;
            }
            WordClass::Neutral => {}
        }
    }

    tally
}

/// Pick the label and a signed score in [-1, 1].
pub fn decide(tally: PolarityTally) -> (Sentiment, f64) {
    let PolarityTally { positive: p, negative: n } = tally;
    let total = p + n;

    let (sentiment, score) = if p > n {
        let s = if total > 0.0 { p / total } else { 0.5 };
        (Sentiment::Positive, s)
    } else if n > p {
        let s = if total > 0.0 { -n / total } else { -0.5 };
        (Sentiment::Negative, s)
    } else {
        (Sentiment::Neutral, 0.0)
    };

    (sentiment, score.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{LanguageCode, LexiconStore};

    fn en() -> Lexicon {
        let store = LexiconStore::builtin().unwrap();
        store.get(&LanguageCode::parse("en").unwrap()).unwrap().clone()
    }

    fn tally(words: &str) -> PolarityTally {
        let toks: Vec<&str> = words.split_whitespace().collect();
        score_tokens(&toks, &en())
    }

    #[test]
    fn plain_positive_and_negative() {
        assert_eq!(tally("good great"), PolarityTally { positive: 2.0, negative: 0.0 });
        assert_eq!(tally("bad awful"), PolarityTally { positive: 0.0, negative: 2.0 });
    }

    #[test]
    fn negated_positive_counts_negative() {
        assert_eq!(tally("not good"), PolarityTally { positive: 0.0, negative: 1.0 });
    }

    #[test]
    fn negated_negative_is_weak_positive() {
        assert_eq!(tally("not bad"), PolarityTally { positive: 0.5, negative: 0.0 });
    }

    #[test]
    fn negation_persists_across_neutral_words() {
        let t = tally("not really that very good");
        assert_eq!(t, PolarityTally { positive: 0.0, negative: 1.0 });
    }

    #[test]
    fn negation_clears_after_sentiment_word() {
        let t = tally("not bad at all i actually quite like it");
        assert_eq!(t, PolarityTally { positive: 1.5, negative: 0.0 });
    }

    #[test]
    fn double_negation_trigger_stays_armed_once() {
        let t = tally("no never good good");
        assert_eq!(t, PolarityTally { positive: 1.0, negative: 1.0 });
    }

    #[test]
    fn decide_table() {
        let d = |p, n| decide(PolarityTally { positive: p, negative: n });
        assert_eq!(d(0.0, 0.0), (Sentiment::Neutral, 0.0));
        assert_eq!(d(1.0, 1.0), (Sentiment::Neutral, 0.0));
        assert_eq!(d(3.0, 1.0), (Sentiment::Positive, 0.75));
        assert_eq!(d(1.0, 3.0), (Sentiment::Negative, -0.75));
        assert_eq!(d(2.0, 0.0), (Sentiment::Positive, 1.0));
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        let s = serde_json::to_string(&Sentiment::Neutral).unwrap();
        assert_eq!(s, "\"neutral\"");
        assert_eq!(Sentiment::Negative.as_str(), "negative");
    }
}
