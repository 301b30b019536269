//! Frequency-ranked keyword extraction.

use std::collections::HashMap;

use crate::lexicon::Lexicon;

pub const DEFAULT_KEYWORD_LIMIT: usize = 5;

/// Top `limit` tokens by frequency, skipping stopwords and one-character tokens.
/// Equal counts keep first-occurrence order.
pub fn extract_keywords<S: AsRef<str>>(tokens: &[S], lexicon: &Lexicon, limit: usize) -> Vec<String> {
    // token -> (count, first position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, token) in tokens.iter().map(|t| t.as_ref()).enumerate() {
        if token.chars().count() <= 1 || lexicon.is_stopword(token) {
            continue;
        }
        counts.entry(token).or_insert((0, pos)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(tok, (count, first))| (tok, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(tok, _, _)| tok.to_string())
        .collect()
}
