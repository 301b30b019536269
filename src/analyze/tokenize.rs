//! Language-aware tokenization.

use once_cell::sync::Lazy;
use regex::Regex;

// `\w` is Unicode-aware in `regex`, so accented and CJK letters survive.
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("non-word regex"));

/// Remove every non-word, non-space character from a piece of text.
pub fn clean_piece(piece: &str) -> String {
    NON_WORD_RE.replace_all(piece, "").into_owned()
}

/// Split normalized text into tokens.
///
/// Logographic languages get one token per character, punctuation included.
/// Everything else is split on whitespace, cleaned with [`clean_piece`], and
/// empty pieces are dropped.
pub fn tokenize(text: &str, logographic: bool) -> Vec<String> {
    if logographic {
        text.chars().map(String::from).collect()
    } else {
        text.split_whitespace()
            .map(clean_piece)
            .filter(|t| !t.is_empty())
            .collect()
    }
}
