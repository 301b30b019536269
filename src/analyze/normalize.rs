//! Text normalization ahead of tokenization.

use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("url regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+@\S+").expect("email regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Lowercase, drop URLs and e-mail addresses, collapse whitespace, trim.
/// Total over all strings; `""` maps to `""`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lowered, "");
    let no_emails = EMAIL_RE.replace_all(&no_urls, "");
    WS_RE.replace_all(&no_emails, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize("  Hello \t\n  WORLD  "), "hello world");
    }

    #[test]
    fn strips_urls_and_emails() {
        let out = normalize("See https://example.com/a?b=1 or www.test.org, mail me@x.io now");
        assert_eq!(out, "see or mail now");
    }

    #[test]
    fn only_the_url_is_removed_when_glued_to_a_word() {
        assert_eq!(normalize("great visithttp://x.io now"), "great visit now");
        assert_eq!(normalize("Greathttps://x"), "great");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \n\t "), "");
    }

    #[test]
    fn cjk_text_passes_through() {
        assert_eq!(normalize("这个产品非常好，我很喜欢！"), "这个产品非常好，我很喜欢！");
    }
}
