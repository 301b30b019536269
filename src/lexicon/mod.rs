// src/lexicon/mod.rs
//! Lexicon store: per-language word sets (positive / negative / negation / stopwords).
//!
//! Lexicons are plain data. The bundled `sentiment_lexicon.json` is compiled in as the
//! default; an external JSON or TOML file with the same shape can replace it:
//!
//! ```json
//! {
//!   "default_language": "en",
//!   "languages": {
//!     "en": { "logographic": false, "positive": [..], "negative": [..],
//!             "negation": [..], "stopwords": [..] }
//!   }
//! }
//! ```
//!
//! A store is immutable once built. Reloads go through [`LexiconHandle`], which swaps
//! the whole store at once.

mod handle;

pub use handle::{start_hot_reload_thread, LexiconHandle, ReloadError};

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::analyze::tokenize::clean_piece;

/// Bundled lexicon data.
const BUILTIN_LEXICON: &str = include_str!("../../sentiment_lexicon.json");

#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid lexicon JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid lexicon TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{0}` is not a valid language code")]
    InvalidLanguage(String),
    #[error("language tags `{first}` and `{second}` both map to `{code}`")]
    DuplicateLanguage {
        code: LanguageCode,
        first: String,
        second: String,
    },
    #[error("default language `{0}` has no lexicon")]
    MissingDefault(LanguageCode),
    #[error("language `{language}`: word `{word}` appears in both {first} and {second}")]
    Overlap {
        language: LanguageCode,
        word: String,
        first: &'static str,
        second: &'static str,
    },
}

/// Normalized two-character language identifier (`"en-US"` -> `en`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Lowercase the tag and keep its first two characters.
    /// Returns `None` for tags that are blank after trimming.
    pub fn parse(tag: &str) -> Option<Self> {
        let code: String = tag.trim().to_lowercase().chars().take(2).collect();
        if code.is_empty() {
            None
        } else {
            Some(Self(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a token relates to a lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    Positive,
    Negative,
    Negation,
    Neutral,
}

/// Word sets for one language. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
    negation: HashSet<String>,
    stopwords: HashSet<String>,
    logographic: bool,
}

impl Lexicon {
    /// True for languages tokenized per character (e.g. Chinese).
    pub fn is_logographic(&self) -> bool {
        self.logographic
    }

    pub fn classify(&self, token: &str) -> WordClass {
        if self.negation.contains(token) {
            WordClass::Negation
        } else if self.positive.contains(token) {
            WordClass::Positive
        } else if self.negative.contains(token) {
            WordClass::Negative
        } else {
            WordClass::Neutral
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    fn from_raw(language: &LanguageCode, raw: RawLexicon) -> Result<Self, LexiconError> {
        let logographic = raw.logographic;
        let norm = |words: Vec<String>| -> HashSet<String> {
            words
                .into_iter()
                .map(|w| normalize_entry(&w, logographic))
                .filter(|w| !w.is_empty())
                .collect()
        };

        let lex = Self {
            positive: norm(raw.positive),
            negative: norm(raw.negative),
            negation: norm(raw.negation),
            stopwords: norm(raw.stopwords),
            logographic,
        };

        let sets = [
            ("positive", &lex.positive),
            ("negative", &lex.negative),
            ("negation", &lex.negation),
        ];
        for (i, &(first, a)) in sets.iter().enumerate() {
            for &(second, b) in sets.iter().skip(i + 1) {
                if let Some(word) = a.intersection(b).min() {
                    return Err(LexiconError::Overlap {
                        language: language.clone(),
                        word: word.clone(),
                        first,
                        second,
                    });
                }
            }
        }

        Ok(lex)
    }
}

/// Bring a lexicon entry into the exact form the tokenizer emits, so lookups
/// never depend on how the data file was written.
fn normalize_entry(word: &str, logographic: bool) -> String {
    let lowered = word.trim().to_lowercase();
    if logographic {
        lowered
    } else {
        clean_piece(&lowered)
    }
}

#[derive(Debug, Deserialize)]
struct RawStore {
    default_language: String,
    languages: BTreeMap<String, RawLexicon>,
}

#[derive(Debug, Deserialize)]
struct RawLexicon {
    #[serde(default)]
    logographic: bool,
    #[serde(default)]
    positive: Vec<String>,
    #[serde(default)]
    negative: Vec<String>,
    #[serde(default)]
    negation: Vec<String>,
    #[serde(default)]
    stopwords: Vec<String>,
}

/// Result of resolving a raw language tag against the store.
#[derive(Debug)]
pub struct Resolved<'a> {
    pub language: &'a LanguageCode,
    pub lexicon: &'a Lexicon,
    /// The requested language was unsupported and the default was used.
    pub fell_back: bool,
}

/// All loaded lexicons plus the fallback language.
#[derive(Debug, Clone)]
pub struct LexiconStore {
    default_language: LanguageCode,
    languages: BTreeMap<LanguageCode, Lexicon>,
}

impl LexiconStore {
    pub fn new(
        default_language: LanguageCode,
        languages: BTreeMap<LanguageCode, Lexicon>,
    ) -> Result<Self, LexiconError> {
        if !languages.contains_key(&default_language) {
            return Err(LexiconError::MissingDefault(default_language));
        }
        Ok(Self {
            default_language,
            languages,
        })
    }

    /// The lexicon compiled into the binary (English + Chinese).
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::from_json_str(BUILTIN_LEXICON)
    }

    pub fn from_json_str(s: &str) -> Result<Self, LexiconError> {
        let raw: RawStore = serde_json::from_str(s)?;
        Self::from_raw(raw)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, LexiconError> {
        let raw: RawStore = toml::from_str(s)?;
        Self::from_raw(raw)
    }

    /// Load from a file; `.toml` is parsed as TOML, anything else as JSON.
    pub fn load_from_file(path: &Path) -> Result<Self, LexiconError> {
        let content = fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_toml = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    fn from_raw(raw: RawStore) -> Result<Self, LexiconError> {
        let default_language = LanguageCode::parse(&raw.default_language)
            .ok_or_else(|| LexiconError::InvalidLanguage(raw.default_language.clone()))?;

        let mut languages = BTreeMap::new();
        let mut tags: BTreeMap<LanguageCode, String> = BTreeMap::new();
        for (tag, raw_lex) in raw.languages {
            let code =
                LanguageCode::parse(&tag).ok_or_else(|| LexiconError::InvalidLanguage(tag.clone()))?;
            if let Some(first) = tags.get(&code) {
                return Err(LexiconError::DuplicateLanguage {
                    code,
                    first: first.clone(),
                    second: tag,
                });
            }
            let lex = Lexicon::from_raw(&code, raw_lex)?;
            tags.insert(code.clone(), tag);
            languages.insert(code, lex);
        }

        Self::new(default_language, languages)
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default_language
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageCode> {
        self.languages.keys()
    }

    pub fn get(&self, language: &LanguageCode) -> Option<&Lexicon> {
        self.languages.get(language)
    }

    /// Map a raw tag to a supported language, falling back to the default.
    pub fn resolve(&self, tag: &str) -> Resolved<'_> {
        if let Some(code) = LanguageCode::parse(tag) {
            if let Some((language, lexicon)) = self.languages.get_key_value(&code) {
                return Resolved {
                    language,
                    lexicon,
                    fell_back: false,
                };
            }
        }
        // The default language is guaranteed present by `new`.
        Resolved {
            language: &self.default_language,
            lexicon: &self.languages[&self.default_language],
            fell_back: true,
        }
    }
}
