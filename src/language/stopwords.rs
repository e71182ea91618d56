//! Stopword sets used for language detection and keyword filtering.
//!
//! Lists come from the `stop-words` crate and are built once per process.

use std::collections::HashSet;
use std::sync::OnceLock;
use stop_words::LANGUAGE;

/// Languages the detector can recognize, by ISO 639-1 code.
const CODES: [&str; 7] = ["en", "es", "fr", "de", "it", "pt", "nl"];

fn language(code: &str) -> Option<LANGUAGE> {
    match code {
        "en" => Some(LANGUAGE::English),
        "es" => Some(LANGUAGE::Spanish),
        "fr" => Some(LANGUAGE::French),
        "de" => Some(LANGUAGE::German),
        "it" => Some(LANGUAGE::Italian),
        "pt" => Some(LANGUAGE::Portuguese),
        "nl" => Some(LANGUAGE::Dutch),
        _ => None,
    }
}

static STOPWORDS: OnceLock<Vec<(&'static str, HashSet<String>)>> = OnceLock::new();

/// Every known language with its stopword set.
pub fn languages() -> &'static [(&'static str, HashSet<String>)] {
    STOPWORDS.get_or_init(|| {
        CODES
            .iter()
            .filter_map(|&code| language(code).map(|lang| (code, lang)))
            .map(|(code, lang)| {
                let words = stop_words::get(lang)
                    .into_iter()
                    .map(|w| w.to_lowercase())
                    .collect();
                (code, words)
            })
            .collect()
    })
}

/// Stopwords for `code`, `None` for unknown languages.
pub fn for_language(code: &str) -> Option<&'static HashSet<String>> {
    languages()
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, words)| words)
}

/// English stopwords.
pub fn english() -> &'static HashSet<String> {
    static EMPTY: OnceLock<HashSet<String>> = OnceLock::new();
    for_language("en").unwrap_or_else(|| EMPTY.get_or_init(HashSet::new))
}
