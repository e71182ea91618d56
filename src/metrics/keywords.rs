//! Keyword frequencies (the data behind a keyword cloud).

use super::tokenize;
use crate::language::stopwords;
use crate::models::KeywordCount;
use std::collections::HashMap;

const MIN_WORD_LEN: usize = 3;

/// The `n` most frequent non-stopword terms, ties broken alphabetically.
pub fn top_keywords(text: &str, n: usize) -> Vec<KeywordCount> {
    let ignored = stopwords::english();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for word in tokenize(text) {
        if word.chars().count() < MIN_WORD_LEN
            || word.chars().all(|c| c.is_numeric())
            || ignored.contains(word.as_str())
        {
            continue;
        }
        *counts.entry(word).or_default() += 1;
    }

    let mut ranked: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(word, count)| KeywordCount { word, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    ranked.truncate(n);
    ranked
}
