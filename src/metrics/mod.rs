//! Local, synchronous text metrics.
//!
//! Nothing here touches the network; these run alongside the remote
//! insights and are merged into the same run result.

pub mod keywords;
pub mod readability;
pub mod sentiment;

use crate::models::LocalMetrics;

pub use keywords::top_keywords;
pub use readability::readability;
pub use sentiment::{LexiconSentiment, SentimentScorer};

/// Lowercased word tokens. Apostrophes inside words are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Compute every local metric for `text`.
pub fn compute(text: &str, scorer: &dyn SentimentScorer, keyword_count: usize) -> LocalMetrics {
    LocalMetrics {
        sentiment: scorer.score(text),
        readability: readability(text),
        keywords: top_keywords(text, keyword_count),
    }
}
