//! Lexicon-based sentiment scoring.

use super::tokenize;
use crate::models::{SentimentLabel, SentimentScore};

/// Scores the polarity of a text.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> SentimentScore;
}

/// Averages per-word polarity from a small lexicon, with negation and
/// intensifier handling on the preceding word.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

/// (word, polarity, subjectivity)
const LEXICON: &[(&str, f64, f64)] = &[
    ("amazing", 0.8, 0.9),
    ("appreciate", 0.5, 0.6),
    ("awesome", 1.0, 1.0),
    ("bad", -0.7, 0.67),
    ("best", 1.0, 0.3),
    ("concern", -0.3, 0.5),
    ("concerned", -0.4, 0.6),
    ("delay", -0.3, 0.3),
    ("delayed", -0.3, 0.3),
    ("disappointed", -0.75, 0.75),
    ("disappointing", -0.6, 0.7),
    ("excellent", 1.0, 1.0),
    ("excited", 0.4, 0.75),
    ("fail", -0.5, 0.3),
    ("failed", -0.5, 0.3),
    ("failure", -0.5, 0.4),
    ("fantastic", 0.4, 0.9),
    ("frustrated", -0.7, 0.8),
    ("glad", 0.5, 1.0),
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("happy", 0.8, 1.0),
    ("helpful", 0.5, 0.5),
    ("horrible", -1.0, 1.0),
    ("issue", -0.2, 0.3),
    ("late", -0.3, 0.6),
    ("love", 0.5, 0.6),
    ("nice", 0.6, 1.0),
    ("pleased", 0.5, 0.75),
    ("poor", -0.4, 0.6),
    ("problem", -0.4, 0.4),
    ("sorry", -0.5, 1.0),
    ("success", 0.6, 0.5),
    ("successful", 0.75, 0.95),
    ("terrible", -1.0, 1.0),
    ("thank", 0.4, 0.3),
    ("thanks", 0.4, 0.3),
    ("unacceptable", -0.8, 0.9),
    ("unfortunately", -0.5, 1.0),
    ("upset", -0.5, 0.8),
    ("urgent", -0.1, 0.5),
    ("welcome", 0.8, 0.9),
    ("wonderful", 1.0, 1.0),
    ("worried", -0.4, 0.7),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("wrong", -0.5, 0.9),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "don't", "didn't", "isn't", "wasn't", "can't", "won't"];

/// (word, multiplier)
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("so", 1.2),
    ("slightly", 0.6),
    ("somewhat", 0.7),
];

fn lookup(word: &str) -> Option<(f64, f64)> {
    LEXICON
        .binary_search_by(|(w, _, _)| w.cmp(&word))
        .ok()
        .map(|i| (LEXICON[i].1, LEXICON[i].2))
}

impl SentimentScorer for LexiconSentiment {
    fn score(&self, text: &str) -> SentimentScore {
        let words = tokenize(text);
        let mut polarities = Vec::new();
        let mut subjectivities = Vec::new();

        for (i, word) in words.iter().enumerate() {
            let Some((mut polarity, subjectivity)) = lookup(word) else {
                continue;
            };

            if let Some(prev) = i.checked_sub(1).map(|j| words[j].as_str()) {
                if let Some((_, factor)) = INTENSIFIERS.iter().find(|(w, _)| *w == prev) {
                    polarity *= factor;
                }
            }

            // Negation within the two preceding words halves and flips.
            let window = &words[i.saturating_sub(2)..i];
            if window.iter().any(|w| NEGATIONS.contains(&w.as_str())) {
                polarity *= -0.5;
            }

            polarities.push(polarity.clamp(-1.0, 1.0));
            subjectivities.push(subjectivity);
        }

        if polarities.is_empty() {
            return SentimentScore::default();
        }

        let polarity = mean(&polarities).clamp(-1.0, 1.0);
        let subjectivity = mean(&subjectivities).clamp(0.0, 1.0);

        SentimentScore {
            polarity,
            subjectivity,
            label: SentimentLabel::from_polarity(polarity),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
