//! Stopword-frequency language detection.

use super::stopwords;
use crate::metrics::tokenize;

/// Minimum stopword hits before a language is reported.
const MIN_HITS: usize = 2;

/// Guesses the language of a text.
pub trait LanguageDetector: Send + Sync {
    /// ISO 639-1 code, or `None` when the text is inconclusive.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Picks the language whose stopwords occur most often.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopwordDetector;

impl LanguageDetector for StopwordDetector {
    fn detect(&self, text: &str) -> Option<String> {
        let words = tokenize(text);

        let mut scores: Vec<(&str, usize)> = stopwords::languages()
            .iter()
            .map(|(code, list)| {
                let hits = words.iter().filter(|w| list.contains(w.as_str())).count();
                (*code, hits)
            })
            .collect();
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        match scores.as_slice() {
            [(code, best), rest @ ..] if *best >= MIN_HITS => {
                // A tie for first place is inconclusive.
                if rest.first().is_some_and(|(_, second)| second == best) {
                    None
                } else {
                    Some(code.to_string())
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let text = "Hi team, the deadline moved to Friday. Please confirm.";
        assert_eq!(StopwordDetector.detect(text).as_deref(), Some("en"));
    }

    #[test]
    fn test_detects_spanish() {
        let text = "Hola equipo, la reunión de mañana se mueve para el viernes. Gracias por su paciencia.";
        assert_eq!(StopwordDetector.detect(text).as_deref(), Some("es"));
    }

    #[test]
    fn test_detects_french() {
        let text = "Bonjour, nous avons reçu votre message et nous vous répondrons dans les plus brefs délais. Merci.";
        assert_eq!(StopwordDetector.detect(text).as_deref(), Some("fr"));
    }

    #[test]
    fn test_inconclusive_text() {
        assert_eq!(StopwordDetector.detect("Q3 KPIs attached."), None);
        assert_eq!(StopwordDetector.detect(""), None);
    }
}
