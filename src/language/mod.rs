//! Language detection, translation, and the pre-dispatch language policy.
//!
//! Prompts are written for one supported language. A document in another
//! language is either rejected or translated before any insight runs.

pub mod detector;
pub mod stopwords;
pub mod translator;

use crate::config::{LanguageConfig, LanguagePolicy};
use crate::error::InsightError;
use crate::models::InputDocument;
use tracing::{debug, info};

pub use detector::{LanguageDetector, StopwordDetector};
pub use translator::{CompletionTranslator, Translator};

/// English name for an ISO 639-1 code.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        other => other,
    }
}

/// Detect the document language and apply the configured policy.
///
/// Fails with [`InsightError::UnsupportedLanguage`] or
/// [`InsightError::TranslationFailed`] before any insight is dispatched.
pub async fn prepare_document(
    mut document: InputDocument,
    detector: &dyn LanguageDetector,
    translator: Option<&dyn Translator>,
    config: &LanguageConfig,
) -> Result<InputDocument, InsightError> {
    if document.is_blank() {
        return Err(InsightError::EmptyDocument);
    }

    if !config.detect {
        return Ok(document);
    }

    let detected = detector.detect(&document.content);
    document.detected_language = detected.clone();

    let detected = match detected {
        Some(code) if code != config.supported => code,
        Some(code) => {
            debug!("{}: detected {}", document.source, code);
            return Ok(document);
        }
        None => {
            debug!("{}: language undetermined, accepting", document.source);
            return Ok(document);
        }
    };

    let translator = match (config.on_unsupported, translator) {
        (LanguagePolicy::Translate, Some(translator)) => translator,
        _ => {
            return Err(InsightError::UnsupportedLanguage {
                detected,
                supported: config.supported.clone(),
            })
        }
    };

    info!(
        "Translating {} from {} to {}",
        document.source,
        language_name(&detected),
        language_name(&config.supported)
    );

    let translated = translator
        .translate(&document.content, &detected, &config.supported)
        .await
        .map_err(InsightError::TranslationFailed)?;

    document.content = translated.trim().to_string();
    document.translated = true;

    if document.is_blank() {
        return Err(InsightError::EmptyDocument);
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::mock::{MockCompletion, MockReply};
    use crate::error::CompletionError;
    use std::sync::Arc;

    const GERMAN_MAIL: &str =
        "Hallo zusammen, die Frist ist auf Freitag verschoben. Bitte bestätigt das und meldet euch bei mir, wenn es nicht passt.";

    fn translate_config() -> LanguageConfig {
        LanguageConfig {
            on_unsupported: LanguagePolicy::Translate,
            ..LanguageConfig::default()
        }
    }

    #[tokio::test]
    async fn test_supported_language_passes() {
        let doc = InputDocument::new("t", "Hi team, the deadline moved to Friday. Please confirm.");
        let prepared = prepare_document(doc, &StopwordDetector, None, &LanguageConfig::default())
            .await
            .unwrap();
        assert_eq!(prepared.detected_language.as_deref(), Some("en"));
        assert!(!prepared.translated);
    }

    #[tokio::test]
    async fn test_unsupported_language_rejected_without_calls() {
        let mock = Arc::new(MockCompletion::new("translated"));
        let translator = CompletionTranslator::new(mock.clone());
        let doc = InputDocument::new("t", GERMAN_MAIL);

        let err = prepare_document(doc, &StopwordDetector, Some(&translator), &LanguageConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InsightError::UnsupportedLanguage { ref detected, .. } if detected == "de"
        ));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_translate_policy() {
        let mock = Arc::new(MockCompletion::new(
            "  Hi all, the deadline moved to Friday. Please confirm.  ",
        ));
        let translator = CompletionTranslator::new(mock.clone());
        let doc = InputDocument::new("t", GERMAN_MAIL);

        let prepared = prepare_document(doc, &StopwordDetector, Some(&translator), &translate_config())
            .await
            .unwrap();

        assert!(prepared.translated);
        assert_eq!(prepared.detected_language.as_deref(), Some("de"));
        assert_eq!(prepared.content, "Hi all, the deadline moved to Friday. Please confirm.");
        assert_eq!(mock.call_count(), 1);
        assert!(mock.prompts()[0].contains("from German to English"));
    }

    #[tokio::test]
    async fn test_translation_failure_aborts() {
        let mock = Arc::new(
            MockCompletion::new("").with_default(MockReply::Fail(CompletionError::Connect(
                "http://localhost:11434".into(),
            ))),
        );
        let translator = CompletionTranslator::new(mock);
        let doc = InputDocument::new("t", GERMAN_MAIL);

        let err = prepare_document(doc, &StopwordDetector, Some(&translator), &translate_config())
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::TranslationFailed(_)));
    }

    #[tokio::test]
    async fn test_detection_disabled() {
        let config = LanguageConfig {
            detect: false,
            ..LanguageConfig::default()
        };
        let prepared = prepare_document(InputDocument::new("t", GERMAN_MAIL), &StopwordDetector, None, &config)
            .await
            .unwrap();
        assert_eq!(prepared.detected_language, None);
    }

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let err = prepare_document(
            InputDocument::new("t", "   "),
            &StopwordDetector,
            None,
            &LanguageConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, InsightError::EmptyDocument));
    }
}
