//! Data models for the insight generator.
//!
//! This module contains the core data structures used throughout
//! the application for representing documents, insights, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A named category of analysis, each bound to one prompt template.
///
/// Declaration order is the display order used by every report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Summary in the configured style (always computed)
    Summary,
    /// Names, dates and important terms
    KeyEntities,
    /// Actionable next steps
    ActionItems,
    /// Tone of the writer
    Tone,
    /// How urgently a reply is needed
    Urgency,
    /// Model-written sentiment assessment
    Sentiment,
    /// Draft reply
    Response,
    /// Mail category (meeting, request, newsletter, ...)
    Category,
    /// Open questions the sender is asking
    Questions,
}

impl InsightKind {
    /// Every kind, in display order.
    pub const ALL: [InsightKind; 9] = [
        InsightKind::Summary,
        InsightKind::KeyEntities,
        InsightKind::ActionItems,
        InsightKind::Tone,
        InsightKind::Urgency,
        InsightKind::Sentiment,
        InsightKind::Response,
        InsightKind::Category,
        InsightKind::Questions,
    ];

    /// Kinds that run regardless of which features are enabled.
    pub const MANDATORY: [InsightKind; 1] = [InsightKind::Summary];

    /// Stable identifier used in config files and JSON output.
    pub fn id(&self) -> &'static str {
        match self {
            InsightKind::Summary => "summary",
            InsightKind::KeyEntities => "key_entities",
            InsightKind::ActionItems => "action_items",
            InsightKind::Tone => "tone",
            InsightKind::Urgency => "urgency",
            InsightKind::Sentiment => "sentiment",
            InsightKind::Response => "response",
            InsightKind::Category => "category",
            InsightKind::Questions => "questions",
        }
    }

    /// Returns an emoji representation of the kind.
    pub fn emoji(&self) -> &'static str {
        match self {
            InsightKind::Summary => "📝",
            InsightKind::KeyEntities => "🏷️",
            InsightKind::ActionItems => "✅",
            InsightKind::Tone => "🎭",
            InsightKind::Urgency => "⏰",
            InsightKind::Sentiment => "💬",
            InsightKind::Response => "✉️",
            InsightKind::Category => "🗂️",
            InsightKind::Questions => "❓",
        }
    }

    pub fn is_mandatory(&self) -> bool {
        Self::MANDATORY.contains(self)
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Summary => write!(f, "Summary"),
            InsightKind::KeyEntities => write!(f, "Key Entities"),
            InsightKind::ActionItems => write!(f, "Action Items"),
            InsightKind::Tone => write!(f, "Tone"),
            InsightKind::Urgency => write!(f, "Urgency"),
            InsightKind::Sentiment => write!(f, "Sentiment"),
            InsightKind::Response => write!(f, "Suggested Response"),
            InsightKind::Category => write!(f, "Category"),
            InsightKind::Questions => write!(f, "Open Questions"),
        }
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .iter()
            .find(|kind| kind.id() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown insight kind: {}", s))
    }
}

/// Style used by the summary prompt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    /// Bullet points (default)
    #[default]
    BulletPoints,
    /// A short paragraph
    ConciseParagraph,
    /// Insights phrased as actions
    ActionableInsights,
}

impl SummaryStyle {
    /// Phrase embedded in the summary prompt.
    pub fn prompt_phrase(&self) -> &'static str {
        match self {
            SummaryStyle::BulletPoints => "bullet points",
            SummaryStyle::ConciseParagraph => "concise paragraph",
            SummaryStyle::ActionableInsights => "actionable insights",
        }
    }
}

/// The raw text submitted for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDocument {
    /// Where the text came from (file path or `<stdin>`).
    pub source: String,
    /// Full document text.
    pub content: String,
    /// ISO 639-1 code, if detection ran and was conclusive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    /// Whether `content` was machine-translated before the run.
    #[serde(default)]
    pub translated: bool,
}

impl InputDocument {
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content: content.into(),
            detected_language: None,
            translated: false,
        }
    }

    /// Returns true if there is nothing but whitespace to analyze.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Returns the first `max_chars` characters and whether anything was cut.
    ///
    /// Counts characters, not bytes, so multi-byte text is never split.
    pub fn truncated(&self, max_chars: usize) -> (&str, bool) {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => (&self.content[..idx], true),
            None => (self.content.as_str(), false),
        }
    }
}

/// One prompt ready for dispatch.
#[derive(Debug, Clone)]
pub struct InsightRequest {
    pub kind: InsightKind,
    /// Style-resolved template before the email is embedded (part of the cache key).
    pub template: String,
    /// Template rendered with the truncated document.
    pub prompt: String,
}

/// Outcome of exactly one completion attempt for one kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub kind: InsightKind,
    /// Trimmed completion text; empty on failure.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Served from the memoization cache.
    #[serde(default)]
    pub cached: bool,
}

impl InsightResult {
    pub fn success(kind: InsightKind, text: impl Into<String>, cached: bool) -> Self {
        Self {
            kind,
            text: text.into(),
            error: None,
            cached,
        }
    }

    pub fn failed(kind: InsightKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            text: String::new(),
            error: Some(error.into()),
            cached: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Polarity bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "Positive"),
            SentimentLabel::Neutral => write!(f, "Neutral"),
            SentimentLabel::Negative => write!(f, "Negative"),
        }
    }
}

impl SentimentLabel {
    /// Buckets a polarity in [-1, 1].
    pub fn from_polarity(polarity: f64) -> Self {
        if polarity > 0.05 {
            SentimentLabel::Positive
        } else if polarity < -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "😊",
            SentimentLabel::Neutral => "😐",
            SentimentLabel::Negative => "☹️",
        }
    }
}

/// Local sentiment score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// -1.0 (negative) to 1.0 (positive).
    pub polarity: f64,
    /// 0.0 (objective) to 1.0 (subjective).
    pub subjectivity: f64,
    pub label: SentimentLabel,
}

/// Readability proxy computed from word and sentence counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub words: usize,
    pub sentences: usize,
    pub avg_words_per_sentence: f64,
    /// Flesch reading ease; higher is easier.
    pub flesch_reading_ease: f64,
}

/// Term frequency entry (the data behind a keyword cloud).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Metrics computed locally without any remote call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalMetrics {
    pub sentiment: SentimentScore,
    pub readability: Readability,
    pub keywords: Vec<KeywordCount>,
}

/// Aggregated output of one aggregator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// One entry per dispatched kind, ordered for display.
    pub insights: BTreeMap<InsightKind, InsightResult>,
    pub metrics: LocalMetrics,
    /// The document was cut to the configured length before prompting.
    pub truncated: bool,
    pub duration_seconds: f64,
}

impl RunResult {
    pub fn get(&self, kind: InsightKind) -> Option<&InsightResult> {
        self.insights.get(&kind)
    }

    /// Kinds present in this result, in display order.
    pub fn kinds(&self) -> Vec<InsightKind> {
        self.insights.keys().copied().collect()
    }

    /// Kinds whose completion failed.
    pub fn failed_kinds(&self) -> Vec<InsightKind> {
        self.insights
            .values()
            .filter(|r| !r.is_success())
            .map(|r| r.kind)
            .collect()
    }

    /// Number of kinds answered from the cache.
    pub fn cached_count(&self) -> usize {
        self.insights.values().filter(|r| r.cached).count()
    }
}

/// Metadata about an insight report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Where the document came from.
    pub source: String,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Completion provider name.
    pub provider: String,
    /// Name of the LLM model used.
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    pub translated: bool,
    pub truncated: bool,
    /// Number of insight kinds dispatched.
    pub kinds_requested: usize,
    /// Number of insight kinds that failed.
    pub kinds_failed: usize,
    /// Number of insight kinds served from cache.
    pub cached_hits: usize,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete exportable report for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub metrics: LocalMetrics,
    /// Insights in display order.
    pub insights: Vec<InsightResult>,
}

impl Report {
    /// Builds a report from a finished run.
    pub fn from_run(
        document: &InputDocument,
        run: &RunResult,
        provider: &str,
        model: &str,
    ) -> Self {
        let metadata = ReportMetadata {
            source: document.source.clone(),
            analysis_date: Utc::now(),
            provider: provider.to_string(),
            model_used: model.to_string(),
            detected_language: document.detected_language.clone(),
            translated: document.translated,
            truncated: run.truncated,
            kinds_requested: run.insights.len(),
            kinds_failed: run.failed_kinds().len(),
            cached_hits: run.cached_count(),
            duration_seconds: run.duration_seconds,
        };

        Self {
            metadata,
            metrics: run.metrics.clone(),
            insights: run.insights.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ordering_matches_display_order() {
        let mut kinds = InsightKind::ALL.to_vec();
        kinds.reverse();
        kinds.sort();
        assert_eq!(kinds, InsightKind::ALL.to_vec());
        assert_eq!(kinds[0], InsightKind::Summary);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("summary".parse::<InsightKind>(), Ok(InsightKind::Summary));
        assert_eq!(
            "key-entities".parse::<InsightKind>(),
            Ok(InsightKind::KeyEntities)
        );
        assert_eq!(
            "Action Items".parse::<InsightKind>(),
            Ok(InsightKind::ActionItems)
        );
        assert!("horoscope".parse::<InsightKind>().is_err());
    }

    #[test]
    fn test_only_summary_is_mandatory() {
        let mandatory: Vec<_> = InsightKind::ALL
            .iter()
            .filter(|k| k.is_mandatory())
            .collect();
        assert_eq!(mandatory, vec![&InsightKind::Summary]);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let doc = InputDocument::new("test", "héllo wörld");
        let (prefix, cut) = doc.truncated(4);
        assert_eq!(prefix, "héll");
        assert!(cut);

        let (full, cut) = doc.truncated(100);
        assert_eq!(full, "héllo wörld");
        assert!(!cut);

        let (exact, cut) = doc.truncated(11);
        assert_eq!(exact, "héllo wörld");
        assert!(!cut);
    }

    #[test]
    fn test_blank_document() {
        assert!(InputDocument::new("t", "  \n\t ").is_blank());
        assert!(!InputDocument::new("t", "Hi").is_blank());
    }

    #[test]
    fn test_sentiment_label_buckets() {
        assert_eq!(SentimentLabel::from_polarity(0.4), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_polarity(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_polarity(-0.3), SentimentLabel::Negative);
    }

    #[test]
    fn test_run_result_failed_and_cached() {
        let mut insights = BTreeMap::new();
        insights.insert(
            InsightKind::Summary,
            InsightResult::success(InsightKind::Summary, "ok", true),
        );
        insights.insert(
            InsightKind::Response,
            InsightResult::failed(InsightKind::Response, "boom"),
        );
        let run = RunResult {
            insights,
            metrics: LocalMetrics::default(),
            truncated: false,
            duration_seconds: 0.1,
        };

        assert_eq!(run.failed_kinds(), vec![InsightKind::Response]);
        assert_eq!(run.cached_count(), 1);
        assert_eq!(
            run.kinds(),
            vec![InsightKind::Summary, InsightKind::Response]
        );

        let mut doc = InputDocument::new("mail.eml", "Hello");
        doc.detected_language = Some("en".to_string());
        let report = Report::from_run(&doc, &run, "ollama", "llama3.2:latest");
        assert_eq!(report.metadata.source, "mail.eml");
        assert_eq!(report.metadata.kinds_requested, 2);
        assert_eq!(report.metadata.kinds_failed, 1);
        assert_eq!(report.metadata.cached_hits, 1);
        assert_eq!(report.insights[0].kind, InsightKind::Summary);
    }
}
