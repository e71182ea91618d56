//! Report generation.
//!
//! Renders a [`Report`] as Markdown, JSON or plain text and writes it to
//! disk. Insights are always emitted in display order.

use crate::config::ReportFormat;
use crate::error::ExportError;
use crate::language::language_name;
use crate::models::{InsightResult, LocalMetrics, Report, ReportMetadata};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, include_metrics: bool) -> String {
    let mut output = String::new();

    output.push_str("# Email Insights\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));

    if include_metrics {
        output.push_str(&generate_metrics_section(&report.metrics));
    }

    output.push_str("## Insights\n\n");
    for insight in &report.insights {
        output.push_str(&generate_insight_block(insight));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Model Used:** `{}` ({})\n",
        metadata.model_used, metadata.provider
    ));
    if let Some(ref lang) = metadata.detected_language {
        section.push_str(&format!("- **Language:** {}", language_name(lang)));
        if metadata.translated {
            section.push_str(" (translated)");
        }
        section.push('\n');
    }
    if metadata.truncated {
        section.push_str("- **Truncated:** yes\n");
    }
    section.push_str(&format!(
        "- **Insights:** {} requested",
        metadata.kinds_requested
    ));
    if metadata.kinds_failed > 0 {
        section.push_str(&format!(", {} failed", metadata.kinds_failed));
    }
    if metadata.cached_hits > 0 {
        section.push_str(&format!(", {} cached", metadata.cached_hits));
    }
    section.push('\n');
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

/// Generate the local metrics section.
fn generate_metrics_section(metrics: &LocalMetrics) -> String {
    let mut section = String::new();

    section.push_str("## Metrics\n\n");

    let sentiment = &metrics.sentiment;
    section.push_str("| Sentiment | Polarity | Subjectivity | Words | Sentences | Reading Ease |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} {} | {:.2} | {:.2} | {} | {} | {:.1} |\n\n",
        sentiment.label.emoji(),
        sentiment.label,
        sentiment.polarity,
        sentiment.subjectivity,
        metrics.readability.words,
        metrics.readability.sentences,
        metrics.readability.flesch_reading_ease,
    ));

    if !metrics.keywords.is_empty() {
        section.push_str("### Top Keywords\n\n");
        section.push_str("| Keyword | Count |\n");
        section.push_str("|:---|:---:|\n");
        for keyword in &metrics.keywords {
            section.push_str(&format!("| {} | {} |\n", keyword.word, keyword.count));
        }
        section.push('\n');
    }

    section
}

/// Generate a single insight block.
fn generate_insight_block(insight: &InsightResult) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {} {}\n\n", insight.kind.emoji(), insight.kind));

    match insight.error {
        Some(ref err) => block.push_str(&format!("> ⚠️ **Failed:** {}\n\n", err)),
        None => {
            block.push_str(insight.text.trim());
            block.push_str("\n\n");
            if insight.cached {
                block.push_str("*(cached)*\n\n");
            }
        }
    }

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by MailSight v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a plain-text report.
pub fn generate_text_report(report: &Report, include_metrics: bool) -> String {
    let mut output = String::new();
    let meta = &report.metadata;

    output.push_str("EMAIL INSIGHTS\n");
    output.push_str(&format!("Source: {}\n", meta.source));
    output.push_str(&format!(
        "Date: {}\n",
        meta.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Model: {} ({})\n", meta.model_used, meta.provider));
    if let Some(ref lang) = meta.detected_language {
        let suffix = if meta.translated { " (translated)" } else { "" };
        output.push_str(&format!("Language: {}{}\n", language_name(lang), suffix));
    }
    output.push('\n');

    if include_metrics {
        let metrics = &report.metrics;
        output.push_str(&format!(
            "Sentiment: {} (polarity {:.2}, subjectivity {:.2})\n",
            metrics.sentiment.label, metrics.sentiment.polarity, metrics.sentiment.subjectivity
        ));
        output.push_str(&format!(
            "Readability: {:.1} ({} words, {} sentences)\n",
            metrics.readability.flesch_reading_ease,
            metrics.readability.words,
            metrics.readability.sentences
        ));
        if !metrics.keywords.is_empty() {
            let keywords: Vec<String> = metrics
                .keywords
                .iter()
                .map(|k| format!("{} ({})", k.word, k.count))
                .collect();
            output.push_str(&format!("Keywords: {}\n", keywords.join(", ")));
        }
        output.push('\n');
    }

    for insight in &report.insights {
        let label = insight.kind.to_string();
        output.push_str(&format!("{}\n{}\n", label, "-".repeat(label.chars().count())));
        match insight.error {
            Some(ref err) => output.push_str(&format!("[failed] {}\n\n", err)),
            None => {
                output.push_str(insight.text.trim());
                output.push_str("\n\n");
            }
        }
    }

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Render the report in the requested format.
pub fn render_report(
    report: &Report,
    format: ReportFormat,
    include_metrics: bool,
) -> Result<String, ExportError> {
    match format {
        ReportFormat::Markdown => Ok(generate_markdown_report(report, include_metrics)),
        ReportFormat::Text => Ok(generate_text_report(report, include_metrics)),
        ReportFormat::Json => generate_json_report(report),
    }
}

/// Write the report to a file, creating parent directories.
pub fn write_report(
    report: &Report,
    format: ReportFormat,
    include_metrics: bool,
    path: &Path,
) -> Result<(), ExportError> {
    let content = render_report(report, format, include_metrics)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

/// Assigns each document its report destination.
///
/// A single input writes straight to `output`. Several inputs treat
/// `output` as a directory holding `<stem>.insights.<ext>` files; repeated
/// stems get a numeric suffix so no report overwrites another.
pub struct ReportPaths {
    output: PathBuf,
    format: ReportFormat,
    multiple: bool,
    taken: HashSet<PathBuf>,
}

impl ReportPaths {
    pub fn new(output: impl Into<PathBuf>, format: ReportFormat, multiple: bool) -> Self {
        Self {
            output: output.into(),
            format,
            multiple,
            taken: HashSet::new(),
        }
    }

    /// The destination for the report of `source`.
    pub fn next(&mut self, source: &str) -> PathBuf {
        if !self.multiple {
            return self.output.clone();
        }

        let stem = Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.starts_with('<'))
            .unwrap_or("stdin");
        let ext = self.format.extension();

        let mut path = self.output.join(format!("{}.insights.{}", stem, ext));
        let mut n = 2;
        while self.taken.contains(&path) {
            path = self.output.join(format!("{}-{}.insights.{}", stem, n, ext));
            n += 1;
        }

        self.taken.insert(path.clone());
        path
    }
}
