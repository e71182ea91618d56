//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::{Provider, ReportFormat};
use crate::models::{InsightKind, SummaryStyle};
use clap::Parser;
use std::path::PathBuf;

/// MailSight - LLM-powered email insights
///
/// Summarize emails, extract entities and action items, gauge tone and
/// urgency, and draft replies with a local or hosted LLM. Text, Markdown
/// and JSON reports.
///
/// Examples:
///   mailsight message.txt
///   mailsight inbox/ --kinds key-entities,urgency,response --format json -o out/
///   cat message.eml | mailsight - --provider gemini --model gemini-1.5-flash
///   mailsight message.txt --all-kinds --style actionable-insights
///   mailsight --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Email files or directories to analyze (`-` reads stdin)
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub inputs: Vec<PathBuf>,

    /// Insight kinds to compute in addition to the summary (comma-separated)
    ///
    /// Values: summary, key-entities, action-items, tone, urgency, sentiment,
    /// response, category, questions
    #[arg(short, long, value_name = "KINDS", value_delimiter = ',')]
    pub kinds: Option<Vec<InsightKind>>,

    /// Compute every insight kind
    #[arg(long, conflicts_with = "kinds")]
    pub all_kinds: bool,

    /// Summary style
    #[arg(short, long, value_name = "STYLE")]
    pub style: Option<SummaryStyle>,

    /// Completion provider
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Model to use for generation
    ///
    /// Can also be set via MAILSIGHT_MODEL env var or .mailsight.toml config.
    #[arg(short, long, env = "MAILSIGHT_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Output path (file for one input, directory for several)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json, text)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .mailsight.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Per-insight timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Characters of each email embedded into prompts
    #[arg(long, value_name = "CHARS")]
    pub max_chars: Option<usize>,

    /// Disable the result cache
    #[arg(long)]
    pub no_cache: bool,

    /// Cache freshness window in seconds
    #[arg(long, value_name = "SECS", conflicts_with = "no_cache")]
    pub cache_ttl: Option<u64>,

    /// Translate emails in other languages instead of rejecting them
    #[arg(long, conflicts_with = "no_detect")]
    pub translate: bool,

    /// Skip language detection
    #[arg(long)]
    pub no_detect: bool,

    /// Exit with code 2 if any insight failed
    #[arg(long)]
    pub strict: bool,

    /// Show the prompts that would be sent without calling the LLM
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .mailsight.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.inputs.is_empty() {
            return Err("At least one input is required".to_string());
        }

        let stdin_count = self.inputs.iter().filter(|p| is_stdin(p)).count();
        if stdin_count > 1 {
            return Err("Stdin ('-') can only be given once".to_string());
        }

        for input in self.inputs.iter().filter(|p| !is_stdin(p)) {
            if !input.exists() {
                return Err(format!("Input does not exist: {}", input.display()));
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_chars == Some(0) {
            return Err("Max chars must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

/// `-` stands for standard input.
pub fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}
