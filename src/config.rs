//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.mailsight.toml` files.

use crate::models::{InsightKind, SummaryStyle};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".mailsight.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Insight selection and prompting.
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Memoization cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Language detection and translation.
    #[serde(default)]
    pub language: LanguageConfig,

    /// Input discovery.
    #[serde(default)]
    pub input: InputConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Prompt template overrides keyed by insight id.
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

/// Output format for exported reports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
    /// Plain text
    Text,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
            ReportFormat::Text => "txt",
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output path (file for one document, directory for several).
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: ReportFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: ReportFormat::default(),
        }
    }
}

fn default_output() -> String {
    "email_insights.md".to_string()
}

/// Completion backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local or self-hosted Ollama server (default)
    #[default]
    Ollama,
    /// Google Gemini API
    Gemini,
}

impl Provider {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.2:latest",
            Provider::Gemini => "gemini-1.5-flash",
        }
    }
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Completion backend.
    #[serde(default)]
    pub provider: Provider,

    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Gemini API base URL.
    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,

    /// Environment variable holding the Gemini API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default)]
    pub max_tokens: Option<usize>,

    /// HTTP client timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: default_model(),
            ollama_url: default_ollama_url(),
            gemini_url: default_gemini_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    Provider::default().default_model().to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout() -> u64 {
    300
}

/// Which insights to compute and how to prompt for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Enabled insight kinds. The summary always runs.
    #[serde(default = "default_enabled")]
    pub enabled: Vec<InsightKind>,

    /// Summary style.
    #[serde(default)]
    pub style: SummaryStyle,

    /// Characters of the document embedded into each prompt.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Per-insight deadline in seconds; 0 disables it.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Number of keywords reported.
    #[serde(default = "default_keyword_count")]
    pub keyword_count: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            style: SummaryStyle::default(),
            max_chars: default_max_chars(),
            request_timeout_seconds: default_request_timeout(),
            keyword_count: default_keyword_count(),
        }
    }
}

fn default_enabled() -> Vec<InsightKind> {
    vec![
        InsightKind::KeyEntities,
        InsightKind::ActionItems,
        InsightKind::Urgency,
    ]
}

fn default_max_chars() -> usize {
    2000
}

fn default_request_timeout() -> u64 {
    120
}

fn default_keyword_count() -> usize {
    10
}

/// Memoization cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Freshness window in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

/// What to do with a document in another language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePolicy {
    /// Refuse the document before any completion call.
    #[default]
    Reject,
    /// Translate into the supported language, then analyze.
    Translate,
}

/// Language detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Run language detection at all.
    #[serde(default = "default_true")]
    pub detect: bool,

    /// ISO 639-1 code of the language prompts are written for.
    #[serde(default = "default_language")]
    pub supported: String,

    #[serde(default)]
    pub on_unsupported: LanguagePolicy,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            detect: true,
            supported: default_language(),
            on_unsupported: LanguagePolicy::default(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

/// Input discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// File extensions read from directories.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Maximum number of documents per invocation.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "eml".to_string()]
}

fn default_max_file_size() -> u64 {
    1024 * 1024 // 1MB
}

fn default_max_files() -> usize {
    100
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include sentiment, readability and keyword sections.
    #[serde(default = "default_true")]
    pub include_metrics: bool,

    /// Print insights to stdout as they are rendered.
    #[serde(default = "default_true")]
    pub print_insights: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_metrics: true,
            print_insights: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn is_stock_model(name: &str) -> bool {
    [Provider::Ollama, Provider::Gemini]
        .iter()
        .any(|p| p.default_model() == name)
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// The explicit file if given, else the default location, else defaults.
    ///
    /// A file that exists but cannot be parsed is an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Ok(Self::load_default()?.unwrap_or_default()),
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(provider) = args.provider {
            self.model.provider = provider;
        }
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        } else if is_stock_model(&self.model.name) {
            // A stock name belongs to whichever provider is now selected.
            self.model.name = self.model.provider.default_model().to_string();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.insights.request_timeout_seconds = timeout;
        }

        if args.all_kinds {
            self.insights.enabled = InsightKind::ALL.to_vec();
        } else if let Some(ref kinds) = args.kinds {
            self.insights.enabled = kinds.clone();
        }
        if let Some(style) = args.style {
            self.insights.style = style;
        }
        if let Some(max_chars) = args.max_chars {
            self.insights.max_chars = max_chars;
        }

        if args.no_cache {
            self.cache.enabled = false;
        }
        if let Some(ttl) = args.cache_ttl {
            self.cache.ttl_seconds = ttl;
        }

        if args.translate {
            self.language.on_unsupported = LanguagePolicy::Translate;
        }
        if args.no_detect {
            self.language.detect = false;
        }

        if let Some(format) = args.format {
            self.general.format = format;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if args.quiet {
            self.report.print_insights = false;
        }
    }

    /// Reject settings that would produce unusable prompts.
    pub fn validate(&self) -> Result<()> {
        if self.insights.max_chars == 0 {
            bail!("insights.max_chars must be at least 1");
        }
        if self.model.name.trim().is_empty() {
            bail!("model.name must not be empty");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
