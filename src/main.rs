//! MailSight - LLM-powered email insights
//!
//! A CLI tool that fans each email out to one LLM completion per
//! enabled insight kind and exports the aggregated results.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, input, unsupported language, provider, export)
//!   2 - Some insight kind failed and --strict was given

mod analysis;
mod cache;
mod cli;
mod completion;
mod config;
mod error;
mod input;
mod language;
mod metrics;
mod models;
mod report;

use analysis::{AggregatorConfig, InsightAggregator, TemplateSet};
use anyhow::{bail, Context, Result};
use cache::InsightCache;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use input::InputCollector;
use language::{CompletionTranslator, StopwordDetector, Translator};
use metrics::LexiconSentiment;
use models::{InputDocument, InsightKind, Report, RunResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("MailSight v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .mailsight.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the model, insight kinds, templates, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the whole workflow. Returns the exit code.
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let templates = TemplateSet::with_overrides(config.insights.style, &config.templates)
        .context("Invalid [templates] section")?;
    let enabled: BTreeSet<InsightKind> = config.insights.enabled.iter().copied().collect();

    let documents = InputCollector::new(config.input.clone()).collect(&args.inputs)?;
    if documents.is_empty() {
        bail!("No readable email documents found");
    }
    info!("Collected {} document(s)", documents.len());

    if args.dry_run {
        return handle_dry_run(&documents, &templates, &enabled, &config);
    }

    let completion = completion::build_service(&config.model)
        .context("Failed to set up the completion provider")?;

    if !args.quiet {
        println!("🤖 Provider: {}", completion.provider_name());
        println!("   Model: {}", completion.model_name());
        println!(
            "   Insights: {}",
            InsightAggregator::dispatch_set(&enabled)
                .iter()
                .map(|k| k.id())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let request_timeout = match config.insights.request_timeout_seconds {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let aggregator_config = AggregatorConfig {
        max_chars: config.insights.max_chars,
        request_timeout,
        keyword_count: config.insights.keyword_count,
        show_progress: !args.quiet,
    };

    let mut aggregator = InsightAggregator::new(
        Arc::clone(&completion),
        templates,
        Arc::new(LexiconSentiment),
        aggregator_config,
    );

    // Shared by every document of this invocation.
    let cache = config
        .cache
        .enabled
        .then(|| Arc::new(InsightCache::new(Duration::from_secs(config.cache.ttl_seconds))));
    if let Some(ref cache) = cache {
        aggregator = aggregator.with_cache(Arc::clone(cache));
    }

    let detector = StopwordDetector;
    let translator = CompletionTranslator::new(Arc::clone(&completion));

    let multiple = documents.len() > 1;
    let format = config.general.format;
    let mut report_paths =
        report::ReportPaths::new(resolve_output(&args, &config, multiple), format, multiple);

    let mut had_errors = false;
    let mut had_failed_kinds = false;

    for document in documents {
        if let Some(ref cache) = cache {
            cache.purge_expired().await;
        }

        let source = document.source.clone();

        let prepared = language::prepare_document(
            document,
            &detector,
            Some(&translator as &dyn Translator),
            &config.language,
        )
        .await;
        let document = match prepared {
            Ok(document) => document,
            Err(e) => {
                error!("{}: {}", source, e);
                eprintln!("❌ {}: {}", source, e);
                had_errors = true;
                continue;
            }
        };

        let run = match aggregator.run(&document, &enabled).await {
            Ok(run) => run,
            Err(e) => {
                error!("{}: {}", source, e);
                eprintln!("❌ {}: {}", source, e);
                had_errors = true;
                continue;
            }
        };

        let failed = run.failed_kinds();
        if !failed.is_empty() {
            had_failed_kinds = true;
            warn!(
                "{}: {} of {} insight(s) failed",
                source,
                failed.len(),
                run.insights.len()
            );
        }

        if config.report.print_insights {
            print_insights(&document, &run);
        }

        let report = Report::from_run(
            &document,
            &run,
            completion.provider_name(),
            completion.model_name(),
        );
        let path = report_paths.next(&source);

        match report::write_report(&report, format, config.report.include_metrics, &path) {
            Ok(()) => {
                if !args.quiet {
                    println!("✅ Report saved to: {}", path.display());
                }
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                eprintln!("❌ Could not export {}: {}", path.display(), e);
                // Results are never lost to an export failure.
                if !config.report.print_insights {
                    print_insights(&document, &run);
                }
                had_errors = true;
            }
        }
    }

    if let Some(cache) = cache {
        let stats = cache.stats();
        debug!(
            "Cache: {} hit(s), {} miss(es), {} entr(ies), ttl {}s",
            stats.hits,
            stats.misses,
            cache.len().await,
            cache.ttl().as_secs()
        );
    }

    if had_errors {
        return Ok(1);
    }
    if args.strict && had_failed_kinds {
        eprintln!("\n⛔ Some insights failed. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Print every insight under its label, in display order.
fn print_insights(document: &InputDocument, run: &RunResult) {
    println!("\n📧 {}", document.source);
    if run.truncated {
        println!("   (truncated for prompting)");
    }

    for kind in run.kinds() {
        let Some(result) = run.get(kind) else {
            continue;
        };
        println!("\n{} {}", kind.emoji(), kind);
        match result.error {
            Some(ref err) => println!("   ⚠️  Failed: {}", err),
            None => println!("{}", result.text),
        }
    }

    let sentiment = &run.metrics.sentiment;
    println!(
        "\n{} Local sentiment: {} (polarity {:.2}) | Reading ease: {:.1} | {:.1}s",
        sentiment.label.emoji(),
        sentiment.label,
        sentiment.polarity,
        run.metrics.readability.flesch_reading_ease,
        run.duration_seconds
    );
}

/// Handle --dry-run: show what would be sent, exit.
fn handle_dry_run(
    documents: &[InputDocument],
    templates: &TemplateSet,
    enabled: &BTreeSet<InsightKind>,
    config: &Config,
) -> Result<i32> {
    println!("\n🔍 Dry run (no LLM calls)...\n");

    let kinds = InsightAggregator::dispatch_set(enabled);
    for document in documents {
        let (content, truncated) = document.truncated(config.insights.max_chars);
        println!(
            "   📄 {} ({} chars{})",
            document.source,
            document.content.chars().count(),
            if truncated { ", truncated" } else { "" }
        );
        if document.is_blank() {
            println!("      (empty, would be rejected)");
            continue;
        }
        for &kind in &kinds {
            let prompt = templates.render(kind, content);
            let marker = if kind.is_mandatory() { " (always)" } else { "" };
            println!(
                "      {} {}{}: {} chars",
                kind.emoji(),
                kind,
                marker,
                prompt.chars().count()
            );
        }
    }

    println!(
        "\n   Total: {} document(s) x {} insight(s)",
        documents.len(),
        kinds.len()
    );
    println!("\n✅ Dry run complete. No LLM calls were made.");
    Ok(0)
}

/// Report destination: `-o` as given, else the configured default with
/// the format's extension (or without one when it names a directory).
fn resolve_output(args: &Args, config: &Config, multiple: bool) -> PathBuf {
    if let Some(ref output) = args.output {
        return output.clone();
    }

    let configured = PathBuf::from(&config.general.output);
    if multiple {
        configured.with_extension("")
    } else {
        configured.with_extension(config.general.format.extension())
    }
}

/// Load configuration from file or use defaults.
///
/// A config file that exists but is malformed fails the run.
fn load_config(args: &Args) -> Result<Config> {
    match args.config {
        Some(ref path) => info!("Loading config from: {}", path.display()),
        None if Path::new(CONFIG_FILE_NAME).exists() => {
            info!("Loading default config from {}", CONFIG_FILE_NAME)
        }
        None => debug!("No config file found, using defaults"),
    }

    Config::resolve(args.config.as_deref())
}
