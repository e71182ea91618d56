//! Insight fan-out aggregation.
//!
//! One run takes a document and a set of enabled insight kinds, dispatches
//! one completion per kind concurrently, and joins every outcome into a
//! [`RunResult`] together with the local metrics.

use crate::analysis::fanout::{fan_out, TaskError};
use crate::analysis::templates::TemplateSet;
use crate::cache::{CacheKey, InsightCache};
use crate::completion::CompletionService;
use crate::error::{CompletionError, InsightError};
use crate::metrics::{self, SentimentScorer};
use crate::models::{InputDocument, InsightKind, InsightRequest, InsightResult, RunResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runtime settings for the aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Characters of the document embedded into prompts.
    pub max_chars: usize,
    /// Deadline for each completion; `None` waits forever.
    pub request_timeout: Option<Duration>,
    /// Keywords included in the local metrics.
    pub keyword_count: usize,
    /// Draw a progress bar while waiting.
    pub show_progress: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_chars: 2000,
            request_timeout: Some(Duration::from_secs(120)),
            keyword_count: 10,
            show_progress: false,
        }
    }
}

/// Outcome of one dispatched completion.
#[derive(Debug, Clone)]
struct Completed {
    text: String,
    cached: bool,
}

/// Dispatches insight requests and aggregates their results.
pub struct InsightAggregator {
    completion: Arc<dyn CompletionService>,
    templates: Arc<TemplateSet>,
    cache: Option<Arc<InsightCache>>,
    scorer: Arc<dyn SentimentScorer>,
    config: AggregatorConfig,
}

impl InsightAggregator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        templates: TemplateSet,
        scorer: Arc<dyn SentimentScorer>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            completion,
            templates: Arc::new(templates),
            cache: None,
            scorer,
            config,
        }
    }

    /// Memoize completions in `cache`.
    pub fn with_cache(mut self, cache: Arc<InsightCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The kinds a run dispatches: the enabled ones plus the mandatory ones.
    pub fn dispatch_set(enabled: &BTreeSet<InsightKind>) -> BTreeSet<InsightKind> {
        enabled
            .iter()
            .copied()
            .chain(InsightKind::MANDATORY)
            .collect()
    }

    /// Build one request per dispatched kind, all sharing the same prefix.
    ///
    /// Returns the requests and whether the document was truncated.
    pub fn build_requests(
        &self,
        document: &InputDocument,
        enabled: &BTreeSet<InsightKind>,
    ) -> (Vec<InsightRequest>, bool) {
        let (content, truncated) = document.truncated(self.config.max_chars);

        let requests = Self::dispatch_set(enabled)
            .into_iter()
            .map(|kind| InsightRequest {
                kind,
                template: self.templates.template(kind).to_string(),
                prompt: self.templates.render(kind, content),
            })
            .collect();

        (requests, truncated)
    }

    /// Run every enabled insight for `document`.
    ///
    /// Only an empty document fails the run; each kind's remote failure is
    /// recorded in its own [`InsightResult`].
    pub async fn run(
        &self,
        document: &InputDocument,
        enabled: &BTreeSet<InsightKind>,
    ) -> Result<RunResult, InsightError> {
        if document.is_blank() {
            return Err(InsightError::EmptyDocument);
        }

        let start = Instant::now();
        let (requests, truncated) = self.build_requests(document, enabled);
        let (content, _) = document.truncated(self.config.max_chars);

        if truncated {
            info!(
                "{}: truncated to {} characters for prompting",
                document.source, self.config.max_chars
            );
        }
        info!(
            "{}: dispatching {} insight requests to {}",
            document.source,
            requests.len(),
            self.completion.provider_name()
        );

        let progress = self.progress_bar(requests.len());

        let tasks: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let completion = Arc::clone(&self.completion);
                let cache = self.cache.clone();
                let key = CacheKey::new(&request.template, content);
                (request.kind, complete_one(completion, cache, key, request.prompt))
            })
            .collect();

        let outcomes = fan_out(tasks, self.config.request_timeout, |kind, result| {
            match result {
                Ok(_) => debug!("{} finished", kind),
                Err(e) => warn!("{} failed: {}", kind, e),
            }
            if let Some(ref pb) = progress {
                pb.set_message(kind.to_string());
                pb.inc(1);
            }
        })
        .await;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let insights: BTreeMap<InsightKind, InsightResult> = outcomes
            .into_iter()
            .map(|(kind, outcome)| (kind, to_insight_result(kind, outcome)))
            .collect();

        let metrics = metrics::compute(
            &document.content,
            self.scorer.as_ref(),
            self.config.keyword_count,
        );

        Ok(RunResult {
            insights,
            metrics,
            truncated,
            duration_seconds: start.elapsed().as_secs_f64(),
        })
    }

    fn progress_bar(&self, len: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

/// Answer one request from the cache or the completion service.
async fn complete_one(
    completion: Arc<dyn CompletionService>,
    cache: Option<Arc<InsightCache>>,
    key: CacheKey,
    prompt: String,
) -> Result<Completed, CompletionError> {
    if let Some(ref cache) = cache {
        if let Some(text) = cache.get(&key).await {
            return Ok(Completed { text, cached: true });
        }
    }

    let text = completion.complete(&prompt).await?.trim().to_string();

    if let Some(cache) = cache {
        cache.insert(key, text.clone()).await;
    }

    Ok(Completed {
        text,
        cached: false,
    })
}

fn to_insight_result(kind: InsightKind, outcome: Result<Completed, TaskError>) -> InsightResult {
    match outcome {
        Ok(done) => InsightResult::success(kind, done.text, done.cached),
        Err(e) => InsightResult::failed(kind, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::mock::{MockCompletion, MockReply};
    use crate::metrics::LexiconSentiment;
    use crate::models::SummaryStyle;

    const MAIL: &str = "Hi team, the deadline moved to Friday. Please confirm.";

    fn aggregator(mock: Arc<MockCompletion>) -> InsightAggregator {
        InsightAggregator::new(
            mock,
            TemplateSet::new(SummaryStyle::BulletPoints),
            Arc::new(LexiconSentiment),
            AggregatorConfig::default(),
        )
    }

    fn kinds(list: &[InsightKind]) -> BTreeSet<InsightKind> {
        list.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_summary_and_urgency_scenario() {
        let mock = Arc::new(
            MockCompletion::new("unused")
                .on("provide a summary", MockReply::Text("  - Deadline is Friday\n".into()))
                .on("Rate the urgency", MockReply::Text("Medium".into())),
        );
        let doc = InputDocument::new("mail.txt", MAIL);

        let run = aggregator(mock.clone())
            .run(&doc, &kinds(&[InsightKind::Summary, InsightKind::Urgency]))
            .await
            .unwrap();

        assert_eq!(run.kinds(), vec![InsightKind::Summary, InsightKind::Urgency]);
        assert_eq!(run.get(InsightKind::Summary).unwrap().text, "- Deadline is Friday");
        assert_eq!(run.get(InsightKind::Urgency).unwrap().text, "Medium");
        assert!(run.failed_kinds().is_empty());
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_key_set_is_enabled_plus_mandatory() {
        let mock = Arc::new(MockCompletion::new("ok"));
        let agg = aggregator(mock);
        let doc = InputDocument::new("t", MAIL);

        let cases: Vec<Vec<InsightKind>> = vec![
            vec![],
            vec![InsightKind::Tone],
            vec![InsightKind::Summary],
            InsightKind::ALL.to_vec(),
            vec![InsightKind::Response, InsightKind::Category, InsightKind::Questions],
        ];

        for case in cases {
            let enabled = kinds(&case);
            let run = agg.run(&doc, &enabled).await.unwrap();

            let mut expected = enabled.clone();
            expected.insert(InsightKind::Summary);
            let actual: BTreeSet<_> = run.kinds().into_iter().collect();
            assert_eq!(actual, expected);
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let mock = Arc::new(
            MockCompletion::new("fine").on(
                "Draft a short, professional reply",
                MockReply::Fail(CompletionError::Api {
                    status: 500,
                    body: "model overloaded".into(),
                }),
            ),
        );
        let doc = InputDocument::new("t", MAIL);

        let run = aggregator(mock)
            .run(&doc, &kinds(&[InsightKind::Response, InsightKind::Tone]))
            .await
            .unwrap();

        let response = run.get(InsightKind::Response).unwrap();
        assert!(response.error.as_deref().unwrap().contains("model overloaded"));
        assert!(response.text.is_empty());

        assert_eq!(run.get(InsightKind::Summary).unwrap().text, "fine");
        assert_eq!(run.get(InsightKind::Tone).unwrap().text, "fine");
        assert_eq!(run.failed_kinds(), vec![InsightKind::Response]);
    }

    #[tokio::test]
    async fn test_panicking_completion_is_isolated() {
        let mock = Arc::new(MockCompletion::new("fine").on("Classify", MockReply::Panic));
        let doc = InputDocument::new("t", MAIL);

        let run = aggregator(mock)
            .run(&doc, &kinds(&[InsightKind::Category]))
            .await
            .unwrap();

        assert!(run.get(InsightKind::Category).unwrap().error.is_some());
        assert!(run.get(InsightKind::Summary).unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_run_concurrently() {
        let mock = Arc::new(MockCompletion::new("slow").with_delay(Duration::from_secs(10)));
        let doc = InputDocument::new("t", MAIL);
        let enabled = kinds(&[InsightKind::Tone, InsightKind::Urgency, InsightKind::Category]);

        let started = tokio::time::Instant::now();
        let run = aggregator(mock).run(&doc, &enabled).await.unwrap();

        assert_eq!(run.insights.len(), 4);
        assert!(run.failed_kinds().is_empty());
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_per_kind() {
        let mock = Arc::new(MockCompletion::new("fine").on("Rate the urgency", MockReply::Hang));
        let config = AggregatorConfig {
            request_timeout: Some(Duration::from_secs(5)),
            ..AggregatorConfig::default()
        };
        let agg = InsightAggregator::new(
            mock,
            TemplateSet::new(SummaryStyle::BulletPoints),
            Arc::new(LexiconSentiment),
            config,
        );
        let doc = InputDocument::new("t", MAIL);

        let run = agg.run(&doc, &kinds(&[InsightKind::Urgency])).await.unwrap();

        let urgency = run.get(InsightKind::Urgency).unwrap();
        assert!(urgency.error.as_deref().unwrap().contains("Timed out"));
        assert!(run.get(InsightKind::Summary).unwrap().is_success());
    }

    #[tokio::test]
    async fn test_empty_document_dispatches_nothing() {
        let mock = Arc::new(MockCompletion::new("never"));
        let doc = InputDocument::new("t", " \n ");

        let err = aggregator(mock.clone())
            .run(&doc, &kinds(&InsightKind::ALL))
            .await
            .unwrap_err();

        assert!(matches!(err, InsightError::EmptyDocument));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_truncation_consistent_across_kinds() {
        let mock = Arc::new(MockCompletion::new("ok"));
        let config = AggregatorConfig {
            max_chars: 40,
            ..AggregatorConfig::default()
        };
        let agg = InsightAggregator::new(
            mock.clone(),
            TemplateSet::new(SummaryStyle::BulletPoints),
            Arc::new(LexiconSentiment),
            config,
        );
        let long_mail = format!("{} {}", MAIL, "Extra detail that must be cut. ".repeat(20));
        let doc = InputDocument::new("t", long_mail.as_str());
        let prefix: String = long_mail.chars().take(40).collect();

        let run = agg.run(&doc, &kinds(&InsightKind::ALL)).await.unwrap();

        assert!(run.truncated);
        let prompts = mock.prompts();
        assert_eq!(prompts.len(), InsightKind::ALL.len());
        for prompt in prompts {
            assert!(prompt.ends_with(&prefix));
            assert!(!prompt.contains("Extra detail that must be cut. Extra"));
        }
    }

    #[tokio::test]
    async fn test_cached_results_are_reused() {
        let mock = Arc::new(MockCompletion::new("").with_default(MockReply::Numbered("answer".into())));
        let cache = Arc::new(InsightCache::new(Duration::from_secs(3600)));
        let agg = aggregator(mock.clone()).with_cache(cache);
        let doc = InputDocument::new("t", MAIL);
        let enabled = kinds(&[InsightKind::Tone, InsightKind::Urgency]);

        let first = agg.run(&doc, &enabled).await.unwrap();
        let second = agg.run(&doc, &enabled).await.unwrap();

        assert_eq!(mock.call_count(), 3);
        for kind in [InsightKind::Summary, InsightKind::Tone, InsightKind::Urgency] {
            assert_eq!(first.get(kind).unwrap().text, second.get(kind).unwrap().text);
            assert!(!first.get(kind).unwrap().cached);
            assert!(second.get(kind).unwrap().cached);
        }
    }

    #[tokio::test]
    async fn test_overlapping_kind_sets_share_cache() {
        let mock = Arc::new(MockCompletion::new("").with_default(MockReply::Numbered("answer".into())));
        let cache = Arc::new(InsightCache::new(Duration::from_secs(3600)));
        let agg = aggregator(mock.clone()).with_cache(cache);
        let doc = InputDocument::new("t", MAIL);

        agg.run(&doc, &kinds(&[InsightKind::Tone])).await.unwrap();
        let second = agg
            .run(&doc, &kinds(&[InsightKind::Tone, InsightKind::Questions]))
            .await
            .unwrap();

        // Summary + tone cached, only questions is new.
        assert_eq!(mock.call_count(), 3);
        assert_eq!(second.cached_count(), 2);
        assert!(!second.get(InsightKind::Questions).unwrap().cached);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_new_call() {
        let mock = Arc::new(MockCompletion::new("").with_default(MockReply::Numbered("answer".into())));
        let cache = Arc::new(InsightCache::new(Duration::from_millis(200)));
        let agg = aggregator(mock.clone()).with_cache(cache);
        let doc = InputDocument::new("t", MAIL);
        let enabled = BTreeSet::new();

        let first = agg.run(&doc, &enabled).await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        let second = agg.run(&doc, &enabled).await.unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_ne!(
            first.get(InsightKind::Summary).unwrap().text,
            second.get(InsightKind::Summary).unwrap().text
        );
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let failing = Arc::new(
            MockCompletion::new("").with_default(MockReply::Fail(CompletionError::Connect("x".into()))),
        );
        let cache = Arc::new(InsightCache::new(Duration::from_secs(3600)));
        let doc = InputDocument::new("t", MAIL);

        aggregator(failing).with_cache(cache.clone()).run(&doc, &BTreeSet::new()).await.unwrap();
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_local_metrics_are_merged() {
        let mock = Arc::new(MockCompletion::new("ok"));
        let doc = InputDocument::new("t", "Thanks, the launch was a great success. Great work!");

        let run = aggregator(mock).run(&doc, &BTreeSet::new()).await.unwrap();

        assert!(run.metrics.sentiment.polarity > 0.0);
        assert!(run.metrics.readability.words > 0);
        assert_eq!(run.metrics.keywords[0].word, "great");
    }
}
