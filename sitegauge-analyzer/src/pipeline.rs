use crate::capability;
use crate::classify;
use crate::config::{self, DetectionResult, SiteConfiguration};
use crate::discover::{self, DiscoverOptions};
use crate::error::{AnalyzeError, Result};
use crate::extract;
use crate::fetch::{Fetch, FetchedPage, HttpFetcher};
use crate::profiles::TypeProfile;
use crate::summary::StructuralSummary;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 1;
pub const DEFAULT_RETRY_LIMIT: usize = 3;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 250;

/// Stages of one analysis run. Only the initial fetch can fail a run;
/// every later stage degrades into the output value instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    Start,
    Fetched,
    Extracted,
    Classified,
    CapabilitiesDetected,
    UrlsDiscovered,
    Synthesized,
}

impl AnalysisStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStage::Start => "start",
            AnalysisStage::Fetched => "fetched",
            AnalysisStage::Extracted => "extracted",
            AnalysisStage::Classified => "classified",
            AnalysisStage::CapabilitiesDetected => "capabilities_detected",
            AnalysisStage::UrlsDiscovered => "urls_discovered",
            AnalysisStage::Synthesized => "synthesized",
        }
    }
}

/// Terminal state of one run: a configuration, or the fetch failure that
/// stopped it. A batch of runs never aborts on one failed member.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Complete(Box<SiteConfiguration>),
    Failed { url: String, error: AnalyzeError },
}

impl AnalysisOutcome {
    pub fn configuration(&self) -> Option<&SiteConfiguration> {
        match self {
            AnalysisOutcome::Complete(config) => Some(config),
            AnalysisOutcome::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AnalysisOutcome::Failed { .. })
    }
}

/// Runs the full detection pipeline against one or more source URLs.
/// Stateless between runs; the only shared data is the injected fetch
/// capability and the read-only profile catalogue.
#[derive(Clone)]
pub struct Analyzer {
    fetcher: Arc<dyn Fetch>,
    max_depth: usize,
    retry_limit: usize,
    backoff_base: Duration,
    allowed_domains: Vec<String>,
    cancel: CancellationToken,
}

impl Analyzer {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_DEPTH,
            retry_limit: DEFAULT_RETRY_LIMIT,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            allowed_domains: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Analyzer backed by the bundled HTTP fetcher.
    pub fn over_http() -> Self {
        Self::new(Arc::new(HttpFetcher::new()))
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_retry_limit(mut self, retries: usize) -> Self {
        self.retry_limit = retries;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// One full analysis run. Returns `Err` only for an unusable input URL
    /// or caller cancellation; a fetch that keeps failing after retries is
    /// reported as [`AnalysisOutcome::Failed`], and every downstream stage
    /// degrades into the configuration rather than erroring.
    pub async fn analyze(&self, source_url: &str) -> Result<AnalysisOutcome> {
        let parsed = Url::parse(source_url)
            .map_err(|e| AnalyzeError::InvalidUrl(format!("{}: {}", source_url, e)))?;

        let mut stage = AnalysisStage::Start;
        info!("Analyzing {}", source_url);
        debug!("{}: {}", source_url, stage.as_str());

        let page = match self.fetch_with_retry(source_url).await {
            Ok(page) => page,
            Err(AnalyzeError::Cancelled) => return Err(AnalyzeError::Cancelled),
            Err(error) => {
                warn!("Analysis of {} failed at fetch: {}", source_url, error);
                return Ok(AnalysisOutcome::Failed {
                    url: source_url.to_string(),
                    error,
                });
            }
        };
        stage = AnalysisStage::Fetched;
        debug!("{}: {}", source_url, stage.as_str());

        let summary = match extract::extract(&page.body) {
            Ok(summary) => summary,
            Err(e) => {
                debug!("{}: degrading to empty summary ({})", source_url, e);
                StructuralSummary::empty()
            }
        };
        stage = AnalysisStage::Extracted;
        debug!("{}: {}", source_url, stage.as_str());

        let (site_type, confidence) = classify::classify(&summary);
        stage = AnalysisStage::Classified;
        debug!("{}: {} ({})", source_url, stage.as_str(), site_type.as_str());

        let capabilities = capability::detect(&summary);
        stage = AnalysisStage::CapabilitiesDetected;
        debug!("{}: {}", source_url, stage.as_str());

        let options = DiscoverOptions {
            max_depth: self.max_depth,
            allowed_domains: self.allowed_domains.clone(),
            fanout_limit: discover::DISCOVERY_FANOUT_LIMIT,
        };
        let candidates = discover::discover(
            &summary,
            &parsed,
            TypeProfile::for_type(site_type),
            self.fetcher.as_ref(),
            &options,
            &self.cancel,
        )
        .await?;
        stage = AnalysisStage::UrlsDiscovered;
        debug!("{}: {} ({} candidates)", source_url, stage.as_str(), candidates.len());

        let detection = DetectionResult {
            site_type,
            confidence,
            capabilities,
        };
        let site_name = summary.title.clone().or_else(|| fallback_site_name(&parsed));
        let configuration = config::synthesize(
            source_url,
            site_name,
            summary.description.clone(),
            detection,
            candidates,
        );
        stage = AnalysisStage::Synthesized;
        debug!("{}: {}", source_url, stage.as_str());

        info!(
            "{} classified as {} ({:.2}), {} candidates",
            source_url,
            configuration.detection.site_type.as_str(),
            configuration.detection.confidence,
            configuration.candidates.len()
        );
        Ok(AnalysisOutcome::Complete(Box::new(configuration)))
    }

    /// Analyzes independent sites concurrently on a fixed worker pool.
    /// URLs are distributed round-robin; outcomes come back in input order.
    pub async fn analyze_many(
        &self,
        urls: &[String],
        workers: usize,
    ) -> Result<Vec<AnalysisOutcome>> {
        let workers = workers.max(1);
        info!("Analyzing {} sites with {} workers", urls.len(), workers);

        let mut queues: Vec<Vec<(usize, String)>> = (0..workers).map(|_| Vec::new()).collect();
        for (index, url) in urls.iter().enumerate() {
            queues[index % workers].push((index, url.clone()));
        }

        let results: Arc<Mutex<Vec<(usize, AnalysisOutcome)>>> =
            Arc::new(Mutex::new(Vec::with_capacity(urls.len())));
        let mut handles = Vec::new();

        for (worker_id, queue) in queues.into_iter().enumerate() {
            let analyzer = self.clone();
            let results = results.clone();

            handles.push(tokio::spawn(async move {
                debug!("Worker {} started with {} sites", worker_id, queue.len());
                for (index, url) in queue {
                    if analyzer.cancel.is_cancelled() {
                        debug!("Worker {} stopping: cancelled", worker_id);
                        break;
                    }
                    let outcome = match analyzer.analyze(&url).await {
                        Ok(outcome) => outcome,
                        Err(error) => {
                            warn!("Run for {} aborted: {}", url, error);
                            AnalysisOutcome::Failed { url: url.clone(), error }
                        }
                    };
                    results.lock().await.push((index, outcome));
                }
                debug!("Worker {} finished", worker_id);
            }));
        }

        for handle in handles {
            handle.await?;
        }

        let mut collected: Vec<(usize, AnalysisOutcome)> = {
            let mut guard = results.lock().await;
            guard.drain(..).collect()
        };
        collected.sort_by_key(|(index, _)| *index);
        Ok(collected.into_iter().map(|(_, outcome)| outcome).collect())
    }

    /// Bounded retries with exponential backoff around the injected fetch.
    async fn fetch_with_retry(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                return Err(AnalyzeError::Cancelled);
            }
            let result = tokio::select! {
                _ = self.cancel.cancelled() => return Err(AnalyzeError::Cancelled),
                result = self.fetcher.fetch(url) => result,
            };
            match result {
                Ok(page) => return Ok(page),
                Err(error) if error.is_retryable() && attempt < self.retry_limit => {
                    let delay = self.backoff_base * 2u32.pow(attempt as u32);
                    warn!(
                        "Fetch of {} failed ({}), retry {}/{} in {:?}",
                        url,
                        error,
                        attempt + 1,
                        self.retry_limit,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Prettified host name for sites without a usable title.
fn fallback_site_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let label = host.trim_start_matches("www.").split('.').next()?;
    if label.is_empty() {
        return None;
    }
    let mut chars = label.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}
