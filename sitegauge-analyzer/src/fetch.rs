use crate::error::{AnalyzeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use url::Url;

/// One fetched page, as handed to the analysis pipeline.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// The fetch capability the engine depends on. The pipeline only ever sees
/// this trait; transport concerns (client construction, pooling, politeness)
/// live in the implementation.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Default HTTP implementation of [`Fetch`], with a per-origin minimum delay
/// so depth-1 discovery does not hammer a single host.
pub struct HttpFetcher {
    client: Client,
    min_origin_delay: Duration,
    last_hit: Mutex<HashMap<String, Instant>>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent("Sitegauge/0.1 (+https://github.com/sitegauge/sitegauge)")
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs / 2))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            min_origin_delay: Duration::from_millis(500),
            last_hit: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_origin_delay(mut self, delay: Duration) -> Self {
        self.min_origin_delay = delay;
        self
    }

    /// Waits until at least `min_origin_delay` has passed since the last
    /// request to the same origin, then claims the slot.
    async fn respect_origin_delay(&self, url: &Url) {
        if self.min_origin_delay.is_zero() {
            return;
        }
        let origin = url.origin().ascii_serialization();
        loop {
            let wait = {
                let mut last_hit = self.last_hit.lock().await;
                match last_hit.get(&origin) {
                    Some(last) if last.elapsed() < self.min_origin_delay => {
                        Some(self.min_origin_delay - last.elapsed())
                    }
                    _ => {
                        last_hit.insert(origin.clone(), Instant::now());
                        None
                    }
                }
            };
            match wait {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => break,
            }
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let parsed = Url::parse(url)
            .map_err(|e| AnalyzeError::InvalidUrl(format!("{}: {}", url, e)))?;
        self.respect_origin_delay(&parsed).await;

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AnalyzeError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await.map_err(|e| AnalyzeError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
