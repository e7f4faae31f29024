//! HTTP acquisition with per-attempt identity rotation and bounded retries.

pub mod identity;
pub mod retry;

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::app::ports::{HttpClientPort, Sleeper};
use crate::error::FetchError;
use crate::observability::metrics;
use identity::RequestIdentity;
use retry::RetryPolicy;

/// Result of one `TransportClient::fetch` call, after all retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Document(String),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_document(&self) -> bool {
        matches!(self, FetchOutcome::Document(_))
    }
}

pub struct TransportClient {
    http: Arc<dyn HttpClientPort>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl TransportClient {
    pub fn new(http: Arc<dyn HttpClientPort>, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        let policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        Self { http, policy, sleeper }
    }

    /// GETs `url`, retrying transient failures. Never returns an error: an
    /// exhausted budget comes back as `FetchOutcome::Failed`.
    #[instrument(skip(self), fields(max_attempts = self.policy.max_attempts))]
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut last_error = None;

        for attempt in 0..self.policy.max_attempts {
            let identity = RequestIdentity::pick(&mut rand::thread_rng());
            let started = Instant::now();

            let result = self.http.get(url, &identity).await.and_then(|resp| {
                if resp.is_success() {
                    Ok(resp)
                } else {
                    Err(FetchError::Status {
                        url: url.to_string(),
                        status: resp.status,
                    })
                }
            });

            match result {
                Ok(resp) => {
                    metrics::transport::request_success(started.elapsed().as_secs_f64(), resp.bytes.len());
                    debug!(attempt, bytes = resp.bytes.len(), content_type = %resp.content_type, "fetched document");
                    return FetchOutcome::Document(String::from_utf8_lossy(&resp.bytes).into_owned());
                }
                Err(e) => {
                    metrics::transport::attempt_error(e.kind());
                    warn!(attempt, error = %e, "fetch attempt failed");
                    last_error = Some(e);
                }
            }

            let delay = self.policy.backoff(attempt, &mut rand::thread_rng());
            if let Some(delay) = delay {
                debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(delay).await;
            }
        }

        metrics::transport::fetch_exhausted();
        let last = last_error.unwrap_or_else(|| FetchError::Connect {
            url: url.to_string(),
            message: "no attempt was made".into(),
        });
        FetchOutcome::Failed(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.policy.max_attempts,
            last: Box::new(last),
        })
    }
}
