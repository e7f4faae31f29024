use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchError;
use crate::transport::identity::RequestIdentity;
use crate::types::{ComparisonRecord, ProductRecord};

// Acquisition-side ports
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    /// One GET attempt. Retries are the caller's concern.
    async fn get(&self, url: &str, identity: &RequestIdentity) -> Result<HttpGetResult, FetchError>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Suspension point for backoff and pacing delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// Export-side port
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn write_comparisons(&self, records: &[ComparisonRecord]) -> anyhow::Result<()>;
    async fn write_products(&self, records: &[ProductRecord]) -> anyhow::Result<()>;
}
