use crate::app::ports::{HttpClientPort, HttpGetResult};
use crate::error::FetchError;
use crate::transport::identity::RequestIdentity;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

/// reqwest-backed HTTP port. The client is shared; headers are set per request.
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        // gzip/deflate decoding comes from the crate features
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout { url: url.to_string() }
    } else {
        FetchError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl HttpClientPort for ReqwestHttp {
    async fn get(&self, url: &str, identity: &RequestIdentity) -> Result<HttpGetResult, FetchError> {
        tracing::debug!(url, user_agent = identity.user_agent, "HTTP GET");
        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, identity.user_agent)
            .header(ACCEPT_LANGUAGE, identity.accept_language)
            .send()
            .await
            .map_err(|e| classify(url, e))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| classify(url, e))?.to_vec();
        tracing::debug!(url, status, size = bytes.len(), "HTTP response");
        Ok(HttpGetResult { status, bytes, content_type })
    }
}
