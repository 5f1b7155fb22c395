//! HTTP access to the upstream APIs.

use super::DataError;
use core::time::Duration;
use ohno::IntoAppError;
use serde_json::Value as Json;

const LOG_TARGET: &str = " transport";

/// Status and undecoded body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Issues GET requests on behalf of the pipeline.
pub trait Transport: Send + Sync {
    /// Fetch `url`, returning the body as text whatever the status code.
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse, DataError>> + Send;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .into_app_err("unable to create HTTP client")?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, DataError> {
        log::debug!(target: LOG_TARGET, "GET '{url}'");

        let response = self.client.get(url).send().await.map_err(|source| DataError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| DataError::Transport {
            url: url.to_string(),
            source,
        })?;

        log::debug!(target: LOG_TARGET, "GET '{url}' returned {status} ({} bytes)", body.len());
        Ok(RawResponse { status, body })
    }
}

/// Fetch `url` and decode its body as JSON.
pub async fn fetch_json<T: Transport>(transport: &T, url: &str) -> Result<Json, DataError> {
    let response = transport.get(url).await?;
    serde_json::from_str(&response.body).map_err(|e| DataError::MalformedPayload {
        url: url.to_string(),
        reason: format!("HTTP {} with a body that is not valid JSON: {e}", response.status),
    })
}
