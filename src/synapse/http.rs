//! HTTP transport for Synapse REST API calls

use super::backoff::ExponentialBackoff;
use super::error::TransportError;
use super::transport::{Request, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// OK, Created and NoContent are the only statuses treated as success
fn is_success_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT
    )
}

/// HTTP client for a single homeserver
#[derive(Clone)]
pub struct SynapseHttpClient {
    client: Client,
    base_url: String,
    access_token: String,
}

impl SynapseHttpClient {
    /// Create a new HTTP client; `timeout` bounds each individual attempt
    pub fn new(base_url: &str, access_token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("syncli/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// One attempt, no retry
    async fn send(&self, request: &Request, url: &str) -> Result<Vec<u8>, TransportError> {
        tracing::debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(&self.access_token);

        if request.method == Method::POST {
            if let Some(body) = &request.body {
                builder = builder
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }
        }

        let response = builder.send().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| TransportError::Body {
            url: url.to_string(),
            source,
        })?;

        if !is_success_status(status) {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&String::from_utf8_lossy(&body))
            );
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(body.to_vec())
    }

    async fn send_before(
        &self,
        request: &Request,
        url: &str,
        deadline: Instant,
    ) -> Result<Vec<u8>, TransportError> {
        match timeout_at(deadline, self.send(request, url)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::DeadlineExceeded {
                url: url.to_string(),
            }),
        }
    }

    async fn send_with_retry(
        &self,
        request: &Request,
        url: &str,
        deadline: Instant,
    ) -> Result<Vec<u8>, TransportError> {
        let mut backoff = ExponentialBackoff::default();
        let mut attempt: u32 = 1;

        loop {
            let err = match self.send_before(request, url, deadline).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_deadline_exceeded() => return Err(err),
                Err(err) => err,
            };

            let Some(delay) = backoff.next_backoff() else {
                tracing::warn!(attempts = attempt, "Giving up on {}: {}", url, err);
                return Err(err);
            };

            if Instant::now() + delay >= deadline {
                return Err(TransportError::DeadlineExceeded {
                    url: url.to_string(),
                });
            }

            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Retrying {}: {}",
                url,
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl Transport for SynapseHttpClient {
    async fn call(
        &self,
        request: &Request,
        deadline: Instant,
        retry: bool,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.url_for(&request.path);
        if retry {
            self.send_with_retry(request, &url, deadline).await
        } else {
            self.send_before(request, &url, deadline).await
        }
    }
}
