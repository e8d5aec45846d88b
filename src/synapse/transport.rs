//! Transport abstraction
//!
//! The enrichment pipeline only talks to the homeserver through [`Transport`],
//! so tests can swap the real HTTP client for an in-memory double.

use super::error::TransportError;
use async_trait::async_trait;
use reqwest::Method;
use tokio::time::Instant;

/// A single request relative to the homeserver base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Only sent for POST requests
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }
}

/// Performs one logical request/response cycle.
///
/// Implementations must give up once `deadline` has passed. With `retry` set,
/// failed attempts are retried with exponential backoff; otherwise a single
/// attempt is made.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        request: &Request,
        deadline: Instant,
        retry: bool,
    ) -> Result<Vec<u8>, TransportError>;
}
