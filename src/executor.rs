//! Request execution.
//!
//! [`RequestExecutor`] is the contract a built request is handed to;
//! [`HttpExecutor`] is the bundled bridge to `reqwest`. Everything beyond a
//! bounded retry loop (queueing, pooling, caching) stays inside `reqwest`.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::Error;
use crate::request::{BuiltRequest, RequestParts};
use crate::response::RawResponse;

/// Drives a built request to completion.
///
/// Implementations perform the I/O described by the request descriptor and
/// call [`BuiltRequest::complete`] exactly once with the final outcome.
/// Delivery may happen on a different task than the one that built the
/// request.
#[async_trait]
pub trait RequestExecutor {
    async fn execute<T: Send + 'static>(&self, request: BuiltRequest<T>);
}

/// `reqwest`-backed executor applying the request's retry policy.
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing `reqwest` client (connection pool, proxy, TLS
    /// configuration).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send_once(&self, parts: &RequestParts, attempt: u32) -> Result<RawResponse, Error> {
        let url = parts.url();
        debug!(method = %parts.method(), %url, attempt, "sending request");

        let mut builder = self
            .client
            .request(parts.method().clone(), url.as_str())
            .timeout(parts.retry().timeout);
        for (key, value) in parts.headers() {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let body = parts.body();
        if !body.is_empty() {
            builder = builder
                .header(CONTENT_TYPE, parts.content_type())
                .body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    elapsed: parts.retry().timeout,
                }
            } else if e.is_builder() {
                Error::Configuration(e.to_string())
            } else {
                Error::Http(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let headers = headermap_to_hashmap(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.to_string()))?
            .to_vec();

        if !(200..300).contains(&status) {
            return Err(Error::Api {
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(RawResponse::new(status, headers, body))
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute<T: Send + 'static>(&self, request: BuiltRequest<T>) {
        let parts = request.parts().clone();
        let policy = parts.retry().clone();

        let mut attempt = 0;
        let outcome = loop {
            match self.send_once(&parts, attempt).await {
                Ok(raw) => break Ok(raw),
                Err(err) => {
                    attempt += 1;
                    if attempt >= policy.max_attempts || !err.is_retryable() {
                        break Err(err);
                    }
                    debug!(error = %err, attempt, "retrying request");
                    let delay = policy.delay_before(attempt - 1);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        };

        // Retries are invisible above this point: the request sees one final
        // outcome, delivered exactly once.
        request.complete(outcome);
    }
}

/// Convert a `reqwest` header map to case-sensitive string pairs, canonical
/// `Title-Case` keys. Headers with non-UTF-8 values are skipped.
fn headermap_to_hashmap(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (canonical_header_name(key.as_str()), v.to_string()))
        })
        .collect()
}

fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
