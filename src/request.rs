//! Typed request builder and delivery contract.
//!
//! [`RequestBuilder`] gathers configuration on a single owner, then `build`
//! consumes it into an immutable [`BuiltRequest`] snapshot. The executor
//! drives the snapshot and reports the final outcome through
//! [`BuiltRequest::complete`], which runs the parse hook and fans out to the
//! typed continuations and the optional [`StatusObserver`], in that order.

use std::collections::HashMap;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::charset::{self, DEFAULT_CHARSET};
use crate::error::Error;
use crate::param::ParamValue;
use crate::response::RawResponse;
use crate::retry::RetryPolicy;

type Parser<T> = Box<dyn FnOnce(&RequestParts, &RawResponse) -> Result<T, Error> + Send>;
type SuccessFn<T> = Box<dyn FnOnce(T) + Send>;
type ErrorFn = Box<dyn FnOnce(&Error) + Send>;

/// Secondary per-request observer, invoked after the typed continuation on
/// the same outcome. Receives the finalized request descriptor.
pub trait StatusObserver: Send {
    fn on_success(&self, request: &RequestParts);
    fn on_failure(&self, request: &RequestParts, error: &Error);
}

/// Immutable request descriptor produced by [`RequestBuilder::build`].
///
/// This is what the executor reads and what the parse hook and observer see.
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: Method,
    base_url: String,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    charset: String,
    content_type: Option<String>,
    retry: RetryPolicy,
}

impl RequestParts {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Whether this request carries its parameters in the body rather than
    /// the query string.
    pub fn has_body(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }

    /// Final URL: for no-body methods every parameter is appended
    /// URL-encoded; body-bearing methods get the base URL unchanged.
    pub fn url(&self) -> String {
        if self.has_body() || self.params.is_empty() {
            return self.base_url.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.base_url, separator, query)
    }

    /// Request body: the explicit override when present, otherwise the
    /// form-encoded parameter map for body-bearing methods.
    pub fn body(&self) -> Vec<u8> {
        if let Some(body) = &self.body {
            return body.clone();
        }
        if !self.has_body() || self.params.is_empty() {
            return Vec::new();
        }
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
            .into_bytes()
    }

    /// Content type sent with the body, derived from the charset unless
    /// overridden.
    pub fn content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| charset::form_content_type(&self.charset))
    }
}

/// Builder for a typed request producing a `T`.
///
/// Constructed with the base URL, method and success/error continuations;
/// parameters, headers and the retry policy accumulate through `with_*`
/// calls; `build` finalizes exactly once (enforced by ownership).
pub struct RequestBuilder<T> {
    method: Method,
    base_url: String,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
    charset: String,
    content_type: Option<String>,
    retry: RetryPolicy,
    parser: Parser<T>,
    on_success: SuccessFn<T>,
    on_error: ErrorFn,
}

impl<T> RequestBuilder<T> {
    /// Create a builder with an injected parse hook.
    ///
    /// The hook receives the finalized request descriptor alongside the raw
    /// response, so parsers can consult method or headers while parsing.
    pub fn new<P, S, E>(
        base_url: impl Into<String>,
        method: Method,
        parser: P,
        on_success: S,
        on_error: E,
    ) -> Self
    where
        P: FnOnce(&RequestParts, &RawResponse) -> Result<T, Error> + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(&Error) + Send + 'static,
    {
        Self {
            method,
            base_url: base_url.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            charset: DEFAULT_CHARSET.to_string(),
            content_type: None,
            retry: RetryPolicy::lenient(),
            parser: Box::new(parser),
            on_success: Box::new(on_success),
            on_error: Box::new(on_error),
        }
    }

    /// Store a parameter; repeated keys overwrite (last write wins).
    pub fn with_param(mut self, key: impl Into<String>, value: impl ParamValue) -> Self {
        self.params.insert(key.into(), value.into_param());
        self
    }

    /// Store a header; repeated keys overwrite (last write wins). Keys are
    /// case-sensitive strings.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Explicit request body, taking precedence over form-encoding the
    /// parameter map.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Charset for parameter encoding (default `UTF-8`).
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Override the body content type entirely.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach a retry policy (default [`RetryPolicy::lenient`]).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Finalize into an immutable [`BuiltRequest`], attaching the optional
    /// status observer. Consumes the builder: later mutation of a builder
    /// cannot affect an in-flight request.
    pub fn build(self, observer: Option<Box<dyn StatusObserver>>) -> BuiltRequest<T> {
        BuiltRequest {
            parts: RequestParts {
                method: self.method,
                base_url: self.base_url,
                params: self.params,
                headers: self.headers,
                body: self.body,
                charset: self.charset,
                content_type: self.content_type,
                retry: self.retry,
            },
            parser: self.parser,
            on_success: self.on_success,
            on_error: self.on_error,
            observer,
        }
    }
}

impl<T: DeserializeOwned> RequestBuilder<T> {
    /// Builder wired with a JSON parse hook for `T`.
    pub fn json<S, E>(base_url: impl Into<String>, method: Method, on_success: S, on_error: E) -> Self
    where
        S: FnOnce(T) + Send + 'static,
        E: FnOnce(&Error) + Send + 'static,
    {
        Self::new(
            base_url,
            method,
            |_parts, raw: &RawResponse| serde_json::from_slice(&raw.body).map_err(Error::parse),
            on_success,
            on_error,
        )
    }
}

/// Finalized request: descriptor snapshot plus parser, continuations and
/// observer. Handed to a [`RequestExecutor`], which calls
/// [`complete`](Self::complete) exactly once with the final outcome.
///
/// [`RequestExecutor`]: crate::executor::RequestExecutor
pub struct BuiltRequest<T> {
    parts: RequestParts,
    parser: Parser<T>,
    on_success: SuccessFn<T>,
    on_error: ErrorFn,
    observer: Option<Box<dyn StatusObserver>>,
}

impl<T> BuiltRequest<T> {
    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    /// Deliver the final outcome of the request.
    ///
    /// On network success the raw response goes through the parse hook; the
    /// typed value reaches the success continuation and then the observer's
    /// success callback. Any parse failure, or a network-level error, goes to
    /// the error continuation and then the observer's failure callback.
    /// Exactly one of the two paths runs. Failures are logged once before
    /// delivery; logging never replaces delivery.
    pub fn complete(self, outcome: Result<RawResponse, Error>) {
        let Self {
            parts,
            parser,
            on_success,
            on_error,
            observer,
        } = self;

        match outcome {
            Ok(raw) => match parser(&parts, &raw) {
                Ok(value) => {
                    on_success(value);
                    if let Some(observer) = &observer {
                        observer.on_success(&parts);
                    }
                }
                Err(err) => deliver_failure(&parts, &err, on_error, observer.as_deref()),
            },
            Err(err) => deliver_failure(&parts, &err, on_error, observer.as_deref()),
        }
    }
}

fn deliver_failure(
    parts: &RequestParts,
    err: &Error,
    on_error: ErrorFn,
    observer: Option<&dyn StatusObserver>,
) {
    error!(url = %parts.url(), error = %err, "request failed");
    on_error(err);
    if let Some(observer) = observer {
        observer.on_failure(parts, err);
    }
}
