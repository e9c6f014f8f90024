//! End-to-end tests for `HttpExecutor` against a wiremock server.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fastreq::{
    Error, HttpExecutor, Method, RawResponse, RequestBuilder, RequestExecutor, RequestParts,
    RetryPolicy, StatusObserver,
};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Widget {
    id: u32,
    name: String,
}

#[derive(Default)]
struct CountingObserver {
    successes: AtomicU32,
    failures: AtomicU32,
}

/// Local handle around the shared counter; `StatusObserver` can only be
/// implemented for types owned by this crate.
#[derive(Clone)]
struct SharedObserver(Arc<CountingObserver>);

impl StatusObserver for SharedObserver {
    fn on_success(&self, _request: &RequestParts) {
        self.0.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self, _request: &RequestParts, _error: &Error) {
        self.0.failures.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn get_request_sends_encoded_query_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/widgets"))
        .and(query_param("name", "left handed"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "left handed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let observer = SharedObserver(Arc::new(CountingObserver::default()));
    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<Widget>::json(
        format!("{}/widgets", server.uri()),
        Method::GET,
        move |widget| *delivered_clone.lock().unwrap() = Some(widget),
        |err| panic!("unexpected error: {err}"),
    )
    .with_param("name", "left handed")
    .with_param("page", 2)
    .build(Some(Box::new(observer.clone())));

    HttpExecutor::new().execute(request).await;

    assert_eq!(
        *delivered.lock().unwrap(),
        Some(Widget {
            id: 1,
            name: "left handed".into()
        })
    );
    assert_eq!(observer.0.successes.load(Ordering::SeqCst), 1);
    assert_eq!(observer.0.failures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_request_form_encodes_params_in_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header(
            "Content-Type",
            "application/x-www-form-urlencoded; charset=UTF-8",
        ))
        .and(body_string("name=alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "name": "alice"})))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<Widget>::json(
        format!("{}/submit", server.uri()),
        Method::POST,
        move |widget| *delivered_clone.lock().unwrap() = Some(widget.id),
        |err| panic!("unexpected error: {err}"),
    )
    .with_param("name", "alice")
    .build(None);

    HttpExecutor::new().execute(request).await;

    assert_eq!(*delivered.lock().unwrap(), Some(9));
}

#[tokio::test]
async fn explicit_body_and_content_type_are_sent_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/raw"))
        .and(header("Content-Type", "application/json"))
        .and(body_string(r#"{"direct":true}"#))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<String>::new(
        format!("{}/raw", server.uri()),
        Method::PUT,
        |_parts, raw: &RawResponse| Ok(raw.text()),
        move |text| *delivered_clone.lock().unwrap() = Some(text),
        |err| panic!("unexpected error: {err}"),
    )
    .with_body(r#"{"direct":true}"#.as_bytes().to_vec())
    .with_content_type("application/json")
    .build(None);

    HttpExecutor::new().execute(request).await;

    assert_eq!(delivered.lock().unwrap().as_deref(), Some("stored"));
}

#[tokio::test]
async fn server_error_reaches_error_continuation_and_observer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let observer = SharedObserver(Arc::new(CountingObserver::default()));
    let failed = Arc::new(Mutex::new(None));
    let failed_clone = failed.clone();

    let request = RequestBuilder::<Widget>::json(
        format!("{}/broken", server.uri()),
        Method::GET,
        |_widget| panic!("success continuation must not run"),
        move |err| *failed_clone.lock().unwrap() = Some(err.to_string()),
    )
    .with_retry_policy(RetryPolicy::lenient().with_max_attempts(1))
    .build(Some(Box::new(observer.clone())));

    HttpExecutor::new().execute(request).await;

    let message = failed.lock().unwrap().clone().unwrap();
    assert!(message.contains("500"), "unexpected message: {message}");
    assert!(message.contains("boom"), "unexpected message: {message}");
    assert_eq!(observer.0.successes.load(Ordering::SeqCst), 0);
    assert_eq!(observer.0.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retryable_failure_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3, "name": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<Widget>::json(
        format!("{}/flaky", server.uri()),
        Method::GET,
        move |widget| *delivered_clone.lock().unwrap() = Some(widget.id),
        |err| panic!("unexpected error: {err}"),
    )
    .with_retry_policy(
        RetryPolicy::lenient()
            .with_max_attempts(2)
            .with_initial_delay(Duration::from_millis(10)),
    )
    .build(None);

    HttpExecutor::new().execute(request).await;

    assert_eq!(*delivered.lock().unwrap(), Some(3));
}

#[tokio::test]
async fn parse_failure_surfaces_typed_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let observer = SharedObserver(Arc::new(CountingObserver::default()));
    let saw_parse_error = Arc::new(AtomicU32::new(0));
    let saw_parse_error_clone = saw_parse_error.clone();

    let request = RequestBuilder::<Widget>::json(
        format!("{}/garbled", server.uri()),
        Method::GET,
        |_widget| panic!("success continuation must not run"),
        move |err| {
            assert!(matches!(err, Error::Parse { source: Some(_), .. }));
            saw_parse_error_clone.fetch_add(1, Ordering::SeqCst);
        },
    )
    .build(Some(Box::new(observer.clone())));

    HttpExecutor::new().execute(request).await;

    assert_eq!(saw_parse_error.load(Ordering::SeqCst), 1);
    assert_eq!(observer.0.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn parser_can_read_response_charset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html; charset=ISO-8859-1"),
        )
        .mount(&server)
        .await;

    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<String>::new(
        format!("{}/page", server.uri()),
        Method::GET,
        |parts, raw: &RawResponse| Ok(raw.charset(parts.charset()).to_string()),
        move |charset| *delivered_clone.lock().unwrap() = Some(charset),
        |err| panic!("unexpected error: {err}"),
    )
    .build(None);

    HttpExecutor::new().execute(request).await;

    assert_eq!(delivered.lock().unwrap().as_deref(), Some("ISO-8859-1"));
}

#[tokio::test]
async fn request_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/authed"))
        .and(header("X-Api-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Arc::new(Mutex::new(None));
    let delivered_clone = delivered.clone();

    let request = RequestBuilder::<String>::new(
        format!("{}/authed", server.uri()),
        Method::GET,
        |_parts, raw: &RawResponse| Ok(raw.text()),
        move |text| *delivered_clone.lock().unwrap() = Some(text),
        |err| panic!("unexpected error: {err}"),
    )
    .with_header("X-Api-Key", "secret")
    .build(None);

    HttpExecutor::new().execute(request).await;

    assert_eq!(delivered.lock().unwrap().as_deref(), Some("ok"));
}
