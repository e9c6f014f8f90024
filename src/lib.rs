//! fastreq
//!
//! A thin typed-request layer over `reqwest`. A [`RequestBuilder`] assembles
//! method, URL, parameters, headers and retry policy, binds a typed response
//! parser plus success/error continuations, and finalizes into an immutable
//! [`BuiltRequest`] that a [`RequestExecutor`] drives. The bundled
//! [`HttpExecutor`] bridges to `reqwest`, which owns all queueing, pooling
//! and transport concerns.
//!
//! ```rust,no_run
//! use fastreq::{HttpExecutor, Method, RequestBuilder, RequestExecutor};
//!
//! # #[derive(serde::Deserialize)] struct User { name: String }
//! # async fn example() {
//! let request = RequestBuilder::<User>::json(
//!     "https://api.example.com/user",
//!     Method::GET,
//!     |user| println!("hello {}", user.name),
//!     |err| eprintln!("request failed: {err}"),
//! )
//! .with_param("id", 42)
//! .build(None);
//!
//! HttpExecutor::new().execute(request).await;
//! # }
//! ```
#![deny(unsafe_code)]

pub mod charset;
pub mod error;
pub mod executor;
pub mod param;
pub mod request;
pub mod response;
pub mod retry;

pub use error::Error;
pub use executor::{HttpExecutor, RequestExecutor};
pub use param::ParamValue;
pub use request::{BuiltRequest, RequestBuilder, RequestParts, StatusObserver};
pub use response::RawResponse;
pub use retry::RetryPolicy;

// Re-exported so callers don't need a direct reqwest dependency.
pub use reqwest::Method;
