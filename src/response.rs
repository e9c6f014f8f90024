//! Raw network response handed to the parse hook.

use std::collections::HashMap;

use crate::charset;

/// Status, headers and body bytes of a completed network exchange, before
/// any typed parsing.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Charset declared by the response's `Content-Type`, or `fallback`.
    pub fn charset<'a>(&'a self, fallback: &'a str) -> &'a str {
        charset::parse_charset(&self.headers, fallback)
    }

    /// Body as text. Non-UTF-8 bytes are replaced rather than rejected;
    /// parsers needing strict decoding should work on `body` directly.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
