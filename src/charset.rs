//! Charset and content-type handling.

use std::collections::HashMap;

/// Charset used for parameter encoding unless a builder overrides it.
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// The header key read by [`parse_charset`]. Response header maps use
/// case-sensitive string keys, so the canonical spelling matters.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Default body content type for the given charset.
pub fn form_content_type(charset: &str) -> String {
    format!("application/x-www-form-urlencoded; charset={charset}")
}

/// Extract the charset from a `Content-Type` header value.
///
/// Scans the `;`-separated attributes after the media type for one literally
/// named `charset` (attribute name is case-sensitive). Returns `fallback`
/// when the header is absent or carries no well-formed charset attribute.
pub fn parse_charset<'a>(headers: &'a HashMap<String, String>, fallback: &'a str) -> &'a str {
    if let Some(content_type) = headers.get(CONTENT_TYPE) {
        for attribute in content_type.split(';').skip(1) {
            // Trailing empty values ("charset=") don't count as a charset.
            let pair: Vec<&str> = attribute.trim().split('=').collect();
            if pair.len() == 2 && pair[0] == "charset" && !pair[1].is_empty() {
                return pair[1];
            }
        }
    }
    fallback
}
