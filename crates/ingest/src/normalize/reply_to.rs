use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

const MARKER: &str = "reply to";

/// Finds the first email address after a case-insensitive "reply to" marker.
pub fn find_reply_to(body: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `body`.
    let index = body.to_ascii_lowercase().find(MARKER)?;
    EMAIL
        .find(&body[index + MARKER.len()..])
        .map(|m| m.as_str().to_string())
}

/// Reply-to address from the body, else the provider-supplied field.
pub fn extract_reply_to(body: &str, fallback: &str) -> String {
    find_reply_to(body).unwrap_or_else(|| fallback.trim().to_string())
}
