//! Raw request parsers normalizing heterogeneous captures into canonical
//! request fields.
//!
//! Parsing is best-effort and never fails past this boundary: the result is
//! a partial structure the caller merges with defaults, and the original
//! raw text is always retained upstream for audit display.

pub mod har;
pub mod raw_http;

use crate::models::request::KeyValue;

/// Partial request fields recovered from a raw capture.
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: Vec<KeyValue>,
    pub cookies: Vec<KeyValue>,
    pub params: Vec<KeyValue>,
    pub body: Option<String>,
}

/// Parse a raw text blob: HAR capture first (short-circuits on a match),
/// raw HTTP wire text as the fallback.
pub fn parse_raw(text: &str) -> ParsedRequest {
    match har::parse(text) {
        Some(parsed) => parsed,
        None => raw_http::parse(text),
    }
}
