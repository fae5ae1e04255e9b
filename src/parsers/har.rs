//! HAR capture parser: maps the first request entry of an HTTP Archive
//! to canonical request fields.

use serde::Deserialize;

use crate::models::request::KeyValue;
use crate::parsers::ParsedRequest;

#[derive(Debug, Deserialize)]
struct Har {
    log: HarLog,
}

#[derive(Debug, Deserialize)]
struct HarLog {
    #[serde(default)]
    entries: Vec<HarEntry>,
}

#[derive(Debug, Deserialize)]
struct HarEntry {
    request: Option<HarRequest>,
}

#[derive(Debug, Deserialize)]
struct HarRequest {
    method: Option<String>,
    url: Option<String>,
    #[serde(default)]
    headers: Vec<HarPair>,
    #[serde(default)]
    cookies: Vec<HarPair>,
    #[serde(default, rename = "queryString")]
    query_string: Vec<HarPair>,
    #[serde(rename = "postData")]
    post_data: Option<HarPostData>,
}

#[derive(Debug, Deserialize)]
struct HarPair {
    #[serde(default)]
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct HarPostData {
    text: Option<String>,
}

/// Attempt to parse the blob as a HAR capture. Returns `None` when the text
/// is not JSON or lacks a navigable `log.entries[0].request`, letting the
/// caller fall back to the raw HTTP text parser.
pub fn parse(text: &str) -> Option<ParsedRequest> {
    let har: Har = serde_json::from_str(text).ok()?;
    let request = har.log.entries.into_iter().next()?.request?;

    Some(ParsedRequest {
        method: request.method,
        url: request.url,
        headers: pairs(request.headers),
        cookies: pairs(request.cookies),
        params: pairs(request.query_string),
        body: request.post_data.and_then(|p| p.text),
    })
}

fn pairs(entries: Vec<HarPair>) -> Vec<KeyValue> {
    entries
        .into_iter()
        .map(|p| KeyValue::new(p.name, p.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_json() {
        assert!(parse("GET / HTTP/1.1\nHost: x\n\n").is_none());
    }

    #[test]
    fn rejects_json_without_entries() {
        assert!(parse(r#"{"log":{"entries":[]}}"#).is_none());
        assert!(parse(r#"{"log":{}}"#).is_none());
        assert!(parse(r#"{"other":1}"#).is_none());
    }

    #[test]
    fn maps_first_entry_fields() {
        let blob = serde_json::json!({
            "log": { "entries": [
                { "request": {
                    "method": "PUT",
                    "url": "https://api.example.com/items/3?full=1",
                    "headers": [ { "name": "Accept", "value": "application/json" } ],
                    "cookies": [],
                    "queryString": [ { "name": "full", "value": "1" } ],
                    "postData": { "text": "{\"name\":\"x\"}" }
                } },
                { "request": { "method": "GET", "url": "https://ignored.example.com/" } }
            ] }
        })
        .to_string();

        let parsed = parse(&blob).unwrap();
        assert_eq!(parsed.method.as_deref(), Some("PUT"));
        assert_eq!(parsed.url.as_deref(), Some("https://api.example.com/items/3?full=1"));
        assert_eq!(parsed.params, vec![KeyValue::new("full", "1")]);
        assert_eq!(parsed.body.as_deref(), Some("{\"name\":\"x\"}"));
    }
}
