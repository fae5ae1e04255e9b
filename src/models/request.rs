//! Canonical request model: the single normalized representation of an
//! HTTP request regardless of how it was supplied (form fields, raw wire
//! text, or a HAR capture).

use serde::{Deserialize, Serialize};
use url::Url;

use crate::parsers;

/// Base used to resolve host-relative URLs so they are always parseable.
pub const PLACEHOLDER_BASE: &str = "https://placeholder.local";

/// An ordered key/value pair. Duplicate keys are preserved; last value per
/// key wins only at query-string materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Fixed set of supported HTTP verbs. Anything unrecognized falls back to GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            _ => Self::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// GET and HEAD never carry a request body on replay.
    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound analysis request: the transport-agnostic logical shape. Every
/// field is optional on the wire and defaulted here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    pub method: String,
    pub url: String,
    pub params: Vec<KeyValue>,
    pub headers: Vec<KeyValue>,
    pub cookies: Vec<KeyValue>,
    pub body: String,
    pub raw: String,
    pub fetch_response: bool,
    pub analyze_headers_only: bool,
}

/// The normalized request every downstream pipeline step consumes.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<KeyValue>,
    pub headers: Vec<KeyValue>,
    pub cookies: Vec<KeyValue>,
    pub body: String,
    /// Original raw text (wire format or HAR JSON), kept for audit display.
    pub raw: Option<String>,
}

impl CanonicalRequest {
    /// Assemble the canonical model from an inbound request, merging parsed
    /// raw-text fields with explicit structured fields. Structured fields
    /// take precedence when present and non-empty; query parameters found in
    /// the URL itself are folded into `params`.
    pub fn from_input(input: &AnalyzeRequest) -> Self {
        let parsed = if input.raw.trim().is_empty() {
            parsers::ParsedRequest::default()
        } else {
            parsers::parse_raw(&input.raw)
        };

        let method = if input.method.trim().is_empty() {
            parsed
                .method
                .as_deref()
                .map(HttpMethod::parse)
                .unwrap_or(HttpMethod::Get)
        } else {
            HttpMethod::parse(&input.method)
        };

        let url = if input.url.trim().is_empty() {
            parsed.url.clone().unwrap_or_default()
        } else {
            input.url.clone()
        };

        let headers = pick_pairs(&input.headers, &parsed.headers);
        let cookies = pick_pairs(&input.cookies, &parsed.cookies);
        let mut params = pick_pairs(&input.params, &parsed.params);

        // Fold query parameters embedded in the URL into the param list,
        // skipping exact duplicates already contributed by the parser or
        // the caller. URL-derived pairs go first so explicit values win at
        // materialization.
        if let Ok(resolved) = resolve_url(&url) {
            let mut merged: Vec<KeyValue> = resolved
                .query_pairs()
                .filter(|(k, _)| !k.is_empty())
                .map(|(k, v)| KeyValue::new(k.into_owned(), v.into_owned()))
                .filter(|kv| !params.contains(kv))
                .collect();
            merged.append(&mut params);
            params = merged;
        }

        let body = if input.body.is_empty() {
            parsed.body.clone().unwrap_or_default()
        } else {
            input.body.clone()
        };

        let raw = if input.raw.trim().is_empty() {
            None
        } else {
            Some(input.raw.clone())
        };

        Self {
            method,
            url,
            params,
            headers,
            cookies,
            body,
            raw,
        }
    }

    /// The request URL with `params` merged into its query component,
    /// last value per key winning.
    pub fn merged_url(&self) -> Result<Url, url::ParseError> {
        let mut url = resolve_url(&self.url)?;
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for kv in &self.params {
            if kv.key.is_empty() {
                continue;
            }
            pairs.retain(|(k, _)| *k != kv.key);
            pairs.push((kv.key.clone(), kv.value.clone()));
        }
        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs).finish();
        }
        Ok(url)
    }

    /// Percent-encoded query string materialized from `params`, skipping
    /// empty keys.
    pub fn query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for kv in &self.params {
            if kv.key.is_empty() {
                continue;
            }
            serializer.append_pair(&kv.key, &kv.value);
        }
        serializer.finish()
    }

    /// The user-supplied raw text, or a synthesized wire-format rendering
    /// for audit display when none was supplied.
    pub fn raw_or_rendered(&self) -> String {
        match &self.raw {
            Some(raw) => raw.clone(),
            None => self.render_raw(),
        }
    }

    /// Synthesize a raw HTTP/1.1 rendering of this request.
    pub fn render_raw(&self) -> String {
        let (path, host) = match self.merged_url() {
            Ok(url) => {
                let mut path = url.path().to_string();
                if let Some(q) = url.query().filter(|q| !q.is_empty()) {
                    path.push('?');
                    path.push_str(q);
                }
                let host = url
                    .host_str()
                    .map(|h| match url.port() {
                        Some(p) => format!("{h}:{p}"),
                        None => h.to_string(),
                    })
                    .unwrap_or_default();
                (path, host)
            }
            Err(_) => (self.url.clone(), String::new()),
        };

        let mut lines = vec![
            format!("{} {} HTTP/1.1", self.method, path),
            format!("Host: {host}"),
        ];
        for h in &self.headers {
            if h.key.is_empty() {
                continue;
            }
            lines.push(format!("{}: {}", h.key, h.value));
        }
        let cookie_line = self.cookie_header_value();
        if !cookie_line.is_empty() {
            lines.push(format!("Cookie: {cookie_line}"));
        }
        lines.push(String::new());
        lines.push(self.body.clone());
        lines.join("\n")
    }

    /// Cookies joined into a single `Cookie` header value.
    pub fn cookie_header_value(&self) -> String {
        self.cookies
            .iter()
            .filter(|c| !c.key.is_empty())
            .map(|c| format!("{}={}", c.key, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Parse an absolute URL, resolving host-relative input against the
/// placeholder base.
pub fn resolve_url(raw: &str) -> Result<Url, url::ParseError> {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw)
    } else {
        Url::parse(PLACEHOLDER_BASE)?.join(raw)
    }
}

/// Structured fields win over parsed raw-text fields when non-empty after
/// filtering; entries where both key and value are empty are dropped.
fn pick_pairs(structured: &[KeyValue], parsed: &[KeyValue]) -> Vec<KeyValue> {
    let filtered = filter_pairs(structured);
    if filtered.is_empty() {
        filter_pairs(parsed)
    } else {
        filtered
    }
}

fn filter_pairs(pairs: &[KeyValue]) -> Vec<KeyValue> {
    pairs
        .iter()
        .filter(|kv| !(kv.key.is_empty() && kv.value.is_empty()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parse_defaults_to_get() {
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse("TRACE"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Get);
    }

    #[test]
    fn method_body_gating() {
        assert!(!HttpMethod::Get.allows_body());
        assert!(!HttpMethod::Head.allows_body());
        assert!(HttpMethod::Post.allows_body());
        assert!(HttpMethod::Delete.allows_body());
    }

    #[test]
    fn empty_entries_are_filtered() {
        let input = AnalyzeRequest {
            method: "GET".into(),
            url: "https://example.com/".into(),
            headers: vec![
                KeyValue::new("", ""),
                KeyValue::new("X-Test", "1"),
                KeyValue::new("", "orphan-value"),
            ],
            ..Default::default()
        };
        let req = CanonicalRequest::from_input(&input);
        assert_eq!(req.headers.len(), 2);
        assert!(!req
            .headers
            .iter()
            .any(|kv| kv.key.is_empty() && kv.value.is_empty()));
    }

    #[test]
    fn url_query_params_fold_into_params() {
        let input = AnalyzeRequest {
            method: "GET".into(),
            url: "https://example.com/a?x=1".into(),
            ..Default::default()
        };
        let req = CanonicalRequest::from_input(&input);
        assert_eq!(req.params, vec![KeyValue::new("x", "1")]);
    }

    #[test]
    fn explicit_params_not_duplicated_from_url() {
        let input = AnalyzeRequest {
            url: "https://example.com/a?x=1".into(),
            params: vec![KeyValue::new("x", "1"), KeyValue::new("y", "2")],
            ..Default::default()
        };
        let req = CanonicalRequest::from_input(&input);
        assert_eq!(
            req.params,
            vec![KeyValue::new("x", "1"), KeyValue::new("y", "2")]
        );
    }

    #[test]
    fn merged_url_last_value_per_key_wins() {
        let input = AnalyzeRequest {
            url: "https://example.com/a?x=1&x=2".into(),
            params: vec![KeyValue::new("x", "3")],
            ..Default::default()
        };
        let req = CanonicalRequest::from_input(&input);
        let url = req.merged_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs, vec![("x".to_string(), "3".to_string())]);
    }

    #[test]
    fn host_relative_url_resolves_against_placeholder() {
        let url = resolve_url("/api/users?id=7").unwrap();
        assert_eq!(url.host_str(), Some("placeholder.local"));
        assert_eq!(url.path(), "/api/users");
    }

    #[test]
    fn query_string_skips_empty_keys_and_encodes() {
        let req = CanonicalRequest::from_input(&AnalyzeRequest {
            url: "https://example.com/".into(),
            params: vec![
                KeyValue::new("q", "a b"),
                KeyValue::new("", "dropped"),
                KeyValue::new("r", "1&2"),
            ],
            ..Default::default()
        });
        assert_eq!(req.query_string(), "q=a+b&r=1%262");
    }

    #[test]
    fn render_raw_includes_host_headers_and_cookie_line() {
        let req = CanonicalRequest::from_input(&AnalyzeRequest {
            method: "POST".into(),
            url: "https://api.example.com/login".into(),
            headers: vec![KeyValue::new("Content-Type", "application/json")],
            cookies: vec![
                KeyValue::new("sid", "abc"),
                KeyValue::new("theme", "dark"),
            ],
            body: r#"{"user":"admin"}"#.into(),
            ..Default::default()
        });
        let raw = req.render_raw();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines[0], "POST /login HTTP/1.1");
        assert_eq!(lines[1], "Host: api.example.com");
        assert!(lines.contains(&"Content-Type: application/json"));
        assert!(lines.contains(&"Cookie: sid=abc; theme=dark"));
        assert_eq!(*lines.last().unwrap(), r#"{"user":"admin"}"#);
    }

    #[test]
    fn structured_fields_take_precedence_over_raw() {
        let raw = "GET /old?a=1 HTTP/1.1\nHost: old.example.com\nX-Raw: yes\n\n";
        let input = AnalyzeRequest {
            method: "POST".into(),
            url: "https://new.example.com/new".into(),
            headers: vec![KeyValue::new("X-Explicit", "yes")],
            raw: raw.into(),
            ..Default::default()
        };
        let req = CanonicalRequest::from_input(&input);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://new.example.com/new");
        assert_eq!(req.headers, vec![KeyValue::new("X-Explicit", "yes")]);
        assert_eq!(req.raw.as_deref(), Some(raw));
    }
}
