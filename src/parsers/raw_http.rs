//! Raw HTTP wire-text parser.
//!
//! Grammar is deliberately forgiving: an unmatched request line leaves the
//! method unset and the path empty, header lines split on the first colon,
//! and everything after the first blank line is the body verbatim.

use regex::Regex;

use crate::models::request::KeyValue;
use crate::parsers::ParsedRequest;

/// Parse raw HTTP request text into partial canonical fields. Never fails.
pub fn parse(text: &str) -> ParsedRequest {
    let request_line = Regex::new(r"^([A-Z]+)\s+(\S+)\s+HTTP/(\d\.\d)")
        .expect("request-line regex is valid");

    let mut lines = text.lines();

    let mut method = None;
    let mut path = String::new();
    if let Some(first) = lines.next() {
        if let Some(caps) = request_line.captures(first.trim()) {
            method = Some(caps[1].to_string());
            path = caps[2].to_string();
        }
    }

    let mut headers: Vec<KeyValue> = Vec::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut in_body = false;
    for line in lines {
        if in_body {
            body_lines.push(line);
            continue;
        }
        if line.trim().is_empty() {
            in_body = true;
            continue;
        }
        if let Some(idx) = line.find(':') {
            headers.push(KeyValue::new(
                line[..idx].trim().to_string(),
                line[idx + 1..].trim().to_string(),
            ));
        }
    }
    let body = body_lines.join("\n");

    let host = header_value(&headers, "host").unwrap_or_default();
    let url = if path.starts_with("http://") || path.starts_with("https://") {
        path.clone()
    } else if !host.is_empty() {
        format!("https://{host}{path}")
    } else {
        path.clone()
    };

    let cookies = header_value(&headers, "cookie")
        .map(|header| {
            header
                .split(';')
                .filter_map(|entry| {
                    let entry = entry.trim();
                    if entry.is_empty() {
                        return None;
                    }
                    match entry.split_once('=') {
                        Some((k, v)) => Some(KeyValue::new(k, v)),
                        None => Some(KeyValue::new(entry, "")),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let params = query_params(&url);

    ParsedRequest {
        method,
        url: if url.is_empty() { None } else { Some(url) },
        headers,
        cookies,
        params,
        body: if body.is_empty() { None } else { Some(body) },
    }
}

/// Case-insensitive lookup of the first header with the given name.
fn header_value(headers: &[KeyValue], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.key.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

/// Percent-decoded key/value pairs from the URL's query component.
fn query_params(url: &str) -> Vec<KeyValue> {
    let query = match url.split_once('?') {
        Some((_, rest)) => rest.split('#').next().unwrap_or(""),
        None => return Vec::new(),
    };
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| KeyValue::new(k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_synthetic_request() {
        let text = "POST /login?next=%2Fhome HTTP/1.1\r\n\
                    Host: auth.example.com\r\n\
                    Content-Type: application/x-www-form-urlencoded\r\n\
                    Cookie: sid=abc123; theme=dark\r\n\
                    \r\n\
                    user=admin&pass=secret";

        let parsed = parse(text);
        assert_eq!(parsed.method.as_deref(), Some("POST"));
        assert_eq!(
            parsed.url.as_deref(),
            Some("https://auth.example.com/login?next=%2Fhome")
        );
        assert!(parsed
            .headers
            .contains(&KeyValue::new("Content-Type", "application/x-www-form-urlencoded")));
        assert_eq!(
            parsed.cookies,
            vec![KeyValue::new("sid", "abc123"), KeyValue::new("theme", "dark")]
        );
        assert_eq!(parsed.params, vec![KeyValue::new("next", "/home")]);
        assert_eq!(parsed.body.as_deref(), Some("user=admin&pass=secret"));
    }

    #[test]
    fn unmatched_request_line_yields_empty_fields() {
        let parsed = parse("not an http request\nstill not\n");
        assert!(parsed.method.is_none());
        assert!(parsed.url.is_none());
        // "still not" has no colon, so no header either.
        assert!(parsed.headers.is_empty());
    }

    #[test]
    fn absolute_path_skips_host_derivation() {
        let text = "GET https://direct.example.com/a?b=1 HTTP/1.1\nHost: ignored.example.com\n\n";
        let parsed = parse(text);
        assert_eq!(parsed.url.as_deref(), Some("https://direct.example.com/a?b=1"));
        assert_eq!(parsed.params, vec![KeyValue::new("b", "1")]);
    }

    #[test]
    fn cookie_value_keeps_embedded_equals() {
        let text = "GET / HTTP/1.1\nHost: x.example.com\nCookie: token=a=b=c\n\n";
        let parsed = parse(text);
        assert_eq!(parsed.cookies, vec![KeyValue::new("token", "a=b=c")]);
    }

    #[test]
    fn multiline_body_preserved_verbatim() {
        let text = "POST /x HTTP/1.1\nHost: h\n\nline one\n\nline three";
        let parsed = parse(text);
        assert_eq!(parsed.body.as_deref(), Some("line one\n\nline three"));
    }
}
