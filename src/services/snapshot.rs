//! Response snapshotter: a single bounded, best-effort replay of the
//! canonical request against the real network.
//!
//! Infallible from the caller's view: every failure mode (bad URL, invalid
//! header, DNS, TLS, timeout, body read) collapses into a structurally
//! valid snapshot with `status = 0` and `status_text = "NETWORK_ERROR"`.

use std::time::Duration;

use chrono::Utc;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::Method;

use crate::models::analysis::{HeaderPair, ResponseSnapshot};
use crate::models::request::{CanonicalRequest, HttpMethod};
use crate::services::prompt::truncate_chars;

/// Hard bound on the replay call, end to end.
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Maximum characters captured from a textual response body.
const BODY_PREVIEW_CAP: usize = 10_000;

/// Capture a snapshot of the live response to `request`.
pub async fn capture(request: &CanonicalRequest) -> ResponseSnapshot {
    capture_with_timeout(request, FETCH_TIMEOUT).await
}

/// Capture with an explicit deadline. The `tokio::time::timeout` wrapper
/// guarantees the bound fires on every path; the per-request reqwest
/// timeout releases the underlying connection.
pub async fn capture_with_timeout(
    request: &CanonicalRequest,
    timeout: Duration,
) -> ResponseSnapshot {
    match tokio::time::timeout(timeout, execute(request, timeout)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            tracing::warn!(url = %request.url, error = %e, "Replay failed; using sentinel snapshot");
            failure_snapshot(request, e.to_string())
        }
        Err(_) => {
            tracing::warn!(url = %request.url, "Replay timed out; using sentinel snapshot");
            failure_snapshot(
                request,
                format!("Request aborted after {}s timeout", timeout.as_secs()),
            )
        }
    }
}

async fn execute(
    request: &CanonicalRequest,
    timeout: Duration,
) -> anyhow::Result<ResponseSnapshot> {
    let url = request.merged_url()?;

    // Redirects are followed by the client's default policy.
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut headers = HeaderMap::new();
    for kv in &request.headers {
        if kv.key.is_empty() {
            continue;
        }
        // Structurally invalid pairs are skipped, never abort the call.
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(kv.key.as_bytes()),
            HeaderValue::from_str(&kv.value),
        ) {
            headers.append(name, value);
        }
    }

    let cookie_str = request.cookie_header_value();
    if !cookie_str.is_empty() {
        let merged = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{existing}; {cookie_str}"),
            _ => cookie_str,
        };
        if let Ok(value) = HeaderValue::from_str(&merged) {
            headers.insert(COOKIE, value);
        }
    }

    let method = match request.method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    };

    let mut builder = client.request(method, url).headers(headers);
    if request.method.allows_body() && !request.body.is_empty() {
        builder = builder.body(request.body.clone());
    }

    let response = builder.send().await?;

    let final_url = response.url().to_string();
    let status = response.status();
    let header_pairs: Vec<HeaderPair> = response
        .headers()
        .iter()
        .map(|(name, value)| HeaderPair {
            name: name.to_string(),
            value: value.to_str().unwrap_or("<non-ascii>").to_string(),
        })
        .collect();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_length = response.content_length();

    let body_preview = if is_text_like(content_type.as_deref()) {
        match response.text().await {
            Ok(text) => truncate_chars(&text, BODY_PREVIEW_CAP),
            Err(e) => format!("Failed to read response body: {e}"),
        }
    } else {
        format!(
            "[non-text content: {}; length={}]",
            content_type.as_deref().unwrap_or("unknown"),
            content_length
                .map(|l| l.to_string())
                .unwrap_or_else(|| "?".to_string())
        )
    };

    Ok(ResponseSnapshot {
        url: final_url,
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("").to_string(),
        headers: header_pairs,
        content_type,
        content_length,
        body_preview,
        fetched_at: Utc::now().to_rfc3339(),
    })
}

/// Sentinel snapshot carrying the failure message; still structurally valid
/// and fed to the prompt unchanged.
fn failure_snapshot(request: &CanonicalRequest, message: String) -> ResponseSnapshot {
    ResponseSnapshot {
        url: request.url.clone(),
        status: 0,
        status_text: "NETWORK_ERROR".to_string(),
        headers: Vec::new(),
        content_type: None,
        content_length: None,
        body_preview: message,
        fetched_at: Utc::now().to_rfc3339(),
    }
}

/// Absent or textual/JSON/XML/JS/form content types are read; everything
/// else is represented by a placeholder instead of raw bytes.
fn is_text_like(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return true;
    };
    let pattern = Regex::new(r"^(text/|application/(json|xml|javascript|x-www-form-urlencoded))")
        .expect("content-type regex is valid");
    pattern.is_match(ct)
}
