//! Deterministic prompt construction from the canonical request and the
//! optional response snapshot.
//!
//! Truncation limits are hard character caps applied to the serialized
//! strings, not token-aware; they exist only to bound prompt size.

use crate::models::analysis::ResponseSnapshot;
use crate::models::request::CanonicalRequest;

/// Request body cap in the prompt.
const BODY_CAP: usize = 4_000;
/// User-supplied raw text cap.
const RAW_CAP: usize = 7_000;
/// Response body preview cap.
const RESPONSE_BODY_CAP: usize = 8_000;

/// Render the analysis instruction. Pure: identical inputs (including the
/// snapshot's caller-supplied timestamp) yield identical output.
pub fn build(
    request: &CanonicalRequest,
    snapshot: Option<&ResponseSnapshot>,
    headers_only: bool,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(
        "You are a senior application security analyst. Analyze the HTTP request and, \
         if provided, the server response. Produce a combined, practical security report."
            .to_string(),
    );
    lines.push(String::new());
    lines.push("Task requirements:".to_string());
    lines.push("- Consider headers, query parameters, cookies, and body of the request.".to_string());
    if snapshot.is_some() {
        if headers_only {
            lines.push(
                "- Focus ONLY on the response headers in combination with the request context. \
                 Explain each header's purpose in clear terms, mark if it appears non-standard, \
                 evaluate security implications (CORS, cache, CSP, cookies, HSTS, referrer-policy, \
                 x-frame-options, x-content-type-options, etc.)."
                    .to_string(),
            );
            lines.push(
                "- Provide issues and concrete recommendations per header, with practical \
                 command examples (curl, nuclei, etc.)."
                    .to_string(),
            );
            lines.push(
                "- Keep findings concise and prioritize risk. Still return overall summary and next steps."
                    .to_string(),
            );
        } else {
            lines.push(
                "- If response is provided: analyze status, headers, and body for security \
                 implications (info leaks, CORS, cache control, cookies, error disclosure, \
                 SSRF reflections, HTML/JSON issues, etc.)."
                    .to_string(),
            );
        }
    }
    lines.push(
        "- Identify injection points (SQLi, XSS, SSTI), auth/session weaknesses, CSRF, SSRF, \
         IDOR, deserialization, misconfiguration."
            .to_string(),
    );
    lines.push(
        "- Include practical commands for tools (curl, wget, sqlmap, ffuf, nuclei, nmap, \
         jwt-tool, zap/burp, etc.)."
            .to_string(),
    );
    lines.push("- Recommend secure configurations for each header/cookie suspected weak.".to_string());
    lines.push("- Suggest fuzz lists or payload categories where applicable.".to_string());
    lines.push(String::new());
    lines.push("Request (normalized parts):".to_string());
    lines.push(format!("Method: {}", request.method));
    lines.push(format!("URL: {}", request.url));
    lines.push(format!("Params: {}", json(&request.params)));
    lines.push(format!("Headers: {}", json(&request.headers)));
    lines.push(format!("Cookies: {}", json(&request.cookies)));
    lines.push(format!("Body: {}", truncate_chars(&request.body, BODY_CAP)));
    if let Some(raw) = request.raw.as_deref().filter(|r| !r.is_empty()) {
        lines.push(String::new());
        lines.push("Raw request (user-supplied):".to_string());
        lines.push(truncate_chars(raw, RAW_CAP));
    }
    if let Some(resp) = snapshot {
        lines.push(String::new());
        lines.push("Response snapshot (from real request):".to_string());
        lines.push(format!("Status: {} {}", resp.status, resp.status_text));
        lines.push(format!("Headers: {}", json(&resp.headers)));
        if headers_only {
            lines.push("Body is intentionally excluded from analysis (header-only mode).".to_string());
        } else {
            lines.push(format!(
                "Body preview (first ~{RESPONSE_BODY_CAP} chars):\n{}",
                truncate_chars(&resp.body_preview, RESPONSE_BODY_CAP)
            ));
        }
    }
    lines.push(String::new());
    lines.push(
        "Return a concise but comprehensive structured object: httpInsights.headers must \
         include for each header: name, purpose (short explanation), isStandard (boolean), \
         issues, recommendations, exampleCommands."
            .to_string(),
    );
    lines.join("\n")
}

fn json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string())
}

/// Truncate to at most `cap` characters, respecting UTF-8 boundaries.
pub(crate) fn truncate_chars(s: &str, cap: usize) -> String {
    match s.char_indices().nth(cap) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
