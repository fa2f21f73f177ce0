use std::fmt::Write;

use crate::types::Request;

/// Serialize a [`Request`] to a JSON string.
///
/// When `pretty` is `true` the output is indented for readability.
pub fn format_json<B: AsRef<[u8]>>(request: &Request<B>, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(request)
    } else {
        serde_json::to_string(request)
    };
    rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

/// Render a [`Request`] in a human-readable debug format.
pub fn format_debug<B: AsRef<[u8]>>(request: &Request<B>) -> String {
    let mut out = String::with_capacity(256);

    out.push_str("=== HTTP Request ===\n");
    let _ = writeln!(out, "Method:  {}", request.method);
    let _ = writeln!(out, "Target:  {}", request.target);
    let _ = writeln!(out, "Version: {}", request.version);

    let _ = writeln!(out, "\n--- Headers ({}) ---", request.headers.len());
    for header in &request.headers {
        let _ = writeln!(out, "  {}: {}", header.name, header.value);
    }

    match request.body_bytes() {
        Some(body) => {
            let _ = writeln!(out, "\n--- Body ({} bytes) ---", body.len());
            match std::str::from_utf8(body) {
                Ok(s) => out.push_str(s),
                Err(_) => {
                    let _ = write!(out, "<binary data: {} bytes>", body.len());
                }
            }
            out.push('\n');
        }
        None => out.push_str("\n--- No Body ---\n"),
    }

    out.push_str("====================\n");
    out
}

/// Render only the start line and headers (no body).
pub fn format_headers_only<B>(request: &Request<B>) -> String {
    let mut out = String::with_capacity(64 + request.headers.len() * 40);

    let _ = writeln!(out, "{} {} {}", request.method, request.target, request.version);
    for header in &request.headers {
        let _ = writeln!(out, "{}: {}", header.name, header.value);
    }

    out
}
