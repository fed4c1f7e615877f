//! Batch response decoding.
//!
//! Splits the multipart body at its top-level boundary, recursively
//! re-splits nested changeset parts, restores changeset item order from
//! `Content-ID` and reconstructs one [`HttpOutcome`] per sub-request.
//! Framing corruption fails the whole batch; a sub-response's own non-2xx
//! status does not.

use odata_query::HttpOutcome;
use serde_json::Value as Json;

use crate::errors::{BatchError, BatchResult};

/// Decode a full batch response body.
///
/// Outcomes come back in sub-request order: top-level parts in wire order,
/// changeset members sorted by their `Content-ID`.
///
/// # Errors
/// Returns `BatchError` on missing boundaries, truncated payloads or parts
/// that do not reconstruct into an HTTP response.
pub fn parse_response(content_type: &str, body: &str) -> BatchResult<Vec<HttpOutcome>> {
    let boundary = extract_boundary(content_type)?;
    let parts = split_parts(body, &boundary)?;
    tracing::debug!(parts = parts.len(), %boundary, "parsed batch response");

    let mut outcomes = Vec::with_capacity(parts.len());
    for part in parts {
        let (headers, payload) = split_headers(part)?;
        match header_value(&headers, "content-type") {
            Some(value) if value.to_ascii_lowercase().contains("multipart/mixed") => {
                outcomes.extend(parse_changeset(value, payload)?);
            }
            _ => outcomes.push(parse_http_response(payload)?),
        }
    }
    Ok(outcomes)
}

fn parse_changeset(content_type: &str, payload: &str) -> BatchResult<Vec<HttpOutcome>> {
    let boundary = extract_boundary(content_type)?;
    let parts = split_parts(payload, &boundary)?;

    let mut numbered: Vec<(usize, HttpOutcome)> = Vec::with_capacity(parts.len());
    for (position, part) in parts.into_iter().enumerate() {
        let (headers, inner) = split_headers(part)?;
        let content_id = header_value(&headers, "content-id")
            .and_then(|id| id.trim().parse::<usize>().ok())
            .unwrap_or(position + 1);
        numbered.push((content_id, parse_http_response(inner)?));
    }
    numbered.sort_by_key(|(content_id, _)| *content_id);
    Ok(numbered.into_iter().map(|(_, outcome)| outcome).collect())
}

/// Pull the `boundary` parameter out of a `Content-Type` value.
fn extract_boundary(content_type: &str) -> BatchResult<String> {
    for param in content_type.split(';').skip(1) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("boundary") {
            let token = value.trim().trim_matches('"');
            if !token.is_empty() {
                return Ok(token.to_owned());
            }
        }
    }
    Err(BatchError::MissingBoundary(content_type.to_owned()))
}

/// Cut the body into the chunks between boundary delimiter lines.
fn split_parts<'a>(body: &'a str, boundary: &str) -> BatchResult<Vec<&'a str>> {
    let open = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut closed = false;
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == close {
            if let Some(from) = start.take() {
                parts.push(&body[from..offset]);
            }
            closed = true;
            break;
        }
        if trimmed == open {
            if let Some(from) = start {
                parts.push(&body[from..offset]);
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }
    if !closed {
        return Err(BatchError::UnexpectedEnd);
    }
    Ok(parts)
}

/// Split one part into its MIME headers and the payload after the blank line.
fn split_headers(part: &str) -> BatchResult<(Vec<(String, String)>, &str)> {
    let mut headers = Vec::new();
    let mut offset = 0;
    for line in part.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        offset += line.len();
        if trimmed.is_empty() {
            return Ok((headers, &part[offset..]));
        }
        let Some((name, value)) = trimmed.split_once(':') else {
            return Err(BatchError::MalformedPart(format!(
                "header line without colon: {trimmed}"
            )));
        };
        headers.push((name.trim().to_owned(), value.trim().to_owned()));
    }
    // Headers without a payload are fine for bodiless parts.
    Ok((headers, ""))
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Reconstruct an embedded `application/http` response.
fn parse_http_response(payload: &str) -> BatchResult<HttpOutcome> {
    let mut lines = payload.split_inclusive('\n');
    let status_line = lines
        .next()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.is_empty())
        .ok_or_else(|| BatchError::MalformedPart("empty response part".to_owned()))?;

    // "HTTP/1.1 404 Not Found"
    let mut pieces = status_line.splitn(3, ' ');
    let version = pieces.next().unwrap_or_default();
    if !version.starts_with("HTTP/") {
        return Err(BatchError::MalformedPart(format!(
            "bad status line: {status_line}"
        )));
    }
    let status = pieces
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| BatchError::MalformedPart(format!("bad status line: {status_line}")))?;
    let status_text = pieces.next().unwrap_or_default().to_owned();

    let rest = &payload[status_line.len()..];
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest);
    let (headers, body_text) = split_headers(rest)?;

    let trimmed = body_text.trim();
    let body = if trimmed.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str(trimmed)
                .unwrap_or_else(|_| Json::String(trimmed.to_owned())),
        )
    };

    Ok(HttpOutcome {
        status,
        status_text,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CT: &str = "multipart/mixed; boundary=b1";

    fn wire(lines: &[&str]) -> String {
        let mut out = lines.join("\r\n");
        out.push_str("\r\n");
        out
    }

    #[test]
    fn single_get_response() {
        let body = wire(&[
            "--b1",
            "Content-Type: application/http",
            "",
            "HTTP/1.1 200 OK",
            "Content-Type: application/json",
            "",
            "{\"FirstName\":\"Russell\"}",
            "--b1--",
        ]);
        let outcomes = parse_response(CT, &body).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, 200);
        assert_eq!(outcomes[0].body, Some(json!({"FirstName": "Russell"})));
    }

    #[test]
    fn changeset_items_reorder_by_content_id() {
        let body = wire(&[
            "--b1",
            "Content-Type: multipart/mixed; boundary=cs",
            "",
            "--cs",
            "Content-Type: application/http",
            "Content-ID: 2",
            "",
            "HTTP/1.1 204 No Content",
            "",
            "--cs",
            "Content-Type: application/http",
            "Content-ID: 1",
            "",
            "HTTP/1.1 201 Created",
            "",
            "{\"id\":1}",
            "--cs--",
            "--b1--",
        ]);
        let outcomes = parse_response(CT, &body).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, 201);
        assert_eq!(outcomes[1].status, 204);
    }

    #[test]
    fn non_2xx_item_is_an_outcome_not_an_error() {
        let body = wire(&[
            "--b1",
            "Content-Type: application/http",
            "",
            "HTTP/1.1 404 Not Found",
            "Content-Type: application/json",
            "",
            "{\"error\":{\"code\":\"NotFound\"}}",
            "--b1--",
        ]);
        let outcomes = parse_response(CT, &body).unwrap();
        assert!(!outcomes[0].is_success());
        assert_eq!(outcomes[0].status_text, "Not Found");
        assert_eq!(outcomes[0].body, Some(json!({"error": {"code": "NotFound"}})));
    }

    #[test]
    fn missing_boundary_parameter_fails() {
        assert!(matches!(
            parse_response("multipart/mixed", "--x--\r\n"),
            Err(BatchError::MissingBoundary(_))
        ));
    }

    #[test]
    fn truncated_payload_fails() {
        let body = wire(&[
            "--b1",
            "Content-Type: application/http",
            "",
            "HTTP/1.1 200 OK",
            "",
        ]);
        assert!(matches!(parse_response(CT, &body), Err(BatchError::UnexpectedEnd)));
    }

    #[test]
    fn quoted_boundary_parses() {
        assert_eq!(
            extract_boundary("multipart/mixed; boundary=\"b-2\"").unwrap(),
            "b-2"
        );
    }
}
