//! Gateway response formatting.
//!
//! Drains the application body and shapes status, headers and body into
//! the JSON object API Gateway or an ALB expects back from the function.

use base64::{engine::general_purpose, Engine as _};
use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use crate::app::AppResponse;
use crate::config::AdapterConfig;
use crate::error::Result;
use crate::event::{Dialect, HttpEvent};
use crate::headers::{split_values, HeaderCollection};

/// The function's reply to an HTTP event. Absent fields are omitted from
/// the JSON entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<IndexMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_base64_encoded: Option<bool>,
}

pub fn format_response(
    event: &HttpEvent,
    response: AppResponse,
    config: &AdapterConfig,
) -> Result<GatewayResponse> {
    let AppResponse {
        status,
        headers,
        body,
    } = response;
    let body = body.drain()?;

    let mut formatted = GatewayResponse {
        status_code: status,
        headers: None,
        multi_value_headers: None,
        status_description: None,
        body: None,
        is_base64_encoded: None,
    };

    if event.uses_multi_value_headers() {
        formatted.multi_value_headers = Some(grouped_headers(&headers));
    } else {
        formatted.headers = Some(split_headers(&headers));
    }

    if event.dialect() == Dialect::LoadBalancer {
        formatted.status_description = Some(status_description(status));
    }

    if !body.is_empty() {
        let (body, is_base64_encoded) = encode_body(body, &headers, config);
        formatted.body = Some(body);
        formatted.is_base64_encoded = Some(is_base64_encoded);
    }

    Ok(formatted)
}

/// `"<code> <reason phrase>"`, as ALB target groups require.
pub fn status_description(status: u16) -> String {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or_default();
    format!("{status} {reason}")
}

/// Whether a response body can be returned as text.
///
/// Any `Content-Encoding` means binary. A missing `Content-Type` counts
/// as `text/plain`.
pub fn is_text_response(headers: &HeaderCollection, config: &AdapterConfig) -> bool {
    if headers.contains("Content-Encoding") {
        return false;
    }
    let mime_type = headers.get_or("Content-Type", "text/plain");
    mime_type.starts_with("text/") || config.text_mime_types().any(|t| t == mime_type)
}

fn encode_body(body: Vec<u8>, headers: &HeaderCollection, config: &AdapterConfig) -> (String, bool) {
    if !is_text_response(headers, config) {
        return (general_purpose::STANDARD.encode(body), true);
    }
    // Text that is not UTF-8 cannot travel as a JSON string.
    match String::from_utf8(body) {
        Ok(text) => (text, false),
        Err(err) => (general_purpose::STANDARD.encode(err.into_bytes()), true),
    }
}

fn grouped_headers(headers: &HeaderCollection) -> IndexMap<String, Vec<String>> {
    headers
        .iter()
        .map(|(name, value)| {
            let values = split_values(value).into_iter().map(str::to_string).collect();
            (name.to_string(), values)
        })
        .collect()
}

/// One value per key. A header with several occurrences is spread over
/// differently-cased spellings of its name, which the gateway forwards as
/// distinct keys.
fn split_headers(headers: &HeaderCollection) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for (name, value) in headers.iter() {
        let values = split_values(value);
        if values.len() < 2 {
            out.insert(name.to_string(), value.to_string());
            continue;
        }

        let mut casings = Casings::new(name);
        for (i, value) in values.iter().enumerate() {
            match casings.next() {
                Some(casing) => {
                    out.insert(casing, value.to_string());
                }
                None => {
                    warn!(
                        header = name,
                        dropped = values.len() - i,
                        "not enough casings of header name to carry every value"
                    );
                    break;
                }
            }
        }
    }
    out
}

/// Every upper/lower-case spelling of a name, generated lazily.
///
/// Only ASCII letters vary. The first spelling is all lower case and the
/// leftmost letter flips fastest, so `"ab"` yields `ab`, `Ab`, `aB`, `AB`.
#[derive(Debug, Clone)]
pub struct Casings {
    chars: Vec<char>,
    letters: Vec<usize>,
    upper: Option<Vec<bool>>,
}

impl Casings {
    pub fn new(name: &str) -> Self {
        let chars: Vec<char> = name.chars().collect();
        let letters: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .collect();
        let upper = Some(vec![false; letters.len()]);
        Self {
            chars,
            letters,
            upper,
        }
    }
}

impl Iterator for Casings {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let upper = self.upper.as_mut()?;

        let mut casing = self.chars.clone();
        for (&pos, &up) in self.letters.iter().zip(upper.iter()) {
            casing[pos] = if up {
                casing[pos].to_ascii_uppercase()
            } else {
                casing[pos].to_ascii_lowercase()
            };
        }

        // Binary increment, least significant letter first.
        let mut exhausted = true;
        for flag in upper.iter_mut() {
            if *flag {
                *flag = false;
            } else {
                *flag = true;
                exhausted = false;
                break;
            }
        }
        if exhausted {
            self.upper = None;
        }

        Some(casing.into_iter().collect())
    }
}
