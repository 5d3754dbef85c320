//! Just enough HTTP/1.1 for one request and one response per connection.

use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Upper-cased.
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

impl HttpRequest {
    /// Parse the request line out of the raw bytes read from the socket.
    /// Headers and body are ignored. `None` when the request line is unusable.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(raw).ok()?;
        let line = text.split("\r\n").next()?;
        let mut parts = line.split_whitespace();
        let method = parts.next()?.to_ascii_uppercase();
        let target = parts.next()?;

        // Origin form only. The path is kept verbatim, without dot-segment folding.
        if !target.starts_with('/') {
            return None;
        }
        let target = target.split('#').next().unwrap_or(target);
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let query = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Some(Self {
            method,
            path: path.to_string(),
            query,
        })
    }

    /// The query parameter `name`, if present and non-empty.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

pub const JSON: &str = "application/json; charset=utf-8";
pub const YAML: &str = "application/yaml; charset=utf-8";

impl HttpResponse {
    /// JSON body with object keys in sorted order.
    pub fn json(status: u16, payload: &impl Serialize) -> Self {
        // serde_json::Value keeps objects in a BTreeMap, so round-tripping sorts keys.
        let body = serde_json::to_value(payload)
            .and_then(|v| serde_json::to_vec(&v))
            .unwrap_or_else(|_| b"{}".to_vec());
        Self {
            status,
            reason: reason_phrase(status),
            content_type: JSON,
            body,
        }
    }

    pub fn error(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self::json(
            status,
            &ErrorBody {
                error: code.to_string(),
                message: message.into(),
            },
        )
    }

    pub fn text(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason_phrase(status),
            content_type,
            body: body.into(),
        }
    }

    /// Status line, headers and body, ready to write to the socket.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status,
            self.reason,
            self.content_type,
            self.body.len()
        )
        .into_bytes();
        out.extend_from_slice(&self.body);
        out
    }

    /// Body parsed as JSON. Test and client convenience.
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
