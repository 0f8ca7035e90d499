//! # Request Assembly
//!
//! Builds one outbound request from the four request-bearing documents.
//! Each field comes from exactly one document:
//!
//! | Field   | Source                                   |
//! |---------|------------------------------------------|
//! | method  | `request.method`, uppercased, or `GET`   |
//! | url     | `request.url` (required)                 |
//! | timeout | `request.timeout` seconds, or 30         |
//! | headers | every key of `headers`, empties dropped  |
//! | query   | every key of `query`, empties dropped    |
//! | body    | whole `body` document as a JSON object   |

use super::validation::validate_method;
use crate::config::{DEFAULT_HTTP_METHOD, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::store::Document;
use std::fmt;
use std::time::Duration;

const CONTENT_TYPE: &str = "Content-Type";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything the HTTP layer needs to send one request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    pub timeout: Duration,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.method, self.url)?;
        writeln!(f, "timeout: {}s", self.timeout.as_secs())?;
        for (key, value) in &self.query {
            writeln!(f, "query {key}: {value}")?;
        }
        for (key, value) in &self.headers {
            writeln!(f, "{key}: {value}")?;
        }
        if let Some(body) = &self.body {
            writeln!(f)?;
            writeln!(f, "{body}")?;
        }
        Ok(())
    }
}

/// Assemble a request. Fails with [`Error::MissingUrl`] when `request.url` is
/// empty, whatever the other documents hold.
pub fn build(
    request: &Document,
    headers: &Document,
    body: &Document,
    query: &Document,
) -> Result<RequestDescriptor> {
    let url = request.get_as_string("url");
    if url.is_empty() {
        return Err(Error::MissingUrl);
    }

    let method = match request.get_as_string("method") {
        m if m.is_empty() => DEFAULT_HTTP_METHOD.to_string(),
        m => m.to_ascii_uppercase(),
    };
    validate_method(&method)?;

    let timeout = request
        .get_as_int("timeout")
        .filter(|secs| *secs > 0)
        .map(|secs| secs as u64)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let mut header_pairs = non_empty_pairs(headers);
    let query_pairs = non_empty_pairs(query);

    let body = if body.is_empty() {
        None
    } else {
        let json = body.to_json()?;
        let has_content_type = header_pairs
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case(CONTENT_TYPE));
        if !has_content_type {
            header_pairs.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        Some(json)
    };

    tracing::debug!("assembled {} {}", method, url);
    Ok(RequestDescriptor {
        method,
        url,
        timeout: Duration::from_secs(timeout),
        headers: header_pairs,
        query: query_pairs,
        body,
    })
}

pub(crate) fn non_empty_pairs(document: &Document) -> Vec<(String, String)> {
    document
        .keys()
        .into_iter()
        .filter_map(|key| {
            let value = document.get_as_string(&key);
            (!value.is_empty()).then_some((key, value))
        })
        .collect()
}
