//! # HTTP Service
//!
//! Sends an assembled [`RequestDescriptor`] with reqwest and captures the
//! response for display and history.

use crate::error::{Error, Result};
use crate::history::HistoryEntry;
use crate::request::RequestDescriptor;
use reqwest::Method;
use std::time::{Duration, Instant};

/// A received response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub duration: Duration,
}

impl HttpResponse {
    /// Status line such as `200 OK`
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn duration_text(&self) -> String {
        format!("{}ms", self.duration.as_millis())
    }

    /// Body parsed as JSON, if it is JSON
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// History record of this response to `request`
    pub fn to_history_entry(&self, request: &RequestDescriptor) -> HistoryEntry {
        HistoryEntry::new(
            &request.method,
            &request.url,
            &self.status_line(),
            &self.duration_text(),
            &self.headers,
            &self.body,
        )
    }
}

/// Executes requests over one shared reqwest client
pub struct HttpService {
    client: reqwest::Client,
}

impl HttpService {
    pub fn new() -> Result<Self> {
        tracing::debug!("creating HTTP client");
        let client = reqwest::Client::builder()
            .user_agent(concat!("bluepreset/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::RequestFailed(format!("cannot create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Send the request and read the whole response
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<HttpResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| Error::InvalidMethod(request.method.clone()))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        tracing::info!("sending {} {}", request.method, request.url);
        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| Error::RequestFailed(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| Error::RequestFailed(format!("failed to read response body: {e}")))?;
        let duration = start.elapsed();

        tracing::debug!("received {} after {:?}", status, duration);
        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
            duration,
        })
    }
}
