//! Reqwest-based client for the visualization service.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use anyhow::Result;
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::Config,
    language::Language,
    protocol::{VisualizeRequest, VisualizeResponse},
};

pub const EMPTY_CODE_MESSAGE: &str = "Please enter some code before generating a visualization";
pub const CONNECTION_MESSAGE: &str = "Error connecting to the server.";
pub const FALLBACK_SERVER_MESSAGE: &str = "Failed to generate visualization";

/// Errors surfaced to the user. `Display` is the exact text to show.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualizeError {
    #[error("{}", EMPTY_CODE_MESSAGE)]
    EmptyCode,
    /// Message reported by the service, verbatim.
    #[error("{0}")]
    Server(String),
    #[error("{}", CONNECTION_MESSAGE)]
    Connection,
    #[error("A visualization is already being generated")]
    Busy,
}

/// A rendered chart the service handed back.
#[derive(Debug, Clone, PartialEq)]
pub struct Visualization {
    /// `visualizationUrl` resolved against the server origin.
    pub url: String,
    pub response: VisualizeResponse,
}

#[derive(Debug)]
pub struct VisualizeClient {
    http: reqwest::Client,
    origin: String,
    in_flight: AtomicBool,
}

impl VisualizeClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.server_origin(), request_timeout(cfg))
    }

    /// `timeout` of `None` waits for the service indefinitely.
    pub fn new(origin: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            origin: origin.trim_end_matches('/').to_string(),
            in_flight: AtomicBool::new(false),
        })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submit `code` for rendering. Empty code fails before any request is made,
    /// and a submission while another is pending fails with [`VisualizeError::Busy`].
    pub async fn visualize(
        &self,
        code: &str,
        language: Language,
    ) -> Result<Visualization, VisualizeError> {
        if code.trim().is_empty() {
            return Err(VisualizeError::EmptyCode);
        }
        let _guard = InFlight::acquire(&self.in_flight).ok_or(VisualizeError::Busy)?;

        let url = format!("{}/api/visualize", self.origin);
        let body = VisualizeRequest { code: code.to_string(), language };
        info!(%url, %language, bytes = code.len(), "submitting visualization request");

        let resp = self
            .http
            .post(&url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                debug!(error = %e, "visualization request failed to send");
                VisualizeError::Connection
            })?;

        let status = resp.status();
        let payload: Value = resp.json().await.map_err(|e| {
            debug!(%status, error = %e, "visualization response was not JSON");
            VisualizeError::Connection
        })?;

        if !status.is_success() {
            let message = payload
                .get("error")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(FALLBACK_SERVER_MESSAGE)
                .to_string();
            debug!(%status, %message, "visualization service reported an error");
            return Err(VisualizeError::Server(message));
        }

        let response: VisualizeResponse = serde_json::from_value(payload).map_err(|e| {
            debug!(error = %e, "success response lacked visualizationUrl");
            VisualizeError::Connection
        })?;
        let url = resolve_url(&self.origin, &response.visualization_url);
        info!(%url, kind = ?response.kind, viz_id = ?response.viz_id, "visualization ready");
        Ok(Visualization { url, response })
    }
}

/// `REQUEST_TIMEOUT` in seconds; unset or 0 means no timeout.
pub fn request_timeout(cfg: &Config) -> Option<Duration> {
    cfg.get_u64("REQUEST_TIMEOUT")
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Join a server-relative path onto an origin.
pub fn resolve_url(origin: &str, path: &str) -> String {
    let origin = origin.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", origin, path)
    } else {
        format!("{}/{}", origin, path)
    }
}

/// Clears the in-flight flag when the request finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
