//! HTTP transport for the AI artifact endpoints.
//!
//! The coordinator only knows the [`Transport`] trait. [`UreqTransport`]
//! implements it with the synchronous `ureq` client; it is called from a
//! worker thread (see [`crate::runtime::ThreadDispatcher`]), never from the
//! event loop itself.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::ApiConfig;

// ---------------------------------------------------------------------------
// Request / failure types
// ---------------------------------------------------------------------------

/// Request body shared by both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRequest {
    pub dax: String,
    #[serde(rename = "measureName")]
    pub measure_name: String,
}

/// Why a request produced no usable payload.
///
/// A 2xx response with an unexpected shape is not a failure at this level;
/// the coordinator judges the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Connection, DNS, timeout, or other transport-level error.
    Transport(String),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// A 2xx response whose body was not JSON.
    Decode(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "transport error: {detail}"),
            Self::Status(code) => write!(f, "server responded with status {code}"),
            Self::Decode(detail) => write!(f, "invalid JSON response: {detail}"),
        }
    }
}

/// Performs one POST against the backend.
pub trait Transport: Send + Sync {
    fn post(&self, endpoint: &str, body: &ArtifactRequest) -> Result<Value, FetchFailure>;
}

// ---------------------------------------------------------------------------
// ureq implementation
// ---------------------------------------------------------------------------

/// Blocking HTTP transport.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    base_url: String,
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        let url = format!("{}{}", self.base_url, endpoint);
        // On Windows, "localhost" may try IPv6 (::1) first, causing delays
        // when the server only binds to IPv4.
        url.replace("://localhost", "://127.0.0.1")
    }
}

impl Transport for UreqTransport {
    fn post(&self, endpoint: &str, body: &ArtifactRequest) -> Result<Value, FetchFailure> {
        let result = ureq::post(&self.url_for(endpoint))
            .timeout(self.timeout)
            .send_json(body);

        match result {
            Ok(resp) => resp
                .into_json::<Value>()
                .map_err(|e| FetchFailure::Decode(e.to_string())),
            Err(ureq::Error::Status(code, _)) => Err(FetchFailure::Status(code)),
            Err(e) => Err(FetchFailure::Transport(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
