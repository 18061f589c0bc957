//! HTTP transport abstraction
//!
//! A transport performs exactly one GET and never follows redirects itself;
//! redirect handling lives in `RegistryClient` so the chain can be bounded.

use crate::error::{StageError, StageResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

/// Upper bound on a buffered response body (the platform tarballs are well below this)
const MAX_BODY_BYTES: u64 = 1024 * 1024 * 1024;

/// One HTTP response, fully buffered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// `Location` header, if present
    pub location: Option<String>,
    /// Response body (empty for non-2xx responses)
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Whether the status is in [200, 300)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is one of the followed redirect codes
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 307 | 308)
    }
}

/// Single-request HTTP GET
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET without following redirects
    async fn get(&self, url: &str) -> StageResult<RawResponse>;
}

/// Transport backed by a blocking `ureq` agent run on the blocking pool
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport with an optional whole-request timeout
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(timeout)
            .max_redirects(0)
            .max_redirects_will_error(false)
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn get(&self, url: &str) -> StageResult<RawResponse> {
        let agent = self.agent.clone();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || get_blocking(&agent, &url))
            .await
            .map_err(|e| StageError::Internal(format!("request task failed: {e}")))?
    }
}

fn get_blocking(agent: &Agent, url: &str) -> StageResult<RawResponse> {
    debug!("GET {}", url);

    let mut response = agent
        .get(url)
        .call()
        .map_err(|e| StageError::network(url, e.to_string()))?;

    let status = response.status().as_u16();
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = if (200..300).contains(&status) {
        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| StageError::network(url, e.to_string()))?
    } else {
        Vec::new()
    };

    debug!("GET {} -> {} ({} bytes)", url, status, body.len());
    Ok(RawResponse {
        status,
        location,
        body,
    })
}
