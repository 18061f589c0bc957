//! Scripted in-memory transport for tests

use super::transport::{RawResponse, Transport};
use crate::error::StageResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Transport that answers from a route table and records every request.
/// Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTransport {
    routes: Arc<Mutex<HashMap<String, RawResponse>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, url: &str, status: u16, location: Option<&str>, body: Vec<u8>) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            RawResponse {
                status,
                location: location.map(str::to_string),
                body,
            },
        );
    }

    pub(crate) fn ok(&self, url: &str, body: Vec<u8>) {
        self.respond(url, 200, None, body);
    }

    pub(crate) fn redirect(&self, url: &str, status: u16, location: &str) {
        self.respond(url, status, Some(location), vec![]);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn reset_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> StageResult<RawResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let response = self.routes.lock().unwrap().get(url).cloned();
        Ok(response.unwrap_or(RawResponse {
            status: 404,
            location: None,
            body: vec![],
        }))
    }
}
