//! Scripted transport for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::request::{Method, Request};
use super::transport::Transport;
use super::ApiError;

/// Replays queued outcomes in order and records every request it sees.
/// Once the script runs dry every call fails with a 503.
#[derive(Default)]
pub(crate) struct MockTransport {
    script: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, value: Value) -> &Self {
        self.push(Ok(value))
    }

    pub(crate) fn fail(&self, status: u16, message: &str) -> &Self {
        self.push(Err(ApiError::Transport {
            status,
            message: message.to_string(),
        }))
    }

    pub(crate) fn push(&self, outcome: Result<Value, ApiError>) -> &Self {
        self.script.lock().expect("script lock").push_back(outcome);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Request> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub(crate) fn calls_to(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &Request) -> Result<Value, ApiError> {
        self.calls.lock().expect("calls lock").push(request.clone());
        // Behave like a real network call: suspend at least once
        tokio::task::yield_now().await;
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    status: 503,
                    message: "no scripted response".to_string(),
                })
            })
    }
}
