// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock remote backend for deterministic testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use helmsman_core::{GenerationRequest, HelmsmanError, RemoteBackend};

/// A mock remote API with a FIFO queue of scripted outcomes.
///
/// When the queue is empty, a default "mock response" text is returned.
pub struct MockRemoteBackend {
    name: String,
    outcomes: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
    /// When set, every call fails regardless of the queue.
    always_fail: bool,
}

impl MockRemoteBackend {
    /// Create a mock backend with an empty outcome queue.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            always_fail: false,
        }
    }

    /// Create a mock backend that fails every call.
    pub fn always_failing(name: impl Into<String>) -> Self {
        let mut backend = Self::new(name);
        backend.always_fail = true;
        backend
    }

    /// Queue a successful outcome.
    pub async fn push_response(&self, text: impl Into<String>) {
        self.outcomes.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failed outcome.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.outcomes.lock().await.push_back(Err(message.into()));
    }

    /// Number of generate calls received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteBackend for MockRemoteBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, HelmsmanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.always_fail {
            return Err(HelmsmanError::Backend {
                name: self.name.clone(),
                message: "scripted permanent failure".into(),
                source: None,
            });
        }

        match self.outcomes.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(HelmsmanError::Backend {
                name: self.name.clone(),
                message,
                source: None,
            }),
            None => Ok("mock response".to_string()),
        }
    }
}
