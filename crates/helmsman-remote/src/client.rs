// SPDX-FileCopyrightText: 2026 Helmsman Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for OpenAI-compatible chat-completions endpoints.
//!
//! Provides [`OpenAiCompatClient`] which handles request construction,
//! bearer authentication, and transient error retry. Failures surface as
//! `HelmsmanError::Backend` for the circuit breaker and error budget to
//! interpret.

use std::time::Duration;

use async_trait::async_trait;
use helmsman_config::model::RemoteConfig;
use helmsman_core::{GenerationRequest, HelmsmanError, ModelDescriptor, RemoteBackend};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatMessage, ChatRequest, ChatResponse};

/// HTTP driver for one remote-api catalog entry.
///
/// The descriptor's `path_or_endpoint` is the API base (e.g.
/// `https://api.openai.com/v1`); the descriptor id doubles as the model
/// name requested from the endpoint and as the backend name used for
/// breaker bookkeeping.
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    name: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OpenAiCompatClient {
    /// Creates a client for the given backend.
    ///
    /// # Arguments
    /// * `name` - backend name for resilience bookkeeping
    /// * `base_url` - API base, without the `/chat/completions` suffix
    /// * `model` - model identifier requested from the endpoint
    /// * `api_key` - optional bearer token
    /// * `timeout` - per-request HTTP timeout
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, HelmsmanError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).map_err(|e| {
                    HelmsmanError::Config(format!("invalid API key header value: {e}"))
                })?,
            );
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let name = name.into();
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| HelmsmanError::Backend {
                name: name.clone(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_retries: 1,
        })
    }

    /// Build a client from a remote-api catalog entry.
    pub fn from_descriptor(
        descriptor: &ModelDescriptor,
        config: &RemoteConfig,
    ) -> Result<Self, HelmsmanError> {
        Self::new(
            descriptor.id.clone(),
            descriptor.path_or_endpoint.clone(),
            descriptor.id.clone(),
            config.api_key.as_deref(),
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send a request, retrying once on transient errors (429, 500,
    /// 503, 529) after a 1-second delay.
    async fn post_chat(&self, request: &ChatRequest) -> Result<ChatResponse, HelmsmanError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(backend = %self.name, attempt, "retrying request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(self.completions_url())
                .json(request)
                .send()
                .await
                .map_err(|e| HelmsmanError::Backend {
                    name: self.name.clone(),
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(backend = %self.name, status = %status, attempt, "response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| HelmsmanError::Backend {
                    name: self.name.clone(),
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| HelmsmanError::Backend {
                    name: self.name.clone(),
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(backend = %self.name, status = %status, body = %body, "transient error, will retry");
                last_error = Some(HelmsmanError::Backend {
                    name: self.name.clone(),
                    message: format!("API returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            // Non-transient error or exhausted retries.
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "API error ({}): {}",
                    api_err.error.type_.as_deref().unwrap_or("unknown"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(HelmsmanError::Backend {
                name: self.name.clone(),
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| HelmsmanError::Backend {
            name: self.name.clone(),
            message: "request failed after retries".into(),
            source: None,
        }))
    }
}

#[async_trait]
impl RemoteBackend for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, HelmsmanError> {
        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(request.prompt.clone())],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        let response = self.post_chat(&chat_request).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| HelmsmanError::Backend {
                name: self.name.clone(),
                message: "API response contained no choices".into(),
                source: None,
            })
    }
}

/// True for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
