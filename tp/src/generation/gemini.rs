//! Gemini generateContent client
//!
//! Implements [`GenerationClient`] against the `models/{model}:generateContent`
//! endpoint with JSON-mode output constrained by the itinerary schema.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationSettings, provider_message};
use super::{GenerationClient, GenerationError, UNKNOWN_ERROR};
use crate::config::{GenerationConfig, RetryConfig};
use crate::error::PlannerError;
use crate::request::{GenerationRequest, RESPONSE_MIME_TYPE};
use crate::retry::{AttemptFailure, RetryPolicy};

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from configuration, resolving the API key once
    pub fn from_config(config: &GenerationConfig, retry: &RetryConfig) -> Result<Self, PlannerError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config.api_key()?;
        let client = Self::new(
            &config.model,
            api_key,
            &config.base_url,
            Duration::from_millis(config.timeout_ms),
            RetryPolicy::from_config(retry),
        )?;
        Ok(client)
    }

    /// Create a client with explicit settings
    pub fn new(
        model: &str,
        api_key: String,
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, GenerationError> {
        debug!(%model, %base_url, ?timeout, "new: called");
        let http = Client::builder().timeout(timeout).build().map_err(GenerationError::Network)?;

        Ok(Self {
            model: model.to_string(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
            retry,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the generateContent API
    fn build_request_body(&self, request: &GenerationRequest) -> GenerateContentRequest {
        debug!(prompt_len = request.prompt.len(), "build_request_body: called");
        GenerateContentRequest {
            contents: vec![Content::user(request.prompt.clone())],
            generation_config: GenerationSettings {
                response_mime_type: RESPONSE_MIME_TYPE.to_string(),
                response_schema: request.schema.clone(),
            },
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            debug!(timeout = ?self.timeout, "transport_error: timed out");
            GenerationError::Timeout(self.timeout)
        } else {
            debug!(error = %error, "transport_error: network error");
            GenerationError::Network(error)
        }
    }

    /// One HTTP round trip
    async fn send_once(&self, url: &str, body: &GenerateContentRequest, attempt: u32) -> Result<String, AttemptFailure> {
        debug!(attempt, "send_once: called");
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure_from(response).await);
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        match parsed.first_text() {
            Some(text) => {
                debug!(len = text.len(), "send_once: success");
                Ok(text)
            }
            None => {
                debug!("send_once: no candidate content");
                Err(GenerationError::EmptyResponse.into())
            }
        }
    }

    /// Turn a non-2xx response into an API error
    async fn failure_from(response: Response) -> AttemptFailure {
        let status = response.status();
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
            parse_retry_after(&response)
        } else {
            None
        };
        let body = response.text().await.unwrap_or_default();
        let message = provider_message(&body).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        debug!(status = status.as_u16(), %message, ?retry_after, "failure_from: API error");

        AttemptFailure {
            error: GenerationError::Api {
                status: status.as_u16(),
                message,
            },
            retry_after,
        }
    }
}

/// Numeric Retry-After header, in seconds
fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(model = %self.model, "generate: called");
        let url = self.endpoint();
        let body = self.build_request_body(request);

        let url = url.as_str();
        let body = &body;
        let text = self
            .retry
            .run(move |attempt| self.send_once(url, body, attempt))
            .await?;

        info!(model = %self.model, len = text.len(), "generation complete");
        Ok(text)
    }
}
