//! Generation client module
//!
//! Sends built itinerary requests to the configured generative endpoint and
//! returns the raw text payload for validation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod gemini;
mod types;

pub use client::GenerationClient;
pub use error::{GenerationError, UNKNOWN_ERROR, is_retryable_status};
pub use gemini::GeminiClient;
pub use types::{GenerateContentRequest, GenerateContentResponse};

use crate::config::Config;
use crate::error::{ConfigurationError, PlannerError};

/// Create a generation client based on the provider specified in config
///
/// The API key is resolved here, once, and injected into the client.
pub fn create_client(config: &Config) -> Result<Arc<dyn GenerationClient>, PlannerError> {
    debug!(provider = %config.generation.provider, model = %config.generation.model, "create_client: called");
    match config.generation.provider.as_str() {
        "gemini" => {
            debug!("create_client: creating Gemini client");
            Ok(Arc::new(GeminiClient::from_config(&config.generation, &config.retry)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(ConfigurationError::UnknownProvider(other.to_string()).into())
        }
    }
}
