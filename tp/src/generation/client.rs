//! GenerationClient trait definition

use async_trait::async_trait;

use super::GenerationError;
use crate::request::GenerationRequest;

/// Sends one generation request and returns the raw text payload
///
/// Each call is independent. Concurrent calls are neither coordinated nor
/// deduplicated; a second call while one is pending issues a second request.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Text of the first candidate's first content part
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
