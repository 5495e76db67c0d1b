//! Pipeline error taxonomy
//!
//! Every failure that can reach the user is one of four kinds. The session
//! turns them into banner text with [`PlannerError::user_message`] so nothing
//! escapes unhandled.

use planstore::StoreError;
use thiserror::Error;

use crate::generation::GenerationError;
use crate::retry::Transient;

/// Preconditions that are not met yet (identity, configuration, state)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Identity is not ready")]
    IdentityNotReady,

    #[error("No itinerary has been generated")]
    NoItinerary,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("API key not found. Set the {env} environment variable.")]
    MissingApiKey { env: String },

    #[error("Unknown generation provider: '{0}'. Supported: gemini")]
    UnknownProvider(String),

    #[error("No day at position {index} (itinerary has {len} days)")]
    DayOutOfRange { index: usize, len: usize },
}

/// Generator output that is not a usable itinerary
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Response is not valid JSON: {0}")]
    Unparseable(String),

    #[error("Itinerary is empty or malformed: {0}")]
    EmptyOrMalformed(String),

    #[error("Saved plan could not be decoded: {0}")]
    SavedPlan(String),
}

/// Any failure surfaced by the pipeline
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlannerError {
    /// Text shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(ConfigurationError::IdentityNotReady | ConfigurationError::NoItinerary) => {
                "Cannot save: identity not ready or no plan generated.".to_string()
            }
            Self::Configuration(e) => format!("Configuration error: {}", e),
            Self::Generation(GenerationError::EmptyResponse) => {
                "Could not generate trip plan. No content returned from AI.".to_string()
            }
            Self::Generation(e) => format!("Failed to generate trip plan: {}", e),
            Self::Validation(ValidationError::Unparseable(_)) => {
                "Failed to parse AI response. Please try again or refine your request.".to_string()
            }
            Self::Validation(ValidationError::EmptyOrMalformed(_)) => {
                "AI generated an invalid or empty trip plan structure.".to_string()
            }
            Self::Validation(ValidationError::SavedPlan(_)) => "Failed to load saved plan content.".to_string(),
            Self::Store(StoreError::NotFound(id)) => format!("Saved plan '{}' not found.", id),
            Self::Store(e) => format!(
                "Failed to save trip plan: {}. Check store configuration and permissions.",
                e
            ),
        }
    }

    /// Whether retrying the same action later could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Generation(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            _ => false,
        }
    }
}
