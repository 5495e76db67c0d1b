//! Store error types

use thiserror::Error;

/// Errors from plan store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No signed-in identity")]
    NotSignedIn,

    #[error("Invalid auth token: {0}")]
    InvalidToken(String),

    #[error("Plan not found: {0}")]
    NotFound(String),

    #[error("Channel error")]
    ChannelError,
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Attach a message to rusqlite failures
pub(crate) trait DatabaseResultExt<T> {
    fn db_context(self, message: &str) -> StoreResult<T>;
}

impl<T> DatabaseResultExt<T> for Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> StoreResult<T> {
        self.map_err(|source| StoreError::Database {
            message: message.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_context_wraps_source() {
        let result: Result<(), rusqlite::Error> = Err(rusqlite::Error::InvalidQuery);
        let err = result.db_context("Failed to insert plan").unwrap_err();

        assert!(matches!(err, StoreError::Database { .. }));
        assert!(err.to_string().contains("Failed to insert plan"));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(StoreError::NotSignedIn.to_string(), "No signed-in identity");
        assert_eq!(
            StoreError::NotFound("paris_1".to_string()).to_string(),
            "Plan not found: paris_1"
        );
    }
}
