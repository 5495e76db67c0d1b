//! User identity for scoping saved plans

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an identity was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Anonymous,
    Token,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Token => write!(f, "token"),
        }
    }
}

/// Credentials presented when signing in
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Device-scoped identity, created on first use and reused afterwards
    Anonymous,
    /// Externally issued token; the same token always maps to the same user
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Token(_) => write!(f, "Token(<redacted>)"),
        }
    }
}

/// An established user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub kind: IdentityKind,
}

impl Identity {
    /// Identity derived from an auth token
    pub fn from_token(token: &str) -> Self {
        Self {
            user_id: Uuid::new_v5(&Uuid::NAMESPACE_OID, token.as_bytes()).to_string(),
            kind: IdentityKind::Token,
        }
    }

    /// Fresh anonymous identity
    pub fn new_anonymous() -> Self {
        Self {
            user_id: Uuid::new_v4().to_string(),
            kind: IdentityKind::Anonymous,
        }
    }
}
