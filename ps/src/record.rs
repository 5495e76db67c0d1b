//! Saved plan record types and identifier derivation

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a saved plan within a user's collection
pub type PlanId = String;

/// Persisted payload of a saved plan
///
/// Field names follow the document layout used by the hosted store so records
/// exported as JSON line up with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub interests: Vec<String>,
    pub budget: String,
    /// JSON-encoded itinerary
    pub plan_content: String,
}

/// A stored plan together with its store-assigned metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub id: PlanId,
    /// Opaque reference to the owning identity
    pub owner: String,
    #[serde(flatten)]
    pub record: PlanRecord,
    /// Assigned by the store when the plan is written (Unix milliseconds)
    pub created_at: i64,
}

impl SavedPlan {
    /// Creation time as a UTC timestamp
    pub fn created(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

/// Derive a plan identifier from the destination and a millisecond timestamp
///
/// Whitespace runs become a single underscore and the result is lowercased,
/// e.g. `"New York"` at `1752566400000` gives `new_york_1752566400000`.
/// Two saves for the same destination within the same millisecond produce the
/// same identifier.
pub fn derive_plan_id(destination: &str, timestamp_ms: i64) -> PlanId {
    let slug = destination.split_whitespace().collect::<Vec<_>>().join("_").to_lowercase();
    format!("{}_{}", slug, timestamp_ms)
}

/// Render the collection path for a user's plans
pub fn collection_path(namespace: &str, user_id: &str) -> String {
    format!("artifacts/{}/users/{}/tripPlans", namespace, user_id)
}
