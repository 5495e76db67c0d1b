//! PlanStore - saved trip plan persistence
//!
//! Stores trip plans per deployment namespace and per user identity, mirroring a
//! document-store collection layout:
//!
//! ```text
//! artifacts/{namespace}/users/{user_id}/tripPlans/{plan_id}
//! ```
//!
//! Records live in a single SQLite database. [`PlanStoreManager`] is an actor
//! that owns the connection, establishes the user identity (anonymous or
//! token-based), and publishes change notifications so callers can keep a
//! live, newest-first view of their saved plans.
//!
//! # Example
//!
//! ```ignore
//! use planstore::{Credentials, PlanStoreManager};
//!
//! let store = PlanStoreManager::spawn("plans.db", "default-app-id")?;
//! let identity = store.sign_in(Credentials::Anonymous).await?;
//! let saved = store.save(record).await?;
//! let plans = store.list().await?;
//! ```

mod error;
mod identity;
mod manager;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use identity::{Credentials, Identity, IdentityKind};
pub use manager::{PlanListCallback, PlanStoreManager, Subscription};
pub use record::{PlanId, PlanRecord, SavedPlan, collection_path, derive_plan_id};
pub use store::SqliteStore;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
