//! Plan store adapter seam
//!
//! The session depends on [`PlanStoreAdapter`] rather than on the concrete
//! store so tests can substitute a failing or slow backend.

use async_trait::async_trait;
use planstore::{Identity, PlanId, PlanListCallback, PlanRecord, PlanStoreManager, SavedPlan, StoreError, Subscription};
use tracing::debug;

use crate::domain::{DATE_FORMAT, Itinerary, TripCriteria};
use crate::error::ValidationError;

/// What the pipeline needs from plan storage
#[async_trait]
pub trait PlanStoreAdapter: Send + Sync {
    /// Current identity; `None` until bootstrap completes
    fn identity(&self) -> Option<Identity>;

    /// Persist a plan for the current identity
    async fn save(&self, record: PlanRecord) -> Result<PlanId, StoreError>;

    /// Current identity's plans, newest first
    async fn list_for_current_user(&self) -> Result<Vec<SavedPlan>, StoreError>;

    /// Deliver the plan list now and after every change until unsubscribed
    fn subscribe(&self, callback: PlanListCallback) -> Subscription;
}

#[async_trait]
impl PlanStoreAdapter for PlanStoreManager {
    fn identity(&self) -> Option<Identity> {
        PlanStoreManager::identity(self)
    }

    async fn save(&self, record: PlanRecord) -> Result<PlanId, StoreError> {
        Ok(PlanStoreManager::save(self, record).await?.id)
    }

    async fn list_for_current_user(&self) -> Result<Vec<SavedPlan>, StoreError> {
        self.list().await
    }

    fn subscribe(&self, callback: PlanListCallback) -> Subscription {
        PlanStoreManager::subscribe(self, callback)
    }
}

/// Build the persisted record for criteria and their itinerary
pub fn to_record(criteria: &TripCriteria, itinerary: &Itinerary) -> Result<PlanRecord, StoreError> {
    debug!(destination = %criteria.destination, days = itinerary.len(), "to_record: called");
    Ok(PlanRecord {
        destination: criteria.destination.clone(),
        start_date: criteria.start_date.format(DATE_FORMAT).to_string(),
        end_date: criteria.end_date.format(DATE_FORMAT).to_string(),
        interests: criteria.interests.clone(),
        budget: criteria.budget.clone(),
        plan_content: itinerary.to_json()?,
    })
}

/// Rebuild criteria and itinerary from a saved plan
pub fn from_saved(plan: &SavedPlan) -> Result<(TripCriteria, Itinerary), ValidationError> {
    debug!(id = %plan.id, "from_saved: called");
    let record = &plan.record;

    let criteria = TripCriteria::parse(
        &record.destination,
        &record.start_date,
        &record.end_date,
        record.interests.clone(),
        &record.budget,
    )
    .map_err(|e| ValidationError::SavedPlan(e.to_string()))?;

    let itinerary: Itinerary =
        serde_json::from_str(&record.plan_content).map_err(|e| ValidationError::SavedPlan(e.to_string()))?;

    Ok((criteria, itinerary))
}
