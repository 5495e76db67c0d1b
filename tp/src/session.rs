//! Planner session - the pipeline state machine
//!
//! A session walks Idle -> Generating -> {Ready, Failed} and, from Ready,
//! Saving -> {Ready, SaveFailed}. `reset()` returns to Idle from anywhere.
//!
//! Generate, save and load are tagged with the session epoch when they start.
//! `reset()`, `load_saved()` and every new `generate()` advance the epoch, so a
//! call that resolves afterwards still returns its result to the caller but
//! leaves session state alone. The state lock is never held across an await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use planstore::{PlanId, SavedPlan, StoreError, StoreResult, Subscription};
use tracing::{debug, info, warn};

use crate::domain::{Itinerary, ItineraryDay, TripCriteria};
use crate::error::{ConfigurationError, PlannerError};
use crate::generation::GenerationClient;
use crate::request::build_request;
use crate::retry::{AttemptFailure, RetryPolicy};
use crate::store::{PlanStoreAdapter, from_saved, to_record};
use crate::validator::Validator;

/// Pipeline phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Ready,
    Failed,
    Saving,
    SaveFailed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Generating => "generating",
            Phase::Ready => "ready",
            Phase::Failed => "failed",
            Phase::Saving => "saving",
            Phase::SaveFailed => "save-failed",
        };
        write!(f, "{}", name)
    }
}

/// Point-in-time copy of session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub criteria: Option<TripCriteria>,
    pub itinerary: Option<Itinerary>,
    /// Position of the active day; 0 whenever an itinerary is present
    pub active_day: usize,
    /// Banner for the last failed generate or load
    pub error: Option<String>,
    /// Message shown next to the save action after a failed save
    pub save_error: Option<String>,
    pub last_saved: Option<PlanId>,
}

impl SessionSnapshot {
    /// Day currently selected for display
    pub fn active(&self) -> Option<&ItineraryDay> {
        self.itinerary.as_ref().and_then(|i| i.day_at(self.active_day))
    }
}

/// Refreshed saved-plan list; failures arrive as an empty list with the error
#[derive(Debug)]
pub struct PlanListUpdate {
    pub plans: Vec<SavedPlan>,
    pub error: Option<StoreError>,
}

#[derive(Debug, Default)]
struct SessionState {
    view: SessionSnapshot,
    epoch: u64,
}

pub struct PlannerSession {
    client: Arc<dyn GenerationClient>,
    store: Arc<dyn PlanStoreAdapter>,
    validator: Validator,
    save_retry: RetryPolicy,
    state: Mutex<SessionState>,
    subscription: Mutex<Option<Subscription>>,
}

impl PlannerSession {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn PlanStoreAdapter>, validator: Validator) -> Self {
        debug!(mode = ?validator.mode(), "PlannerSession::new: called");
        Self {
            client,
            store,
            validator,
            save_retry: RetryPolicy::none(),
            state: Mutex::new(SessionState::default()),
            subscription: Mutex::new(None),
        }
    }

    /// Retry saves that fail with a transient store error
    pub fn with_save_retry(mut self, policy: RetryPolicy) -> Self {
        self.save_retry = policy;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().view.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state().view.phase
    }

    /// Whether save is currently available
    pub fn can_save(&self) -> bool {
        let phase = self.phase();
        matches!(phase, Phase::Ready | Phase::SaveFailed) && self.store.identity().is_some()
    }

    /// Generate an itinerary for `criteria`
    ///
    /// Clears any previous itinerary and error first. The typed error is
    /// returned to the caller and its user message kept in the snapshot.
    pub async fn generate(&self, criteria: TripCriteria) -> Result<Itinerary, PlannerError> {
        debug!(destination = %criteria.destination, "generate: called");
        let epoch = {
            let mut state = self.state();
            state.epoch += 1;
            state.view = SessionSnapshot {
                phase: Phase::Generating,
                criteria: Some(criteria.clone()),
                ..Default::default()
            };
            state.epoch
        };

        let result = self.run_generation(&criteria).await;

        let mut state = self.state();
        if state.epoch != epoch {
            debug!(epoch, current = state.epoch, "generate: stale resolution ignored");
            return result;
        }
        match &result {
            Ok(itinerary) => {
                info!(days = itinerary.len(), destination = %criteria.destination, "Itinerary ready");
                state.view.phase = Phase::Ready;
                state.view.itinerary = Some(itinerary.clone());
                state.view.active_day = 0;
            }
            Err(e) => {
                warn!(error = %e, "Generation failed");
                state.view.phase = Phase::Failed;
                state.view.error = Some(e.user_message());
            }
        }
        result
    }

    async fn run_generation(&self, criteria: &TripCriteria) -> Result<Itinerary, PlannerError> {
        let request = build_request(criteria);
        let raw = self.client.generate(&request).await?;
        Ok(self.validator.validate(&raw)?)
    }

    /// Save the current criteria and itinerary for the signed-in identity
    ///
    /// The in-memory itinerary is kept whether or not the save succeeds.
    pub async fn save(&self) -> Result<PlanId, PlannerError> {
        debug!("save: called");
        if self.store.identity().is_none() {
            debug!("save: identity not ready");
            return Err(ConfigurationError::IdentityNotReady.into());
        }

        let (epoch, record) = {
            let mut state = self.state();
            match state.view.phase {
                Phase::Ready | Phase::SaveFailed => {}
                Phase::Saving => return Err(ConfigurationError::SaveInProgress.into()),
                _ => return Err(ConfigurationError::NoItinerary.into()),
            }
            let (Some(criteria), Some(itinerary)) = (&state.view.criteria, &state.view.itinerary) else {
                return Err(ConfigurationError::NoItinerary.into());
            };
            let record = to_record(criteria, itinerary)?;
            state.view.phase = Phase::Saving;
            state.view.save_error = None;
            (state.epoch, record)
        };

        let store = &self.store;
        let result = self
            .save_retry
            .run(|_| {
                let record = record.clone();
                async move { store.save(record).await.map_err(AttemptFailure::from) }
            })
            .await
            .map_err(PlannerError::from);

        let mut state = self.state();
        if state.epoch != epoch || state.view.phase != Phase::Saving {
            debug!(epoch, current = state.epoch, "save: stale resolution ignored");
            return result;
        }
        match &result {
            Ok(id) => {
                info!(%id, "Plan saved");
                state.view.phase = Phase::Ready;
                state.view.last_saved = Some(id.clone());
            }
            Err(e) => {
                warn!(error = %e, "Save failed");
                state.view.phase = Phase::SaveFailed;
                state.view.save_error = Some(e.user_message());
            }
        }
        result
    }

    /// Repopulate criteria and itinerary from a saved plan
    ///
    /// Content that cannot be decoded clears the itinerary and leaves the
    /// session Failed.
    pub fn load_saved(&self, plan: &SavedPlan) -> Result<(TripCriteria, Itinerary), PlannerError> {
        debug!(id = %plan.id, "load_saved: called");
        let loaded = from_saved(plan);

        let mut state = self.state();
        state.epoch += 1;
        match loaded {
            Ok((criteria, itinerary)) => {
                info!(id = %plan.id, days = itinerary.len(), "Loaded saved plan");
                state.view = SessionSnapshot {
                    phase: Phase::Ready,
                    criteria: Some(criteria.clone()),
                    itinerary: Some(itinerary.clone()),
                    last_saved: Some(plan.id.clone()),
                    ..Default::default()
                };
                Ok((criteria, itinerary))
            }
            Err(e) => {
                warn!(id = %plan.id, error = %e, "Saved plan content could not be decoded");
                let err = PlannerError::from(e);
                state.view = SessionSnapshot {
                    phase: Phase::Failed,
                    error: Some(err.user_message()),
                    ..Default::default()
                };
                Err(err)
            }
        }
    }

    /// Discard criteria, itinerary and errors
    pub fn reset(&self) {
        debug!("reset: called");
        let mut state = self.state();
        state.epoch += 1;
        state.view = SessionSnapshot::default();
    }

    /// Make the day at `index` the active one
    pub fn select_day(&self, index: usize) -> Result<(), PlannerError> {
        debug!(index, "select_day: called");
        let mut state = self.state();
        let len = match &state.view.itinerary {
            Some(itinerary) => itinerary.len(),
            None => return Err(ConfigurationError::NoItinerary.into()),
        };
        if index >= len {
            return Err(ConfigurationError::DayOutOfRange { index, len }.into());
        }
        state.view.active_day = index;
        Ok(())
    }

    /// Keep `callback` supplied with the signed-in identity's saved plans
    ///
    /// Replaces any previous subscription. Delivery stops on
    /// [`PlannerSession::unsubscribe_saved_plans`] or when the session is dropped.
    pub fn subscribe_saved_plans<F>(&self, callback: F)
    where
        F: Fn(PlanListUpdate) + Send + Sync + 'static,
    {
        debug!("subscribe_saved_plans: called");
        let subscription = self.store.subscribe(Box::new(move |result: StoreResult<Vec<SavedPlan>>| {
            let update = match result {
                Ok(plans) => PlanListUpdate { plans, error: None },
                Err(error) => {
                    warn!(error = %error, "Failed to load saved plans");
                    PlanListUpdate {
                        plans: Vec::new(),
                        error: Some(error),
                    }
                }
            };
            callback(update);
        }));

        let previous = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    pub fn unsubscribe_saved_plans(&self) {
        debug!("unsubscribe_saved_plans: called");
        let current = self.subscription.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(subscription) = current {
            subscription.unsubscribe();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(Subscription::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationError;
    use crate::generation::client::mock::MockGenerationClient;
    use async_trait::async_trait;
    use planstore::{Credentials, Identity, PlanListCallback, PlanRecord, PlanStoreManager};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc};

    const LOUVRE: &str =
        r#"[{"day":1,"date":"2025-07-15","activities":[{"time":"9:00 AM","name":"Louvre","description":"Art museum"}]}]"#;
    const TWO_DAYS: &str = r#"[{"day":1,"date":"2025-07-15","activities":[]},{"day":2,"date":"2025-07-16","activities":[]}]"#;

    fn paris() -> TripCriteria {
        TripCriteria::parse("Paris", "2025-07-15", "2025-07-16", vec!["History".to_string()], "medium").unwrap()
    }

    async fn signed_in_store() -> Arc<PlanStoreManager> {
        let store = PlanStoreManager::spawn_in_memory("test-app").unwrap();
        store.sign_in(Credentials::Anonymous).await.unwrap();
        Arc::new(store)
    }

    fn session(client: MockGenerationClient, store: Arc<dyn PlanStoreAdapter>) -> PlannerSession {
        PlannerSession::new(Arc::new(client), store, Validator::lenient())
    }

    /// Store whose writes always fail
    struct FailingStore;

    #[async_trait]
    impl PlanStoreAdapter for FailingStore {
        fn identity(&self) -> Option<Identity> {
            Some(Identity::from_token("failing"))
        }

        async fn save(&self, _record: PlanRecord) -> Result<PlanId, StoreError> {
            Err(StoreError::ChannelError)
        }

        async fn list_for_current_user(&self) -> Result<Vec<SavedPlan>, StoreError> {
            Err(StoreError::ChannelError)
        }

        fn subscribe(&self, callback: PlanListCallback) -> Subscription {
            Subscription::from_task(tokio::spawn(async move {
                callback(Err(StoreError::ChannelError));
            }))
        }
    }

    /// Real store behind a save that can be held on a gate or fail transiently first
    struct ScriptedStore {
        inner: Arc<PlanStoreManager>,
        transient_failures: AtomicU32,
        attempts: AtomicU32,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedStore {
        fn new(inner: Arc<PlanStoreManager>) -> Self {
            Self {
                inner,
                transient_failures: AtomicU32::new(0),
                attempts: AtomicU32::new(0),
                gate: None,
            }
        }

        fn failing_first(inner: Arc<PlanStoreManager>, failures: u32) -> Self {
            Self {
                transient_failures: AtomicU32::new(failures),
                ..Self::new(inner)
            }
        }

        fn gated(inner: Arc<PlanStoreManager>, gate: Arc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(inner)
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlanStoreAdapter for ScriptedStore {
        fn identity(&self) -> Option<Identity> {
            PlanStoreManager::identity(&self.inner)
        }

        async fn save(&self, record: PlanRecord) -> Result<PlanId, StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let remaining = self.transient_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.transient_failures.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::ChannelError);
            }
            PlanStoreAdapter::save(self.inner.as_ref(), record).await
        }

        async fn list_for_current_user(&self) -> Result<Vec<SavedPlan>, StoreError> {
            self.inner.list().await
        }

        fn subscribe(&self, callback: PlanListCallback) -> Subscription {
            PlanStoreManager::subscribe(&self.inner, callback)
        }
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_generate_success() {
        let session = session(MockGenerationClient::with_text(LOUVRE), signed_in_store().await);
        assert_eq!(session.phase(), Phase::Idle);

        let itinerary = session.generate(paris()).await.unwrap();
        assert_eq!(itinerary.len(), 1);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.criteria, Some(paris()));
        assert_eq!(snapshot.active_day, 0);
        assert_eq!(snapshot.active().unwrap().activities()[0].name(), Some("Louvre"));
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn test_generate_sends_built_prompt() {
        let client = Arc::new(MockGenerationClient::with_text(LOUVRE));
        let session = PlannerSession::new(client.clone(), signed_in_store().await, Validator::lenient());

        session.generate(paris()).await.unwrap();
        assert_eq!(client.prompts(), vec![build_request(&paris()).prompt]);
    }

    #[tokio::test]
    async fn test_generation_failure_sets_failed() {
        let client = MockGenerationClient::new(vec![
            Ok(LOUVRE.to_string()),
            Err(GenerationError::Api {
                status: 500,
                message: "quota exceeded".to_string(),
            }),
        ]);
        let session = session(client, signed_in_store().await);
        session.generate(paris()).await.unwrap();

        let err = session.generate(paris()).await.unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Generation(GenerationError::Api { status: 500, ref message }) if message == "quota exceeded"
        ));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Failed);
        assert!(snapshot.itinerary.is_none(), "prior itinerary is cleared");
        assert!(snapshot.error.unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_validation_failure_sets_failed() {
        let session = session(MockGenerationClient::with_text("[]"), signed_in_store().await);

        let err = session.generate(paris()).await.unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
        assert_eq!(session.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let store = signed_in_store().await;
        let session = session(MockGenerationClient::with_text(LOUVRE), store.clone());
        let itinerary = session.generate(paris()).await.unwrap();

        let id = session.save().await.unwrap();
        assert!(id.starts_with("paris_"));
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.snapshot().last_saved, Some(id.clone()));

        let saved = store.get_required(&id).await.unwrap();
        session.reset();
        let (criteria, loaded) = session.load_saved(&saved).unwrap();
        assert_eq!(criteria, paris());
        assert_eq!(loaded, itinerary);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_save_requires_identity() {
        let store = Arc::new(PlanStoreManager::spawn_in_memory("test-app").unwrap());
        let session = session(MockGenerationClient::with_text(LOUVRE), store);
        session.generate(paris()).await.unwrap();

        assert!(!session.can_save());
        let err = session.save().await.unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Configuration(ConfigurationError::IdentityNotReady)
        ));
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[tokio::test]
    async fn test_save_requires_itinerary() {
        let session = session(MockGenerationClient::new(vec![]), signed_in_store().await);

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, PlannerError::Configuration(ConfigurationError::NoItinerary)));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_itinerary() {
        let session = session(MockGenerationClient::with_text(LOUVRE), Arc::new(FailingStore));
        session.generate(paris()).await.unwrap();

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, PlannerError::Store(_)));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::SaveFailed);
        assert!(snapshot.itinerary.is_some());
        assert!(snapshot.save_error.unwrap().starts_with("Failed to save trip plan"));
        assert!(snapshot.error.is_none());
        assert!(session.can_save(), "re-save stays available");
    }

    #[tokio::test]
    async fn test_transient_save_failure_is_retried() {
        let inner = signed_in_store().await;
        let store = Arc::new(ScriptedStore::failing_first(inner.clone(), 2));
        let session = PlannerSession::new(
            Arc::new(MockGenerationClient::with_text(LOUVRE)),
            store.clone(),
            Validator::lenient(),
        )
        .with_save_retry(fast_retry(3));
        session.generate(paris()).await.unwrap();

        let id = session.save().await.unwrap();
        assert_eq!(store.attempts(), 3);
        assert_eq!(session.phase(), Phase::Ready);
        assert!(inner.get_required(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_retries_exhausted() {
        let store = Arc::new(ScriptedStore::failing_first(signed_in_store().await, 5));
        let session = PlannerSession::new(
            Arc::new(MockGenerationClient::with_text(LOUVRE)),
            store.clone(),
            Validator::lenient(),
        )
        .with_save_retry(fast_retry(1));
        session.generate(paris()).await.unwrap();

        let err = session.save().await.unwrap_err();
        assert!(matches!(err, PlannerError::Store(StoreError::ChannelError)));
        assert!(err.is_transient());
        assert_eq!(store.attempts(), 2);
        assert_eq!(session.phase(), Phase::SaveFailed);
    }

    #[tokio::test]
    async fn test_save_without_retry_policy_tries_once() {
        let store = Arc::new(ScriptedStore::failing_first(signed_in_store().await, 1));
        let session = PlannerSession::new(
            Arc::new(MockGenerationClient::with_text(LOUVRE)),
            store.clone(),
            Validator::lenient(),
        );
        session.generate(paris()).await.unwrap();

        assert!(session.save().await.is_err());
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn test_stale_save_after_reset_is_ignored() {
        let gate = Arc::new(Notify::new());
        let inner = signed_in_store().await;
        let store: Arc<dyn PlanStoreAdapter> = Arc::new(ScriptedStore::gated(inner.clone(), gate.clone()));
        let session = Arc::new(session(MockGenerationClient::with_text(LOUVRE), store));
        session.generate(paris()).await.unwrap();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.save().await }
        });
        while session.phase() != Phase::Saving {
            tokio::task::yield_now().await;
        }

        session.reset();
        gate.notify_one();

        let id = pending.await.unwrap().expect("caller still receives the saved id");
        assert_eq!(session.snapshot(), SessionSnapshot::default());
        assert!(inner.get_required(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_save_after_new_generation_is_ignored() {
        let gate = Arc::new(Notify::new());
        let store: Arc<dyn PlanStoreAdapter> = Arc::new(ScriptedStore::gated(signed_in_store().await, gate.clone()));
        let client = MockGenerationClient::new(vec![Ok(LOUVRE.to_string()), Ok(TWO_DAYS.to_string())]);
        let session = Arc::new(session(client, store));
        session.generate(paris()).await.unwrap();

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.save().await }
        });
        while session.phase() != Phase::Saving {
            tokio::task::yield_now().await;
        }

        session.generate(paris()).await.unwrap();
        gate.notify_one();
        assert!(pending.await.unwrap().is_ok());

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Ready);
        assert_eq!(snapshot.itinerary.unwrap().len(), 2);
        assert_eq!(snapshot.last_saved, None);
    }

    #[tokio::test]
    async fn test_stale_generation_after_reset_is_ignored() {
        let gate = Arc::new(Notify::new());
        let client = MockGenerationClient::gated(vec![Ok(LOUVRE.to_string())], gate.clone());
        let session = Arc::new(session(client, signed_in_store().await));

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.generate(paris()).await }
        });
        while session.phase() != Phase::Generating {
            tokio::task::yield_now().await;
        }

        session.reset();
        gate.notify_one();

        let result = pending.await.unwrap();
        assert!(result.is_ok(), "caller still receives the result");
        assert_eq!(session.snapshot(), SessionSnapshot::default());
    }

    #[tokio::test]
    async fn test_newer_generation_wins() {
        let gate = Arc::new(Notify::new());
        let client = MockGenerationClient::gated(vec![Ok(LOUVRE.to_string()), Ok(TWO_DAYS.to_string())], gate.clone());
        let session = Arc::new(session(client, signed_in_store().await));

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.generate(paris()).await }
        });
        while session.phase() != Phase::Generating {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let session = session.clone();
            async move { session.generate(paris()).await }
        });

        // first waiter takes the first queued response once released
        gate.notify_one();
        let first = first.await.unwrap().unwrap();
        gate.notify_one();
        let second = second.await.unwrap().unwrap();

        assert_eq!(first.len() + second.len(), 3);
        assert_eq!(session.snapshot().itinerary.unwrap(), second);
    }

    #[tokio::test]
    async fn test_select_day() {
        let session = session(MockGenerationClient::with_text(TWO_DAYS), signed_in_store().await);
        assert!(matches!(
            session.select_day(0),
            Err(PlannerError::Configuration(ConfigurationError::NoItinerary))
        ));

        session.generate(paris()).await.unwrap();
        session.select_day(1).unwrap();
        assert_eq!(session.snapshot().active().unwrap().date(), Some("2025-07-16"));

        let err = session.select_day(2).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Configuration(ConfigurationError::DayOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(session.snapshot().active_day, 1);
    }

    #[tokio::test]
    async fn test_load_undecodable_plan() {
        let session = session(MockGenerationClient::with_text(LOUVRE), signed_in_store().await);
        session.generate(paris()).await.unwrap();

        let plan = SavedPlan {
            id: "broken_1".to_string(),
            owner: "user".to_string(),
            record: PlanRecord {
                destination: "Paris".to_string(),
                start_date: "2025-07-15".to_string(),
                end_date: "2025-07-16".to_string(),
                interests: vec![],
                budget: "low".to_string(),
                plan_content: "not json".to_string(),
            },
            created_at: 1,
        };

        let err = session.load_saved(&plan).unwrap_err();
        assert_eq!(err.user_message(), "Failed to load saved plan content.");
        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, Phase::Failed);
        assert!(snapshot.itinerary.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_saved_plans() {
        let store = signed_in_store().await;
        let session = session(MockGenerationClient::with_text(LOUVRE), store);
        let (tx, mut rx) = mpsc::unbounded_channel();

        session.subscribe_saved_plans(move |update| {
            let _ = tx.send(update.plans.len());
        });
        assert_eq!(rx.recv().await, Some(0));

        session.generate(paris()).await.unwrap();
        session.save().await.unwrap();
        assert_eq!(tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap(), Some(1));

        assert!(session.is_subscribed());
        session.unsubscribe_saved_plans();
        assert!(!session.is_subscribed());
    }

    #[tokio::test]
    async fn test_subscription_failure_yields_empty_list() {
        let session = session(MockGenerationClient::new(vec![]), Arc::new(FailingStore));
        let (tx, mut rx) = mpsc::unbounded_channel();

        session.subscribe_saved_plans(move |update| {
            let _ = tx.send(update);
        });

        let update = rx.recv().await.unwrap();
        assert!(update.plans.is_empty());
        assert!(matches!(update.error, Some(StoreError::ChannelError)));
    }
}
