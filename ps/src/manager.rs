//! PlanStoreManager - actor that owns the SQLite store
//!
//! Commands travel over an mpsc channel with oneshot replies. Successful writes
//! are published on a broadcast channel, and the signed-in identity is held in
//! a watch channel so subscribers learn when identity becomes ready.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::identity::{Credentials, Identity};
use crate::record::{PlanId, PlanRecord, SavedPlan, collection_path};
use crate::store::SqliteStore;

/// Change notification published after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreEvent {
    PlanSaved { user_id: String, id: PlanId },
}

/// Callback invoked with every refreshed plan list
pub type PlanListCallback = Box<dyn Fn(StoreResult<Vec<SavedPlan>>) + Send + Sync + 'static>;

enum StoreCommand {
    SignIn {
        credentials: Credentials,
        reply: oneshot::Sender<StoreResult<Identity>>,
    },
    Save {
        user_id: String,
        record: PlanRecord,
        reply: oneshot::Sender<StoreResult<SavedPlan>>,
    },
    List {
        user_id: String,
        reply: oneshot::Sender<StoreResult<Vec<SavedPlan>>>,
    },
    Get {
        user_id: String,
        id: String,
        reply: oneshot::Sender<StoreResult<Option<SavedPlan>>>,
    },
}

/// Handle to the plan store actor
#[derive(Clone)]
pub struct PlanStoreManager {
    namespace: String,
    tx: mpsc::Sender<StoreCommand>,
    event_tx: broadcast::Sender<StoreEvent>,
    identity_tx: Arc<watch::Sender<Option<Identity>>>,
}

impl PlanStoreManager {
    /// Spawn a manager over a database file
    pub fn spawn(path: impl AsRef<Path>, namespace: impl Into<String>) -> StoreResult<Self> {
        debug!(path = %path.as_ref().display(), "PlanStoreManager::spawn: called");
        let store = SqliteStore::open(path)?;
        Ok(Self::spawn_with_store(store, namespace.into()))
    }

    /// Spawn a manager over an in-memory database
    pub fn spawn_in_memory(namespace: impl Into<String>) -> StoreResult<Self> {
        debug!("PlanStoreManager::spawn_in_memory: called");
        let store = SqliteStore::open_in_memory()?;
        Ok(Self::spawn_with_store(store, namespace.into()))
    }

    fn spawn_with_store(store: SqliteStore, namespace: String) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(64);
        let (identity_tx, _) = watch::channel(None);

        tokio::spawn(actor_loop(store, namespace.clone(), rx));
        info!(%namespace, "PlanStoreManager spawned");

        Self {
            namespace,
            tx,
            event_tx,
            identity_tx: Arc::new(identity_tx),
        }
    }

    /// Deployment namespace this manager is scoped to
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Currently signed-in identity, if any
    pub fn identity(&self) -> Option<Identity> {
        self.identity_tx.borrow().clone()
    }

    /// Collection path of the signed-in user
    pub fn collection_path(&self) -> Option<String> {
        self.identity()
            .map(|identity| collection_path(&self.namespace, &identity.user_id))
    }

    /// Establish the identity used by subsequent operations
    pub async fn sign_in(&self, credentials: Credentials) -> StoreResult<Identity> {
        debug!(?credentials, "sign_in: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::SignIn {
                credentials,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        let identity = reply_rx.await.map_err(|_| StoreError::ChannelError)??;

        info!(user_id = %identity.user_id, kind = %identity.kind, "Signed in");
        self.identity_tx.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Save a plan for the signed-in user
    ///
    /// The creation timestamp is assigned by the store.
    pub async fn save(&self, record: PlanRecord) -> StoreResult<SavedPlan> {
        let identity = self.identity().ok_or(StoreError::NotSignedIn)?;
        debug!(user_id = %identity.user_id, destination = %record.destination, "save: called");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Save {
                user_id: identity.user_id.clone(),
                record,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        let saved = reply_rx.await.map_err(|_| StoreError::ChannelError)??;

        let _ = self.event_tx.send(StoreEvent::PlanSaved {
            user_id: identity.user_id,
            id: saved.id.clone(),
        });
        Ok(saved)
    }

    /// List the signed-in user's plans, newest first
    pub async fn list(&self) -> StoreResult<Vec<SavedPlan>> {
        let identity = self.identity().ok_or(StoreError::NotSignedIn)?;
        debug!(user_id = %identity.user_id, "list: called");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::List {
                user_id: identity.user_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Fetch one of the signed-in user's plans
    pub async fn get(&self, id: &str) -> StoreResult<Option<SavedPlan>> {
        let identity = self.identity().ok_or(StoreError::NotSignedIn)?;
        debug!(user_id = %identity.user_id, %id, "get: called");

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(StoreCommand::Get {
                user_id: identity.user_id,
                id: id.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::ChannelError)?;
        reply_rx.await.map_err(|_| StoreError::ChannelError)?
    }

    /// Fetch a plan, failing if it does not exist
    pub async fn get_required(&self, id: &str) -> StoreResult<SavedPlan> {
        self.get(id).await?.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Keep `callback` supplied with the signed-in user's plan list
    ///
    /// The callback receives the current list as soon as an identity is
    /// available, then a refreshed list after every write for that user and
    /// after every identity change. Dropping or unsubscribing the returned
    /// handle stops delivery.
    pub fn subscribe(&self, callback: PlanListCallback) -> Subscription {
        debug!("subscribe: called");
        let manager = self.clone();
        let mut events = self.event_tx.subscribe();
        let mut identity_rx = self.identity_tx.subscribe();

        let handle = tokio::spawn(async move {
            let mut refresh = true;
            loop {
                let current_user = identity_rx.borrow_and_update().as_ref().map(|i| i.user_id.clone());
                if refresh && current_user.is_some() {
                    debug!("subscribe: delivering refreshed plan list");
                    callback(manager.list().await);
                }

                tokio::select! {
                    event = events.recv() => match event {
                        Ok(StoreEvent::PlanSaved { user_id, .. }) => {
                            refresh = current_user.as_deref() == Some(user_id.as_str());
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "subscribe: lagged behind store events, refreshing");
                            refresh = true;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("subscribe: event channel closed");
                            break;
                        }
                    },
                    changed = identity_rx.changed() => {
                        if changed.is_err() {
                            debug!("subscribe: identity channel closed");
                            break;
                        }
                        refresh = true;
                    }
                }
            }
        });

        Subscription { handle: Some(handle) }
    }
}

/// Live subscription handle; delivery stops on [`Subscription::unsubscribe`] or drop
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wrap a task that delivers updates
    pub fn from_task(handle: JoinHandle<()>) -> Self {
        Self { handle: Some(handle) }
    }

    /// Whether the delivery task is still running
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop delivery
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Subscription::stop: aborting delivery task");
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn actor_loop(store: SqliteStore, namespace: String, mut rx: mpsc::Receiver<StoreCommand>) {
    debug!(%namespace, "PlanStoreManager actor started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            StoreCommand::SignIn { credentials, reply } => {
                debug!("actor_loop: SignIn command");
                let result = match credentials {
                    Credentials::Anonymous => store.anonymous_identity(&namespace),
                    Credentials::Token(token) if token.trim().is_empty() => {
                        Err(StoreError::InvalidToken("token is empty".to_string()))
                    }
                    Credentials::Token(token) => Ok(Identity::from_token(token.trim())),
                };
                let _ = reply.send(result);
            }

            StoreCommand::Save { user_id, record, reply } => {
                debug!(%user_id, "actor_loop: Save command");
                let created_at = crate::now_ms();
                let result = store
                    .save(&namespace, &user_id, &record, created_at)
                    .map(|id| SavedPlan {
                        id,
                        owner: user_id,
                        record,
                        created_at,
                    });
                let _ = reply.send(result);
            }

            StoreCommand::List { user_id, reply } => {
                debug!(%user_id, "actor_loop: List command");
                let _ = reply.send(store.list(&namespace, &user_id));
            }

            StoreCommand::Get { user_id, id, reply } => {
                debug!(%user_id, %id, "actor_loop: Get command");
                let _ = reply.send(store.get(&namespace, &user_id, &id));
            }
        }
    }

    debug!("PlanStoreManager actor stopped");
}
