//! SQLite-backed plan storage

use std::fs;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use crate::error::{DatabaseResultExt, StoreResult};
use crate::identity::{Identity, IdentityKind};
use crate::record::{PlanId, PlanRecord, SavedPlan, derive_plan_id};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trip_plans (
    namespace    TEXT NOT NULL,
    user_id      TEXT NOT NULL,
    id           TEXT NOT NULL,
    destination  TEXT NOT NULL,
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL,
    interests    TEXT NOT NULL,
    budget       TEXT NOT NULL,
    plan_content TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    PRIMARY KEY (namespace, user_id, id)
);

CREATE INDEX IF NOT EXISTS idx_trip_plans_created
    ON trip_plans (namespace, user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS anonymous_identities (
    namespace  TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
";

const SELECT_COLUMNS: &str =
    "id, user_id, destination, start_date, end_date, interests, budget, plan_content, created_at";

/// Synchronous plan store over a single SQLite connection
pub struct SqliteStore {
    connection: Connection,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "SqliteStore::open: called");
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let connection = Connection::open(path).db_context("Failed to open plan database")?;
        let store = Self { connection };
        store.initialize_schema()?;
        info!(path = %path.display(), "Opened plan store");
        Ok(store)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("SqliteStore::open_in_memory: called");
        let connection = Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        let store = Self { connection };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> StoreResult<()> {
        self.connection
            .execute_batch(SCHEMA)
            .db_context("Failed to initialize plan store schema")
    }

    /// Return the device's anonymous identity for a namespace, creating it on first use
    pub fn anonymous_identity(&self, namespace: &str) -> StoreResult<Identity> {
        debug!(%namespace, "SqliteStore::anonymous_identity: called");
        let existing: Option<String> = self
            .connection
            .query_row(
                "SELECT user_id FROM anonymous_identities WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
            .optional()
            .db_context("Failed to read anonymous identity")?;

        if let Some(user_id) = existing {
            debug!(%user_id, "SqliteStore::anonymous_identity: reusing existing identity");
            return Ok(Identity {
                user_id,
                kind: IdentityKind::Anonymous,
            });
        }

        let identity = Identity::new_anonymous();
        self.connection
            .execute(
                "INSERT INTO anonymous_identities (namespace, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![namespace, identity.user_id, crate::now_ms()],
            )
            .db_context("Failed to persist anonymous identity")?;
        info!(user_id = %identity.user_id, %namespace, "Created anonymous identity");
        Ok(identity)
    }

    /// Write a plan and return its identifier
    ///
    /// The identifier is derived from the destination and `created_at`; writing
    /// the same identifier again replaces the earlier record.
    pub fn save(&self, namespace: &str, user_id: &str, record: &PlanRecord, created_at: i64) -> StoreResult<PlanId> {
        let id = derive_plan_id(&record.destination, created_at);
        debug!(%namespace, %user_id, %id, "SqliteStore::save: called");
        let interests = serde_json::to_string(&record.interests)?;

        self.connection
            .execute(
                "INSERT OR REPLACE INTO trip_plans
                    (namespace, user_id, id, destination, start_date, end_date, interests, budget, plan_content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    namespace,
                    user_id,
                    id,
                    record.destination,
                    record.start_date,
                    record.end_date,
                    interests,
                    record.budget,
                    record.plan_content,
                    created_at,
                ],
            )
            .db_context("Failed to save trip plan")?;

        Ok(id)
    }

    /// List a user's plans, newest first
    pub fn list(&self, namespace: &str, user_id: &str) -> StoreResult<Vec<SavedPlan>> {
        debug!(%namespace, %user_id, "SqliteStore::list: called");
        let sql = format!(
            "SELECT {} FROM trip_plans WHERE namespace = ?1 AND user_id = ?2 ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        );
        let mut stmt = self.connection.prepare(&sql).db_context("Failed to prepare plan query")?;
        let rows = stmt
            .query_map(params![namespace, user_id], read_row)
            .db_context("Failed to query trip plans")?;

        let mut plans = Vec::new();
        for row in rows {
            let (plan, interests) = row.db_context("Failed to read trip plan row")?;
            plans.push(finish_plan(plan, &interests)?);
        }
        debug!(count = plans.len(), "SqliteStore::list: loaded plans");
        Ok(plans)
    }

    /// Fetch a single plan by identifier
    pub fn get(&self, namespace: &str, user_id: &str, id: &str) -> StoreResult<Option<SavedPlan>> {
        debug!(%namespace, %user_id, %id, "SqliteStore::get: called");
        let sql = format!(
            "SELECT {} FROM trip_plans WHERE namespace = ?1 AND user_id = ?2 AND id = ?3",
            SELECT_COLUMNS
        );
        let found = self
            .connection
            .query_row(&sql, params![namespace, user_id, id], read_row)
            .optional()
            .db_context("Failed to read trip plan")?;

        match found {
            Some((plan, interests)) => Ok(Some(finish_plan(plan, &interests)?)),
            None => Ok(None),
        }
    }
}

/// Map a row to a plan with interests still JSON-encoded
fn read_row(row: &Row<'_>) -> rusqlite::Result<(SavedPlan, String)> {
    let interests: String = row.get(5)?;
    let plan = SavedPlan {
        id: row.get(0)?,
        owner: row.get(1)?,
        record: PlanRecord {
            destination: row.get(2)?,
            start_date: row.get(3)?,
            end_date: row.get(4)?,
            interests: Vec::new(),
            budget: row.get(6)?,
            plan_content: row.get(7)?,
        },
        created_at: row.get(8)?,
    };
    Ok((plan, interests))
}

fn finish_plan(mut plan: SavedPlan, interests: &str) -> StoreResult<SavedPlan> {
    plan.record.interests = serde_json::from_str(interests)?;
    Ok(plan)
}
