//! Persistent store collaborator contract and implementations.
//!
//! The session layer never talks to a database directly; everything goes
//! through the [`FleetStore`] trait. The contract deliberately keeps
//! "no match" distinguishable from "store failure" (`Result<Option<_>, _>`)
//! because the two propagate differently: an ownership miss is a normal
//! reply to the caller, a store failure is logged or reported depending on
//! the path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query was executed but failed
    #[error("store query failed: {0}")]
    Query(String),

    /// The store could not be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            sqlx::Error::PoolTimedOut => StoreError::Unavailable("pool timed out".to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Presence state of a delivery agent, as persisted in the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The agent has an active session
    Working,
    /// The agent has no active session
    Off,
}

impl Presence {
    /// Stored string representation (`"working"` / `"off"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Working => "working",
            Presence::Off => "off",
        }
    }
}

/// A user row as the store sees it. Resolved into an
/// [`Identity`](crate::auth::Identity) by the session gate.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: i64,
    pub display_name: String,
    pub role_id: i16,
}

/// An append-only agent position record. Never mutated after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub agent_id: i64,
    pub lat: f64,
    pub lng: f64,
    pub observed_at: DateTime<Utc>,
}

/// A package row: current status plus the agent it is assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub id: i64,
    pub status_id: i32,
    pub delivery_agent_id: i64,
}

/// The persistent store contract assumed by the session layer.
///
/// Four operations: lookup-by-credential, append-insert, a conditional
/// update with an ownership predicate, and an unconditional presence update.
///
/// Credential verification and identity resolution are a single call here
/// because the backing schema stores the credential on the user row. They
/// are separable contracts: an implementation backed by a dedicated token
/// service would verify first and resolve second without the callers
/// noticing.
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Resolves an opaque credential to a user record.
    ///
    /// Returns `Ok(None)` when no user matches; the gate treats that and
    /// `Err(_)` identically, but other callers may not.
    async fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Appends one location report. No uniqueness constraint beyond
    /// storage-assigned identity.
    async fn insert_location(&self, report: &LocationReport) -> Result<(), StoreError>;

    /// Atomically sets the package status **where** the package is assigned
    /// to `agent_id`.
    ///
    /// Returns the updated record on a match, `Ok(None)` when zero rows
    /// matched (wrong agent or no such package). The atomicity of the
    /// check-and-set is this method's responsibility; callers perform no
    /// additional locking.
    async fn update_package_status(
        &self,
        package_id: i64,
        status_id: i32,
        agent_id: i64,
    ) -> Result<Option<PackageRecord>, StoreError>;

    /// Unconditionally sets an agent's presence state.
    async fn set_agent_presence(&self, agent_id: i64, presence: Presence)
        -> Result<(), StoreError>;
}
