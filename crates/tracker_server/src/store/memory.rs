//! In-memory store implementation.
//!
//! Backs development mode and the behavioural tests. The conditional
//! package update holds the write lock across the check-and-set, so the
//! ownership predicate is atomic here just as it is in the SQL
//! implementation.

use super::{FleetStore, LocationReport, PackageRecord, Presence, StoreError, UserRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// A [`FleetStore`] backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Credential -> user row
    users: RwLock<HashMap<String, UserRecord>>,
    /// Package id -> package row
    packages: RwLock<HashMap<i64, PackageRecord>>,
    /// Append-only location log
    locations: RwLock<Vec<LocationReport>>,
    /// Agent id -> presence
    presence: RwLock<HashMap<i64, Presence>>,
    /// When set, all write operations fail with a query error
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user reachable under `token`.
    pub async fn insert_user(&self, token: &str, user: UserRecord) {
        self.users.write().await.insert(token.to_string(), user);
    }

    /// Seeds a package row.
    pub async fn insert_package(&self, package: PackageRecord) {
        self.packages.write().await.insert(package.id, package);
    }

    /// Snapshot of the location log, oldest first.
    pub async fn locations(&self) -> Vec<LocationReport> {
        self.locations.read().await.clone()
    }

    /// Current state of a package row, if any.
    pub async fn package(&self, package_id: i64) -> Option<PackageRecord> {
        self.packages.read().await.get(&package_id).cloned()
    }

    /// Current presence of an agent, if ever written.
    pub async fn presence_of(&self, agent_id: i64) -> Option<Presence> {
        self.presence.read().await.get(&agent_id).copied()
    }

    /// Makes every subsequent write operation fail. Used to exercise the
    /// lossy-telemetry and logged-only failure policies.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Query("induced write failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(token).cloned())
    }

    async fn insert_location(&self, report: &LocationReport) -> Result<(), StoreError> {
        self.check_writable()?;
        self.locations.write().await.push(report.clone());
        Ok(())
    }

    async fn update_package_status(
        &self,
        package_id: i64,
        status_id: i32,
        agent_id: i64,
    ) -> Result<Option<PackageRecord>, StoreError> {
        self.check_writable()?;
        // Single write lock across check-and-set keeps the predicate atomic.
        let mut packages = self.packages.write().await;
        match packages.get_mut(&package_id) {
            Some(package) if package.delivery_agent_id == agent_id => {
                package.status_id = status_id;
                Ok(Some(package.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_agent_presence(
        &self,
        agent_id: i64,
        presence: Presence,
    ) -> Result<(), StoreError> {
        self.check_writable()?;
        self.presence.write().await.insert(agent_id, presence);
        Ok(())
    }
}
