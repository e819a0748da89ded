//! PostgreSQL store implementation backed by `sqlx`.
//!
//! Schema assumed:
//!
//! ```sql
//! CREATE TABLE users (
//!     id            BIGINT PRIMARY KEY,
//!     token         TEXT NOT NULL UNIQUE,
//!     display_name  TEXT NOT NULL,
//!     role_id       SMALLINT NOT NULL,
//!     presence      TEXT NOT NULL DEFAULT 'off'
//! );
//!
//! CREATE TABLE packages (
//!     id                 BIGINT PRIMARY KEY,
//!     status_id          INTEGER NOT NULL,
//!     delivery_agent_id  BIGINT NOT NULL REFERENCES users (id)
//! );
//!
//! CREATE TABLE agent_locations (
//!     id          BIGSERIAL PRIMARY KEY,
//!     agent_id    BIGINT NOT NULL REFERENCES users (id),
//!     lat         DOUBLE PRECISION NOT NULL,
//!     lng         DOUBLE PRECISION NOT NULL,
//!     observed_at TIMESTAMPTZ NOT NULL
//! );
//! ```
//!
//! The ownership check on package updates is a single conditional `UPDATE`
//! with a `RETURNING` clause. Two concurrent updates on the same package row
//! serialize on the row lock, so at most one predicate match wins; no
//! application-level locking is involved.

use super::{FleetStore, LocationReport, PackageRecord, Presence, StoreError, UserRecord};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::Row;

/// A [`FleetStore`] backed by a PostgreSQL connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connects to the database at `url` and returns a ready store.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FleetStore for PostgresStore {
    async fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, display_name, role_id
            FROM users
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            display_name: row.get("display_name"),
            role_id: row.get("role_id"),
        }))
    }

    async fn insert_location(&self, report: &LocationReport) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO agent_locations (agent_id, lat, lng, observed_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(report.agent_id)
        .bind(report.lat)
        .bind(report.lng)
        .bind(report.observed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_package_status(
        &self,
        package_id: i64,
        status_id: i32,
        agent_id: i64,
    ) -> Result<Option<PackageRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE packages
            SET status_id = $1
            WHERE id = $2 AND delivery_agent_id = $3
            RETURNING id, status_id, delivery_agent_id
            "#,
        )
        .bind(status_id)
        .bind(package_id)
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PackageRecord {
            id: row.get("id"),
            status_id: row.get("status_id"),
            delivery_agent_id: row.get("delivery_agent_id"),
        }))
    }

    async fn set_agent_presence(
        &self,
        agent_id: i64,
        presence: Presence,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET presence = $1
            WHERE id = $2
            "#,
        )
        .bind(presence.as_str())
        .bind(agent_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
