//! Postgres store backend.
//!
//! One `kv_entries` table holds every record kind; the key shape (see
//! [`crate::keys`]) carries the namespacing. All SQL is runtime-checked
//! (`sqlx::query`, not `sqlx::query!`) so the crate builds without a live
//! database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;

use crate::kv::{KvStore, StoreError};

/// Postgres-backed [`KvStore`].
///
/// `claim` is a single `DELETE ... RETURNING` statement, so of N concurrent
/// claimers exactly one deletes the live row and receives its value; the
/// rest match zero rows and observe absent.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations (creates the `kv_entries` table).
    pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    /// Remove expired rows. Reads already treat them as absent; this keeps
    /// the table from accumulating dead entries. Returns the purged count.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        Ok(result.rows_affected())
    }
}

fn backend_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl KvStore for PgStore {
    async fn store(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| StoreError::Backend(format!("ttl out of range: {e}")))?;
        sqlx::query(
            "INSERT INTO kv_entries (key, value, expires_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO UPDATE \
                 SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
        )
        .bind(key)
        .bind(&value)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(backend_err)?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        sqlx::query_scalar::<_, Value>(
            "SELECT value FROM kv_entries WHERE key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)
    }

    async fn claim(&self, key: &str) -> Result<Option<Value>, StoreError> {
        sqlx::query_scalar::<_, Value>(
            "DELETE FROM kv_entries \
             WHERE key = $1 AND expires_at > NOW() \
             RETURNING value",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_err)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
