// ABOUTME: SQLite-backed token store using sqlx with conditional DELETE/UPDATE statements
// ABOUTME: One table keyed by (namespace, key); expiry stored as unix milliseconds
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::TokenStore;
use async_trait::async_trait;
use chrono::Utc;
use doodle_core::errors::StorageError;
use doodle_core::models::RecordKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

const CREATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS token_records (
    namespace  TEXT    NOT NULL,
    key        TEXT    NOT NULL,
    value      BLOB    NOT NULL,
    expires_at INTEGER,
    PRIMARY KEY (namespace, key)
)";

const CREATE_EXPIRY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_token_records_expires_at ON token_records (expires_at)";

/// Token store persisted in a `SQLite` database.
///
/// Every conditional operation is a single statement whose `WHERE` clause
/// carries the expected value, so `SQLite`'s statement atomicity provides the
/// compare-and-set guarantee.
#[derive(Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Connect to `database_url` and create the schema if needed.
    ///
    /// In-memory URLs (`sqlite::memory:`) are private to one connection, so the
    /// pool is pinned to a single connection for them.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid, the database cannot be opened, or
    /// schema creation fails
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(database_url = %database_url, "SQLite token store ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_EXPIRY_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn expiry_millis(ttl: Option<Duration>) -> Option<i64> {
        ttl.map(|ttl| {
            let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
            Self::now_millis().saturating_add(ttl_millis)
        })
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn put(
        &self,
        kind: RecordKind,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"INSERT INTO token_records (namespace, key, value, expires_at)
              VALUES (?1, ?2, ?3, ?4)
              ON CONFLICT (namespace, key)
              DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        )
        .bind(kind.namespace())
        .bind(key)
        .bind(value)
        .bind(Self::expiry_millis(ttl))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row = sqlx::query(
            r"SELECT value FROM token_records
              WHERE namespace = ?1 AND key = ?2
                AND (expires_at IS NULL OR expires_at > ?3)",
        )
        .bind(kind.namespace())
        .bind(key)
        .bind(Self::now_millis())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.try_get::<Vec<u8>, _>("value"))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM token_records WHERE namespace = ?1 AND key = ?2")
            .bind(kind.namespace())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn compare_and_delete(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"DELETE FROM token_records
              WHERE namespace = ?1 AND key = ?2 AND value = ?3
                AND (expires_at IS NULL OR expires_at > ?4)",
        )
        .bind(kind.namespace())
        .bind(key)
        .bind(expected)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn compare_and_swap(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r"UPDATE token_records SET value = ?1
              WHERE namespace = ?2 AND key = ?3 AND value = ?4
                AND (expires_at IS NULL OR expires_at > ?5)",
        )
        .bind(new)
        .bind(kind.namespace())
        .bind(key)
        .bind(expected)
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let result = sqlx::query(
            "DELETE FROM token_records WHERE expires_at IS NOT NULL AND expires_at <= ?1",
        )
        .bind(Self::now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
