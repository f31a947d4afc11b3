// ABOUTME: Token store abstraction for authorization codes, access tokens, and refresh tokens
// ABOUTME: Byte-level keyed storage with TTL plus conditional delete/swap, and a typed JSON facade
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! # Token Store
//!
//! Durable keyed storage for the three OAuth 2.0 record kinds. Backends only
//! see opaque bytes in three namespaces; [`RecordStore`] layers JSON encoding on
//! top and remembers the exact stored bytes of every read so that conditional
//! operations compare against what the caller actually observed.
//!
//! The conditional operations are what make single-use codes and refresh
//! rotation safe under concurrency: `compare_and_delete` reports success to
//! exactly one caller, and `compare_and_swap` fails once another writer has
//! moved the record on.

/// In-memory backend
pub mod memory;
/// `SQLite` backend
pub mod sqlite;
/// Per-call timeout decorator
pub mod timeout;

pub use memory::MemoryTokenStore;
pub use sqlite::SqliteTokenStore;
pub use timeout::TimeoutTokenStore;

use async_trait::async_trait;
use doodle_core::errors::StorageError;
use doodle_core::models::RecordKind;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Storage operations required by the authorization server
#[async_trait]
pub trait TokenStore: Send + Sync + 'static {
    /// Insert or replace a record. `ttl` of `None` keeps it until deleted.
    async fn put(
        &self,
        kind: RecordKind,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError>;

    /// Fetch a live record; expired records read as absent
    async fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove a record, returning whether one was present
    async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError>;

    /// Remove the record only if it is live and its bytes equal `expected`.
    /// Among concurrent callers with the same `expected`, at most one sees `true`.
    async fn compare_and_delete(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
    ) -> Result<bool, StorageError>;

    /// Replace the record's bytes only if it is live and currently equals `expected`.
    /// The record keeps its existing expiry.
    async fn compare_and_swap(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<bool, StorageError>;

    /// Physically remove every expired record, returning how many were dropped
    async fn purge_expired(&self) -> Result<u64, StorageError>;
}

/// A decoded record together with the exact bytes it was decoded from
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The decoded record
    pub record: T,
    raw: Vec<u8>,
}

/// Typed JSON facade over a [`TokenStore`]
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<dyn TokenStore>,
}

impl RecordStore {
    /// Wrap a backend
    #[must_use]
    pub fn new(inner: Arc<dyn TokenStore>) -> Self {
        Self { inner }
    }

    /// Underlying backend
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn TokenStore> {
        &self.inner
    }

    /// Store `record` under `key`
    ///
    /// # Errors
    /// Returns an error if encoding or the backend write fails
    pub async fn put<T: Serialize + Sync>(
        &self,
        kind: RecordKind,
        key: &str,
        record: &T,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(record)?;
        self.inner.put(kind, key, bytes, ttl).await
    }

    /// Load the live record under `key`
    ///
    /// # Errors
    /// Returns an error if the backend read or decoding fails
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        key: &str,
    ) -> Result<Option<Versioned<T>>, StorageError> {
        match self.inner.get(kind, key).await? {
            Some(raw) => {
                let record = serde_json::from_slice(&raw)?;
                Ok(Some(Versioned { record, raw }))
            }
            None => Ok(None),
        }
    }

    /// Remove the record under `key`
    ///
    /// # Errors
    /// Returns an error if the backend delete fails
    pub async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError> {
        self.inner.delete(kind, key).await
    }

    /// Remove the record only if it is unchanged since `observed` was read
    ///
    /// # Errors
    /// Returns an error if the backend operation fails
    pub async fn compare_and_delete<T>(
        &self,
        kind: RecordKind,
        key: &str,
        observed: &Versioned<T>,
    ) -> Result<bool, StorageError> {
        self.inner.compare_and_delete(kind, key, &observed.raw).await
    }

    /// Replace the record with `new` only if it is unchanged since `observed` was read
    ///
    /// # Errors
    /// Returns an error if encoding or the backend operation fails
    pub async fn compare_and_swap<T: Serialize + Sync>(
        &self,
        kind: RecordKind,
        key: &str,
        observed: &Versioned<T>,
        new: &T,
    ) -> Result<bool, StorageError> {
        let bytes = serde_json::to_vec(new)?;
        self.inner
            .compare_and_swap(kind, key, &observed.raw, bytes)
            .await
    }
}

/// Handle to a background reaper; dropping it stops the task
pub struct ReaperHandle {
    _shutdown_tx: tokio::sync::mpsc::Sender<()>,
}

/// Spawn a task that purges expired records every `interval`
#[must_use]
pub fn spawn_reaper(store: Arc<dyn TokenStore>, interval: Duration) -> ReaperHandle {
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match store.purge_expired().await {
                        Ok(0) => {}
                        Ok(removed) => tracing::debug!("Purged {removed} expired token records"),
                        Err(e) => tracing::warn!(error = %e, "Token store purge failed"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("Token store reaper received shutdown signal");
                    break;
                }
            }
        }
    });

    ReaperHandle {
        _shutdown_tx: shutdown_tx,
    }
}
