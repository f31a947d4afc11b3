// ABOUTME: Token store decorator bounding every backend call with a deadline
// ABOUTME: Elapsed calls surface as StorageError::Timeout and the caller aborts without retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::TokenStore;
use async_trait::async_trait;
use doodle_core::errors::StorageError;
use doodle_core::models::RecordKind;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Wraps another store and fails any call that outlives `limit`
#[derive(Clone)]
pub struct TimeoutTokenStore {
    inner: Arc<dyn TokenStore>,
    limit: Duration,
}

impl TimeoutTokenStore {
    /// Wrap `inner` with a per-call deadline
    #[must_use]
    pub fn new(inner: Arc<dyn TokenStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>> + Send,
    {
        if let Ok(result) = tokio::time::timeout(self.limit, call).await {
            result
        } else {
            tracing::warn!(
                operation,
                timeout_ms = self.limit.as_millis(),
                "Token store call timed out"
            );
            Err(StorageError::Timeout { operation })
        }
    }
}

#[async_trait]
impl TokenStore for TimeoutTokenStore {
    async fn put(
        &self,
        kind: RecordKind,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        self.bounded("put", self.inner.put(kind, key, value, ttl))
            .await
    }

    async fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.bounded("get", self.inner.get(kind, key)).await
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError> {
        self.bounded("delete", self.inner.delete(kind, key)).await
    }

    async fn compare_and_delete(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
    ) -> Result<bool, StorageError> {
        self.bounded(
            "compare_and_delete",
            self.inner.compare_and_delete(kind, key, expected),
        )
        .await
    }

    async fn compare_and_swap(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<bool, StorageError> {
        self.bounded(
            "compare_and_swap",
            self.inner.compare_and_swap(kind, key, expected, new),
        )
        .await
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        self.bounded("purge_expired", self.inner.purge_expired())
            .await
    }
}
