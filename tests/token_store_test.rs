// ABOUTME: Integration tests for the token store backends and decorators
// ABOUTME: Runs the same conditional-operation and TTL checks against memory and SQLite stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use common::init_test_logging;
use doodle_api::errors::StorageError;
use doodle_api::models::RecordKind;
use doodle_api::oauth2_server::{
    spawn_reaper, MemoryTokenStore, SqliteTokenStore, TimeoutTokenStore, TokenStore,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const KIND: RecordKind = RecordKind::AuthorizationCode;

async fn sqlite_store(dir: &TempDir) -> SqliteTokenStore {
    let url = format!("sqlite:{}", dir.path().join("tokens.db").display());
    SqliteTokenStore::connect(&url).await.unwrap()
}

async fn check_basic_operations(store: &dyn TokenStore) {
    assert_eq!(store.get(KIND, "k1").await.unwrap(), None);

    store.put(KIND, "k1", b"v1".to_vec(), None).await.unwrap();
    assert_eq!(store.get(KIND, "k1").await.unwrap(), Some(b"v1".to_vec()));

    // Namespaces are disjoint
    assert_eq!(store.get(RecordKind::AccessToken, "k1").await.unwrap(), None);

    store.put(KIND, "k1", b"v2".to_vec(), None).await.unwrap();
    assert_eq!(store.get(KIND, "k1").await.unwrap(), Some(b"v2".to_vec()));

    assert!(store.delete(KIND, "k1").await.unwrap());
    assert!(!store.delete(KIND, "k1").await.unwrap());
}

async fn check_conditional_operations(store: &dyn TokenStore) {
    store.put(KIND, "code", b"v1".to_vec(), None).await.unwrap();

    assert!(!store.compare_and_delete(KIND, "code", b"stale").await.unwrap());
    assert!(store.compare_and_delete(KIND, "code", b"v1").await.unwrap());
    assert!(!store.compare_and_delete(KIND, "code", b"v1").await.unwrap());

    store.put(KIND, "rt", b"v1".to_vec(), None).await.unwrap();
    assert!(store
        .compare_and_swap(KIND, "rt", b"v1", b"v2".to_vec())
        .await
        .unwrap());
    assert!(!store
        .compare_and_swap(KIND, "rt", b"v1", b"v3".to_vec())
        .await
        .unwrap());
    assert_eq!(store.get(KIND, "rt").await.unwrap(), Some(b"v2".to_vec()));

    assert!(!store
        .compare_and_swap(KIND, "missing", b"v1", b"v2".to_vec())
        .await
        .unwrap());
}

async fn check_expiry(store: &dyn TokenStore) {
    store
        .put(KIND, "short", b"v".to_vec(), Some(Duration::from_millis(50)))
        .await
        .unwrap();
    store
        .put(KIND, "long", b"v".to_vec(), Some(Duration::from_secs(600)))
        .await
        .unwrap();
    assert!(store.get(KIND, "short").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(120)).await;

    assert!(!store.compare_and_delete(KIND, "short", b"v").await.unwrap());
    assert!(!store
        .compare_and_swap(KIND, "short", b"v", b"w".to_vec())
        .await
        .unwrap());

    assert_eq!(store.purge_expired().await.unwrap(), 1);
    assert_eq!(store.purge_expired().await.unwrap(), 0);
    assert_eq!(store.get(KIND, "short").await.unwrap(), None);
    assert!(store.get(KIND, "long").await.unwrap().is_some());
}

async fn check_swap_keeps_expiry(store: &dyn TokenStore) {
    store
        .put(KIND, "ttl", b"v1".to_vec(), Some(Duration::from_millis(80)))
        .await
        .unwrap();
    assert!(store
        .compare_and_swap(KIND, "ttl", b"v1", b"v2".to_vec())
        .await
        .unwrap());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(store.get(KIND, "ttl").await.unwrap(), None);
}

#[tokio::test]
async fn test_memory_store_contract() {
    init_test_logging();
    let store = MemoryTokenStore::new();
    check_basic_operations(&store).await;
    check_conditional_operations(&store).await;
    check_expiry(&store).await;
    check_swap_keeps_expiry(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let store = sqlite_store(&dir).await;
    check_basic_operations(&store).await;
    check_conditional_operations(&store).await;
    check_expiry(&store).await;
    check_swap_keeps_expiry(&store).await;
}

#[tokio::test]
async fn test_memory_store_rejects_unrepresentable_ttl() {
    init_test_logging();
    let store = MemoryTokenStore::new();
    let error = store
        .put(KIND, "k", b"v".to_vec(), Some(Duration::MAX))
        .await
        .unwrap_err();
    assert!(matches!(error, StorageError::Backend { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_sqlite_in_memory_store() {
    init_test_logging();
    let store = SqliteTokenStore::connect("sqlite::memory:").await.unwrap();
    check_basic_operations(&store).await;
    check_conditional_operations(&store).await;
}

#[tokio::test]
async fn test_sqlite_store_survives_reopen() {
    init_test_logging();
    let dir = TempDir::new().unwrap();

    {
        let store = sqlite_store(&dir).await;
        store
            .put(RecordKind::RefreshToken, "rt", b"pointer".to_vec(), None)
            .await
            .unwrap();
    }

    let reopened = sqlite_store(&dir).await;
    assert_eq!(
        reopened.get(RecordKind::RefreshToken, "rt").await.unwrap(),
        Some(b"pointer".to_vec())
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_compare_and_delete_has_one_winner() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let stores: Vec<Arc<dyn TokenStore>> = vec![
        Arc::new(MemoryTokenStore::new()),
        Arc::new(sqlite_store(&dir).await),
    ];

    for store in stores {
        store.put(KIND, "code", b"v".to_vec(), None).await.unwrap();

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.compare_and_delete(KIND, "code", b"v").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

/// Store whose reads never complete in time
struct SlowTokenStore;

#[async_trait]
impl TokenStore for SlowTokenStore {
    async fn put(
        &self,
        _kind: RecordKind,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    async fn get(&self, _kind: RecordKind, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(None)
    }

    async fn delete(&self, _kind: RecordKind, _key: &str) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn compare_and_delete(
        &self,
        _kind: RecordKind,
        _key: &str,
        _expected: &[u8],
    ) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn compare_and_swap(
        &self,
        _kind: RecordKind,
        _key: &str,
        _expected: &[u8],
        _new: Vec<u8>,
    ) -> Result<bool, StorageError> {
        Ok(false)
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        Ok(0)
    }
}

#[tokio::test]
async fn test_timeout_decorator_bounds_slow_calls() {
    init_test_logging();
    let store = TimeoutTokenStore::new(Arc::new(SlowTokenStore), Duration::from_millis(50));

    let error = store.get(KIND, "k").await.unwrap_err();
    assert!(matches!(error, StorageError::Timeout { operation: "get" }));

    // Fast calls pass straight through
    store.put(KIND, "k", b"v".to_vec(), None).await.unwrap();
}

#[tokio::test]
async fn test_reaper_purges_in_background() {
    init_test_logging();
    let store = Arc::new(MemoryTokenStore::new());
    store
        .put(KIND, "short", b"v".to_vec(), Some(Duration::from_millis(20)))
        .await
        .unwrap();
    assert_eq!(store.len(), 1);

    let reaper = spawn_reaper(store.clone(), Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(store.is_empty());
    drop(reaper);
}
