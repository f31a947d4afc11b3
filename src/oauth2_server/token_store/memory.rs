// ABOUTME: In-memory token store with per-entry TTL and atomic conditional operations
// ABOUTME: Backed by a sharded concurrent map; expired entries read as absent and are reaped lazily
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::TokenStore;
use async_trait::async_trait;
use dashmap::DashMap;
use doodle_core::errors::StorageError;
use doodle_core::models::RecordKind;
use std::sync::Arc;
use std::time::{Duration, Instant};

type EntryKey = (RecordKind, String);

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }

    fn is_live_and_equals(&self, expected: &[u8]) -> bool {
        !self.is_expired() && self.value == expected
    }
}

/// Token store held entirely in process memory.
///
/// Conditional operations run under the map's shard lock for the key, so a
/// compare and its mutation are a single step from the point of view of every
/// other caller.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<DashMap<EntryKey, Entry>>,
}

impl MemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is physically stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_key(kind: RecordKind, key: &str) -> EntryKey {
        (kind, key.to_owned())
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(
        &self,
        kind: RecordKind,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Instant::now()
                    .checked_add(ttl)
                    .ok_or_else(|| StorageError::backend("ttl out of range"))?,
            ),
            None => None,
        };
        let entry = Entry { value, expires_at };
        self.entries.insert(Self::entry_key(kind, key), entry);
        Ok(())
    }

    async fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entry_key = Self::entry_key(kind, key);
        let expired = match self.entries.get(&entry_key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        // Shard guard released above; remove only if still expired
        if expired {
            self.entries
                .remove_if(&entry_key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.remove(&Self::entry_key(kind, key)).is_some())
    }

    async fn compare_and_delete(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
    ) -> Result<bool, StorageError> {
        Ok(self
            .entries
            .remove_if(&Self::entry_key(kind, key), |_, entry| {
                entry.is_live_and_equals(expected)
            })
            .is_some())
    }

    async fn compare_and_swap(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<bool, StorageError> {
        match self.entries.get_mut(&Self::entry_key(kind, key)) {
            Some(mut entry) if entry.is_live_and_equals(expected) => {
                entry.value = new;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let mut removed = 0u64;
        self.entries.retain(|_, entry| {
            let expired = entry.is_expired();
            removed += u64::from(expired);
            !expired
        });
        Ok(removed)
    }
}
