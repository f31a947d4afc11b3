// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides registered clients, an authorization server over a memory store, and a faulty store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `doodle_api`

use async_trait::async_trait;
use doodle_api::auth::InMemoryResourceOwnerDirectory;
use doodle_api::config::ServerConfig;
use doodle_api::oauth2_server::{
    AuthorizationServer, AuthorizeRequest, ClientCredentials, InMemoryClientRegistry,
    MemoryTokenStore, TokenLifetimes, TokenRequest, TokenStore,
};
use doodle_api::errors::StorageError;
use doodle_api::models::RecordKind;
use doodle_api::resources::ServerResources;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Registered client used by most tests
pub const CLIENT_ID: &str = "C1";
/// Secret of [`CLIENT_ID`]
pub const CLIENT_SECRET: &str = "s1";
/// Second registered client
pub const OTHER_CLIENT_ID: &str = "C2";
/// Secret of [`OTHER_CLIENT_ID`]
pub const OTHER_CLIENT_SECRET: &str = "s2";
/// Redirect URI registered for both clients
pub const REDIRECT_URI: &str = "https://app.example.com/cb";
/// Resource owner login
pub const USERNAME: &str = "alice";
/// Resource owner password
pub const PASSWORD: &str = "wonderland";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Client registry with C1 and C2 registered
pub fn create_test_clients() -> InMemoryClientRegistry {
    let clients = InMemoryClientRegistry::new();
    clients
        .register(CLIENT_ID, CLIENT_SECRET, vec![REDIRECT_URI.to_owned()])
        .unwrap();
    clients
        .register(
            OTHER_CLIENT_ID,
            OTHER_CLIENT_SECRET,
            vec![REDIRECT_URI.to_owned()],
        )
        .unwrap();
    clients
}

/// Authorization server wired to a store and the test clients
pub struct TestServer {
    /// Server under test
    pub server: AuthorizationServer,
    /// Backing store, shared with `server`
    pub store: Arc<dyn TokenStore>,
    /// Resource owner every code is issued for
    pub user_id: Uuid,
}

impl TestServer {
    /// Authorize `client_id` for the test user and return the code
    pub async fn authorize(&self, client_id: &str, redirect_uri: &str) -> String {
        self.server
            .authorize(
                AuthorizeRequest {
                    response_type: Some("code".to_owned()),
                    client_id: Some(client_id.to_owned()),
                    redirect_uri: Some(redirect_uri.to_owned()),
                    state: Some("xyz".to_owned()),
                },
                self.user_id,
            )
            .await
            .unwrap()
            .code
    }
}

/// Server over a fresh memory store with default lifetimes
pub fn create_test_server() -> TestServer {
    create_test_server_with(Arc::new(MemoryTokenStore::new()), TokenLifetimes::default())
}

/// Server over `store` with `lifetimes`
pub fn create_test_server_with(store: Arc<dyn TokenStore>, lifetimes: TokenLifetimes) -> TestServer {
    init_test_logging();
    let server = AuthorizationServer::new(store.clone(), Arc::new(create_test_clients()), lifetimes);
    TestServer {
        server,
        store,
        user_id: Uuid::new_v4(),
    }
}

/// Server resources for route tests, returning the resource owner's id
pub fn create_test_resources() -> (Arc<ServerResources>, Uuid) {
    init_test_logging();
    let owners = InMemoryResourceOwnerDirectory::new();
    let user_id = Uuid::new_v4();
    owners.register(user_id, USERNAME, PASSWORD).unwrap();

    let resources = ServerResources::new(
        Arc::new(ServerConfig::default()),
        Arc::new(MemoryTokenStore::new()),
        Arc::new(create_test_clients()),
        Arc::new(owners),
    );
    (Arc::new(resources), user_id)
}

/// Client credentials value
pub fn credentials(client_id: &str, client_secret: &str) -> ClientCredentials {
    ClientCredentials {
        client_id: client_id.to_owned(),
        client_secret: client_secret.to_owned(),
    }
}

/// `grant_type=authorization_code` request body
pub fn code_request(code: &str, redirect_uri: &str) -> TokenRequest {
    TokenRequest {
        grant_type: Some("authorization_code".to_owned()),
        code: Some(code.to_owned()),
        redirect_uri: Some(redirect_uri.to_owned()),
        ..TokenRequest::default()
    }
}

/// `grant_type=refresh_token` request body
pub fn refresh_request(refresh_token: &str) -> TokenRequest {
    TokenRequest {
        grant_type: Some("refresh_token".to_owned()),
        refresh_token: Some(refresh_token.to_owned()),
        ..TokenRequest::default()
    }
}

/// Memory store whose writes can be made to fail on demand
#[derive(Default)]
pub struct FaultyTokenStore {
    inner: MemoryTokenStore,
    fail_put: Mutex<Option<RecordKind>>,
    fail_delete: Mutex<Option<RecordKind>>,
    fail_swap: AtomicBool,
    fail_reads: AtomicBool,
}

impl FaultyTokenStore {
    /// Wrap a fresh memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` of `kind` fail
    pub fn fail_puts_of(&self, kind: RecordKind) {
        *self.fail_put.lock().unwrap() = Some(kind);
    }

    /// Make every `delete` of `kind` fail
    pub fn fail_deletes_of(&self, kind: RecordKind) {
        *self.fail_delete.lock().unwrap() = Some(kind);
    }

    /// Make `compare_and_swap` fail
    pub fn fail_swaps(&self) {
        self.fail_swap.store(true, Ordering::SeqCst);
    }

    /// Make `get` fail
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Clear every injected fault
    pub fn heal(&self) {
        *self.fail_put.lock().unwrap() = None;
        *self.fail_delete.lock().unwrap() = None;
        self.fail_swap.store(false, Ordering::SeqCst);
        self.fail_reads.store(false, Ordering::SeqCst);
    }

    fn faulted(slot: &Mutex<Option<RecordKind>>, kind: RecordKind) -> bool {
        *slot.lock().unwrap() == Some(kind)
    }

    fn injected() -> StorageError {
        StorageError::unavailable("injected fault")
    }
}

#[async_trait]
impl TokenStore for FaultyTokenStore {
    async fn put(
        &self,
        kind: RecordKind,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StorageError> {
        if Self::faulted(&self.fail_put, kind) {
            return Err(Self::injected());
        }
        self.inner.put(kind, key, value, ttl).await
    }

    async fn get(&self, kind: RecordKind, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.get(kind, key).await
    }

    async fn delete(&self, kind: RecordKind, key: &str) -> Result<bool, StorageError> {
        if Self::faulted(&self.fail_delete, kind) {
            return Err(Self::injected());
        }
        self.inner.delete(kind, key).await
    }

    async fn compare_and_delete(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
    ) -> Result<bool, StorageError> {
        self.inner.compare_and_delete(kind, key, expected).await
    }

    async fn compare_and_swap(
        &self,
        kind: RecordKind,
        key: &str,
        expected: &[u8],
        new: Vec<u8>,
    ) -> Result<bool, StorageError> {
        if self.fail_swap.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.compare_and_swap(kind, key, expected, new).await
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        self.inner.purge_expired().await
    }
}
