// ABOUTME: Shared server resources handed to every HTTP handler
// ABOUTME: Builds the token store stack and the authorization server from configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use crate::auth::ResourceOwnerDirectory;
use crate::config::{ServerConfig, TokenStoreBackend};
use crate::oauth2_server::{
    AuthorizationServer, ClientRegistry, MemoryTokenStore, SqliteTokenStore, TimeoutTokenStore,
    TokenStore,
};
use doodle_core::errors::StorageError;
use std::sync::Arc;

/// Everything the route handlers need, built once at startup
#[derive(Clone)]
pub struct ServerResources {
    /// OAuth 2.0 authorization server
    pub authorization_server: AuthorizationServer,
    /// Resource-owner credential check for the authorization endpoint
    pub resource_owners: Arc<dyn ResourceOwnerDirectory>,
    /// Token store, also probed by the readiness endpoint
    pub token_store: Arc<dyn TokenStore>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Assemble resources over an already-built token store
    #[must_use]
    pub fn new(
        config: Arc<ServerConfig>,
        token_store: Arc<dyn TokenStore>,
        clients: Arc<dyn ClientRegistry>,
        resource_owners: Arc<dyn ResourceOwnerDirectory>,
    ) -> Self {
        let authorization_server = AuthorizationServer::new(
            token_store.clone(),
            clients,
            config.oauth2_server.lifetimes(),
        );
        Self {
            authorization_server,
            resource_owners,
            token_store,
            config,
        }
    }
}

/// Open the configured token store backend, wrapped with the per-call timeout
///
/// # Errors
/// Returns an error if the `SQLite` database cannot be opened
pub async fn build_token_store(config: &ServerConfig) -> Result<Arc<dyn TokenStore>, StorageError> {
    let backend: Arc<dyn TokenStore> = match config.token_store.backend {
        TokenStoreBackend::Memory => Arc::new(MemoryTokenStore::new()),
        TokenStoreBackend::Sqlite => {
            Arc::new(SqliteTokenStore::connect(&config.token_store.database_url).await?)
        }
    };

    tracing::info!(
        backend = %config.token_store.backend,
        timeout_ms = config.token_store.operation_timeout_ms,
        "Token store initialized"
    );
    Ok(Arc::new(TimeoutTokenStore::new(
        backend,
        config.token_store.operation_timeout(),
    )))
}
