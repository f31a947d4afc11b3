// ABOUTME: Registered OAuth 2.0 client lookup and client credential authentication
// ABOUTME: Clients are created out-of-band with Argon2-hashed secrets; the authenticator verifies them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use crate::crypto::{hash_secret, verify_secret, verify_unknown_secret};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use doodle_core::errors::{AppError, AppResult, OAuth2ServerError, StorageError};
use doodle_core::models::OAuth2Client;
use std::sync::Arc;

/// Read access to registered clients
#[async_trait]
pub trait ClientRegistry: Send + Sync + 'static {
    /// Look up a client by its identifier
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read
    async fn find_by_id(&self, client_id: &str) -> Result<Option<OAuth2Client>, StorageError>;
}

/// Client registry held in process memory
#[derive(Clone, Default)]
pub struct InMemoryClientRegistry {
    clients: Arc<DashMap<String, OAuth2Client>>,
}

impl InMemoryClientRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, hashing `client_secret` before it is stored
    ///
    /// # Errors
    /// Returns an error if the client id is empty or already taken, a redirect URI
    /// is malformed, or hashing fails
    pub fn register(
        &self,
        client_id: &str,
        client_secret: &str,
        redirect_uris: Vec<String>,
    ) -> AppResult<OAuth2Client> {
        if client_id.trim().is_empty() {
            return Err(AppError::invalid_input("client_id must not be empty"));
        }
        if client_secret.is_empty() {
            return Err(AppError::invalid_input("client_secret must not be empty"));
        }
        for uri in &redirect_uris {
            if !is_valid_redirect_uri(uri) {
                return Err(AppError::invalid_input(format!(
                    "Invalid redirect_uri for client {client_id}: {uri}"
                )));
            }
        }

        let client = OAuth2Client {
            client_id: client_id.to_owned(),
            client_secret_hash: hash_secret(client_secret)?,
            redirect_uris,
            client_name: None,
            created_at: Utc::now(),
        };

        match self.clients.entry(client_id.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::invalid_input(format!(
                "OAuth2 client {client_id} is already registered"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(client.clone());
                tracing::info!(client_id = %client_id, "Registered OAuth2 client");
                Ok(client)
            }
        }
    }

    /// Number of registered clients
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl ClientRegistry for InMemoryClientRegistry {
    async fn find_by_id(&self, client_id: &str) -> Result<Option<OAuth2Client>, StorageError> {
        Ok(self.clients.get(client_id).map(|entry| entry.value().clone()))
    }
}

/// Registered redirect URIs must be absolute, fragment-free and wildcard-free,
/// and use https unless they point at the loopback host
fn is_valid_redirect_uri(uri: &str) -> bool {
    if uri.trim().is_empty() || uri.contains('#') || uri.contains('*') {
        return false;
    }

    let Ok(parsed_uri) = url::Url::parse(uri) else {
        tracing::warn!("Rejected malformed redirect_uri: {}", uri);
        return false;
    };

    let is_localhost = matches!(parsed_uri.host_str(), Some("localhost" | "127.0.0.1"));
    match parsed_uri.scheme() {
        "https" => parsed_uri.host_str().is_some(),
        "http" => is_localhost,
        _ => false,
    }
}

/// Verifies client credentials against a [`ClientRegistry`]
#[derive(Clone)]
pub struct ClientAuthenticator {
    registry: Arc<dyn ClientRegistry>,
}

impl ClientAuthenticator {
    /// Build an authenticator over `registry`
    #[must_use]
    pub fn new(registry: Arc<dyn ClientRegistry>) -> Self {
        Self { registry }
    }

    /// Resolve a client by id without checking any secret
    ///
    /// # Errors
    /// `UnknownClient` if absent, `Storage` if the registry fails
    pub async fn resolve(&self, client_id: &str) -> Result<OAuth2Client, OAuth2ServerError> {
        self.registry
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(client_id = %client_id, "OAuth client not found");
                OAuth2ServerError::UnknownClient {
                    client_id: client_id.to_owned(),
                }
            })
    }

    /// Authenticate a confidential client
    ///
    /// # Errors
    /// `UnknownClient` if no such client, `InvalidSecret` if the secret does not
    /// verify, `Storage` if the registry fails
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuth2Client, OAuth2ServerError> {
        tracing::debug!("Validating OAuth client: {}", client_id);
        let client = match self.resolve(client_id).await {
            Ok(client) => client,
            Err(e) => {
                if matches!(e, OAuth2ServerError::UnknownClient { .. }) {
                    verify_unknown_secret(client_secret);
                }
                return Err(e);
            }
        };

        // Argon2 verification is constant-time in the secret
        if !verify_secret(client_secret, &client.client_secret_hash) {
            tracing::warn!(client_id = %client_id, "OAuth client secret validation failed");
            return Err(OAuth2ServerError::InvalidSecret {
                client_id: client_id.to_owned(),
            });
        }

        tracing::debug!(client_id = %client_id, "OAuth client authenticated");
        Ok(client)
    }
}
