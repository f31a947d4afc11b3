// ABOUTME: Out-of-band registration of OAuth 2.0 clients and resource owners from a JSON file
// ABOUTME: Plaintext secrets in the file are hashed on load and never kept in memory afterwards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use crate::auth::InMemoryResourceOwnerDirectory;
use crate::oauth2_server::InMemoryClientRegistry;
use anyhow::{Context, Result};
use doodle_core::errors::AppResult;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

/// A client to register at startup
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapClient {
    /// OAuth 2.0 client identifier
    pub client_id: String,
    /// Plaintext client secret
    pub client_secret: String,
    /// Registered redirect URIs
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// A resource owner to register at startup
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapUser {
    /// Stable user id; generated when omitted
    pub user_id: Option<Uuid>,
    /// Login name used with HTTP Basic at the authorization endpoint
    pub username: String,
    /// Plaintext password
    pub password: String,
}

/// Contents of a bootstrap file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapFile {
    /// Clients to register
    #[serde(default)]
    pub clients: Vec<BootstrapClient>,
    /// Resource owners to register
    #[serde(default)]
    pub users: Vec<BootstrapUser>,
}

impl BootstrapFile {
    /// Read and parse a bootstrap file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid bootstrap JSON
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bootstrap file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid bootstrap file {}", path.display()))
    }

    /// Register every client and user
    ///
    /// # Errors
    /// Returns an error on the first registration that is rejected
    pub fn apply(
        &self,
        clients: &InMemoryClientRegistry,
        users: &InMemoryResourceOwnerDirectory,
    ) -> AppResult<()> {
        for client in &self.clients {
            clients.register(
                &client.client_id,
                &client.client_secret,
                client.redirect_uris.clone(),
            )?;
        }

        for user in &self.users {
            let user_id = user.user_id.unwrap_or_else(Uuid::new_v4);
            users.register(user_id, &user.username, &user.password)?;
        }

        tracing::info!(
            clients = self.clients.len(),
            users = self.users.len(),
            "Bootstrap registrations applied"
        );
        Ok(())
    }
}
