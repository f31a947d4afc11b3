// ABOUTME: Resource-owner authentication and HTTP credential header parsing
// ABOUTME: Argon2-backed user directory plus Basic and Bearer Authorization header extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! # Resource-owner authentication
//!
//! The authorization endpoint needs an authenticated user before it can mint a
//! code. Users present HTTP Basic credentials which are checked against a
//! [`ResourceOwnerDirectory`]. The same header helpers serve client
//! authentication (`client_secret_basic`) at the token endpoint and bearer
//! extraction for API routes.

use crate::crypto::{hash_secret, verify_secret, verify_unknown_secret};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use dashmap::DashMap;
use doodle_core::errors::{AppError, AppResult, StorageError};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Verifies resource-owner credentials
#[async_trait]
pub trait ResourceOwnerDirectory: Send + Sync + 'static {
    /// Return the user id when `username`/`password` verify, `None` otherwise
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<Option<Uuid>, StorageError>;
}

#[derive(Clone)]
struct ResourceOwner {
    user_id: Uuid,
    password_hash: String,
}

/// Resource-owner directory held in process memory
#[derive(Clone, Default)]
pub struct InMemoryResourceOwnerDirectory {
    owners: Arc<DashMap<String, ResourceOwner>>,
}

impl InMemoryResourceOwnerDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, hashing `password` before it is stored
    ///
    /// # Errors
    /// Returns an error if the username is empty or taken, or hashing fails
    pub fn register(&self, user_id: Uuid, username: &str, password: &str) -> AppResult<()> {
        if username.trim().is_empty() {
            return Err(AppError::invalid_input("username must not be empty"));
        }

        let owner = ResourceOwner {
            user_id,
            password_hash: hash_secret(password)?,
        };

        match self.owners.entry(username.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(AppError::invalid_input(format!(
                "User {username} is already registered"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(owner);
                tracing::info!(user_id = %user_id, "Registered resource owner");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ResourceOwnerDirectory for InMemoryResourceOwnerDirectory {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Uuid>, StorageError> {
        let Some(owner) = self.owners.get(username).map(|entry| entry.value().clone()) else {
            // Same Argon2 cost as a wrong password
            verify_unknown_secret(password);
            return Ok(None);
        };

        if verify_secret(password, &owner.password_hash) {
            Ok(Some(owner.user_id))
        } else {
            tracing::warn!(user_id = %owner.user_id, "Resource owner password rejected");
            Ok(None)
        }
    }
}

/// Decoded `Authorization: Basic` credentials
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// User name or client id
    pub username: String,
    /// Password or client secret
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl BasicCredentials {
    /// Parse an `Authorization` header value of the form `Basic base64(user:pass)`
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let (scheme, encoded) = header_value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self {
            username: username.to_owned(),
            password: password.to_owned(),
        })
    }

    /// Extract Basic credentials from request headers, if present and well formed
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::parse)
    }
}

/// Extract a bearer token from the `Authorization` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
