// ABOUTME: Authorization code issuance for the authorization_code grant
// ABOUTME: Mints a single-use code bound to client, redirect URI and resource owner, stored with a TTL
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::token_store::RecordStore;
use super::tokens::{expiry_after, fingerprint, generate_token_value};
use chrono::Utc;
use doodle_core::errors::OAuth2ServerError;
use doodle_core::models::{AuthorizationCodeRecord, OAuth2Client, RecordKind};
use std::time::Duration;
use uuid::Uuid;

/// Mints authorization codes
#[derive(Clone)]
pub struct AuthorizationCodeIssuer {
    store: RecordStore,
    code_ttl: Duration,
}

impl AuthorizationCodeIssuer {
    /// Build an issuer writing to `store`; codes expire after `code_ttl`
    #[must_use]
    pub const fn new(store: RecordStore, code_ttl: Duration) -> Self {
        Self { store, code_ttl }
    }

    /// Issue a code for `user_id` bound to `client` and `redirect_uri`.
    ///
    /// The redirect URI is recorded as presented; it is matched exactly at exchange.
    ///
    /// # Errors
    /// Returns `Storage` if the code cannot be generated or written
    pub async fn issue_code(
        &self,
        client: &OAuth2Client,
        redirect_uri: &str,
        user_id: Uuid,
    ) -> Result<String, OAuth2ServerError> {
        let issued_at = Utc::now();
        let record = AuthorizationCodeRecord {
            code: generate_token_value()?,
            client_id: client.client_id.clone(),
            redirect_uri: redirect_uri.to_owned(),
            user_id,
            issued_at,
            expires_at: expiry_after(issued_at, self.code_ttl)?,
        };

        self.store
            .put(
                RecordKind::AuthorizationCode,
                &record.code,
                &record,
                Some(self.code_ttl),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    client_id = %client.client_id,
                    error = %e,
                    "Failed to store authorization code"
                );
                e
            })?;

        tracing::debug!(
            client_id = %client.client_id,
            user_id = %user_id,
            code = fingerprint(&record.code),
            "Issued authorization code"
        );
        Ok(record.code)
    }
}
