// ABOUTME: Token exchange engine redeeming authorization codes for access and refresh tokens
// ABOUTME: Binding checks run first, then a conditional delete consumes the code exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::token_store::RecordStore;
use super::tokens::{fingerprint, generate_token_value, mint_access_token, TokenLifetimes};
use chrono::Utc;
use doodle_core::errors::OAuth2ServerError;
use doodle_core::models::{
    AuthorizationCodeRecord, OAuth2Client, RecordKind, RefreshTokenRecord,
};

/// Credentials minted by a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// New bearer access token
    pub access_token: String,
    /// Refresh token resolving to `access_token`
    pub refresh_token: String,
    /// Seconds until `access_token` expires
    pub expires_in: u64,
}

/// Redeems authorization codes
#[derive(Clone)]
pub struct TokenExchangeEngine {
    store: RecordStore,
    lifetimes: TokenLifetimes,
}

impl TokenExchangeEngine {
    /// Build an engine over `store`
    #[must_use]
    pub const fn new(store: RecordStore, lifetimes: TokenLifetimes) -> Self {
        Self { store, lifetimes }
    }

    /// Exchange `code` presented by `client` with `redirect_uri` for a token pair.
    ///
    /// A binding mismatch leaves the code redeemable by its rightful client.
    /// Once the code is consumed a later failure cannot be retried: the client
    /// must restart the authorization flow.
    ///
    /// # Errors
    /// `InvalidGrant` if the code is unknown, expired, already used or bound to
    /// another client or redirect URI; `Storage` on store failure
    pub async fn exchange_code(
        &self,
        client: &OAuth2Client,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, OAuth2ServerError> {
        let Some(stored) = self
            .store
            .get::<AuthorizationCodeRecord>(RecordKind::AuthorizationCode, code)
            .await?
        else {
            tracing::warn!(
                client_id = %client.client_id,
                code = fingerprint(code),
                "Authorization code not found or already used"
            );
            return Err(OAuth2ServerError::invalid_grant(
                "authorization code is invalid or already used",
            ));
        };

        Self::check_binding(&stored.record, client, redirect_uri)?;

        if !self
            .store
            .compare_and_delete(RecordKind::AuthorizationCode, code, &stored)
            .await?
        {
            tracing::warn!(
                client_id = %client.client_id,
                code = fingerprint(code),
                "Authorization code consumed by a concurrent exchange"
            );
            return Err(OAuth2ServerError::invalid_grant(
                "authorization code is invalid or already used",
            ));
        }

        // Code is consumed from here on; any failure below is fail-closed
        let access = mint_access_token(
            stored.record.user_id,
            &client.client_id,
            self.lifetimes.access_token,
        )?;
        let refresh = RefreshTokenRecord {
            token: generate_token_value()?,
            access_token_ref: access.token.clone(),
            issued_at: access.issued_at,
        };

        let persisted = tokio::try_join!(
            self.store.put(
                RecordKind::AccessToken,
                &access.token,
                &access,
                Some(self.lifetimes.access_record_ttl()),
            ),
            self.store
                .put(RecordKind::RefreshToken, &refresh.token, &refresh, None),
        );

        if let Err(e) = persisted {
            tracing::error!(
                client_id = %client.client_id,
                error = %e,
                "Failed to persist tokens after consuming authorization code"
            );
            self.discard(&access.token, &refresh.token).await;
            return Err(e.into());
        }

        tracing::info!(
            client_id = %client.client_id,
            user_id = %access.user_id,
            "Authorization code exchanged for tokens"
        );

        Ok(TokenGrant {
            expires_in: access.expires_in(access.issued_at),
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }

    fn check_binding(
        record: &AuthorizationCodeRecord,
        client: &OAuth2Client,
        redirect_uri: &str,
    ) -> Result<(), OAuth2ServerError> {
        if record.is_expired(Utc::now()) {
            tracing::warn!(client_id = %client.client_id, "Authorization code expired");
            return Err(OAuth2ServerError::invalid_grant(
                "authorization code has expired",
            ));
        }

        if record.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                bound_client_id = %record.client_id,
                "Authorization code presented by a different client"
            );
            return Err(OAuth2ServerError::invalid_grant(
                "authorization code was issued to another client",
            ));
        }

        if record.redirect_uri != redirect_uri {
            tracing::warn!(
                client_id = %client.client_id,
                "Redirect URI does not match the authorization request"
            );
            return Err(OAuth2ServerError::invalid_grant(
                "redirect_uri does not match the authorization request",
            ));
        }

        Ok(())
    }

    /// Best-effort removal of partially persisted tokens
    async fn discard(&self, access_token: &str, refresh_token: &str) {
        let (access, refresh) = tokio::join!(
            self.store.delete(RecordKind::AccessToken, access_token),
            self.store.delete(RecordKind::RefreshToken, refresh_token),
        );
        for result in [access, refresh] {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to discard partially issued token");
            }
        }
    }
}
