// ABOUTME: Refresh rotation engine minting a new access token for an existing refresh token
// ABOUTME: Re-points the refresh record with compare-and-swap before retiring the old access token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::token_store::RecordStore;
use super::tokens::{fingerprint, mint_access_token, TokenLifetimes};
use doodle_core::errors::OAuth2ServerError;
use doodle_core::models::{AccessTokenRecord, OAuth2Client, RecordKind, RefreshTokenRecord};

/// Access token minted by a successful rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedAccessToken {
    /// New bearer access token
    pub access_token: String,
    /// Seconds until `access_token` expires
    pub expires_in: u64,
}

/// Rotates access tokens behind long-lived refresh tokens.
///
/// Write order: new access token, then the refresh pointer (conditional on the
/// pointer this request observed), then deletion of the old access token. At
/// every step the refresh token resolves to a stored access token, and of two
/// concurrent rotations on one generation only one can move the pointer.
#[derive(Clone)]
pub struct RefreshRotationEngine {
    store: RecordStore,
    lifetimes: TokenLifetimes,
}

impl RefreshRotationEngine {
    /// Build an engine over `store`
    #[must_use]
    pub const fn new(store: RecordStore, lifetimes: TokenLifetimes) -> Self {
        Self { store, lifetimes }
    }

    /// Redeem `refresh_token` presented by `client` for a new access token
    ///
    /// # Errors
    /// `InvalidGrant` if the refresh token is unknown, its chain is broken, it
    /// belongs to another client, or a concurrent rotation won; `Storage` on
    /// store failure
    pub async fn refresh(
        &self,
        client: &OAuth2Client,
        refresh_token: &str,
    ) -> Result<RefreshedAccessToken, OAuth2ServerError> {
        let Some(refresh) = self
            .store
            .get::<RefreshTokenRecord>(RecordKind::RefreshToken, refresh_token)
            .await?
        else {
            tracing::warn!(
                client_id = %client.client_id,
                refresh_token = fingerprint(refresh_token),
                "Refresh token not found"
            );
            return Err(OAuth2ServerError::invalid_grant("refresh token is invalid"));
        };

        let Some(current) = self
            .store
            .get::<AccessTokenRecord>(RecordKind::AccessToken, &refresh.record.access_token_ref)
            .await?
        else {
            tracing::warn!(
                client_id = %client.client_id,
                refresh_token = fingerprint(refresh_token),
                "Refresh token points at a missing access token"
            );
            // Nothing can re-point a dangling record; drop it unless it moved meanwhile
            if let Err(e) = self
                .store
                .compare_and_delete(RecordKind::RefreshToken, refresh_token, &refresh)
                .await
            {
                tracing::warn!(error = %e, "Failed to discard dangling refresh token");
            }
            return Err(OAuth2ServerError::invalid_grant(
                "refresh token no longer resolves to an access token",
            ));
        };

        if current.record.client_id != client.client_id {
            tracing::warn!(
                client_id = %client.client_id,
                bound_client_id = %current.record.client_id,
                "Refresh token presented by a different client"
            );
            return Err(OAuth2ServerError::invalid_grant(
                "refresh token was issued to another client",
            ));
        }

        let access = mint_access_token(
            current.record.user_id,
            &client.client_id,
            self.lifetimes.access_token,
        )?;
        self.store
            .put(
                RecordKind::AccessToken,
                &access.token,
                &access,
                Some(self.lifetimes.access_record_ttl()),
            )
            .await?;

        let rotated = RefreshTokenRecord {
            access_token_ref: access.token.clone(),
            ..refresh.record.clone()
        };
        // An Err here leaves the outcome unknown, so the new token is kept; it expires passively
        let swapped = self
            .store
            .compare_and_swap(RecordKind::RefreshToken, refresh_token, &refresh, &rotated)
            .await?;

        if !swapped {
            tracing::warn!(
                client_id = %client.client_id,
                refresh_token = fingerprint(refresh_token),
                "Refresh token rotated by a concurrent request"
            );
            if let Err(e) = self.store.delete(RecordKind::AccessToken, &access.token).await {
                tracing::warn!(error = %e, "Failed to discard losing access token");
            }
            return Err(OAuth2ServerError::invalid_grant(
                "refresh token was rotated by a concurrent request",
            ));
        }

        self.store
            .delete(RecordKind::AccessToken, &current.record.token)
            .await
            .map_err(|e| {
                tracing::error!(
                    client_id = %client.client_id,
                    error = %e,
                    "Failed to retire previous access token after rotation"
                );
                e
            })?;

        tracing::info!(
            client_id = %client.client_id,
            user_id = %access.user_id,
            "Access token rotated"
        );

        Ok(RefreshedAccessToken {
            expires_in: access.expires_in(access.issued_at),
            access_token: access.token,
        })
    }
}
