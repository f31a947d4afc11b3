// ABOUTME: OAuth 2.0 authorization server composing client authentication and the grant engines
// ABOUTME: Serves the authorize and token operations plus bearer access-token validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use super::client_registry::{ClientAuthenticator, ClientRegistry};
use super::exchange::TokenExchangeEngine;
use super::issuer::AuthorizationCodeIssuer;
use super::models::{
    AuthorizeRequest, AuthorizeResponse, ClientCredentials, TokenRequest, TokenResponse,
    ValidatedAccessToken,
};
use super::refresh::RefreshRotationEngine;
use super::token_store::{RecordStore, TokenStore};
use super::tokens::{fingerprint, TokenLifetimes};
use chrono::Utc;
use doodle_core::constants::oauth2::{
    GRANT_AUTHORIZATION_CODE, GRANT_REFRESH_TOKEN, RESPONSE_TYPE_CODE, TOKEN_TYPE_BEARER,
};
use doodle_core::errors::OAuth2ServerError;
use doodle_core::models::{AccessTokenRecord, RecordKind};
use std::sync::Arc;
use uuid::Uuid;

/// OAuth 2.0 Authorization Server
///
/// Constructed once at startup with its token store and client registry and
/// shared with the HTTP handlers; it holds no other mutable state.
#[derive(Clone)]
pub struct AuthorizationServer {
    authenticator: ClientAuthenticator,
    issuer: AuthorizationCodeIssuer,
    exchange: TokenExchangeEngine,
    rotation: RefreshRotationEngine,
    store: RecordStore,
}

impl AuthorizationServer {
    /// Build a server over injected storage
    #[must_use]
    pub fn new(
        token_store: Arc<dyn TokenStore>,
        registry: Arc<dyn ClientRegistry>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        let store = RecordStore::new(token_store);
        Self {
            authenticator: ClientAuthenticator::new(registry),
            issuer: AuthorizationCodeIssuer::new(store.clone(), lifetimes.auth_code),
            exchange: TokenExchangeEngine::new(store.clone(), lifetimes),
            rotation: RefreshRotationEngine::new(store.clone(), lifetimes),
            store,
        }
    }

    /// Client authenticator shared by both endpoints
    #[must_use]
    pub const fn authenticator(&self) -> &ClientAuthenticator {
        &self.authenticator
    }

    /// Authorization code issuer
    #[must_use]
    pub const fn issuer(&self) -> &AuthorizationCodeIssuer {
        &self.issuer
    }

    /// Code exchange engine
    #[must_use]
    pub const fn exchange(&self) -> &TokenExchangeEngine {
        &self.exchange
    }

    /// Refresh rotation engine
    #[must_use]
    pub const fn rotation(&self) -> &RefreshRotationEngine {
        &self.rotation
    }

    /// Handle an authorization request for an authenticated resource owner.
    /// Consent is granted automatically.
    ///
    /// # Errors
    /// `UnknownClient` for an unregistered client, `Validation` for a bad
    /// `response_type` or missing parameters, `Storage` on store failure
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
        user_id: Uuid,
    ) -> Result<AuthorizeResponse, OAuth2ServerError> {
        let client_id = request
            .client_id
            .ok_or_else(|| OAuth2ServerError::validation("Missing client_id"))?;
        let client = self.authenticator.resolve(&client_id).await?;

        match request.response_type.as_deref() {
            Some(RESPONSE_TYPE_CODE) => {}
            Some(other) => {
                return Err(OAuth2ServerError::validation(format!(
                    "Unsupported response_type '{other}'; only 'code' is supported"
                )))
            }
            None => return Err(OAuth2ServerError::validation("Missing response_type")),
        }

        let redirect_uri = request
            .redirect_uri
            .filter(|uri| !uri.is_empty())
            .ok_or_else(|| OAuth2ServerError::validation("Missing redirect_uri"))?;
        url::Url::parse(&redirect_uri)
            .map_err(|_| OAuth2ServerError::validation("redirect_uri must be an absolute URI"))?;

        if !client.redirect_uris.contains(&redirect_uri) {
            // Registered URIs are informational only; exchange enforces exact equality
            tracing::debug!(
                client_id = %client.client_id,
                redirect_uri = %redirect_uri,
                "redirect_uri not among registered URIs"
            );
        }

        let code = self
            .issuer
            .issue_code(&client, &redirect_uri, user_id)
            .await?;

        Ok(AuthorizeResponse {
            code,
            state: request.state,
            redirect_uri,
        })
    }

    /// Handle a token request.
    ///
    /// The client is authenticated before the grant type is inspected.
    ///
    /// # Errors
    /// `UnknownClient`/`InvalidSecret` on failed client authentication,
    /// `Validation` for missing parameters, `UnsupportedGrantType`, or any
    /// error from the selected grant
    pub async fn token(
        &self,
        request: TokenRequest,
        credentials: &ClientCredentials,
    ) -> Result<TokenResponse, OAuth2ServerError> {
        let client = self
            .authenticator
            .authenticate(&credentials.client_id, &credentials.client_secret)
            .await?;

        let grant_type = request
            .grant_type
            .ok_or_else(|| OAuth2ServerError::validation("Missing grant_type"))?;

        match grant_type.as_str() {
            GRANT_AUTHORIZATION_CODE => {
                let code = request
                    .code
                    .ok_or_else(|| OAuth2ServerError::validation("Missing authorization code"))?;
                let redirect_uri = request
                    .redirect_uri
                    .ok_or_else(|| OAuth2ServerError::validation("Missing redirect_uri"))?;

                let grant = self
                    .exchange
                    .exchange_code(&client, &code, &redirect_uri)
                    .await?;

                Ok(TokenResponse {
                    access_token: grant.access_token,
                    token_type: TOKEN_TYPE_BEARER.to_owned(),
                    expires_in: grant.expires_in,
                    refresh_token: Some(grant.refresh_token),
                })
            }
            GRANT_REFRESH_TOKEN => {
                let refresh_token = request
                    .refresh_token
                    .ok_or_else(|| OAuth2ServerError::validation("Missing refresh_token"))?;

                let refreshed = self.rotation.refresh(&client, &refresh_token).await?;

                Ok(TokenResponse {
                    access_token: refreshed.access_token,
                    token_type: TOKEN_TYPE_BEARER.to_owned(),
                    expires_in: refreshed.expires_in,
                    refresh_token: None,
                })
            }
            _ => Err(OAuth2ServerError::UnsupportedGrantType { grant_type }),
        }
    }

    /// Resolve a bearer access token.
    ///
    /// Stored records past `expires_at` are rejected; they are kept only so the
    /// refresh token pointing at them can still rotate.
    ///
    /// # Errors
    /// `InvalidGrant` if the token is unknown, retired or expired; `Storage` on
    /// store failure
    pub async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<ValidatedAccessToken, OAuth2ServerError> {
        let Some(stored) = self
            .store
            .get::<AccessTokenRecord>(RecordKind::AccessToken, token)
            .await?
        else {
            tracing::debug!(token = fingerprint(token), "Unknown access token");
            return Err(OAuth2ServerError::invalid_grant("access token is invalid"));
        };

        let now = Utc::now();
        if stored.record.is_expired(now) {
            tracing::debug!(token = fingerprint(token), "Expired access token");
            return Err(OAuth2ServerError::invalid_grant("access token has expired"));
        }

        Ok(ValidatedAccessToken {
            user_id: stored.record.user_id,
            client_id: stored.record.client_id.clone(),
            expires_in: stored.record.expires_in(now),
        })
    }
}
