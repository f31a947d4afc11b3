// ABOUTME: OAuth 2.0 server persistence models for clients, auth codes, and tokens
// ABOUTME: Records are stored as JSON in the token store, one namespace per record kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::namespaces;

/// The three record kinds held by the token store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Single-use authorization codes
    AuthorizationCode,
    /// Bearer access tokens
    AccessToken,
    /// Refresh tokens pointing at the current access token
    RefreshToken,
}

impl RecordKind {
    /// Every kind, in namespace order
    pub const ALL: [Self; 3] = [Self::AuthorizationCode, Self::AccessToken, Self::RefreshToken];

    /// Storage namespace for this kind
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::AuthorizationCode => namespaces::AUTHORIZATION_CODES,
            Self::AccessToken => namespaces::ACCESS_TOKENS,
            Self::RefreshToken => namespaces::REFRESH_TOKENS,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Registered OAuth 2.0 client
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuth2Client {
    /// OAuth 2.0 client identifier
    pub client_id: String,
    /// Argon2 PHC hash of the client secret
    pub client_secret_hash: String,
    /// Registered redirect URIs
    pub redirect_uris: Vec<String>,
    /// Human-readable client name
    pub client_name: Option<String>,
    /// When this client was registered
    pub created_at: DateTime<Utc>,
}

// Secret material never reaches logs
impl fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("client_id", &self.client_id)
            .field("client_secret_hash", &"[REDACTED]")
            .field("redirect_uris", &self.redirect_uris)
            .field("client_name", &self.client_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// OAuth 2.0 authorization code, keyed by `code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCodeRecord {
    /// The authorization code value
    pub code: String,
    /// Client the code was issued to
    pub client_id: String,
    /// Redirect URI that must match during token exchange
    pub redirect_uri: String,
    /// Resource owner who approved the request
    pub user_id: Uuid,
    /// When the code was minted
    pub issued_at: DateTime<Utc>,
    /// When the code stops being redeemable
    pub expires_at: DateTime<Utc>,
}

impl AuthorizationCodeRecord {
    /// Whether the code is past its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// OAuth 2.0 access token, keyed by `token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    /// The access token value
    pub token: String,
    /// User the token acts for
    pub user_id: Uuid,
    /// Client the token was issued to
    pub client_id: String,
    /// When the token was minted
    pub issued_at: DateTime<Utc>,
    /// End of validity; stored records past this instant are invalid
    pub expires_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    /// Whether the token is past its expiry at `now`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds of validity left at `now`, zero once expired
    #[must_use]
    pub fn expires_in(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((self.expires_at - now).num_seconds()).unwrap_or(0)
    }
}

/// OAuth 2.0 refresh token, keyed by `token`.
///
/// The value is long-lived and reused across rotations; only
/// `access_token_ref` moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// The refresh token value
    pub token: String,
    /// Access token this refresh token currently resolves to
    pub access_token_ref: String,
    /// When the refresh token was minted
    pub issued_at: DateTime<Utc>,
}
