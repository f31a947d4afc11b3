// ABOUTME: OAuth 2.0 request and response shapes for the authorize and token endpoints
// ABOUTME: Form and query parameters arrive optional so missing fields become invalid_request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth 2.0 Authorization Request
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthorizeRequest {
    /// Response type; only `code` is supported
    pub response_type: Option<String>,
    /// Client identifier
    pub client_id: Option<String>,
    /// Redirect URI for the response
    pub redirect_uri: Option<String>,
    /// Opaque value echoed back to the client
    pub state: Option<String>,
}

/// OAuth 2.0 Authorization Response
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    /// Authorization code
    pub code: String,
    /// State parameter (if provided in request)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Where the user agent is sent with `code` and `state`
    #[serde(skip)]
    pub redirect_uri: String,
}

/// OAuth 2.0 Token Request
#[derive(Debug, Deserialize, Default)]
pub struct TokenRequest {
    /// Grant type (`authorization_code` or `refresh_token`)
    pub grant_type: Option<String>,
    /// Authorization code (for `authorization_code` grant)
    pub code: Option<String>,
    /// Redirect URI used in the authorization request
    pub redirect_uri: Option<String>,
    /// Refresh token (for `refresh_token` grant)
    pub refresh_token: Option<String>,
    /// Client ID (`client_secret_post` authentication)
    pub client_id: Option<String>,
    /// Client secret (`client_secret_post` authentication)
    pub client_secret: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Opaque bearer access token
    pub access_token: String,
    /// Token type (always "bearer")
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: u64,
    /// Refresh token, only on the initial code exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Client credentials presented at the token endpoint
#[derive(Clone)]
pub struct ClientCredentials {
    /// Client identifier
    pub client_id: String,
    /// Plaintext client secret
    pub client_secret: String,
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Identity behind a valid access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedAccessToken {
    /// Resource owner the token acts for
    pub user_id: uuid::Uuid,
    /// Client the token was issued to
    pub client_id: String,
    /// Seconds of validity left
    pub expires_in: u64,
}
