// ABOUTME: OAuth 2.0 authorization server error taxonomy and RFC 6749 wire mapping
// ABOUTME: Maps client authentication, grant, validation and storage failures to error codes and statuses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use serde::{Deserialize, Serialize};

use super::storage::StorageError;

/// Failures of the token-issuance engine.
///
/// Every variant maps to exactly one RFC 6749 error code; see [`Self::error_code`].
#[derive(Debug, thiserror::Error)]
pub enum OAuth2ServerError {
    /// No client is registered under the presented identifier
    #[error("Unknown OAuth 2.0 client '{client_id}'")]
    UnknownClient {
        /// Identifier presented by the caller
        client_id: String,
    },

    /// The client exists but the presented secret does not verify
    #[error("Client secret rejected for '{client_id}'")]
    InvalidSecret {
        /// Identifier presented by the caller
        client_id: String,
    },

    /// Code or refresh token missing, expired, consumed, retired or bound elsewhere
    #[error("Invalid grant: {reason}")]
    InvalidGrant {
        /// Which check failed
        reason: &'static str,
    },

    /// Malformed or incomplete request parameters
    #[error("Invalid request: {reason}")]
    Validation {
        /// What is wrong with the request
        reason: String,
    },

    /// `grant_type` is absent from the supported set
    #[error("Unsupported grant type '{grant_type}'")]
    UnsupportedGrantType {
        /// The grant type that was requested
        grant_type: String,
    },

    /// Token store or client registry failure
    #[error("Storage failure during OAuth 2.0 operation")]
    Storage {
        /// Underlying storage error
        #[from]
        source: StorageError,
    },
}

impl OAuth2ServerError {
    /// Build an `InvalidGrant` error
    #[must_use]
    pub const fn invalid_grant(reason: &'static str) -> Self {
        Self::InvalidGrant { reason }
    }

    /// Build a `Validation` error
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// RFC 6749 error code for this failure
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownClient { .. } | Self::InvalidSecret { .. } => "invalid_client",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::Validation { .. } => "invalid_request",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::Storage { .. } => "server_error",
        }
    }

    /// HTTP status for this failure
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::UnknownClient { .. } | Self::InvalidSecret { .. } => 401,
            Self::InvalidGrant { .. }
            | Self::Validation { .. }
            | Self::UnsupportedGrantType { .. } => 400,
            Self::Storage { .. } => 500,
        }
    }

    /// Whether this failure came from client authentication
    #[must_use]
    pub const fn is_client_auth_failure(&self) -> bool {
        matches!(self, Self::UnknownClient { .. } | Self::InvalidSecret { .. })
    }
}

/// RFC 6749 section 5.2 error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2ErrorBody {
    /// Error code
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl From<&OAuth2ServerError> for OAuth2ErrorBody {
    fn from(error: &OAuth2ServerError) -> Self {
        // Client authentication failures must not reveal which half was wrong
        let description = match error {
            OAuth2ServerError::UnknownClient { .. } | OAuth2ServerError::InvalidSecret { .. } => {
                "Client authentication failed".to_owned()
            }
            OAuth2ServerError::Storage { .. } => "Internal server error".to_owned(),
            other => other.to_string(),
        };
        Self {
            error: error.error_code().to_owned(),
            error_description: Some(description),
        }
    }
}

#[cfg(feature = "http-response")]
impl axum::response::IntoResponse for OAuth2ServerError {
    fn into_response(self) -> axum::response::Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self, source = ?std::error::Error::source(&self), "OAuth 2.0 request failed");
        } else {
            tracing::warn!(error_code = self.error_code(), error = %self, "OAuth 2.0 request rejected");
        }
        let mut response = (status, axum::Json(OAuth2ErrorBody::from(&self))).into_response();
        response.headers_mut().insert(
            http::header::CACHE_CONTROL,
            http::HeaderValue::from_static("no-store"),
        );
        if self.is_client_auth_failure() {
            response.headers_mut().insert(
                http::header::WWW_AUTHENTICATE,
                http::HeaderValue::from_static("Basic realm=\"oauth2\""),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_failures_share_wire_code() {
        let unknown = OAuth2ServerError::UnknownClient {
            client_id: "C9".to_owned(),
        };
        let bad_secret = OAuth2ServerError::InvalidSecret {
            client_id: "C1".to_owned(),
        };
        assert_eq!(unknown.error_code(), "invalid_client");
        assert_eq!(bad_secret.error_code(), "invalid_client");
        assert_eq!(
            OAuth2ErrorBody::from(&unknown),
            OAuth2ErrorBody::from(&bad_secret)
        );
        assert_eq!(unknown.http_status(), 401);
    }

    #[test]
    fn test_storage_failure_is_server_error() {
        let error: OAuth2ServerError = StorageError::backend("disk full").into();
        assert_eq!(error.error_code(), "server_error");
        assert_eq!(error.http_status(), 500);
        let body = OAuth2ErrorBody::from(&error);
        assert!(!body.error_description.unwrap().contains("disk full"));
    }

    #[test]
    fn test_invalid_grant_body_serialization() {
        let error = OAuth2ServerError::invalid_grant("authorization code already used");
        let json = serde_json::to_string(&OAuth2ErrorBody::from(&error)).unwrap();
        assert!(json.contains("\"error\":\"invalid_grant\""));
        assert!(json.contains("already used"));
    }
}
