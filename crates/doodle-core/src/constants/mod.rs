// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for the Doodle API and its OAuth 2.0 server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! Constants module
//!
//! Constants are grouped into small domain modules rather than a single flat list.

/// OAuth 2.0 protocol constants
pub mod oauth2 {
    /// Lifetime of an access token in seconds (one hour)
    pub const ACCESS_TOKEN_LIFETIME_SECS: u64 = 3600;
    /// Default authorization code time-to-live in seconds
    pub const AUTH_CODE_TTL_SECS: u64 = 600;
    /// Upper bound accepted for the authorization code time-to-live
    pub const MAX_AUTH_CODE_TTL_SECS: u64 = 600;
    /// How long an access record stays stored after issue (30 days)
    pub const ACCESS_TOKEN_RETENTION_SECS: u64 = 30 * 24 * 3600;
    /// Upper bound accepted for the access record retention (one year)
    pub const MAX_ACCESS_TOKEN_RETENTION_SECS: u64 = 365 * 24 * 3600;
    /// Random bytes behind every code and token value (256 bits)
    pub const TOKEN_ENTROPY_BYTES: usize = 32;
    /// `token_type` returned by the token endpoint
    pub const TOKEN_TYPE_BEARER: &str = "bearer";
    /// `grant_type` for the authorization code exchange
    pub const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
    /// `grant_type` for refresh token rotation
    pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
    /// The only supported `response_type`
    pub const RESPONSE_TYPE_CODE: &str = "code";
}

/// Logical key-value namespaces of the token store
pub mod namespaces {
    /// Authorization code records
    pub const AUTHORIZATION_CODES: &str = "authorization_codes";
    /// Access token records
    pub const ACCESS_TOKENS: &str = "access_tokens";
    /// Refresh token records
    pub const REFRESH_TOKENS: &str = "refresh_tokens";
}

/// Token store defaults
pub mod store {
    /// Background reaper period in seconds
    pub const CLEANUP_INTERVAL_SECS: u64 = 60;
    /// Per-call timeout in milliseconds
    pub const OPERATION_TIMEOUT_MS: u64 = 5000;
    /// Default sqlite location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/tokens.db";
}

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Readiness endpoint
    pub const READY: &str = "/ready";
    /// API base path
    pub const API_BASE: &str = "/api";
    /// OAuth 2.0 authorization endpoint
    pub const OAUTH2_AUTHORIZE: &str = "/oauth2/authorize";
    /// OAuth 2.0 token endpoint
    pub const OAUTH2_TOKEN: &str = "/oauth2/token";
    /// RFC 8414 discovery document
    pub const OAUTH2_DISCOVERY: &str = "/.well-known/oauth-authorization-server";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8081;
}

/// Service names for structured logging
pub mod service_names {
    /// Name reported by the server binary
    pub const DOODLE_API_SERVER: &str = "doodle-api-server";
}
