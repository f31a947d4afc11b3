// ABOUTME: Cryptographically secure generation of authorization codes and token values
// ABOUTME: Uses the system CSPRNG and URL-safe base64 so values travel unescaped in redirects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use doodle_core::constants::oauth2::{
    ACCESS_TOKEN_LIFETIME_SECS, ACCESS_TOKEN_RETENTION_SECS, AUTH_CODE_TTL_SECS,
    TOKEN_ENTROPY_BYTES,
};
use doodle_core::errors::StorageError;
use doodle_core::models::AccessTokenRecord;
use ring::rand::{SecureRandom, SystemRandom};
use std::time::Duration;
use uuid::Uuid;

/// Lifetimes applied when minting codes and tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    /// Validity of an access token
    pub access_token: Duration,
    /// Validity of an authorization code
    pub auth_code: Duration,
    /// How long an access record stays stored after issue.
    /// Longer than `access_token` so an expired token can still be refreshed.
    pub access_token_retention: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_token: Duration::from_secs(ACCESS_TOKEN_LIFETIME_SECS),
            auth_code: Duration::from_secs(AUTH_CODE_TTL_SECS),
            access_token_retention: Duration::from_secs(ACCESS_TOKEN_RETENTION_SECS),
        }
    }
}

impl TokenLifetimes {
    /// Store TTL for access records: the retention window, never shorter than validity
    #[must_use]
    pub fn access_record_ttl(&self) -> Duration {
        self.access_token_retention.max(self.access_token)
    }
}

/// Generate an opaque random value from `length` bytes of system randomness
///
/// # Errors
/// Returns an error if the system RNG fails. The server cannot mint credentials
/// without working randomness, so this is surfaced rather than retried.
pub fn generate_random_string(length: usize) -> Result<String, StorageError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; length];

    rng.fill(&mut bytes).map_err(|e| {
        tracing::error!("CRITICAL: SystemRandom failed - cannot generate secure random bytes: {e}");
        StorageError::unavailable("system RNG failure")
    })?;

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&bytes))
}

/// Generate a code or token value with the standard entropy
///
/// # Errors
/// Returns an error if the system RNG fails
pub fn generate_token_value() -> Result<String, StorageError> {
    generate_random_string(TOKEN_ENTROPY_BYTES)
}

/// `now + lifetime`, failing instead of overflowing
///
/// # Errors
/// Returns an error if the lifetime does not fit a timestamp
pub fn expiry_after(now: DateTime<Utc>, lifetime: Duration) -> Result<DateTime<Utc>, StorageError> {
    chrono::Duration::from_std(lifetime)
        .ok()
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| StorageError::backend("credential lifetime out of range"))
}

/// Mint a fresh access token record for `user_id` and `client_id`
///
/// # Errors
/// Returns an error if the system RNG fails or the lifetime is out of range
pub fn mint_access_token(
    user_id: Uuid,
    client_id: &str,
    lifetime: Duration,
) -> Result<AccessTokenRecord, StorageError> {
    let issued_at = Utc::now();
    Ok(AccessTokenRecord {
        token: generate_token_value()?,
        user_id,
        client_id: client_id.to_owned(),
        issued_at,
        expires_at: expiry_after(issued_at, lifetime)?,
    })
}

/// Short, non-reversible prefix of a token suitable for log correlation
#[must_use]
pub fn fingerprint(token: &str) -> &str {
    token.get(..6).unwrap_or(token)
}
