// ABOUTME: Argon2id hashing and verification of shared secrets
// ABOUTME: Used for OAuth 2.0 client secrets and resource-owner passwords alike
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use doodle_core::errors::AppError;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::OnceLock;

/// Salt length in bytes (the Argon2 recommended 16)
const SALT_BYTES: usize = 16;

/// Hash a plaintext secret into an Argon2id PHC string
///
/// # Errors
/// Returns an error if the system RNG fails or Argon2 rejects the input
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| AppError::internal("System RNG failure while salting secret"))?;

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::internal(format!("Failed to encode salt: {e}")))?;

    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::internal(format!("Argon2 password hashing failed: {e}")))?;

    Ok(hash.to_string())
}

/// Check `secret` against a stored PHC hash.
///
/// An unparseable stored hash verifies as `false`.
#[must_use]
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to parse stored password hash: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Run a full Argon2 verification for a principal that does not exist.
///
/// Lookup misses pay the same hashing cost as a wrong secret, so response
/// timing does not reveal which identifiers are registered.
pub fn verify_unknown_secret(secret: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    if let Some(hash) = DUMMY_HASH
        .get_or_init(|| hash_secret("doodle-unknown-principal").ok())
        .as_deref()
    {
        let _ = verify_secret(secret, hash);
    }
}
