// ABOUTME: Cryptography module for credential hashing
// ABOUTME: Centralizes Argon2 handling of client secrets and resource-owner passwords
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! Cryptographic utilities for the Doodle API

/// Argon2 secret hashing and verification
pub mod secrets;

pub use secrets::{hash_secret, verify_secret, verify_unknown_secret};
