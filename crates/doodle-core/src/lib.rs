// ABOUTME: Core types and constants for the Doodle scheduling API
// ABOUTME: Foundation crate with error handling, OAuth 2.0 record models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

#![deny(unsafe_code)]

//! # Doodle Core
//!
//! Foundation crate providing shared types and constants for the Doodle scheduling
//! API and its embedded OAuth 2.0 authorization server. This crate is designed to
//! change infrequently so the service crate can be rebuilt incrementally.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, storage and OAuth 2.0 errors
//! - **constants**: Protocol constants (token lifetimes, record namespaces, wire values)
//! - **models**: Persisted OAuth 2.0 records (clients, codes, access and refresh tokens)

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (OAuth 2.0 clients and token records)
pub mod models;
