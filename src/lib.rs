// ABOUTME: Main library entry point for the Doodle scheduling API server
// ABOUTME: Embedded OAuth 2.0 authorization server issuing API credentials to the web client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

#![deny(unsafe_code)]

//! # Doodle API
//!
//! REST API server with an embedded OAuth 2.0 authorization server.
//!
//! ## Architecture
//!
//! - **`OAuth2` server**: client authentication, authorization code issuance,
//!   code exchange and refresh-token rotation over a pluggable token store
//! - **Auth**: resource-owner authentication and credential header parsing
//! - **Routes**: axum handlers for authorize, token, discovery, health and API
//! - **Config**: environment configuration and bootstrap registrations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use doodle_api::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Doodle API configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Resource-owner authentication and Authorization header parsing
pub mod auth;

/// Environment configuration and bootstrap registrations
pub mod config;

/// Credential hashing
pub mod crypto;

/// Structured logging setup
pub mod logging;

/// OAuth 2.0 authorization server
pub mod oauth2_server;

/// Shared handler resources
pub mod resources;

/// HTTP routes
pub mod routes;

/// HTTP server lifecycle
pub mod server;

/// Foundation types shared with the core crate
pub use doodle_core::{constants, errors, models};
