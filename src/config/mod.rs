// ABOUTME: Configuration management module for server settings
// ABOUTME: Environment-driven server configuration and out-of-band client/user bootstrap
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! Configuration module for the Doodle API server
//!
//! - **Environment**: server, OAuth 2.0 and token store settings from environment variables
//! - **Bootstrap**: registered clients and resource owners loaded from a JSON file

/// Out-of-band registration of clients and resource owners
pub mod bootstrap;
/// Environment and server configuration
pub mod environment;

pub use bootstrap::{BootstrapClient, BootstrapFile, BootstrapUser};
pub use environment::{
    Environment, OAuth2ServerConfig, ServerConfig, TokenStoreBackend, TokenStoreConfig,
};
