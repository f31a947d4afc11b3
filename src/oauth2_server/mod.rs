// ABOUTME: OAuth 2.0 authorization server issuing API credentials to registered clients
// ABOUTME: Authorization code grant with single-use codes and refresh-token rotation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

/// Client registry and client credential authentication
pub mod client_registry;
/// OAuth 2.0 authorization server composing the grant engines
pub mod endpoints;
/// Authorization code to token exchange
pub mod exchange;
/// Authorization code issuance
pub mod issuer;
/// OAuth 2.0 request and response types
pub mod models;
/// Refresh token rotation
pub mod refresh;
/// Keyed storage for codes and tokens
pub mod token_store;
/// Code and token value generation
pub mod tokens;

pub use client_registry::{ClientAuthenticator, ClientRegistry, InMemoryClientRegistry};
pub use endpoints::AuthorizationServer;
pub use exchange::{TokenExchangeEngine, TokenGrant};
pub use issuer::AuthorizationCodeIssuer;
pub use models::{
    AuthorizeRequest, AuthorizeResponse, ClientCredentials, TokenRequest, TokenResponse,
    ValidatedAccessToken,
};
pub use refresh::{RefreshRotationEngine, RefreshedAccessToken};
pub use token_store::{
    spawn_reaper, MemoryTokenStore, ReaperHandle, RecordStore, SqliteTokenStore,
    TimeoutTokenStore, TokenStore, Versioned,
};
pub use tokens::TokenLifetimes;
