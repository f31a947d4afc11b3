// ABOUTME: Core data models shared between the service crate and its stores
// ABOUTME: Re-exports the OAuth 2.0 persistence records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

/// OAuth 2.0 server persistence models
pub mod oauth2_server;

pub use oauth2_server::{
    AccessTokenRecord, AuthorizationCodeRecord, OAuth2Client, RecordKind, RefreshTokenRecord,
};
