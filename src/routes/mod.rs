// ABOUTME: Route module organization for Doodle API HTTP endpoints
// ABOUTME: Merges the per-domain routers and applies request tracing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! Route module for the Doodle API server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the authorization server.

/// Bearer-protected API routes
pub mod api;
/// Health check and readiness routes
pub mod health;
/// OAuth 2.0 authorization server routes
pub mod oauth2;

pub use api::ApiRoutes;
pub use health::HealthRoutes;
pub use oauth2::OAuth2Routes;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete application router
#[must_use]
pub fn router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(OAuth2Routes::routes(resources.clone()))
        .merge(ApiRoutes::routes(resources.clone()))
        .layer(TraceLayer::new_for_http())
}
