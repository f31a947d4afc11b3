// ABOUTME: Bearer-protected API routes consuming access tokens issued by the authorization server
// ABOUTME: Rejects missing, retired and expired tokens with a Bearer challenge
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use crate::auth::bearer_token;
use crate::oauth2_server::ValidatedAccessToken;
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use doodle_core::constants::endpoints;
use doodle_core::errors::{AppError, OAuth2ServerError};
use std::sync::Arc;

/// API routes handler
pub struct ApiRoutes;

impl ApiRoutes {
    /// Create all API routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(endpoints::API_BASE, get(Self::handle_hello))
            .with_state(resources)
    }

    /// Resolve the caller's access token
    async fn authenticate(
        headers: &HeaderMap,
        resources: &ServerResources,
    ) -> Result<ValidatedAccessToken, Response> {
        let Some(token) = bearer_token(headers) else {
            return Err(Self::bearer_challenge(AppError::auth_required(), false));
        };

        resources
            .authorization_server
            .validate_access_token(token)
            .await
            .map_err(|e| match e {
                OAuth2ServerError::Storage { source } => AppError::from(source).into_response(),
                other => Self::bearer_challenge(AppError::auth_invalid(other.to_string()), true),
            })
    }

    fn bearer_challenge(error: AppError, invalid_token: bool) -> Response {
        let challenge = if invalid_token {
            "Bearer realm=\"doodle\", error=\"invalid_token\""
        } else {
            "Bearer realm=\"doodle\""
        };
        let mut response = error.into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        response
    }

    /// Handle GET /api
    async fn handle_hello(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, Response> {
        let caller = Self::authenticate(&headers, &resources).await?;
        Ok(Json(serde_json::json!({
            "message": "Hello from the Doodle API",
            "user_id": caller.user_id,
            "client_id": caller.client_id,
            "expires_in": caller.expires_in
        })))
    }
}
