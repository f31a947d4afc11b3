// ABOUTME: OAuth 2.0 authorization server HTTP endpoints: authorize, token and discovery
// ABOUTME: Parses protocol parameters and client credentials, then delegates to the authorization server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! OAuth 2.0 server routes

use crate::auth::BasicCredentials;
use crate::logging::AppLogger;
use crate::oauth2_server::{
    AuthorizeRequest, AuthorizeResponse, ClientCredentials, TokenRequest,
};
use crate::resources::ServerResources;
use axum::{
    extract::{rejection::FormRejection, Form, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use doodle_core::constants::{endpoints, oauth2};
use doodle_core::errors::{AppError, OAuth2ServerError};
use std::sync::Arc;

/// OAuth 2.0 routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create all OAuth 2.0 routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                endpoints::OAUTH2_AUTHORIZE,
                get(Self::handle_authorize_get).post(Self::handle_authorize_post),
            )
            .route(endpoints::OAUTH2_TOKEN, post(Self::handle_token))
            .route(endpoints::OAUTH2_DISCOVERY, get(Self::handle_discovery))
            .with_state(resources)
    }

    /// Handle GET /oauth2/authorize
    async fn handle_authorize_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(request): Query<AuthorizeRequest>,
    ) -> Result<Response, Response> {
        Self::authorize(&resources, &headers, request).await
    }

    /// Handle POST /oauth2/authorize
    async fn handle_authorize_post(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Form(request): Form<AuthorizeRequest>,
    ) -> Result<Response, Response> {
        Self::authorize(&resources, &headers, request).await
    }

    /// Authenticate the resource owner, auto-approve consent and redirect with a code
    async fn authorize(
        resources: &ServerResources,
        headers: &HeaderMap,
        request: AuthorizeRequest,
    ) -> Result<Response, Response> {
        let Some(credentials) = BasicCredentials::from_headers(headers) else {
            return Err(Self::basic_challenge(AppError::auth_required()));
        };

        let user_id = resources
            .resource_owners
            .authenticate(&credentials.username, &credentials.password)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        let Some(user_id) = user_id else {
            AppLogger::log_auth_event(&credentials.username, "authorize", false);
            return Err(Self::basic_challenge(AppError::auth_invalid(
                "Invalid username or password",
            )));
        };
        AppLogger::log_auth_event(&credentials.username, "authorize", true);

        let response = resources
            .authorization_server
            .authorize(request, user_id)
            .await
            .map_err(IntoResponse::into_response)?;

        let location = Self::redirect_location(&response).map_err(IntoResponse::into_response)?;
        Ok((
            StatusCode::FOUND,
            [
                (header::LOCATION, location),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            ],
        )
            .into_response())
    }

    /// `redirect_uri` with `code` and `state` appended to its query
    fn redirect_location(response: &AuthorizeResponse) -> Result<HeaderValue, OAuth2ServerError> {
        let mut url = url::Url::parse(&response.redirect_uri)
            .map_err(|_| OAuth2ServerError::validation("redirect_uri is not an absolute URI"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("code", &response.code);
            if let Some(state) = &response.state {
                query.append_pair("state", state);
            }
        }
        HeaderValue::from_str(url.as_str())
            .map_err(|_| OAuth2ServerError::validation("redirect_uri is not a valid header value"))
    }

    fn basic_challenge(error: AppError) -> Response {
        let mut response = error.into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"doodle\""),
        );
        response
    }

    /// Handle POST /oauth2/token
    async fn handle_token(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        form: Result<Form<TokenRequest>, FormRejection>,
    ) -> Result<Response, OAuth2ServerError> {
        let Form(request) = form.map_err(|e| {
            OAuth2ServerError::validation(format!("Malformed token request: {e}"))
        })?;

        let credentials = Self::client_credentials(&headers, &request)?;
        let token = resources
            .authorization_server
            .token(request, &credentials)
            .await?;

        Ok((
            StatusCode::OK,
            [
                (header::CACHE_CONTROL, "no-store"),
                (header::PRAGMA, "no-cache"),
            ],
            Json(token),
        )
            .into_response())
    }

    /// Client credentials from `client_secret_basic` or `client_secret_post`.
    /// Presenting both is rejected.
    fn client_credentials(
        headers: &HeaderMap,
        request: &TokenRequest,
    ) -> Result<ClientCredentials, OAuth2ServerError> {
        match (BasicCredentials::from_headers(headers), &request.client_secret) {
            (Some(_), Some(_)) => Err(OAuth2ServerError::validation(
                "Client authenticated with more than one method",
            )),
            (Some(basic), None) => {
                if request
                    .client_id
                    .as_deref()
                    .is_some_and(|client_id| client_id != basic.username)
                {
                    return Err(OAuth2ServerError::validation(
                        "client_id does not match the Authorization header",
                    ));
                }
                Ok(ClientCredentials {
                    client_id: basic.username,
                    client_secret: basic.password,
                })
            }
            (None, Some(client_secret)) => {
                let client_id = request.client_id.clone().ok_or_else(|| {
                    OAuth2ServerError::UnknownClient {
                        client_id: String::new(),
                    }
                })?;
                Ok(ClientCredentials {
                    client_id,
                    client_secret: client_secret.clone(),
                })
            }
            (None, None) => {
                AppLogger::log_security_event(
                    "token_request_without_client_auth",
                    "low",
                    "Token request carried no client credentials",
                );
                Err(OAuth2ServerError::UnknownClient {
                    client_id: request.client_id.clone().unwrap_or_default(),
                })
            }
        }
    }

    /// Handle GET /.well-known/oauth-authorization-server
    async fn handle_discovery(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        let issuer = resources.config.issuer_url();
        Json(serde_json::json!({
            "issuer": issuer,
            "authorization_endpoint": format!("{issuer}{}", endpoints::OAUTH2_AUTHORIZE),
            "token_endpoint": format!("{issuer}{}", endpoints::OAUTH2_TOKEN),
            "response_types_supported": [oauth2::RESPONSE_TYPE_CODE],
            "grant_types_supported": [
                oauth2::GRANT_AUTHORIZATION_CODE,
                oauth2::GRANT_REFRESH_TOKEN
            ],
            "token_endpoint_auth_methods_supported": [
                "client_secret_basic",
                "client_secret_post"
            ]
        }))
    }
}
