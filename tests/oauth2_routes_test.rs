// ABOUTME: HTTP-level tests for the authorize, token, discovery, API and health routes
// ABOUTME: Drives the full router in-process and checks status codes, headers and RFC 6749 bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use common::{
    create_test_resources, CLIENT_ID, CLIENT_SECRET, PASSWORD, REDIRECT_URI, USERNAME,
};
use doodle_api::oauth2_server::TokenResponse;
use doodle_api::routes::router;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        general_purpose::STANDARD.encode(format!("{username}:{password}"))
    )
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn authorize_request(authorization: Option<String>) -> Request<Body> {
    let query = serde_urlencoded::to_string([
        ("response_type", "code"),
        ("client_id", CLIENT_ID),
        ("redirect_uri", REDIRECT_URI),
        ("state", "xyz"),
    ])
    .unwrap();
    let mut builder = Request::builder()
        .method("GET")
        .uri(format!("/oauth2/authorize?{query}"));
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    builder.body(Body::empty()).unwrap()
}

fn token_request(form: &[(&str, &str)], authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/oauth2/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    builder
        .body(Body::from(serde_urlencoded::to_string(form).unwrap()))
        .unwrap()
}

fn api_request(access_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api");
    if let Some(token) = access_token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

/// Authorize as the test user and pull the code out of the redirect
async fn obtain_code(app: &Router) -> String {
    let response = send(app, authorize_request(Some(basic(USERNAME, PASSWORD)))).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    let redirect = url::Url::parse(location).unwrap();
    redirect
        .query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
        .unwrap()
}

async fn obtain_tokens(app: &Router) -> TokenResponse {
    let code = obtain_code(app).await;
    let response = send(
        app,
        token_request(
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", REDIRECT_URI),
            ],
            Some(basic(CLIENT_ID, CLIENT_SECRET)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_value(json_body(response).await).unwrap()
}

#[tokio::test]
async fn test_authorize_requires_resource_owner_credentials() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    let anonymous = send(&app, authorize_request(None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    let challenge = anonymous
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(challenge.starts_with("Basic"));

    let wrong = send(&app, authorize_request(Some(basic(USERNAME, "nope")))).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authorize_redirects_with_code_and_state() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    let response = send(&app, authorize_request(Some(basic(USERNAME, PASSWORD)))).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with(REDIRECT_URI));
    let redirect = url::Url::parse(location).unwrap();
    let pairs: Vec<(String, String)> = redirect.query_pairs().into_owned().collect();
    assert!(pairs.iter().any(|(name, value)| name == "code" && !value.is_empty()));
    assert!(pairs.contains(&("state".to_owned(), "xyz".to_owned())));
}

#[tokio::test]
async fn test_token_exchange_with_basic_auth() {
    let (resources, user_id) = create_test_resources();
    let app = router(&resources);
    let code = obtain_code(&app).await;

    let response = send(
        &app,
        token_request(
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", REDIRECT_URI),
            ],
            Some(basic(CLIENT_ID, CLIENT_SECRET)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    assert_eq!(response.headers().get(header::PRAGMA).unwrap(), "no-cache");

    let body = json_body(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);
    assert!(body["refresh_token"].is_string());

    let access_token = body["access_token"].as_str().unwrap();
    let api = send(&app, api_request(Some(access_token))).await;
    assert_eq!(api.status(), StatusCode::OK);
    let api_body = json_body(api).await;
    assert_eq!(api_body["user_id"], user_id.to_string());
    assert_eq!(api_body["client_id"], CLIENT_ID);
}

#[tokio::test]
async fn test_token_exchange_with_post_auth_and_replay() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);
    let code = obtain_code(&app).await;
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", CLIENT_ID),
        ("client_secret", CLIENT_SECRET),
    ];

    let first = send(&app, token_request(&form, None)).await;
    assert_eq!(first.status(), StatusCode::OK);

    let replay = send(&app, token_request(&form, None)).await;
    assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
    let body = json_body(replay).await;
    assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn test_token_endpoint_client_authentication_failures() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);
    let code = obtain_code(&app).await;
    let grant = [
        ("grant_type", "authorization_code"),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
    ];

    let wrong_secret = send(&app, token_request(&grant, Some(basic(CLIENT_ID, "wrong")))).await;
    assert_eq!(wrong_secret.status(), StatusCode::UNAUTHORIZED);
    assert!(wrong_secret.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_eq!(json_body(wrong_secret).await["error"], "invalid_client");

    let anonymous = send(&app, token_request(&grant, None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(anonymous).await["error"], "invalid_client");

    let mut both = grant.to_vec();
    both.push(("client_secret", CLIENT_SECRET));
    let doubled = send(
        &app,
        token_request(&both, Some(basic(CLIENT_ID, CLIENT_SECRET))),
    )
    .await;
    assert_eq!(doubled.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(doubled).await["error"], "invalid_request");

    // None of the failures consumed the code
    let accepted = send(&app, token_request(&grant, Some(basic(CLIENT_ID, CLIENT_SECRET)))).await;
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_token_endpoint_rejects_unsupported_grant() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    let response = send(
        &app,
        token_request(
            &[("grant_type", "password")],
            Some(basic(CLIENT_ID, CLIENT_SECRET)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn test_refresh_over_http_retires_previous_token() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);
    let initial = obtain_tokens(&app).await;
    let refresh_token = initial.refresh_token.clone().unwrap();

    let response = send(
        &app,
        token_request(
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ],
            Some(basic(CLIENT_ID, CLIENT_SECRET)),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body.get("refresh_token").is_none());
    let rotated = body["access_token"].as_str().unwrap().to_owned();

    let stale = send(&app, api_request(Some(&initial.access_token))).await;
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    let challenge = stale
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(challenge.contains("invalid_token"));

    let fresh = send(&app, api_request(Some(&rotated))).await;
    assert_eq!(fresh.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    let anonymous = send(&app, api_request(None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers().contains_key(header::WWW_AUTHENTICATE));

    let forged = send(&app, api_request(Some(&Uuid::new_v4().to_string()))).await;
    assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_discovery_document() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    let response = send(
        &app,
        Request::builder()
            .uri("/.well-known/oauth-authorization-server")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let issuer = body["issuer"].as_str().unwrap();
    assert_eq!(body["token_endpoint"], format!("{issuer}/oauth2/token"));
    assert_eq!(body["authorization_endpoint"], format!("{issuer}/oauth2/authorize"));
    assert_eq!(body["response_types_supported"], serde_json::json!(["code"]));
    assert_eq!(
        body["grant_types_supported"],
        serde_json::json!(["authorization_code", "refresh_token"])
    );
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (resources, _) = create_test_resources();
    let app = router(&resources);

    for path in ["/health", "/ready"] {
        let response = send(
            &app,
            Request::builder().uri(path).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}
