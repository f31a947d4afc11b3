// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses server, OAuth 2.0 lifetime and token store settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! Environment-based configuration management for production deployment

use crate::oauth2_server::TokenLifetimes;
use anyhow::{Context, Result};
use doodle_core::constants::{oauth2, ports, store};
use doodle_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Which token store backend to run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreBackend {
    /// Process memory; lost on restart
    #[default]
    Memory,
    /// `SQLite` database at `DATABASE_URL`
    Sqlite,
}

impl FromStr for TokenStoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(AppError::config(format!(
                "Unknown TOKEN_STORE '{other}', expected 'memory' or 'sqlite'"
            ))),
        }
    }
}

impl fmt::Display for TokenStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// OAuth 2.0 authorization server settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuth2ServerConfig {
    /// Access token validity in seconds
    pub access_token_lifetime_secs: u64,
    /// Authorization code validity in seconds
    pub auth_code_ttl_secs: u64,
    /// How long access records stay stored after issue, in seconds
    pub access_token_retention_secs: u64,
    /// Issuer base URL advertised by discovery; derived from host and port when unset
    pub issuer_url: Option<String>,
}

impl Default for OAuth2ServerConfig {
    fn default() -> Self {
        Self {
            access_token_lifetime_secs: oauth2::ACCESS_TOKEN_LIFETIME_SECS,
            auth_code_ttl_secs: oauth2::AUTH_CODE_TTL_SECS,
            access_token_retention_secs: oauth2::ACCESS_TOKEN_RETENTION_SECS,
            issuer_url: None,
        }
    }
}

impl OAuth2ServerConfig {
    /// Lifetimes handed to the grant engines
    #[must_use]
    pub const fn lifetimes(&self) -> TokenLifetimes {
        TokenLifetimes {
            access_token: Duration::from_secs(self.access_token_lifetime_secs),
            auth_code: Duration::from_secs(self.auth_code_ttl_secs),
            access_token_retention: Duration::from_secs(self.access_token_retention_secs),
        }
    }
}

/// Token store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenStoreConfig {
    /// Selected backend
    pub backend: TokenStoreBackend,
    /// `SQLite` URL used by the sqlite backend
    pub database_url: String,
    /// Background purge period in seconds
    pub cleanup_interval_secs: u64,
    /// Deadline applied to every store call, in milliseconds
    pub operation_timeout_ms: u64,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            backend: TokenStoreBackend::Memory,
            database_url: store::DEFAULT_DATABASE_URL.to_owned(),
            cleanup_interval_secs: store::CLEANUP_INTERVAL_SECS,
            operation_timeout_ms: store::OPERATION_TIMEOUT_MS,
        }
    }
}

impl TokenStoreConfig {
    /// Reaper period
    #[must_use]
    pub const fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Per-call store deadline
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// OAuth 2.0 server settings
    pub oauth2_server: OAuth2ServerConfig,
    /// Token store settings
    pub token_store: TokenStoreConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: ports::DEFAULT_HTTP_PORT,
            host: "127.0.0.1".to_owned(),
            environment: Environment::Development,
            oauth2_server: OAuth2ServerConfig::default(),
            token_store: TokenStoreConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable does not parse or the result fails validation
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: parse_env("HTTP_PORT", ports::DEFAULT_HTTP_PORT)?,
            host: env_var_or("HOST", "127.0.0.1"),
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),

            oauth2_server: OAuth2ServerConfig {
                access_token_lifetime_secs: parse_env(
                    "OAUTH2_ACCESS_TOKEN_LIFETIME_SECS",
                    oauth2::ACCESS_TOKEN_LIFETIME_SECS,
                )?,
                auth_code_ttl_secs: parse_env(
                    "OAUTH2_AUTH_CODE_TTL_SECS",
                    oauth2::AUTH_CODE_TTL_SECS,
                )?,
                access_token_retention_secs: parse_env(
                    "OAUTH2_ACCESS_TOKEN_RETENTION_SECS",
                    oauth2::ACCESS_TOKEN_RETENTION_SECS,
                )?,
                issuer_url: env::var("OAUTH2_ISSUER_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty()),
            },

            token_store: TokenStoreConfig {
                backend: parse_env("TOKEN_STORE", TokenStoreBackend::Memory)?,
                database_url: env_var_or("DATABASE_URL", store::DEFAULT_DATABASE_URL),
                cleanup_interval_secs: parse_env(
                    "TOKEN_STORE_CLEANUP_INTERVAL_SECS",
                    store::CLEANUP_INTERVAL_SECS,
                )?,
                operation_timeout_ms: parse_env(
                    "STORE_OPERATION_TIMEOUT_MS",
                    store::OPERATION_TIMEOUT_MS,
                )?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns a `ConfigInvalid` error describing the first offending value
    pub fn validate(&self) -> Result<(), AppError> {
        let oauth2_server = &self.oauth2_server;

        if oauth2_server.auth_code_ttl_secs == 0
            || oauth2_server.auth_code_ttl_secs > oauth2::MAX_AUTH_CODE_TTL_SECS
        {
            return Err(AppError::config(format!(
                "OAUTH2_AUTH_CODE_TTL_SECS must be between 1 and {}",
                oauth2::MAX_AUTH_CODE_TTL_SECS
            )));
        }

        if oauth2_server.access_token_lifetime_secs == 0 {
            return Err(AppError::config(
                "OAUTH2_ACCESS_TOKEN_LIFETIME_SECS must be positive",
            ));
        }

        if oauth2_server.access_token_retention_secs < oauth2_server.access_token_lifetime_secs {
            return Err(AppError::config(
                "OAUTH2_ACCESS_TOKEN_RETENTION_SECS must not be shorter than the access token lifetime",
            ));
        }

        if oauth2_server.access_token_retention_secs > oauth2::MAX_ACCESS_TOKEN_RETENTION_SECS {
            return Err(AppError::config(format!(
                "OAUTH2_ACCESS_TOKEN_RETENTION_SECS must not exceed {}",
                oauth2::MAX_ACCESS_TOKEN_RETENTION_SECS
            )));
        }

        if self.token_store.cleanup_interval_secs == 0 {
            return Err(AppError::config(
                "TOKEN_STORE_CLEANUP_INTERVAL_SECS must be positive",
            ));
        }

        if self.token_store.operation_timeout_ms == 0 {
            return Err(AppError::config("STORE_OPERATION_TIMEOUT_MS must be positive"));
        }

        if self.token_store.backend == TokenStoreBackend::Sqlite
            && !self.token_store.database_url.starts_with("sqlite:")
        {
            return Err(AppError::config(
                "DATABASE_URL must be a sqlite: URL when TOKEN_STORE=sqlite",
            ));
        }

        Ok(())
    }

    /// Issuer base URL: explicit setting, or derived from host and port
    #[must_use]
    pub fn issuer_url(&self) -> String {
        self.oauth2_server.issuer_url.clone().map_or_else(
            || format!("http://localhost:{}", self.http_port),
            |url| url.trim_end_matches('/').to_owned(),
        )
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Doodle API Server Configuration:\n\
             - Environment: {}\n\
             - Listen: {}:{}\n\
             - Issuer: {}\n\
             - Access Token Lifetime: {}s\n\
             - Authorization Code TTL: {}s\n\
             - Token Store: {}\n\
             - Store Timeout: {}ms",
            self.environment,
            self.host,
            self.http_port,
            self.issuer_url(),
            self.oauth2_server.access_token_lifetime_secs,
            self.oauth2_server.auth_code_ttl_secs,
            self.token_store.backend,
            self.token_store.operation_timeout_ms,
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw}")),
        Err(_) => Ok(default),
    }
}
