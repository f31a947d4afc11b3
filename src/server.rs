// ABOUTME: HTTP server lifecycle: bind, serve the router, and shut down gracefully
// ABOUTME: Keeps the token store reaper alive for as long as the server runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

use crate::oauth2_server::spawn_reaper;
use crate::resources::ServerResources;
use crate::routes;
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// The Doodle API HTTP server
pub struct DoodleApiServer {
    resources: Arc<ServerResources>,
}

impl DoodleApiServer {
    /// Create a server over prepared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Serve until `shutdown` resolves
    ///
    /// # Errors
    /// Returns an error if the listen address is invalid, binding fails, or the
    /// server stops with an I/O error
    pub async fn run<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let config = &self.resources.config;
        let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", config.host, config.http_port))?;

        let _reaper = spawn_reaper(
            self.resources.token_store.clone(),
            config.token_store.cleanup_interval(),
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!("Listening on {}", addr);

        axum::serve(listener, routes::router(&self.resources))
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server terminated with an error")?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
