// ABOUTME: Doodle API server binary wiring configuration, storage and routes
// ABOUTME: Loads environment config, applies bootstrap registrations and serves until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Doodle API Contributors

//! # Doodle API Server Binary
//!
//! Starts the HTTP API with its embedded OAuth 2.0 authorization server.

use anyhow::Result;
use clap::Parser;
use doodle_api::{
    auth::InMemoryResourceOwnerDirectory,
    config::{BootstrapFile, ServerConfig},
    logging,
    oauth2_server::InMemoryClientRegistry,
    resources::{build_token_store, ServerResources},
    server::{shutdown_signal, DoodleApiServer},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "doodle-api-server")]
#[command(about = "Doodle scheduling API with embedded OAuth 2.0 authorization server")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// JSON file registering clients and resource owners
    #[arg(long)]
    bootstrap: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    info!("{}", config.summary());

    let clients = InMemoryClientRegistry::new();
    let resource_owners = InMemoryResourceOwnerDirectory::new();
    if let Some(path) = &args.bootstrap {
        BootstrapFile::load(path)?.apply(&clients, &resource_owners)?;
    }
    if clients.is_empty() {
        warn!("No OAuth 2.0 clients registered; pass --bootstrap to register some");
    }

    let token_store = build_token_store(&config).await?;
    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::new(
        config.clone(),
        token_store,
        Arc::new(clients),
        Arc::new(resource_owners),
    ));

    display_available_endpoints(&config);

    let server = DoodleApiServer::new(resources);
    if let Err(e) = server.run(shutdown_signal()).await {
        error!("Server error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Display all available API endpoints
fn display_available_endpoints(config: &ServerConfig) {
    let base = format!("http://{}:{}", config.host, config.http_port);
    info!("=== Available API Endpoints ===");
    info!("   Authorization:     GET  {base}/oauth2/authorize");
    info!("   Token Exchange:    POST {base}/oauth2/token");
    info!("   Discovery:         GET  {base}/.well-known/oauth-authorization-server");
    info!("   API:               GET  {base}/api");
    info!("   Health:            GET  {base}/health");
    info!("=== End of Endpoint List ===");
}
