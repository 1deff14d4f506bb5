//! # Aramid Bridge Backend Service
//!
//! This is the main entry point for the backend service that moves one
//! token between its four buckets: the native asset and the
//! contract-managed balance, on each of two ledgers. It provides:
//!
//! - REST API driving the two transfer wizards (internal + external)
//! - Transaction builders for conversions and relay transfers
//! - A background confirmation monitor per bridged leg
//! - A fan-out balance refresher with per-bucket failure isolation
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                       BACKEND SERVICE                           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────────────────────────────────┐  │
//! │  │  REST API   │  │          Background Tasks               │  │
//! │  │  (Actix)    │  │  • Bridge Confirmation Monitor          │  │
//! │  │  /session   │  │  • External-wizard auto-reset watcher   │  │
//! │  └─────────────┘  └─────────────────────────────────────────┘  │
//! │         │                          │                            │
//! │  ┌──────┴──────────────────────────┴───────────────────────┐   │
//! │  │                    SERVICE LAYER                         │   │
//! │  │  ┌───────────────┐ ┌──────────────┐ ┌────────────────┐  │   │
//! │  │  │TransferBuilder│ │TransferExec. │ │BalanceRefresher│  │   │
//! │  │  └───────────────┘ └──────────────┘ └────────────────┘  │   │
//! │  └──────────────────────────┬───────────────────────────────┘  │
//! │              ┌──────────────┴──────────────┐                   │
//! │       ┌──────┴──────┐               ┌──────┴──────┐            │
//! │       │  Algorand   │               │     Voi     │            │
//! │       │  node REST  │               │  node REST  │            │
//! │       └─────────────┘               └─────────────┘            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Copy `.env.example` to `.env` and configure
//! 2. Start the server: `cargo run`
//!
//! ## Environment Variables
//!
//! See `src/config/mod.rs` for all settings.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod api;
mod bridge;
mod buckets;
mod config;
mod contract;
mod ledger;
mod models;
mod services;
mod session;
mod wizard;

use buckets::Network;
use config::AppConfig;
use ledger::HttpLedgerClient;
use services::{ChainHandle, ChainSet};
use session::SessionManager;

/// Application state shared across all handlers.
pub struct AppState {
    /// Application configuration.
    pub config: AppConfig,

    /// Per-network ledger and contract handles.
    pub chains: ChainSet,

    /// All live wallet sessions and their wizards.
    pub sessions: SessionManager,
}

/// Main entry point for the backend service.
///
/// This function:
/// 1. Initializes logging
/// 2. Loads configuration from environment
/// 3. Sets up the per-network ledger clients
/// 4. Creates the session manager
/// 5. Launches the HTTP server
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // =========================================
    // STEP 1: Initialize Logging
    // =========================================
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("🚀 Starting Aramid Bridge Backend Service");

    // =========================================
    // STEP 2: Load Configuration
    // =========================================
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    let config = AppConfig::from_env().expect("Failed to load configuration");

    info!("📋 Configuration loaded");
    info!("   Algorand RPC: {}", config.algorand_rpc_url);
    info!("   Voi RPC: {}", config.voi_rpc_url);
    info!("   Relay address: {}", config.relay_address);

    // =========================================
    // STEP 3: Initialize Ledger Clients
    // =========================================
    let chains = ChainSet::new(
        ChainHandle::new(
            Arc::new(HttpLedgerClient::new(
                Network::Algorand,
                &config.algorand_rpc_url,
            )),
            config.algorand_app_id,
        ),
        ChainHandle::new(
            Arc::new(HttpLedgerClient::new(Network::Voi, &config.voi_rpc_url)),
            config.voi_app_id,
        ),
    );

    info!("⛓️  Ledger clients initialized");

    // =========================================
    // STEP 4: Initialize Session Manager
    // =========================================
    let sessions = SessionManager::new(config.clone(), chains.clone());

    info!("🔧 Session manager initialized");

    // =========================================
    // STEP 5: Create Application State
    // =========================================
    let app_state = Arc::new(AppState {
        config: config.clone(),
        chains,
        sessions,
    });

    // =========================================
    // STEP 6: Start HTTP Server
    // =========================================
    let server_host = config.server_host.clone();
    let server_port = config.server_port;

    info!("🌐 Starting HTTP server on {}:{}", server_host, server_port);

    HttpServer::new(move || {
        App::new()
            // Attach shared application state
            .app_data(web::Data::new(app_state.clone()))
            // CORS for the browser wallet frontend
            .wrap(Cors::permissive())
            // Add logging middleware
            .wrap(middleware::Logger::default())
            // Configure API routes
            .configure(api::configure_routes)
    })
    .bind(format!("{}:{}", server_host, server_port))?
    .run()
    .await
}
