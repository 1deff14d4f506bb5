//! # API Route Configuration
//!
//! This module sets up all the HTTP routes for the API.

use actix_web::web;

use super::handlers;

/// Configure all API routes.
///
/// This function is called from main.rs to set up
/// all the endpoint routes.
///
/// ## Route Structure
///
/// ```text
/// /
/// ├── /health                      GET - Health check
/// └── /session
///     ├── /connect                 POST - Connect wallet session
///     └── /{id}
///         ├── ""                   GET - Snapshot / DELETE - Teardown
///         ├── /buckets             GET - Current buckets
///         ├── /refresh             POST - Re-run balance refresher
///         ├── /network             POST - Switch active network
///         ├── /bridge-status       GET / dismiss / retry
///         └── /transfer
///             ├── /internal/...    Internal wizard steps
///             └── /external/...    External wizard steps
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Root endpoint - API information
        .route("/", web::get().to(handlers::api_info))
        // Health check endpoint
        .route("/health", web::get().to(handlers::health_check))
        // Session endpoints
        .service(
            web::scope("/session")
                // Connect a wallet
                .route("/connect", web::post().to(handlers::connect))
                // Session snapshot / teardown
                .route("/{id}", web::get().to(handlers::session_snapshot))
                .route("/{id}", web::delete().to(handlers::disconnect))
                // Buckets and refresh
                .route("/{id}/buckets", web::get().to(handlers::buckets))
                .route("/{id}/refresh", web::post().to(handlers::refresh))
                // Active network switch
                .route("/{id}/network", web::post().to(handlers::set_network))
                // Bridge confirmation status
                .route("/{id}/bridge-status", web::get().to(handlers::bridge_status))
                .route(
                    "/{id}/bridge-status/dismiss",
                    web::post().to(handlers::bridge_dismiss),
                )
                .route(
                    "/{id}/bridge-status/retry",
                    web::post().to(handlers::bridge_retry),
                )
                // Internal transfer wizard
                .route(
                    "/{id}/transfer/internal",
                    web::get().to(handlers::internal_state),
                )
                .route(
                    "/{id}/transfer/internal/select-from",
                    web::post().to(handlers::internal_select_from),
                )
                .route(
                    "/{id}/transfer/internal/select-to",
                    web::post().to(handlers::internal_select_to),
                )
                .route(
                    "/{id}/transfer/internal/amount",
                    web::post().to(handlers::internal_amount),
                )
                .route(
                    "/{id}/transfer/internal/submit",
                    web::post().to(handlers::internal_submit),
                )
                .route(
                    "/{id}/transfer/internal/reset",
                    web::post().to(handlers::internal_reset),
                )
                // External transfer wizard
                .route(
                    "/{id}/transfer/external",
                    web::get().to(handlers::external_state),
                )
                .route(
                    "/{id}/transfer/external/select-token",
                    web::post().to(handlers::external_select_token),
                )
                .route(
                    "/{id}/transfer/external/amount",
                    web::post().to(handlers::external_amount),
                )
                .route(
                    "/{id}/transfer/external/recipient",
                    web::post().to(handlers::external_recipient),
                )
                .route(
                    "/{id}/transfer/external/destination",
                    web::post().to(handlers::external_destination),
                )
                .route(
                    "/{id}/transfer/external/confirm",
                    web::get().to(handlers::external_confirm),
                )
                .route(
                    "/{id}/transfer/external/submit",
                    web::post().to(handlers::external_submit),
                )
                .route(
                    "/{id}/transfer/external/reset",
                    web::post().to(handlers::external_reset),
                ),
        );
}
