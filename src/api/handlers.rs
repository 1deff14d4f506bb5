//! # API Request Handlers
//!
//! This module contains the handler functions for each API endpoint.
//! Each handler:
//! 1. Extracts request data
//! 2. Calls the session manager
//! 3. Returns a formatted response
//!
//! ## Error Handling
//!
//! All errors are caught and returned as JSON:
//!
//! ```json
//! {
//!     "success": false,
//!     "error": {
//!         "code": "VALIDATION_ERROR",
//!         "message": "recipient is not opted into voi-native"
//!     }
//! }
//! ```
//!
//! Validation failures map to 400, unknown sessions to 404, upstream
//! ledger failures to 502.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::models::{
    AmountRequest, ApiResponse, BridgeRetryRequest, ConnectRequest, HealthResponse,
    NetworkRequest, OptInEntry, RecipientRequest, SelectBucketRequest, TransferSubmitResponse,
};
use crate::services::TransferError;
use crate::session::SessionError;
use crate::AppState;

/// Map a session error to the right HTTP response.
fn error_response(err: SessionError) -> HttpResponse {
    let (status, code) = match &err {
        SessionError::NotFound => (actix_web::http::StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        SessionError::InvalidAddress(_) | SessionError::MissingAddress => {
            (actix_web::http::StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        SessionError::Wizard(_) => {
            (actix_web::http::StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        SessionError::NoSigner => (actix_web::http::StatusCode::BAD_REQUEST, "NO_SIGNER"),
        SessionError::NoBridgeStatus => {
            (actix_web::http::StatusCode::BAD_REQUEST, "NO_BRIDGE_STATUS")
        }
        SessionError::Signer(_) => {
            (actix_web::http::StatusCode::BAD_REQUEST, "SIGNER_ERROR")
        }
        SessionError::Transfer(TransferError::Builder(_)) => {
            (actix_web::http::StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        }
        SessionError::Transfer(TransferError::Signer(_)) => {
            (actix_web::http::StatusCode::BAD_REQUEST, "SIGNING_REJECTED")
        }
        SessionError::Transfer(_) => {
            (actix_web::http::StatusCode::BAD_GATEWAY, "NETWORK_ERROR")
        }
    };

    HttpResponse::build(status).json(ApiResponse::<()>::error(code, &err.to_string()))
}

/// Fold a session-manager result into an HTTP response.
fn respond<T: serde::Serialize>(result: Result<T, SessionError>) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::Ok().json(ApiResponse::success(data)),
        Err(err) => error_response(err),
    }
}

/// API information endpoint (root).
///
/// ## Endpoint
///
/// `GET /`
pub async fn api_info(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let info = json!({
        "name": "Aramid Bridge Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Backend API for bucket-to-bucket token transfers across two ledgers",
        "relayAddress": state.config.relay_address,
        "endpoints": {
            "health": { "method": "GET", "path": "/health" },
            "session": {
                "connect": { "method": "POST", "path": "/session/connect" },
                "snapshot": { "method": "GET", "path": "/session/{id}" },
                "internalWizard": { "path": "/session/{id}/transfer/internal" },
                "externalWizard": { "path": "/session/{id}/transfer/external" },
                "bridgeStatus": { "path": "/session/{id}/bridge-status" }
            }
        }
    });

    HttpResponse::Ok().json(ApiResponse::success(info))
}

/// Health check endpoint.
///
/// Checks reachability of both ledger nodes.
///
/// ## Endpoint
///
/// `GET /health`
///
/// ## Example
///
/// ```bash
/// curl http://127.0.0.1:8080/health
/// ```
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    use crate::buckets::Network;

    let algorand = state.chains.rpc(Network::Algorand).get_status().await.is_ok();
    let voi = state.chains.rpc(Network::Voi).get_status().await.is_ok();
    let overall = algorand && voi;

    let response = HealthResponse {
        status: if overall { "healthy" } else { "unhealthy" }.to_string(),
        algorand,
        voi,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    };

    let status_code = if overall {
        actix_web::http::StatusCode::OK
    } else {
        actix_web::http::StatusCode::SERVICE_UNAVAILABLE
    };

    HttpResponse::build(status_code).json(ApiResponse::success(response))
}

// ==========================================
// SESSION LIFECYCLE
// ==========================================

/// Connect a wallet session.
///
/// ## Endpoint
///
/// `POST /session/connect`
pub async fn connect(
    state: web::Data<Arc<AppState>>,
    body: web::Json<ConnectRequest>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .connect(body.address.as_deref(), body.keypair_path.as_deref())
            .await,
    )
}

/// Session snapshot.
///
/// `GET /session/{id}`
pub async fn session_snapshot(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(state.sessions.snapshot(*path).await)
}

/// Tear a session down.
///
/// `DELETE /session/{id}`
pub async fn disconnect(state: web::Data<Arc<AppState>>, path: web::Path<Uuid>) -> HttpResponse {
    respond(state.sessions.disconnect(*path).await)
}

/// Current buckets.
///
/// `GET /session/{id}/buckets`
pub async fn buckets(state: web::Data<Arc<AppState>>, path: web::Path<Uuid>) -> HttpResponse {
    respond(
        state
            .sessions
            .snapshot(*path)
            .await
            .map(|snapshot| snapshot.buckets),
    )
}

/// Re-run the balance refresher.
///
/// `POST /session/{id}/refresh`
pub async fn refresh(state: web::Data<Arc<AppState>>, path: web::Path<Uuid>) -> HttpResponse {
    respond(state.sessions.refresh(*path).await)
}

/// Switch the active network.
///
/// `POST /session/{id}/network`
pub async fn set_network(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<NetworkRequest>,
) -> HttpResponse {
    respond(state.sessions.set_network(*path, body.network).await)
}

// ==========================================
// BRIDGE STATUS
// ==========================================

/// Bridge confirmation status.
///
/// `GET /session/{id}/bridge-status`
pub async fn bridge_status(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(state.sessions.bridge_status(*path).await)
}

/// Dismiss the bridge status.
///
/// `POST /session/{id}/bridge-status/dismiss`
pub async fn bridge_dismiss(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(state.sessions.bridge_dismiss(*path).await)
}

/// Re-run the confirmation monitor, optionally against the other
/// network (a labeled heuristic, not a verified destination).
///
/// `POST /session/{id}/bridge-status/retry`
pub async fn bridge_retry(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<BridgeRetryRequest>,
) -> HttpResponse {
    respond(state.sessions.bridge_retry(*path, body.network).await)
}

// ==========================================
// INTERNAL TRANSFER WIZARD
// ==========================================

/// Internal wizard state.
///
/// `GET /session/{id}/transfer/internal`
pub async fn internal_state(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .snapshot(*path)
            .await
            .map(|snapshot| snapshot.internal),
    )
}

/// `POST /session/{id}/transfer/internal/select-from`
pub async fn internal_select_from(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<SelectBucketRequest>,
) -> HttpResponse {
    respond(state.sessions.internal_select_from(*path, body.bucket_id).await)
}

/// `POST /session/{id}/transfer/internal/select-to`
pub async fn internal_select_to(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<SelectBucketRequest>,
) -> HttpResponse {
    respond(state.sessions.internal_select_to(*path, body.bucket_id).await)
}

/// `POST /session/{id}/transfer/internal/amount`
pub async fn internal_amount(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<AmountRequest>,
) -> HttpResponse {
    respond(state.sessions.internal_amount(*path, body.amount).await)
}

/// Submit the internal transfer.
///
/// `POST /session/{id}/transfer/internal/submit`
pub async fn internal_submit(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .internal_submit(*path)
            .await
            .map(TransferSubmitResponse::from),
    )
}

/// `POST /session/{id}/transfer/internal/reset`
pub async fn internal_reset(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(state.sessions.internal_reset(*path).await)
}

// ==========================================
// EXTERNAL TRANSFER WIZARD
// ==========================================

/// External wizard state.
///
/// `GET /session/{id}/transfer/external`
pub async fn external_state(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .snapshot(*path)
            .await
            .map(|snapshot| snapshot.external),
    )
}

/// `POST /session/{id}/transfer/external/select-token`
pub async fn external_select_token(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<SelectBucketRequest>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .external_select_token(*path, body.bucket_id)
            .await,
    )
}

/// `POST /session/{id}/transfer/external/amount`
pub async fn external_amount(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<AmountRequest>,
) -> HttpResponse {
    respond(state.sessions.external_amount(*path, body.amount).await)
}

/// Set the recipient; returns the fresh opt-in probe results for all
/// four buckets.
///
/// `POST /session/{id}/transfer/external/recipient`
pub async fn external_recipient(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<RecipientRequest>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .external_recipient(*path, &body.address)
            .await
            .map(OptInEntry::from_statuses),
    )
}

/// `POST /session/{id}/transfer/external/destination`
pub async fn external_destination(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
    body: web::Json<SelectBucketRequest>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .external_destination(*path, body.bucket_id)
            .await,
    )
}

/// The collected transfer as shown on the confirm step.
///
/// `GET /session/{id}/transfer/external/confirm`
pub async fn external_confirm(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .snapshot(*path)
            .await
            .map(|snapshot| snapshot.external),
    )
}

/// Submit the external transfer.
///
/// `POST /session/{id}/transfer/external/submit`
pub async fn external_submit(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state
            .sessions
            .external_submit(*path)
            .await
            .map(TransferSubmitResponse::from),
    )
}

/// `POST /session/{id}/transfer/external/reset`
pub async fn external_reset(
    state: web::Data<Arc<AppState>>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(state.sessions.external_reset(*path).await)
}
