//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::buckets::{BucketId, Network};
use crate::services::{OptInStatus, TransferOutcome};

/// Standard API response wrapper.
///
/// All API responses follow this format:
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... },
///     "error": null
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "data": null,
///     "error": {
///         "code": "VALIDATION_ERROR",
///         "message": "transfer from voi-native to voi-native is not allowed"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (null on error).
    pub data: Option<T>,

    /// Error information (null on success).
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// API error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code (e.g., "VALIDATION_ERROR").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// One settled bridge leg inside a submit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLegResponse {
    /// Source-ledger transaction id the monitor awaits.
    pub source_tx_id: String,

    /// Network being scanned for the confirmation.
    pub destination: Network,
}

/// Response to a wizard submission.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "txIds": ["K45A...", "PQ2B..."],
///         "bridge": {
///             "sourceTxId": "PQ2B...",
///             "destination": "voi"
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSubmitResponse {
    /// Transaction ids of every settled leg, in submission order.
    pub tx_ids: Vec<String>,

    /// Present when a cross-network leg was submitted; its monitor is
    /// already running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeLegResponse>,
}

impl From<TransferOutcome> for TransferSubmitResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            tx_ids: outcome.tx_ids,
            bridge: outcome.bridge.map(|leg| BridgeLegResponse {
                source_tx_id: leg.source_tx_id,
                destination: leg.destination,
            }),
        }
    }
}

/// One bucket's opt-in probe result in an external-wizard response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInEntry {
    /// Which bucket was probed.
    pub bucket_id: BucketId,

    /// Probe outcome.
    #[serde(flatten)]
    pub status: OptInStatus,
}

impl OptInEntry {
    /// Build entries from the prober's output.
    pub fn from_statuses(statuses: Vec<(BucketId, OptInStatus)>) -> Vec<Self> {
        statuses
            .into_iter()
            .map(|(bucket_id, status)| Self { bucket_id, status })
            .collect()
    }
}

/// Health check response.
///
/// Returned by `GET /health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: String,

    /// Algorand node reachability.
    pub algorand: bool,

    /// Voi node reachability.
    pub voi: bool,

    /// Backend version.
    pub version: String,

    /// When this status was generated.
    pub timestamp: DateTime<Utc>,
}
