//! # REST API Module
//!
//! This module defines all HTTP endpoints of the bridge backend.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | API information |
//! | GET | `/health` | Ledger connectivity per network |
//! | POST | `/session/connect` | Connect a wallet session |
//! | DELETE | `/session/{id}` | Tear a session down |
//! | GET | `/session/{id}` | Session snapshot |
//! | POST | `/session/{id}/refresh` | Re-run the balance refresher |
//! | POST | `/session/{id}/network` | Switch the active network |
//! | GET | `/session/{id}/bridge-status` | Bridge confirmation status |
//! | POST | `/session/{id}/bridge-status/dismiss` | Clear the status |
//! | POST | `/session/{id}/bridge-status/retry` | Re-run the monitor |
//! | * | `/session/{id}/transfer/internal/...` | Internal wizard steps |
//! | * | `/session/{id}/transfer/external/...` | External wizard steps |
//!
//! ## Request/Response Format
//!
//! All requests and responses use JSON:
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... }
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "error": {
//!         "code": "ERROR_CODE",
//!         "message": "Human readable message"
//!     }
//! }
//! ```

pub mod handlers;
pub mod routes;

pub use routes::configure_routes;
