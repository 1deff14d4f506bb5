//! # API Request Models
//!
//! Structures for incoming API request bodies.
//! Each struct represents the expected JSON body for an endpoint.

use serde::{Deserialize, Serialize};

use crate::buckets::{BucketId, Network};

/// Request to connect a wallet session.
///
/// ## Example JSON
///
/// ```json
/// {
///     "address": "ARAMIDX...Y4"
/// }
/// ```
///
/// At least one of `address` and `keypairPath` is required. Without a
/// keypair the session is read-only: wizards advance but submission is
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    /// Wallet address to connect.
    pub address: Option<String>,

    /// Optional: Path to the wallet's keypair file for automatic signing.
    /// **DEVNET/TESTING ONLY** - lets the backend sign and submit on the
    /// user's behalf.
    pub keypair_path: Option<String>,
}

/// Request selecting a bucket (wizard source/destination steps).
///
/// ## Example JSON
///
/// ```json
/// {
///     "bucketId": "algorand-native"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectBucketRequest {
    /// The bucket to select.
    pub bucket_id: BucketId,
}

/// Request entering a transfer amount.
///
/// ## Notes
///
/// - `amount` is in base units
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    /// Amount in base units.
    pub amount: u64,
}

/// Request setting the external transfer recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRequest {
    /// Recipient address on the destination ledger.
    pub address: String,
}

/// Request switching the session's active network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
    /// The network to switch to.
    pub network: Network,
}

/// Request re-running the bridge confirmation monitor.
///
/// `network` optionally points the re-scan at the other ledger — a
/// heuristic for when the original destination was ambiguous; the
/// resulting status is marked `heuristic`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRetryRequest {
    /// Destination network override.
    pub network: Option<Network>,
}
