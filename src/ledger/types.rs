//! # Ledger Data Types
//!
//! Typed views of the REST responses the backend consumes. Only the
//! fields the core actually reads are modeled; everything else the node
//! returns is ignored by serde.

use serde::{Deserialize, Serialize};

/// Account information returned by `GET /v2/accounts/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Account address.
    pub address: String,

    /// Native-coin balance in base units (pays fees, not the token).
    #[serde(default)]
    pub amount: u64,

    /// Asset holdings the account has opted into.
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
}

/// One asset holding of an account.
///
/// Presence of a holding is what "opted in" means on the native side —
/// a zero `amount` still counts as opted in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetHolding {
    /// Asset identifier.
    #[serde(rename = "asset-id")]
    pub asset_id: u64,

    /// Held amount in base units.
    pub amount: u64,
}

/// Node status, `GET /v2/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    /// The latest committed round.
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// Suggested transaction parameters, `GET /v2/transactions/params`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxParams {
    /// Genesis id string, e.g. `"mainnet-v1.0"`.
    #[serde(rename = "genesis-id")]
    pub genesis_id: String,

    /// Base64 genesis hash.
    #[serde(rename = "genesis-hash")]
    pub genesis_hash: String,

    /// Suggested flat fee in base units.
    #[serde(rename = "min-fee")]
    pub min_fee: u64,

    /// First round the transaction may be valid in.
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

impl TxParams {
    /// Validity window applied to every transaction this backend builds.
    pub const VALIDITY_WINDOW: u64 = 1000;

    /// First/last valid rounds derived from the suggested params.
    pub fn validity_range(&self) -> (u64, u64) {
        (self.last_round, self.last_round + Self::VALIDITY_WINDOW)
    }
}

/// A block fetched for confirmation scanning, `GET /v2/blocks/{round}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Block {
    /// Block round.
    #[serde(default)]
    pub round: u64,

    /// Transactions in the block.
    #[serde(default)]
    pub transactions: Vec<BlockTransaction>,
}

/// A transaction as it appears inside a fetched block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockTransaction {
    /// Transaction id.
    pub id: String,

    /// Sender address.
    #[serde(default)]
    pub sender: String,

    /// Note field, base64 encoded, if the transaction carries one.
    #[serde(default)]
    pub note: Option<String>,
}

impl BlockTransaction {
    /// Decode the note field as text, if present.
    ///
    /// The bridge protocol is a text convention layered on notes, so a
    /// note that is not valid UTF-8 is decoded lossily rather than
    /// rejected — the marker search just won't match.
    pub fn note_text(&self) -> Option<String> {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        let raw = self.note.as_deref()?;
        let bytes = BASE64.decode(raw).ok()?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Pending-transaction view used while waiting for confirmation,
/// `GET /v2/transactions/pending/{txid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingTransaction {
    /// Round the transaction was confirmed in; 0 while still pending.
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: u64,

    /// Pool error, non-empty when the transaction was rejected.
    #[serde(rename = "pool-error", default)]
    pub pool_error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    #[test]
    fn note_text_decodes_base64() {
        let tx = BlockTransaction {
            id: "TX1".into(),
            sender: String::new(),
            note: Some(BASE64.encode("hello note")),
        };
        assert_eq!(tx.note_text().as_deref(), Some("hello note"));
    }

    #[test]
    fn note_text_absent_when_no_note() {
        let tx = BlockTransaction::default();
        assert!(tx.note_text().is_none());
    }

    #[test]
    fn tx_params_validity_range() {
        let params = TxParams {
            genesis_id: "test-v1".into(),
            genesis_hash: "aGFzaA==".into(),
            min_fee: 1000,
            last_round: 5000,
        };
        assert_eq!(params.validity_range(), (5000, 6000));
    }
}
