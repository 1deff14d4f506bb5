//! # Transaction Types
//!
//! Typed unsigned operations as the transaction builders produce them.
//! The flow mirrors the signing boundary of the system:
//!
//! ```text
//! 1. Builder produces UnsignedTransaction(s), grouped if atomic
//!              ↓
//! 2. WalletSigner signs the canonical bytes
//!              ↓
//! 3. SignedTransaction bytes go to the ledger via submit_raw
//! ```
//!
//! Canonical encoding is the domain-prefixed JSON of the transaction
//! (`"TX"` + compact JSON). Group membership is committed by hashing the
//! concatenated canonical encodings of all members before signing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

/// Domain separator prepended to transaction bytes before signing.
const TX_DOMAIN_PREFIX: &[u8] = b"TX";

/// Fields common to every transaction shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHeader {
    /// Sender address.
    pub sender: String,

    /// Flat fee in base units.
    pub fee: u64,

    /// First round this transaction is valid in.
    pub first_valid: u64,

    /// Last round this transaction is valid in.
    pub last_valid: u64,

    /// Genesis id of the target ledger.
    pub genesis_id: String,

    /// Base64 genesis hash of the target ledger.
    pub genesis_hash: String,

    /// Optional note payload (the bridge protocol rides here).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Vec<u8>>,

    /// Base64 group id once the transaction is part of an atomic group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// The operation-specific part of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransactionBody {
    /// Native-coin payment.
    #[serde(rename_all = "camelCase")]
    Payment { receiver: String, amount: u64 },

    /// Native asset transfer. A zero-amount transfer to self is the
    /// opt-in convention.
    #[serde(rename_all = "camelCase")]
    AssetTransfer {
        asset_id: u64,
        receiver: String,
        amount: u64,
    },

    /// Application call with pre-encoded argument bytes; the first
    /// argument is the method selector.
    #[serde(rename_all = "camelCase")]
    AppCall {
        app_id: u64,
        app_args: Vec<Vec<u8>>,
        /// Accounts the call references besides the sender.
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        accounts: Vec<String>,
    },
}

/// An unsigned operation produced by a transaction builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    #[serde(flatten)]
    pub header: TransactionHeader,

    #[serde(flatten)]
    pub body: TransactionBody,
}

impl UnsignedTransaction {
    /// Canonical bytes that get signed and hashed into group ids.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let json = serde_json::to_vec(self)
            .expect("transaction serialization is infallible for owned data");
        let mut bytes = Vec::with_capacity(TX_DOMAIN_PREFIX.len() + json.len());
        bytes.extend_from_slice(TX_DOMAIN_PREFIX);
        bytes.extend_from_slice(&json);
        bytes
    }

    /// Transaction id: base32-ish stable id derived from the canonical
    /// bytes. Matches what the ledger reports back for a submitted
    /// transaction.
    pub fn id(&self) -> String {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
        let digest = Sha512_256::digest(self.canonical_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

/// Assign a shared group id to a set of transactions, making them an
/// atomic group: all commit or none do.
///
/// The group id is the hash of the members' canonical encodings taken
/// *before* any group field is set, so it must be called exactly once,
/// on ungrouped transactions.
pub fn assign_group_id(txns: &mut [UnsignedTransaction]) {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

    if txns.len() < 2 {
        return;
    }

    debug_assert!(
        txns.iter().all(|t| t.header.group.is_none()),
        "assign_group_id called on already-grouped transactions"
    );

    let mut hasher = Sha512_256::new();
    hasher.update(b"TG");
    for txn in txns.iter() {
        hasher.update(txn.canonical_bytes());
    }
    let group = BASE64.encode(hasher.finalize());

    for txn in txns.iter_mut() {
        txn.header.group = Some(group.clone());
    }
}

/// A signed transaction ready for `submit_raw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// The signed operation.
    pub txn: UnsignedTransaction,

    /// Base64 ed25519 signature over the canonical bytes.
    pub sig: String,

    /// Address of the signing key.
    pub signer: String,
}

impl SignedTransaction {
    /// Wire bytes for submission.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("signed transaction serialization is infallible")
    }
}

/// Encode a group of signed transactions for a single `submit_raw` call.
pub fn encode_signed_group(signed: &[SignedTransaction]) -> Vec<u8> {
    serde_json::to_vec(signed).expect("signed group serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_txn(amount: u64) -> UnsignedTransaction {
        UnsignedTransaction {
            header: TransactionHeader {
                sender: "SENDER".into(),
                fee: 1000,
                first_valid: 10,
                last_valid: 1010,
                genesis_id: "test-v1".into(),
                genesis_hash: "aGFzaA==".into(),
                note: None,
                group: None,
            },
            body: TransactionBody::Payment {
                receiver: "RECEIVER".into(),
                amount,
            },
        }
    }

    #[test]
    fn group_id_is_shared_and_set() {
        let mut txns = vec![sample_txn(1), sample_txn(2)];
        assign_group_id(&mut txns);

        let group = txns[0].header.group.clone().expect("group set");
        assert_eq!(txns[1].header.group.as_deref(), Some(group.as_str()));
    }

    #[test]
    fn single_transaction_gets_no_group() {
        let mut txns = vec![sample_txn(1)];
        assign_group_id(&mut txns);
        assert!(txns[0].header.group.is_none());
    }

    #[test]
    fn different_contents_give_different_ids() {
        assert_ne!(sample_txn(1).id(), sample_txn(2).id());
    }

    #[test]
    fn canonical_bytes_carry_domain_prefix() {
        let bytes = sample_txn(1).canonical_bytes();
        assert_eq!(&bytes[..2], b"TX");
    }
}
