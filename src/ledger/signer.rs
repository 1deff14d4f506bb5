//! # Wallet Signing
//!
//! The signing collaborator: the backend never holds user keys in the
//! normal flow — builders return unsigned operations and a `WalletSigner`
//! turns them into signed bytes. The local keypair-file implementation
//! exists for development and automated testing, where the backend signs
//! on the user's behalf.

use std::fs;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signer as _, SigningKey};
use thiserror::Error;
use tracing::info;

use super::address::encode_address;
use super::transactions::{SignedTransaction, UnsignedTransaction};

/// Errors raised by signing.
#[derive(Debug, Clone, Error)]
pub enum SignerError {
    /// The user declined to sign.
    #[error("signing rejected by user")]
    Rejected,

    /// Failed to load or parse the keypair.
    #[error("failed to load keypair: {0}")]
    Keypair(String),

    /// The transaction sender does not match the signing key.
    #[error("transaction sender {sender} does not match signer {signer}")]
    WrongSender { sender: String, signer: String },
}

/// Signs unsigned operations on behalf of the connected wallet.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Address of the key this signer controls.
    fn address(&self) -> &str;

    /// Sign a batch of transactions (an atomic group signs together).
    async fn sign(
        &self,
        txns: &[UnsignedTransaction],
    ) -> Result<Vec<SignedTransaction>, SignerError>;
}

/// Keypair-file signer for development and tests.
///
/// The keypair file is a JSON array of bytes: either the 32-byte ed25519
/// seed, or 64 bytes of seed followed by the public key.
pub struct LocalKeySigner {
    key: SigningKey,
    address: String,
}

impl LocalKeySigner {
    /// Load a signer from a keypair file.
    pub fn from_file(path: &str) -> Result<Self, SignerError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| SignerError::Keypair(format!("failed to read {}: {}", path, e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&raw)
            .map_err(|e| SignerError::Keypair(format!("failed to parse {}: {}", path, e)))?;

        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(SignerError::Keypair(format!(
                "expected 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }

        let seed: [u8; 32] = bytes[..32]
            .try_into()
            .map_err(|_| SignerError::Keypair("invalid seed bytes".to_string()))?;

        Ok(Self::from_seed(seed))
    }

    /// Build a signer directly from an ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&seed);
        let address = encode_address(key.verifying_key().as_bytes());
        info!("Local signer loaded for {}", address);
        Self { key, address }
    }
}

#[async_trait]
impl WalletSigner for LocalKeySigner {
    fn address(&self) -> &str {
        &self.address
    }

    async fn sign(
        &self,
        txns: &[UnsignedTransaction],
    ) -> Result<Vec<SignedTransaction>, SignerError> {
        let mut signed = Vec::with_capacity(txns.len());

        for txn in txns {
            if txn.header.sender != self.address {
                return Err(SignerError::WrongSender {
                    sender: txn.header.sender.clone(),
                    signer: self.address.clone(),
                });
            }

            let signature = self.key.sign(&txn.canonical_bytes());
            signed.push(SignedTransaction {
                txn: txn.clone(),
                sig: BASE64.encode(signature.to_bytes()),
                signer: self.address.clone(),
            });
        }

        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transactions::{TransactionBody, TransactionHeader};

    fn txn_from(sender: &str) -> UnsignedTransaction {
        UnsignedTransaction {
            header: TransactionHeader {
                sender: sender.to_string(),
                fee: 1000,
                first_valid: 1,
                last_valid: 1001,
                genesis_id: "test-v1".into(),
                genesis_hash: "aGFzaA==".into(),
                note: None,
                group: None,
            },
            body: TransactionBody::Payment {
                receiver: "RECEIVER".into(),
                amount: 5,
            },
        }
    }

    #[tokio::test]
    async fn signs_transactions_from_own_address() {
        let signer = LocalKeySigner::from_seed([9u8; 32]);
        let txn = txn_from(signer.address());

        let signed = signer.sign(&[txn]).await.expect("sign");
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0].signer, signer.address());
        assert!(!signed[0].sig.is_empty());
    }

    #[tokio::test]
    async fn rejects_foreign_sender() {
        let signer = LocalKeySigner::from_seed([9u8; 32]);
        let other = LocalKeySigner::from_seed([8u8; 32]);
        let txn = txn_from(other.address());

        let err = signer.sign(&[txn]).await.unwrap_err();
        assert!(matches!(err, SignerError::WrongSender { .. }));
    }
}
