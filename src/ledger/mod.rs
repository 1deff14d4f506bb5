//! # Ledger Module
//!
//! The ledger collaborator: a typed async interface (`LedgerRpc`) over
//! the AVM-style REST API both networks expose, plus the transaction
//! types, address handling and wallet signing seam.
//!
//! ## Responsibilities
//!
//! - Query accounts, asset holdings, blocks and node status
//! - Fetch suggested transaction parameters
//! - Submit signed transaction bytes and wait for confirmation
//! - Bounded retry with backoff around flaky public endpoints
//!
//! ## Structure
//!
//! | Part | What |
//! |------|------|
//! | `LedgerRpc` | async trait the rest of the core depends on |
//! | `HttpLedgerClient` | reqwest implementation, one per network |
//! | `transactions` | unsigned/signed transaction types, atomic groups |
//! | `address` | address syntax validation + derivation |
//! | `signer` | `WalletSigner` trait + local keypair-file signer |

pub mod address;
#[cfg(test)]
pub mod mock;
pub mod signer;
pub mod transactions;
pub mod types;

pub use address::{encode_address, validate_address, AddressError};
pub use signer::{LocalKeySigner, SignerError, WalletSigner};
pub use transactions::{
    assign_group_id, encode_signed_group, SignedTransaction, TransactionBody,
    TransactionHeader, UnsignedTransaction,
};
pub use types::{
    AccountInfo, AssetHolding, Block, BlockTransaction, NodeStatus, PendingTransaction,
    TxParams,
};

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::buckets::Network;

/// Errors surfaced by ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Malformed address passed to a query.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The account has not opted into the asset.
    #[error("account {address} is not opted into asset {asset_id}")]
    NotOptedIn { address: String, asset_id: u64 },

    /// Transport-level failure.
    #[error("ledger request failed: {0}")]
    Http(String),

    /// The node answered with an error status.
    #[error("ledger rpc error ({status}): {message}")]
    Rpc { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("failed to decode ledger response: {0}")]
    Decode(String),

    /// Operation did not complete within its deadline.
    #[error("ledger operation timed out")]
    Timeout,

    /// Transaction was not confirmed within the allotted rounds.
    #[error("transaction {0} not confirmed: {1}")]
    NotConfirmed(String, String),
}

/// Typed async interface over one ledger's REST API.
///
/// The core depends on this trait only; production wires in
/// `HttpLedgerClient`, tests wire in a mock.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Which network this client talks to.
    fn network(&self) -> Network;

    /// Fetch account information.
    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError>;

    /// Fetch one asset holding; `NotOptedIn` if the account holds none.
    async fn asset_holding(
        &self,
        address: &str,
        asset_id: u64,
    ) -> Result<AssetHolding, LedgerError>;

    /// Fetch a block by round.
    async fn get_block(&self, round: u64) -> Result<Block, LedgerError>;

    /// Current committed round.
    async fn get_status(&self) -> Result<u64, LedgerError>;

    /// Suggested transaction parameters.
    async fn get_tx_params(&self) -> Result<TxParams, LedgerError>;

    /// Execute a read-only application call; returns the raw return
    /// value bytes. Contract-level rejection surfaces as an `Rpc` error
    /// with a 4xx status.
    async fn call_app(
        &self,
        app_id: u64,
        args: Vec<Vec<u8>>,
        sender: &str,
    ) -> Result<Vec<u8>, LedgerError>;

    /// Submit signed transaction bytes; returns the transaction id.
    async fn submit_raw(&self, signed: &[u8]) -> Result<String, LedgerError>;

    /// Wait until `tx_id` is confirmed, at most `rounds` rounds from now.
    /// Returns the confirmed round.
    async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        rounds: u64,
    ) -> Result<u64, LedgerError>;
}

/// REST client for one network's node.
///
/// ## Usage
///
/// ```rust,ignore
/// let client = HttpLedgerClient::new(Network::Voi, &config.voi_rpc_url);
/// let round = client.get_status().await?;
/// ```
#[derive(Clone)]
pub struct HttpLedgerClient {
    /// Which network this client serves.
    network: Network,

    /// Node base URL, e.g. `https://mainnet-api.4160.nodely.dev`.
    base_url: String,

    /// Shared reqwest client.
    http: reqwest::Client,
}

impl HttpLedgerClient {
    /// Create a client for one network.
    pub fn new(network: Network, base_url: &str) -> Self {
        info!("Ledger client initialized: {} -> {}", network, base_url);
        Self {
            network,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Execute an RPC operation with retry logic.
    ///
    /// Retries up to 4 attempts (initial attempt + 3 retries) with
    /// exponential backoff on transport errors, with a 10-second timeout
    /// per attempt. Public node endpoints fail transiently often enough
    /// that single-shot reads are not usable.
    async fn retry_rpc_operation<F, Fut, T>(&self, mut operation: F) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, LedgerError>>,
    {
        const MAX_RETRIES: u32 = 3;
        const INITIAL_DELAY_MS: u64 = 200;
        const TIMEOUT_SECS: u64 = 10;

        for attempt in 0..=MAX_RETRIES {
            match timeout(Duration::from_secs(TIMEOUT_SECS), operation()).await {
                Ok(Ok(result)) => {
                    if attempt > 0 {
                        info!("{}: rpc operation succeeded after {} retries", self.network, attempt);
                    }
                    return Ok(result);
                }
                Ok(Err(e)) => {
                    // Node-side errors (4xx) are not retried; they will not heal.
                    if let LedgerError::Rpc { status, .. } = &e {
                        if *status < 500 {
                            return Err(e);
                        }
                    }
                    if attempt < MAX_RETRIES {
                        let delay_ms = INITIAL_DELAY_MS * (1 << attempt);
                        debug!(
                            "{}: rpc operation failed (attempt {}): {}. Retrying in {}ms...",
                            self.network, attempt + 1, e, delay_ms
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    } else {
                        warn!(
                            "{}: rpc operation failed after {} attempts: {}",
                            self.network, MAX_RETRIES + 1, e
                        );
                        return Err(e);
                    }
                }
                Err(_) => {
                    if attempt < MAX_RETRIES {
                        let delay_ms = INITIAL_DELAY_MS * (1 << attempt);
                        debug!(
                            "{}: rpc operation timed out (attempt {}). Retrying in {}ms...",
                            self.network, attempt + 1, delay_ms
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    } else {
                        warn!(
                            "{}: rpc operation timed out after {} attempts",
                            self.network, MAX_RETRIES + 1
                        );
                        return Err(LedgerError::Timeout);
                    }
                }
            }
        }

        Err(LedgerError::Timeout)
    }

    /// GET a JSON endpoint with retry. Each attempt owns its clones of
    /// the client and URL so the retry closure can hand out independent
    /// futures.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, LedgerError> {
        let url = format!("{}{}", self.base_url, path);
        self.retry_rpc_operation(|| {
            let http = self.http.clone();
            let url = url.clone();
            async move { get_json_once(http, url).await }
        })
        .await
    }
}

/// One GET attempt against a JSON endpoint.
async fn get_json_once<T: serde::de::DeserializeOwned>(
    http: reqwest::Client,
    url: String,
) -> Result<T, LedgerError> {
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| LedgerError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(LedgerError::Rpc {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| LedgerError::Decode(e.to_string()))
}

/// Shape of the submit response body.
#[derive(Debug, serde::Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

/// Poll interval while waiting for a pending transaction.
const CONFIRMATION_POLL_MS: u64 = 1000;

#[async_trait]
impl LedgerRpc for HttpLedgerClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
        validate_address(address)
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;

        let path = format!("/v2/accounts/{}", address);
        self.get_json::<AccountInfo>(&path).await
    }

    async fn asset_holding(
        &self,
        address: &str,
        asset_id: u64,
    ) -> Result<AssetHolding, LedgerError> {
        validate_address(address)
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;

        let path = format!("/v2/accounts/{}/assets/{}", address, asset_id);

        #[derive(serde::Deserialize)]
        struct HoldingResponse {
            #[serde(rename = "asset-holding")]
            asset_holding: AssetHolding,
        }

        match self.get_json::<HoldingResponse>(&path).await {
            Ok(r) => Ok(r.asset_holding),
            Err(LedgerError::Rpc { status: 404, .. }) => Err(LedgerError::NotOptedIn {
                address: address.to_string(),
                asset_id,
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_block(&self, round: u64) -> Result<Block, LedgerError> {
        let path = format!("/v2/blocks/{}", round);
        self.get_json::<Block>(&path).await
    }

    async fn get_status(&self) -> Result<u64, LedgerError> {
        let status: NodeStatus = self.get_json("/v2/status").await?;
        Ok(status.last_round)
    }

    async fn get_tx_params(&self) -> Result<TxParams, LedgerError> {
        self.get_json("/v2/transactions/params").await
    }

    async fn call_app(
        &self,
        app_id: u64,
        args: Vec<Vec<u8>>,
        sender: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

        #[derive(serde::Serialize)]
        struct CallRequest {
            sender: String,
            args: Vec<String>,
        }

        #[derive(serde::Deserialize)]
        struct CallResponse {
            #[serde(rename = "return-value", default)]
            return_value: Option<String>,
        }

        let body = CallRequest {
            sender: sender.to_string(),
            args: args.iter().map(|a| BASE64.encode(a)).collect(),
        };
        let url = format!("{}/v2/applications/{}/call", self.base_url, app_id);

        let response: CallResponse = self
            .retry_rpc_operation(|| {
                let http = self.http.clone();
                let url = url.clone();
                let body = serde_json::to_value(&body)
                    .expect("call request serialization is infallible");
                async move {
                    let response = http
                        .post(&url)
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| LedgerError::Http(e.to_string()))?;

                    let status = response.status();
                    if !status.is_success() {
                        let message = response.text().await.unwrap_or_default();
                        return Err(LedgerError::Rpc {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    response
                        .json::<CallResponse>()
                        .await
                        .map_err(|e| LedgerError::Decode(e.to_string()))
                }
            })
            .await?;

        let raw = response.return_value.unwrap_or_default();
        BASE64
            .decode(&raw)
            .map_err(|e| LedgerError::Decode(format!("bad return value: {}", e)))
    }

    async fn submit_raw(&self, signed: &[u8]) -> Result<String, LedgerError> {
        // Single attempt: submission is not idempotent from this side.
        let url = format!("{}/v2/transactions", self.base_url);
        let response = timeout(
            Duration::from_secs(15),
            self.http
                .post(&url)
                .header("Content-Type", "application/x-binary")
                .body(signed.to_vec())
                .send(),
        )
        .await
        .map_err(|_| LedgerError::Timeout)?
        .map_err(|e| LedgerError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LedgerError::Rpc {
                status: status.as_u16(),
                message,
            });
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        debug!("{}: submitted transaction {}", self.network, body.tx_id);
        Ok(body.tx_id)
    }

    async fn wait_for_confirmation(
        &self,
        tx_id: &str,
        rounds: u64,
    ) -> Result<u64, LedgerError> {
        let start_round = self.get_status().await?;
        let deadline = start_round + rounds;

        let path = format!("/v2/transactions/pending/{}", tx_id);
        loop {
            let pending: PendingTransaction = self.get_json(&path).await?;

            if !pending.pool_error.is_empty() {
                return Err(LedgerError::NotConfirmed(
                    tx_id.to_string(),
                    pending.pool_error,
                ));
            }

            if pending.confirmed_round > 0 {
                debug!(
                    "{}: transaction {} confirmed in round {}",
                    self.network, tx_id, pending.confirmed_round
                );
                return Ok(pending.confirmed_round);
            }

            let current = self.get_status().await?;
            if current > deadline {
                return Err(LedgerError::NotConfirmed(
                    tx_id.to_string(),
                    format!("still pending after {} rounds", rounds),
                ));
            }

            tokio::time::sleep(Duration::from_millis(CONFIRMATION_POLL_MS)).await;
        }
    }
}
