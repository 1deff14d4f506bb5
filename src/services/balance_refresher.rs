//! # Balance Refresher Service
//!
//! Rebuilds the four buckets from live queries and probes recipient
//! opt-in. Both are fan-out/fan-in with per-item failure isolation:
//!
//! ```text
//! refresh_all(address)
//!        │
//!        ├── algorand-native    asset_holding(address, asset_id)
//!        ├── algorand-contract  balance_of(address)
//!        ├── voi-native         asset_holding(address, asset_id)
//!        └── voi-contract       balance_of(address)
//!              (issued concurrently, joined)
//! ```
//!
//! A failed fetch becomes balance 0 with a logged warning — one flaky
//! endpoint never fails the whole refresh. Runs at session start and
//! after every successful transfer.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::buckets::{Bucket, BucketId, Representation};
use crate::config::AppConfig;
use crate::ledger::LedgerError;

use super::ChainSet;

/// Opt-in state of one (recipient × bucket), resolved independently.
///
/// Success of a read-only balance query — zero balance included — is
/// what "opted in" means; any failure defaults to not opted in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptInStatus {
    /// Whether the recipient can receive into this bucket.
    pub opted_in: bool,

    /// Balance observed by the probe, when it succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<u64>,

    /// Why the probe failed, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The Balance Refresher service.
#[derive(Clone)]
pub struct BalanceRefresher {
    /// Application configuration.
    config: AppConfig,

    /// Per-network handles.
    chains: ChainSet,
}

impl BalanceRefresher {
    /// Create a new BalanceRefresher.
    pub fn new(config: AppConfig, chains: ChainSet) -> Self {
        Self { config, chains }
    }

    /// Rebuild all four buckets for `address`. Never fails: individual
    /// fetch failures are logged and yield balance 0.
    pub async fn refresh_all(&self, address: &str) -> [Bucket; 4] {
        debug!("Refreshing buckets for {}", address);

        let fetches = BucketId::ALL.map(|id| self.fetch_balance(id, address));
        let balances = join_all(fetches).await;

        let mut buckets = [Bucket::new(BucketId::AlgorandNative, 0); 4];
        for (slot, (id, balance)) in buckets.iter_mut().zip(BucketId::ALL.into_iter().zip(balances))
        {
            *slot = Bucket::new(id, balance);
        }

        info!(
            "Buckets refreshed for {}: {}",
            address,
            buckets
                .iter()
                .map(|b| format!("{}={}", b.id, b.balance))
                .collect::<Vec<_>>()
                .join(", ")
        );
        buckets
    }

    /// Fetch one bucket's balance, defaulting to 0 on any failure.
    async fn fetch_balance(&self, id: BucketId, address: &str) -> u64 {
        match self.query_balance(id, address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!("Balance fetch failed for {} ({}): {}", id, address, e);
                0
            }
        }
    }

    async fn query_balance(&self, id: BucketId, address: &str) -> Result<u64, String> {
        let network = id.network();
        match id.representation() {
            Representation::Native => {
                let asset_id = self.config.asset_id(network);
                match self.chains.rpc(network).asset_holding(address, asset_id).await {
                    Ok(holding) => Ok(holding.amount),
                    // Not opted in is an ordinary zero balance for the
                    // holder's own view, not a failure.
                    Err(LedgerError::NotOptedIn { .. }) => Ok(0),
                    Err(e) => Err(e.to_string()),
                }
            }
            Representation::ContractManaged => {
                let result = self
                    .chains
                    .contract(network)
                    .balance_of(address)
                    .await
                    .map_err(|e| e.to_string())?;
                if result.success {
                    Ok(result.value.unwrap_or(0))
                } else {
                    // The contract does not know the account yet.
                    Ok(0)
                }
            }
        }
    }

    /// Probe all four buckets for a recipient's opt-in state,
    /// concurrently and independently. Partial failures are tolerated
    /// per bucket (failure ⇒ not opted in).
    pub async fn probe_recipient(&self, address: &str) -> Vec<(BucketId, OptInStatus)> {
        debug!("Probing recipient opt-in for {}", address);

        let probes = BucketId::ALL.map(|id| async move {
            let status = self.probe_bucket(id, address).await;
            (id, status)
        });

        let statuses = join_all(probes).await;
        let opted: Vec<&BucketId> = statuses
            .iter()
            .filter(|(_, s)| s.opted_in)
            .map(|(id, _)| id)
            .collect();
        debug!("Recipient {} opted into {:?}", address, opted);

        statuses
    }

    async fn probe_bucket(&self, id: BucketId, address: &str) -> OptInStatus {
        let network = id.network();
        let outcome: Result<u64, String> = match id.representation() {
            Representation::Native => {
                let asset_id = self.config.asset_id(network);
                self.chains
                    .rpc(network)
                    .asset_holding(address, asset_id)
                    .await
                    .map(|h| h.amount)
                    .map_err(|e| e.to_string())
            }
            Representation::ContractManaged => {
                match self.chains.contract(network).balance_of(address).await {
                    Ok(result) if result.success => Ok(result.value.unwrap_or(0)),
                    Ok(result) => Err(result
                        .error
                        .unwrap_or_else(|| "contract call failed".to_string())),
                    Err(e) => Err(e.to_string()),
                }
            }
        };

        match outcome {
            Ok(balance) => OptInStatus {
                opted_in: true,
                balance: Some(balance),
                error: None,
            },
            Err(error) => OptInStatus {
                opted_in: false,
                balance: None,
                error: Some(error),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::mock_chain_set;

    const ADDR: &str = "HOLDER";
    const RECIPIENT: &str = "RECIPIENT";

    #[tokio::test]
    async fn refresh_builds_all_four_buckets() {
        let (chains, algorand, voi) = mock_chain_set();
        let config = AppConfig::for_tests();
        algorand.set_holding(ADDR, config.algorand_asset_id, 111);
        algorand.set_app_balance(ADDR, 222);
        voi.set_holding(ADDR, config.voi_asset_id, 333);
        voi.set_app_balance(ADDR, 444);

        let refresher = BalanceRefresher::new(config, chains);
        let buckets = refresher.refresh_all(ADDR).await;

        let balances: Vec<u64> = buckets.iter().map(|b| b.balance).collect();
        assert_eq!(balances, vec![111, 222, 333, 444]);
    }

    #[tokio::test]
    async fn failed_fetch_defaults_to_zero_not_error() {
        let (chains, algorand, voi) = mock_chain_set();
        let config = AppConfig::for_tests();
        algorand.set_holding(ADDR, config.algorand_asset_id, 111);
        // Voi side fails entirely; Algorand contract unknown (→ 0).
        voi.fail_holdings(true);
        voi.fail_app_calls(true);

        let refresher = BalanceRefresher::new(config, chains);
        let buckets = refresher.refresh_all(ADDR).await;

        assert_eq!(buckets[0].balance, 111);
        assert_eq!(buckets[1].balance, 0);
        assert_eq!(buckets[2].balance, 0);
        assert_eq!(buckets[3].balance, 0);
    }

    #[tokio::test]
    async fn probe_marks_zero_balance_as_opted_in() {
        let (chains, algorand, _voi) = mock_chain_set();
        let config = AppConfig::for_tests();
        algorand.set_holding(RECIPIENT, config.algorand_asset_id, 0);

        let refresher = BalanceRefresher::new(config, chains);
        let statuses = refresher.probe_recipient(RECIPIENT).await;

        let native = statuses
            .iter()
            .find(|(id, _)| *id == BucketId::AlgorandNative)
            .map(|(_, s)| s)
            .unwrap();
        assert!(native.opted_in);
        assert_eq!(native.balance, Some(0));
    }

    #[tokio::test]
    async fn probe_tolerates_partial_failure() {
        let (chains, algorand, voi) = mock_chain_set();
        let config = AppConfig::for_tests();
        algorand.set_holding(RECIPIENT, config.algorand_asset_id, 5);
        voi.fail_holdings(true);

        let refresher = BalanceRefresher::new(config, chains);
        let statuses = refresher.probe_recipient(RECIPIENT).await;

        let by_id = |id: BucketId| {
            statuses
                .iter()
                .find(|(i, _)| *i == id)
                .map(|(_, s)| s)
                .unwrap()
        };

        assert!(by_id(BucketId::AlgorandNative).opted_in);
        assert!(!by_id(BucketId::VoiNative).opted_in);
        assert!(by_id(BucketId::VoiNative).error.is_some());
        // Contract buckets: account unknown to the mock contract.
        assert!(!by_id(BucketId::AlgorandContract).opted_in);
    }
}
