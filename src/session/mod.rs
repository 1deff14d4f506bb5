//! # Wallet Session Context
//!
//! Everything tied to one connected wallet lives in an explicit
//! `WalletSession`: the four buckets, both wizards, the recipient
//! opt-in cache and the shared bridge status. Sessions are created on
//! connect and torn down on disconnect — there is no ambient global
//! state, and teardown cancels any monitor still running.
//!
//! The `SessionManager` is the orchestration layer the API drives: it
//! performs the I/O a wizard transition needs (balance lookups, opt-in
//! probes), applies the transition, and on submission hands off to the
//! transfer executor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::{BridgeConfirmationStatus, SharedBridgeStatus};
use crate::buckets::{Bucket, BucketId, Network};
use crate::config::AppConfig;
use crate::ledger::{validate_address, LocalKeySigner, SignerError, WalletSigner};
use crate::services::{
    BalanceRefresher, ChainSet, OptInStatus, TransferError, TransferExecutor, TransferOutcome,
};
use crate::wizard::{ExternalWizard, InternalWizard, WizardError};

/// Seconds the external wizard stays visible after a bridge
/// confirmation before auto-resetting.
const AUTO_RESET_DELAY: Duration = Duration::from_secs(3);

/// Errors surfaced by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Unknown session id.
    #[error("session not found")]
    NotFound,

    /// Connect input failed validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Neither an address nor a keypair was supplied.
    #[error("connect requires an address or a keypair path")]
    MissingAddress,

    /// A wizard transition was rejected.
    #[error(transparent)]
    Wizard(#[from] WizardError),

    /// Execution failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Keypair loading failed.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// Read-only session tried to submit.
    #[error("session has no signer; connect with a keypair to submit")]
    NoSigner,

    /// Retry requested with no bridge status to retry.
    #[error("no bridge transfer to retry")]
    NoBridgeStatus,
}

/// State of one connected wallet.
pub struct WalletSession {
    /// Session id.
    pub id: Uuid,

    /// Connected wallet address.
    pub address: String,

    /// Signer, present when the session can submit.
    pub signer: Option<Arc<dyn WalletSigner>>,

    /// The network the UI currently operates on.
    pub active_network: Network,

    /// Buckets as of the last refresh.
    pub buckets: [Bucket; 4],

    /// Internal transfer wizard.
    pub internal: InternalWizard,

    /// External transfer wizard.
    pub external: ExternalWizard,

    /// Opt-in probe results for `probed_recipient`.
    pub recipient_opt_in: HashMap<BucketId, OptInStatus>,

    /// The recipient the opt-in cache belongs to.
    pub probed_recipient: Option<String>,

    /// Shared bridge status the monitor reports into.
    pub bridge: Arc<SharedBridgeStatus>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl WalletSession {
    fn bucket(&self, id: BucketId) -> Bucket {
        // Exactly four buckets exist; the registry is total.
        *self
            .buckets
            .iter()
            .find(|b| b.id == id)
            .expect("bucket registry covers all ids")
    }

    /// Serializable snapshot for the API.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            address: self.address.clone(),
            has_signer: self.signer.is_some(),
            active_network: self.active_network,
            buckets: self.buckets.to_vec(),
            internal: self.internal.view(),
            external: self.external.view(),
            bridge: self.bridge.snapshot(),
            created_at: self.created_at,
        }
    }
}

/// Snapshot of a session for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub address: String,
    pub has_signer: bool,
    pub active_network: Network,
    pub buckets: Vec<Bucket>,
    pub internal: crate::wizard::InternalWizardView,
    pub external: crate::wizard::ExternalWizardView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeConfirmationStatus>,
    pub created_at: DateTime<Utc>,
}

/// Owns all live sessions and drives their wizards.
pub struct SessionManager {
    refresher: BalanceRefresher,
    executor: TransferExecutor,
    sessions: RwLock<HashMap<Uuid, Arc<RwLock<WalletSession>>>>,
}

impl SessionManager {
    /// Create a new SessionManager.
    pub fn new(config: AppConfig, chains: ChainSet) -> Self {
        Self {
            refresher: BalanceRefresher::new(config.clone(), chains.clone()),
            executor: TransferExecutor::new(config, chains),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    // ==========================================
    // SESSION LIFECYCLE
    // ==========================================

    /// Connect a wallet: validates the address, optionally loads a
    /// signer, runs the initial balance refresh and registers the
    /// session.
    pub async fn connect(
        &self,
        address: Option<&str>,
        keypair_path: Option<&str>,
    ) -> Result<SessionSnapshot, SessionError> {
        let signer: Option<Arc<dyn WalletSigner>> = match keypair_path {
            Some(path) => Some(Arc::new(LocalKeySigner::from_file(path)?)),
            None => None,
        };

        let address = match (address, &signer) {
            (Some(address), Some(signer)) => {
                if address != signer.address() {
                    return Err(SessionError::InvalidAddress(
                        "keypair does not control the given address".to_string(),
                    ));
                }
                address.to_string()
            }
            (Some(address), None) => address.to_string(),
            (None, Some(signer)) => signer.address().to_string(),
            (None, None) => return Err(SessionError::MissingAddress),
        };

        validate_address(&address).map_err(|e| SessionError::InvalidAddress(e.to_string()))?;

        let buckets = self.refresher.refresh_all(&address).await;

        let session = WalletSession {
            id: Uuid::new_v4(),
            address: address.clone(),
            signer,
            active_network: Network::Algorand,
            buckets,
            internal: InternalWizard::default(),
            external: ExternalWizard::default(),
            recipient_opt_in: HashMap::new(),
            probed_recipient: None,
            bridge: Arc::new(SharedBridgeStatus::new()),
            created_at: Utc::now(),
        };

        let snapshot = session.snapshot();
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::new(RwLock::new(session)));

        info!("Session {} connected for {}", snapshot.id, address);
        Ok(snapshot)
    }

    /// Tear a session down; cancels any monitor still running.
    pub async fn disconnect(&self, id: Uuid) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound)?;

        session.read().await.bridge.dismiss();
        info!("Session {} disconnected", id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Arc<RwLock<WalletSession>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    /// Current snapshot of a session.
    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        Ok(self.get(id).await?.read().await.snapshot())
    }

    /// Re-run the balance refresher.
    pub async fn refresh(&self, id: Uuid) -> Result<Vec<Bucket>, SessionError> {
        let session = self.get(id).await?;
        let address = session.read().await.address.clone();
        let buckets = self.refresher.refresh_all(&address).await;
        session.write().await.buckets = buckets;
        Ok(buckets.to_vec())
    }

    /// Switch the active network.
    pub async fn set_network(&self, id: Uuid, network: Network) -> Result<(), SessionError> {
        let session = self.get(id).await?;
        session.write().await.active_network = network;
        info!("Session {} switched active network to {}", id, network);
        Ok(())
    }

    // ==========================================
    // BRIDGE STATUS
    // ==========================================

    /// Current bridge status, if any.
    pub async fn bridge_status(
        &self,
        id: Uuid,
    ) -> Result<Option<BridgeConfirmationStatus>, SessionError> {
        Ok(self.get(id).await?.read().await.bridge.snapshot())
    }

    /// Dismiss the bridge status (cancels a live monitor).
    pub async fn bridge_dismiss(&self, id: Uuid) -> Result<(), SessionError> {
        self.get(id).await?.read().await.bridge.dismiss();
        Ok(())
    }

    /// Manually re-run the monitor for the tracked source leg.
    ///
    /// `network` optionally overrides the destination — a heuristic for
    /// the case where the original guess was ambiguous; the resulting
    /// status is marked as such.
    pub async fn bridge_retry(
        &self,
        id: Uuid,
        network: Option<Network>,
    ) -> Result<BridgeConfirmationStatus, SessionError> {
        let session = self.get(id).await?;
        let (bridge, status) = {
            let s = session.read().await;
            let status = s.bridge.snapshot().ok_or(SessionError::NoBridgeStatus)?;
            (s.bridge.clone(), status)
        };

        let destination = network.unwrap_or(status.destination);
        let heuristic = destination != status.destination;
        if heuristic {
            warn!(
                "Session {}: retrying bridge monitor against {} on a guess",
                id, destination
            );
        }

        self.executor.start_monitor(
            &bridge,
            status.source_tx_id.clone(),
            destination,
            heuristic,
        );

        Ok(bridge.snapshot().expect("status installed by start_monitor"))
    }

    // ==========================================
    // INTERNAL TRANSFER WIZARD
    // ==========================================

    /// Internal wizard: choose the source bucket.
    pub async fn internal_select_from(
        &self,
        id: Uuid,
        bucket_id: BucketId,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        let bucket = s.bucket(bucket_id);
        let active = s.active_network;
        s.internal.select_from(&bucket, active)?;
        Ok(s.snapshot())
    }

    /// Internal wizard: choose the destination bucket.
    pub async fn internal_select_to(
        &self,
        id: Uuid,
        bucket_id: BucketId,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        s.internal.select_to(bucket_id)?;
        Ok(s.snapshot())
    }

    /// Internal wizard: enter the amount.
    pub async fn internal_amount(
        &self,
        id: Uuid,
        amount: u64,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        let available = match &s.internal {
            InternalWizard::EnterAmount { from, .. } => s.bucket(*from).balance,
            _ => 0,
        };
        s.internal.enter_amount(amount, available)?;
        Ok(s.snapshot())
    }

    /// Internal wizard: submit. On success every field resets and the
    /// balance refresher runs; cross-network legs have their monitor
    /// running by the time this returns.
    pub async fn internal_submit(&self, id: Uuid) -> Result<TransferOutcome, SessionError> {
        let session = self.get(id).await?;

        let (signer, from, to, amount, bridge, address) = {
            let s = session.read().await;
            let signer = s.signer.clone().ok_or(SessionError::NoSigner)?;
            let (from, to, amount) = s.internal.submission()?;
            (signer, from, to, amount, s.bridge.clone(), s.address.clone())
        };

        let outcome = self
            .executor
            .execute(&signer, from, to, amount, None, &bridge)
            .await?;

        let buckets = self.refresher.refresh_all(&address).await;
        {
            let mut s = session.write().await;
            s.buckets = buckets;
            s.internal.reset();
        }

        Ok(outcome)
    }

    /// Internal wizard: reset.
    pub async fn internal_reset(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        s.internal.reset();
        Ok(s.snapshot())
    }

    // ==========================================
    // EXTERNAL TRANSFER WIZARD
    // ==========================================

    /// External wizard: choose the source bucket.
    pub async fn external_select_token(
        &self,
        id: Uuid,
        bucket_id: BucketId,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        let bucket = s.bucket(bucket_id);
        s.external.select_token(&bucket)?;
        Ok(s.snapshot())
    }

    /// External wizard: enter the amount.
    pub async fn external_amount(
        &self,
        id: Uuid,
        amount: u64,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        let available = match &s.external {
            ExternalWizard::EnterAmount { token } => s.bucket(*token).balance,
            _ => 0,
        };
        s.external.enter_amount(amount, available)?;
        Ok(s.snapshot())
    }

    /// External wizard: set the recipient. Syntax is validated before
    /// anything touches the network; only then are all four buckets
    /// probed (concurrently) for the recipient's opt-in state.
    pub async fn external_recipient(
        &self,
        id: Uuid,
        address: &str,
    ) -> Result<Vec<(BucketId, OptInStatus)>, SessionError> {
        let session = self.get(id).await?;

        {
            let mut s = session.write().await;
            s.external.set_recipient(address)?;
        }

        let statuses = self.refresher.probe_recipient(address).await;

        {
            let mut s = session.write().await;
            s.recipient_opt_in = statuses.iter().cloned().collect();
            s.probed_recipient = Some(address.to_string());
        }

        Ok(statuses)
    }

    /// External wizard: choose the recipient's destination bucket,
    /// gated on policy and the probed opt-in state.
    pub async fn external_destination(
        &self,
        id: Uuid,
        bucket_id: BucketId,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;

        let opt_in = s
            .recipient_opt_in
            .get(&bucket_id)
            .cloned()
            .unwrap_or(OptInStatus {
                opted_in: false,
                balance: None,
                error: Some("opt-in not probed".to_string()),
            });

        s.external.select_destination(bucket_id, &opt_in)?;
        Ok(s.snapshot())
    }

    /// External wizard: submit from `confirm`.
    ///
    /// Same-network sends reset immediately. Cross-network sends hold
    /// the wizard in `awaiting-bridge` and auto-reset a few seconds
    /// after the monitor observes the confirmation.
    pub async fn external_submit(&self, id: Uuid) -> Result<TransferOutcome, SessionError> {
        let session = self.get(id).await?;

        let (signer, token, destination, recipient, amount, bridge, address) = {
            let s = session.read().await;
            let signer = s.signer.clone().ok_or(SessionError::NoSigner)?;
            let (token, destination, recipient, amount) = s.external.submission()?;
            (
                signer,
                token,
                destination,
                recipient,
                amount,
                s.bridge.clone(),
                s.address.clone(),
            )
        };

        let outcome = self
            .executor
            .execute(&signer, token, destination, amount, Some(&recipient), &bridge)
            .await?;

        let buckets = self.refresher.refresh_all(&address).await;
        {
            let mut s = session.write().await;
            s.buckets = buckets;
            match &outcome.bridge {
                Some(leg) => {
                    s.external.begin_awaiting(&leg.source_tx_id)?;
                    spawn_auto_reset(session.clone(), bridge.clone());
                }
                None => s.external.reset(),
            }
        }

        Ok(outcome)
    }

    /// External wizard: reset.
    pub async fn external_reset(&self, id: Uuid) -> Result<SessionSnapshot, SessionError> {
        let session = self.get(id).await?;
        let mut s = session.write().await;
        s.external.reset();
        Ok(s.snapshot())
    }
}

/// Watch the bridge status and reset the external wizard a few seconds
/// after the confirmation is observed. Stops quietly if the status is
/// dismissed or the run ends unconfirmed (the wizard then stays visible
/// for a manual retry).
fn spawn_auto_reset(session: Arc<RwLock<WalletSession>>, bridge: Arc<SharedBridgeStatus>) {
    let mut rx = bridge.subscribe();
    tokio::spawn(async move {
        loop {
            // Inspect the current value first: the monitor may already
            // have finished before this task subscribed.
            match rx.borrow_and_update().clone() {
                None => return, // dismissed
                Some(status) if status.confirmed => break,
                // Exhausted without confirmation; leave the wizard
                // visible for a manual retry.
                Some(status) if !status.monitoring => return,
                Some(_) => {}
            }
            if rx.changed().await.is_err() {
                return;
            }
        }

        tokio::time::sleep(AUTO_RESET_DELAY).await;

        let mut s = session.write().await;
        if s.external.is_awaiting_bridge() {
            s.external.reset();
            info!("Session {}: external wizard auto-reset after confirmation", s.id);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;
    use crate::services::testing::mock_chain_set;
    use crate::services::ChainHandle;

    const SEED: [u8; 32] = [7u8; 32];

    struct Harness {
        manager: SessionManager,
        algorand: Arc<MockLedger>,
        voi: Arc<MockLedger>,
        address: String,
        keypair_file: tempfile_path::KeypairFile,
    }

    /// Minimal keypair-file helper so connect() can load a signer.
    mod tempfile_path {
        use std::io::Write;

        pub struct KeypairFile {
            pub path: std::path::PathBuf,
        }

        impl KeypairFile {
            pub fn new(seed: [u8; 32]) -> Self {
                use std::sync::atomic::{AtomicU64, Ordering};
                static COUNTER: AtomicU64 = AtomicU64::new(0);

                let path = std::env::temp_dir().join(format!(
                    "bridge-backend-test-keypair-{}-{}.json",
                    std::process::id(),
                    COUNTER.fetch_add(1, Ordering::SeqCst)
                ));
                let bytes: Vec<u8> = seed.to_vec();
                let mut file = std::fs::File::create(&path).expect("create keypair file");
                write!(file, "{}", serde_json::to_string(&bytes).unwrap()).unwrap();
                Self { path }
            }
        }

        impl Drop for KeypairFile {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    async fn harness() -> Harness {
        let (chains, algorand, voi) = mock_chain_set();
        let config = AppConfig::for_tests();
        let signer = LocalKeySigner::from_seed(SEED);
        let address = signer.address().to_string();

        // Give the holder balances everywhere.
        algorand.set_holding(&address, config.algorand_asset_id, 1_000_000);
        algorand.set_app_balance(&address, 2_000_000);
        voi.set_holding(&address, config.voi_asset_id, 3_000_000);
        voi.set_app_balance(&address, 4_000_000);

        Harness {
            manager: SessionManager::new(config, chains),
            algorand,
            voi,
            address,
            keypair_file: tempfile_path::KeypairFile::new(SEED),
        }
    }

    async fn connected(h: &Harness) -> Uuid {
        h.manager
            .connect(
                Some(&h.address),
                Some(h.keypair_file.path.to_str().unwrap()),
            )
            .await
            .expect("connect")
            .id
    }

    #[tokio::test]
    async fn connect_refreshes_buckets_and_registers_session() {
        let h = harness().await;
        let snapshot = h
            .manager
            .connect(Some(&h.address), None)
            .await
            .expect("connect read-only");

        assert!(!snapshot.has_signer);
        let balances: Vec<u64> = snapshot.buckets.iter().map(|b| b.balance).collect();
        assert_eq!(balances, vec![1_000_000, 2_000_000, 3_000_000, 4_000_000]);
    }

    #[tokio::test]
    async fn connect_rejects_invalid_address_without_network_calls() {
        let h = harness().await;
        let before = h.algorand.total_calls() + h.voi.total_calls();

        let err = h.manager.connect(Some("not-an-address"), None).await;
        assert!(matches!(err, Err(SessionError::InvalidAddress(_))));
        assert_eq!(h.algorand.total_calls() + h.voi.total_calls(), before);
    }

    #[tokio::test]
    async fn internal_wizard_full_flow_submits_and_resets() {
        let h = harness().await;
        let id = connected(&h).await;

        h.manager
            .internal_select_from(id, BucketId::AlgorandNative)
            .await
            .expect("select from");
        h.manager
            .internal_select_to(id, BucketId::AlgorandContract)
            .await
            .expect("select to");
        h.manager
            .internal_amount(id, 500)
            .await
            .expect("amount");

        let outcome = h.manager.internal_submit(id).await.expect("submit");
        assert_eq!(outcome.tx_ids.len(), 1);
        assert!(outcome.bridge.is_none());

        let snapshot = h.manager.snapshot(id).await.unwrap();
        assert_eq!(snapshot.internal.step, "select-from");
    }

    #[tokio::test]
    async fn internal_same_bucket_rejected_before_any_network_call() {
        let h = harness().await;
        let id = connected(&h).await;

        h.manager
            .internal_select_from(id, BucketId::AlgorandNative)
            .await
            .unwrap();

        let calls_before = h.algorand.total_calls() + h.voi.total_calls();
        let err = h
            .manager
            .internal_select_to(id, BucketId::AlgorandNative)
            .await;

        assert!(matches!(
            err,
            Err(SessionError::Wizard(WizardError::NotAllowed { .. }))
        ));
        assert_eq!(h.algorand.total_calls() + h.voi.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn internal_cross_network_bucket_requires_network_switch() {
        let h = harness().await;
        let id = connected(&h).await;

        let err = h.manager.internal_select_from(id, BucketId::VoiNative).await;
        assert!(matches!(
            err,
            Err(SessionError::Wizard(WizardError::NetworkSwitchRequired { .. }))
        ));

        h.manager.set_network(id, Network::Voi).await.unwrap();
        h.manager
            .internal_select_from(id, BucketId::VoiNative)
            .await
            .expect("after switch");
    }

    #[tokio::test]
    async fn internal_bridge_submit_populates_status() {
        let h = harness().await;
        let id = connected(&h).await;

        h.manager
            .internal_select_from(id, BucketId::AlgorandNative)
            .await
            .unwrap();
        h.manager
            .internal_select_to(id, BucketId::VoiNative)
            .await
            .unwrap();
        h.manager.internal_amount(id, 1000).await.unwrap();

        let outcome = h.manager.internal_submit(id).await.expect("submit");
        let leg = outcome.bridge.expect("bridge leg");
        assert_eq!(leg.destination, Network::Voi);

        let status = h.manager.bridge_status(id).await.unwrap().expect("status");
        assert_eq!(status.source_tx_id, leg.source_tx_id);
    }

    #[tokio::test]
    async fn external_flow_gates_on_recipient_opt_in() {
        let h = harness().await;
        let id = connected(&h).await;

        let recipient_signer = LocalKeySigner::from_seed([9u8; 32]);
        let recipient = recipient_signer.address().to_string();
        // Recipient opted into voi-native only.
        h.voi
            .set_holding(&recipient, AppConfig::for_tests().voi_asset_id, 0);

        h.manager
            .external_select_token(id, BucketId::AlgorandNative)
            .await
            .unwrap();
        h.manager.external_amount(id, 1000).await.unwrap();

        let statuses = h
            .manager
            .external_recipient(id, &recipient)
            .await
            .expect("probe");
        let voi_native = statuses
            .iter()
            .find(|(b, _)| *b == BucketId::VoiNative)
            .unwrap();
        assert!(voi_native.1.opted_in);

        // algorand-contract is policy-allowed but the recipient is not
        // opted in (no contract balance) -> rejected.
        let err = h
            .manager
            .external_destination(id, BucketId::AlgorandContract)
            .await;
        assert!(matches!(
            err,
            Err(SessionError::Wizard(WizardError::NotOptedIn(_)))
        ));

        // voi-native works and submission holds in awaiting-bridge.
        h.manager
            .external_destination(id, BucketId::VoiNative)
            .await
            .expect("destination");
        let outcome = h.manager.external_submit(id).await.expect("submit");
        assert!(outcome.bridge.is_some());

        let snapshot = h.manager.snapshot(id).await.unwrap();
        assert_eq!(snapshot.external.step, "awaiting-bridge");
    }

    #[tokio::test]
    async fn external_invalid_recipient_blocks_without_probing() {
        let h = harness().await;
        let id = connected(&h).await;

        h.manager
            .external_select_token(id, BucketId::AlgorandNative)
            .await
            .unwrap();
        h.manager.external_amount(id, 10).await.unwrap();

        let calls_before = h.algorand.total_calls() + h.voi.total_calls();
        let err = h.manager.external_recipient(id, "bad!addr").await;

        assert!(matches!(
            err,
            Err(SessionError::Wizard(WizardError::InvalidAddress(_)))
        ));
        assert_eq!(h.algorand.total_calls() + h.voi.total_calls(), calls_before);
    }

    #[tokio::test]
    async fn bridge_retry_against_other_network_is_marked_heuristic() {
        let h = harness().await;
        let id = connected(&h).await;

        // Produce a bridge status first.
        h.manager
            .internal_select_from(id, BucketId::AlgorandNative)
            .await
            .unwrap();
        h.manager
            .internal_select_to(id, BucketId::VoiNative)
            .await
            .unwrap();
        h.manager.internal_amount(id, 1000).await.unwrap();
        h.manager.internal_submit(id).await.unwrap();

        let status = h
            .manager
            .bridge_retry(id, Some(Network::Algorand))
            .await
            .expect("retry");
        assert!(status.heuristic);
        assert_eq!(status.destination, Network::Algorand);
    }

    #[tokio::test]
    async fn disconnect_removes_session() {
        let h = harness().await;
        let id = connected(&h).await;

        h.manager.disconnect(id).await.expect("disconnect");
        assert!(matches!(
            h.manager.snapshot(id).await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn submit_without_signer_is_rejected() {
        let h = harness().await;
        let snapshot = h
            .manager
            .connect(Some(&h.address), None)
            .await
            .expect("read-only connect");
        let id = snapshot.id;

        h.manager
            .internal_select_from(id, BucketId::AlgorandNative)
            .await
            .unwrap();
        h.manager
            .internal_select_to(id, BucketId::AlgorandContract)
            .await
            .unwrap();
        h.manager.internal_amount(id, 1).await.unwrap();

        assert!(matches!(
            h.manager.internal_submit(id).await,
            Err(SessionError::NoSigner)
        ));
    }

    #[tokio::test]
    async fn chain_handle_exposes_contract_for_network() {
        let rpc: Arc<MockLedger> = Arc::new(MockLedger::new(Network::Voi));
        let handle = ChainHandle::new(rpc, 47);
        assert_eq!(handle.contract.network(), Network::Voi);
        assert_eq!(handle.contract.app_id(), 47);
    }
}
