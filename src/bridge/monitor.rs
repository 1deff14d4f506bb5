//! # Bridge Confirmation Monitor
//!
//! After a cross-network leg is submitted, the only signal that the
//! relay settled the destination side is a confirmation note in some
//! destination-ledger block. This monitor polls the destination ledger,
//! scanning new blocks for a confirmation note whose `sourceTxId`
//! matches the awaited transaction.
//!
//! ## Scanning Flow
//!
//! ```text
//! every interval (up to max_attempts iterations):
//! 1. read current block height
//!              ↓
//! 2. window = [last_checked+1, current]
//!    (first iteration: [current-100, current])
//!              ↓
//! 3. fetch each block, decode each transaction note
//!              ↓
//! 4. marker match + sourceTxId match → confirmed, stop immediately
//!              ↓
//! 5. no match → last_checked = current, sleep, retry
//! ```
//!
//! The monitor runs as a spawned task with its own cancellation channel,
//! so it can be stopped deterministically instead of running to
//! exhaustion. It terminates on confirmation, cancellation or attempt
//! exhaustion — nothing retries automatically past that bound.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::buckets::Network;
use crate::ledger::LedgerRpc;

use super::note;

/// Tuning for one monitor run.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum polling iterations before giving up.
    pub max_attempts: u32,

    /// Sleep between iterations.
    pub interval: Duration,

    /// How far behind the current height the first window reaches.
    pub initial_lookback: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            interval: Duration::from_millis(5000),
            initial_lookback: 100,
        }
    }
}

/// Shared status of the active (or last) bridge leg, observed by the
/// wizards and the API.
///
/// Transitions `monitoring → confirmed | error` exactly once per monitor
/// run; cleared only by explicit dismiss.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfirmationStatus {
    /// A monitor run is still in flight.
    pub monitoring: bool,

    /// The destination leg was confirmed.
    pub confirmed: bool,

    /// Source-ledger transaction id being awaited.
    pub source_tx_id: String,

    /// Destination network being scanned.
    pub destination: Network,

    /// Destination-ledger transaction id that confirmed the leg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_tx_id: Option<String>,

    /// Diagnostic error after exhaustion or failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set when the destination network was chosen by the manual-retry
    /// heuristic rather than by the original transfer.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub heuristic: bool,
}

impl BridgeConfirmationStatus {
    /// Fresh status for a just-submitted source leg.
    pub fn monitoring(source_tx_id: &str, destination: Network, heuristic: bool) -> Self {
        Self {
            monitoring: true,
            confirmed: false,
            source_tx_id: source_tx_id.to_string(),
            destination,
            confirmation_tx_id: None,
            error: None,
            heuristic,
        }
    }

    /// Apply a finished monitor run. Only the first application per run
    /// changes the status; the monitor calls this exactly once.
    pub fn apply(&mut self, result: &MonitorResult) {
        self.monitoring = false;
        self.confirmed = result.confirmed;
        self.confirmation_tx_id = result.confirmation_tx_id.clone();
        self.error = result.error.clone();
    }
}

/// Shared, observable bridge status for one wallet session.
///
/// The monitor task owns the only writer path (`finish`); wizards and
/// the API read snapshots or subscribe for changes. Starting a new run
/// cancels any previous monitor through its watch channel, so at most
/// one monitor is live per status.
pub struct SharedBridgeStatus {
    status: watch::Sender<Option<BridgeConfirmationStatus>>,
    cancel: std::sync::Mutex<Option<watch::Sender<bool>>>,
}

impl SharedBridgeStatus {
    /// Empty status: nothing monitored, nothing to show.
    pub fn new() -> Self {
        let (status, _) = watch::channel(None);
        Self {
            status,
            cancel: std::sync::Mutex::new(None),
        }
    }

    /// Current status, if any bridge leg is (or was) tracked.
    pub fn snapshot(&self) -> Option<BridgeConfirmationStatus> {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes (used for the post-confirmation
    /// auto-reset of the external wizard).
    pub fn subscribe(&self) -> watch::Receiver<Option<BridgeConfirmationStatus>> {
        self.status.subscribe()
    }

    /// Install a fresh `monitoring` status for a just-submitted source
    /// leg and hand back the cancellation receiver for its monitor.
    ///
    /// There is deliberately no guard against replacing a live status —
    /// the previous monitor is cancelled and a warning logged instead.
    pub fn begin(
        &self,
        source_tx_id: &str,
        destination: Network,
        heuristic: bool,
    ) -> watch::Receiver<bool> {
        let previous_live = self
            .snapshot()
            .map(|s| s.monitoring)
            .unwrap_or(false);
        if previous_live {
            warn!(
                "replacing a live bridge status; previous monitor for this \
                 session is being cancelled"
            );
        }

        self.cancel_active();

        let (cancel_tx, cancel_rx) = watch::channel(false);
        *self.cancel.lock().unwrap() = Some(cancel_tx);

        self.status.send_replace(Some(BridgeConfirmationStatus::monitoring(
            source_tx_id,
            destination,
            heuristic,
        )));

        cancel_rx
    }

    /// Record a finished monitor run. The `monitoring → confirmed |
    /// error` transition happens here, once per run.
    pub fn finish(&self, result: &MonitorResult) {
        self.status.send_modify(|status| {
            if let Some(status) = status {
                status.apply(result);
            }
        });
        *self.cancel.lock().unwrap() = None;
    }

    /// Explicit dismiss: cancel any live monitor and clear the status.
    pub fn dismiss(&self) {
        self.cancel_active();
        self.status.send_replace(None);
    }

    fn cancel_active(&self) {
        if let Some(cancel) = self.cancel.lock().unwrap().take() {
            let _ = cancel.send(true);
        }
    }
}

impl Default for SharedBridgeStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of one monitor run, with operator diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResult {
    /// Whether the destination leg was confirmed.
    pub confirmed: bool,

    /// Destination transaction id carrying the confirmation note.
    pub confirmation_tx_id: Option<String>,

    /// Polling iterations actually performed.
    pub attempts: u32,

    /// Blocks fetched and scanned across all iterations.
    pub blocks_scanned: u64,

    /// Bridge-tagged transactions seen whose `sourceTxId` did not match
    /// the awaited one. Useful when debugging a wrong-network guess.
    pub near_misses: u64,

    /// The run was stopped through its cancellation channel. A
    /// cancelled run must not touch the shared status: whoever
    /// cancelled it owns the status now.
    #[serde(skip)]
    pub cancelled: bool,

    /// Diagnostic message when not confirmed.
    pub error: Option<String>,
}

/// Polling scanner for relay confirmations on one destination ledger.
pub struct BridgeMonitor {
    /// Destination-ledger RPC.
    rpc: Arc<dyn LedgerRpc>,

    /// Run tuning.
    config: MonitorConfig,
}

impl BridgeMonitor {
    /// Create a monitor for the given destination ledger.
    pub fn new(rpc: Arc<dyn LedgerRpc>, config: MonitorConfig) -> Self {
        Self { rpc, config }
    }

    /// Network this monitor scans.
    pub fn network(&self) -> Network {
        self.rpc.network()
    }

    /// Run the scanning loop until confirmation, cancellation or
    /// attempt exhaustion.
    ///
    /// ## Arguments
    ///
    /// * `source_tx_id` - Source-ledger transaction id to await
    /// * `cancel` - Watch channel; flipping it to `true` stops the run
    ///   at the next scheduling point
    pub async fn run(
        &self,
        source_tx_id: &str,
        mut cancel: watch::Receiver<bool>,
    ) -> MonitorResult {
        let network = self.rpc.network();
        info!(
            "Bridge monitor started: awaiting {} on {} (max {} attempts)",
            source_tx_id, network, self.config.max_attempts
        );

        let mut last_checked_round: Option<u64> = None;
        let mut blocks_scanned: u64 = 0;
        let mut near_misses: u64 = 0;
        let mut attempts: u32 = 0;

        while attempts < self.config.max_attempts {
            if *cancel.borrow() {
                return self.cancelled(source_tx_id, attempts, blocks_scanned, near_misses);
            }
            attempts += 1;

            let current = match self.rpc.get_status().await {
                Ok(round) => round,
                Err(e) => {
                    warn!("{}: monitor status read failed: {}", network, e);
                    if self.sleep_or_cancel(&mut cancel).await {
                        return self.cancelled(source_tx_id, attempts, blocks_scanned, near_misses);
                    }
                    continue;
                }
            };

            let window_start = match last_checked_round {
                Some(last) => last + 1,
                None => current.saturating_sub(self.config.initial_lookback),
            };

            // Empty window: the ledger has not advanced since the last
            // scan. Sleep without fetching any block.
            if window_start > current {
                if self.sleep_or_cancel(&mut cancel).await {
                    return self.cancelled(source_tx_id, attempts, blocks_scanned, near_misses);
                }
                continue;
            }

            debug!(
                "{}: scanning rounds {}..={} for {}",
                network, window_start, current, source_tx_id
            );

            for round in window_start..=current {
                let block = match self.rpc.get_block(round).await {
                    Ok(block) => block,
                    Err(e) => {
                        warn!("{}: failed to fetch block {}: {}", network, round, e);
                        continue;
                    }
                };
                blocks_scanned += 1;

                for tx in &block.transactions {
                    let Some(text) = tx.note_text() else { continue };
                    let Some(confirmation) = note::find_confirmation(&text) else {
                        continue;
                    };

                    if confirmation.source_tx_id == source_tx_id {
                        info!(
                            "{}: bridge leg confirmed by {} in round {} \
                             ({} blocks scanned, attempt {})",
                            network, tx.id, round, blocks_scanned, attempts
                        );
                        return MonitorResult {
                            confirmed: true,
                            confirmation_tx_id: Some(tx.id.clone()),
                            attempts,
                            blocks_scanned,
                            near_misses,
                            cancelled: false,
                            error: None,
                        };
                    }

                    near_misses += 1;
                    debug!(
                        "{}: bridge-tagged tx {} confirms {:?}, not {}",
                        network, tx.id, confirmation.source_tx_id, source_tx_id
                    );
                }
            }

            last_checked_round = Some(current);

            if self.sleep_or_cancel(&mut cancel).await {
                return self.cancelled(source_tx_id, attempts, blocks_scanned, near_misses);
            }
        }

        warn!(
            "{}: bridge monitor exhausted for {} ({} attempts, {} blocks, {} near misses)",
            network, source_tx_id, attempts, blocks_scanned, near_misses
        );

        MonitorResult {
            confirmed: false,
            confirmation_tx_id: None,
            attempts,
            blocks_scanned,
            near_misses,
            cancelled: false,
            error: Some(format!(
                "no confirmation for {} on {} after {} attempts \
                 ({} blocks scanned, {} bridge-tagged near misses)",
                source_tx_id, network, attempts, blocks_scanned, near_misses
            )),
        }
    }

    /// Sleep one interval; returns `true` if cancellation fired.
    async fn sleep_or_cancel(&self, cancel: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.config.interval) => *cancel.borrow(),
            changed = cancel.changed() => changed.is_ok() && *cancel.borrow(),
        }
    }

    fn cancelled(
        &self,
        source_tx_id: &str,
        attempts: u32,
        blocks_scanned: u64,
        near_misses: u64,
    ) -> MonitorResult {
        info!(
            "{}: bridge monitor cancelled for {}",
            self.rpc.network(),
            source_tx_id
        );
        MonitorResult {
            confirmed: false,
            confirmation_tx_id: None,
            attempts,
            blocks_scanned,
            near_misses,
            cancelled: true,
            error: Some("monitor cancelled".to_string()),
        }
    }
}

/// Start a monitor run in the background, tied to a session's shared
/// status. The previous run on the same status (if live) is cancelled.
pub fn spawn_monitor(
    monitor: BridgeMonitor,
    source_tx_id: String,
    shared: Arc<SharedBridgeStatus>,
    heuristic: bool,
) {
    let cancel = shared.begin(&source_tx_id, monitor.network(), heuristic);
    tokio::spawn(async move {
        let result = monitor.run(&source_tx_id, cancel).await;
        // A cancelled run lost ownership of the status (a newer run or
        // a dismiss replaced it); only a run that ended on its own
        // reports back.
        if !result.cancelled {
            shared.finish(&result);
        }
    });
}
