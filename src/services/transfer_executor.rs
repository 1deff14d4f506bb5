//! # Transfer Executor Service
//!
//! Owns every submission side effect: signing, raw submission, the
//! settled-leg wait, the conversion padding retry and the bridge-monitor
//! handoff. Builders stay pure; wizards stay state machines; everything
//! that actually moves value goes through here.
//!
//! ## Leg Sequencing
//!
//! ```text
//! Conversion            sign group → submit → wait 4 rounds
//! Bridge                sign txn   → submit → wait 4 rounds → monitor
//! WithdrawThenBridge    conversion leg, then bridge leg with the
//!                       withdrawn amount
//! ```
//!
//! Any failure aborts the whole transfer. A leg that already confirmed
//! is not rolled back — the caller sees which transaction ids landed.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::bridge::{spawn_monitor, BridgeMonitor, MonitorConfig, SharedBridgeStatus};
use crate::buckets::{BucketId, Network};
use crate::config::AppConfig;
use crate::ledger::{encode_signed_group, LedgerError, SignerError, WalletSigner};

use super::transfer_builder::{
    classify, BuilderError, ConversionDirection, TransferBuilder, TransferKind,
    AUX_PAYMENT_PADDING,
};
use super::ChainSet;

/// Errors raised while executing a transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Classification or construction failed; nothing was submitted.
    #[error(transparent)]
    Builder(#[from] BuilderError),

    /// The wallet refused or failed to sign.
    #[error(transparent)]
    Signer(#[from] SignerError),

    /// An RPC call failed outside the conversion retry window.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Both conversion attempts (padding 0 and padding 28_500) failed.
    #[error("conversion failed after both padding attempts: {last_error}")]
    ConversionExhausted { last_error: String },
}

/// A cross-network source leg that now awaits relay settlement.
#[derive(Debug, Clone)]
pub struct BridgeLeg {
    /// Source-ledger transaction id the relay will reference.
    pub source_tx_id: String,

    /// Network the confirmation monitor scans.
    pub destination: Network,
}

/// What a finished execution produced.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Transaction ids of every settled leg, in submission order.
    pub tx_ids: Vec<String>,

    /// Present when a bridge leg was submitted; the monitor for it has
    /// already been started.
    pub bridge: Option<BridgeLeg>,
}

/// The Transfer Executor service.
#[derive(Clone)]
pub struct TransferExecutor {
    /// Application configuration.
    config: AppConfig,

    /// Per-network handles.
    chains: ChainSet,

    /// The pure builders.
    builder: TransferBuilder,
}

impl TransferExecutor {
    /// Create a new TransferExecutor.
    pub fn new(config: AppConfig, chains: ChainSet) -> Self {
        let builder = TransferBuilder::new(config.clone(), chains.clone());
        Self {
            config,
            chains,
            builder,
        }
    }

    /// Execute a transfer between two buckets.
    ///
    /// ## Arguments
    ///
    /// * `signer` - Wallet signer for the connected account
    /// * `from` / `to` - Ordered bucket pair (already policy-checked by
    ///   the wizard; checked again here before anything is built)
    /// * `amount` - Base units to move
    /// * `beneficiary` - Recipient address for external transfers;
    ///   `None` moves between the holder's own buckets
    /// * `bridge_status` - Session status the monitor reports into
    pub async fn execute(
        &self,
        signer: &Arc<dyn WalletSigner>,
        from: BucketId,
        to: BucketId,
        amount: u64,
        beneficiary: Option<&str>,
        bridge_status: &Arc<SharedBridgeStatus>,
    ) -> Result<TransferOutcome, TransferError> {
        let kind = classify(from, to)?;
        info!(
            "Executing transfer {} -> {} ({} base units, {:?})",
            from, to, amount, kind
        );

        match kind {
            TransferKind::Conversion { network, direction } => {
                let tx_id = self
                    .run_conversion(signer, network, direction, amount, beneficiary)
                    .await?;
                Ok(TransferOutcome {
                    tx_ids: vec![tx_id],
                    bridge: None,
                })
            }

            TransferKind::Bridge { source, destination } => {
                let destination_address = beneficiary.unwrap_or_else(|| signer.address());
                let tx_id = self
                    .run_bridge_leg(signer, source, destination, destination_address, amount)
                    .await?;
                self.start_monitor(bridge_status, tx_id.clone(), destination, false);
                Ok(TransferOutcome {
                    tx_ids: vec![tx_id.clone()],
                    bridge: Some(BridgeLeg {
                        source_tx_id: tx_id,
                        destination,
                    }),
                })
            }

            TransferKind::WithdrawThenBridge { source, destination } => {
                // Leg 1: withdraw to the holder's own native bucket on
                // the source network. Confirmed legs are not rolled back
                // if the bridge leg fails after this point.
                let withdraw_tx = self
                    .run_conversion(
                        signer,
                        source,
                        ConversionDirection::Withdraw,
                        amount,
                        None,
                    )
                    .await?;

                // Leg 2: bridge the withdrawn amount.
                let destination_address = beneficiary.unwrap_or_else(|| signer.address());
                let bridge_tx = self
                    .run_bridge_leg(signer, source, destination, destination_address, amount)
                    .await?;
                self.start_monitor(bridge_status, bridge_tx.clone(), destination, false);

                Ok(TransferOutcome {
                    tx_ids: vec![withdraw_tx, bridge_tx.clone()],
                    bridge: Some(BridgeLeg {
                        source_tx_id: bridge_tx,
                        destination,
                    }),
                })
            }
        }
    }

    /// Run a same-network conversion with the two-attempt padding retry:
    /// first with zero auxiliary payment, then with the fixed nonzero
    /// padding. Exactly two attempts, never more.
    async fn run_conversion(
        &self,
        signer: &Arc<dyn WalletSigner>,
        network: Network,
        direction: ConversionDirection,
        amount: u64,
        beneficiary: Option<&str>,
    ) -> Result<String, TransferError> {
        let mut last_error = String::new();

        for padding in [0, AUX_PAYMENT_PADDING] {
            let tx_params = self.chains.rpc(network).get_tx_params().await?;
            let group = self.builder.build_conversion(
                network,
                direction,
                signer.address(),
                amount,
                padding,
                beneficiary,
                &tx_params,
            )?;

            // A signing rejection aborts immediately — re-prompting the
            // wallet is not what the padding retry is for.
            let signed = signer.sign(&group).await?;

            match self
                .submit_and_settle(network, encode_signed_group(&signed))
                .await
            {
                Ok(tx_id) => {
                    info!(
                        "{:?} conversion settled on {} (padding {}): {}",
                        direction, network, padding, tx_id
                    );
                    return Ok(tx_id);
                }
                Err(e) => {
                    warn!(
                        "{:?} conversion attempt with padding {} failed on {}: {}",
                        direction, padding, network, e
                    );
                    last_error = e.to_string();
                }
            }
        }

        Err(TransferError::ConversionExhausted { last_error })
    }

    /// Build, sign and settle the cross-network leg.
    async fn run_bridge_leg(
        &self,
        signer: &Arc<dyn WalletSigner>,
        source: Network,
        destination: Network,
        destination_address: &str,
        amount: u64,
    ) -> Result<String, TransferError> {
        let tx_params = self.chains.rpc(source).get_tx_params().await?;
        let (txn, note) = self.builder.build_bridge_transfer(
            source,
            destination,
            signer.address(),
            destination_address,
            amount,
            &tx_params,
        )?;

        let signed = signer.sign(std::slice::from_ref(&txn)).await?;
        let tx_id = self
            .submit_and_settle(source, signed[0].to_bytes())
            .await?;

        info!(
            "Bridge leg settled on {}: {} ({} base units to {}, fee {})",
            source, tx_id, note.source_amount, note.destination_address, note.fee_amount
        );
        Ok(tx_id)
    }

    /// Submit signed bytes and wait the configured confirming rounds
    /// before trusting the leg as settled.
    async fn submit_and_settle(
        &self,
        network: Network,
        signed: Vec<u8>,
    ) -> Result<String, LedgerError> {
        let rpc = self.chains.rpc(network);
        let tx_id = rpc.submit_raw(&signed).await?;
        rpc.wait_for_confirmation(&tx_id, self.config.confirming_rounds)
            .await?;
        Ok(tx_id)
    }

    /// Start (or restart) a confirmation monitor for a source leg.
    ///
    /// `heuristic` marks a manual retry that guessed the destination
    /// network rather than knowing it.
    pub fn start_monitor(
        &self,
        bridge_status: &Arc<SharedBridgeStatus>,
        source_tx_id: String,
        destination: Network,
        heuristic: bool,
    ) {
        let monitor = BridgeMonitor::new(
            self.chains.rpc(destination).clone(),
            MonitorConfig {
                max_attempts: self.config.monitor_max_attempts,
                interval: Duration::from_millis(self.config.monitor_interval_ms),
                initial_lookback: self.config.monitor_lookback,
            },
        );
        spawn_monitor(monitor, source_tx_id, bridge_status.clone(), heuristic);
    }
}
