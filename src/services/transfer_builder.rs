//! # Transfer Builder Service
//!
//! One builder per transfer shape, producing unsigned operations.
//! Classification from an ordered bucket pair decides the shape:
//!
//! ```text
//! same network          → Conversion (deposit or withdraw group)
//! cross, native→native  → Bridge (one transfer to the relay + note)
//! cross, contract→native → WithdrawThenBridge (two sequenced legs)
//! ```
//!
//! Builders never sign and never submit. The caller obtains signatures
//! from the wallet signer and hands the bytes to the executor.

use thiserror::Error;
use tracing::debug;

use crate::bridge::note::{NoteError, TransferNote};
use crate::buckets::{is_transfer_allowed, BucketId, Network, Representation};
use crate::config::AppConfig;
use crate::contract::CallParams;
use crate::ledger::{
    assign_group_id, TransactionBody, TransactionHeader, TxParams, UnsignedTransaction,
};

use super::ChainSet;

/// Auxiliary payment added on the second conversion attempt. The first
/// attempt carries no padding; contracts that need box storage funded
/// reject it, and the retry with this amount goes through.
pub const AUX_PAYMENT_PADDING: u64 = 28_500;

/// Errors raised while classifying or building a transfer.
#[derive(Debug, Clone, Error)]
pub enum BuilderError {
    /// The ordered bucket pair is not a supported transfer.
    #[error("transfer from {from} to {to} is not supported")]
    NotAllowed { from: BucketId, to: BucketId },

    /// Zero or otherwise unusable amount.
    #[error("transfer amount must be positive")]
    ZeroAmount,

    /// Bridge note construction failed.
    #[error(transparent)]
    Note(#[from] NoteError),
}

/// Direction of a same-network representation conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionDirection {
    /// Native → contract-managed.
    Deposit,
    /// Contract-managed → native.
    Withdraw,
}

/// The shape of a transfer between two buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Same-network representation conversion.
    Conversion {
        network: Network,
        direction: ConversionDirection,
    },

    /// Cross-network native→native leg through the relay.
    Bridge {
        source: Network,
        destination: Network,
    },

    /// Cross-network contract→native: withdraw on the source network,
    /// then bridge the withdrawn amount.
    WithdrawThenBridge {
        source: Network,
        destination: Network,
    },
}

/// Classify an ordered bucket pair into its transfer shape.
///
/// Mirrors `is_transfer_allowed` exactly: every allowed pair maps to a
/// shape, every disallowed pair is `NotAllowed`.
pub fn classify(from: BucketId, to: BucketId) -> Result<TransferKind, BuilderError> {
    if !is_transfer_allowed(from, to) {
        return Err(BuilderError::NotAllowed { from, to });
    }

    if from.network() == to.network() {
        let direction = match from.representation() {
            Representation::Native => ConversionDirection::Deposit,
            Representation::ContractManaged => ConversionDirection::Withdraw,
        };
        return Ok(TransferKind::Conversion {
            network: from.network(),
            direction,
        });
    }

    match from.representation() {
        Representation::Native => Ok(TransferKind::Bridge {
            source: from.network(),
            destination: to.network(),
        }),
        Representation::ContractManaged => Ok(TransferKind::WithdrawThenBridge {
            source: from.network(),
            destination: to.network(),
        }),
    }
}

/// The Transfer Builder service.
///
/// Stateless aside from configuration and the contract clients it
/// builds app calls with.
#[derive(Clone)]
pub struct TransferBuilder {
    /// Application configuration.
    config: AppConfig,

    /// Per-network handles (contract clients are what builders use).
    chains: ChainSet,
}

impl TransferBuilder {
    /// Create a new TransferBuilder.
    pub fn new(config: AppConfig, chains: ChainSet) -> Self {
        Self { config, chains }
    }

    /// Build a same-network conversion as an atomic group.
    ///
    /// ## Group Layout
    ///
    /// | # | Deposit | Withdraw |
    /// |---|---------|----------|
    /// | 1 | protocol fee + padding payment to escrow | protocol fee + padding payment to escrow |
    /// | 2 | `deposit` app call | `withdraw` app call |
    /// | 3 | asset transfer to escrow | — |
    ///
    /// `padding` is the auxiliary payment amount: zero on the first
    /// attempt, [`AUX_PAYMENT_PADDING`] on the second.
    ///
    /// `beneficiary` credits a third party instead of the sender
    /// (external transfers); it rides in the app call's account list.
    pub fn build_conversion(
        &self,
        network: Network,
        direction: ConversionDirection,
        sender: &str,
        amount: u64,
        padding: u64,
        beneficiary: Option<&str>,
        tx_params: &TxParams,
    ) -> Result<Vec<UnsignedTransaction>, BuilderError> {
        if amount == 0 {
            return Err(BuilderError::ZeroAmount);
        }

        let contract = self.chains.contract(network);
        let escrow = contract.escrow_address();

        let call = CallParams {
            // The app call covers its inner transaction too.
            fee: Some(tx_params.min_fee * 2),
            payment: self.config.conversion_fee + padding,
            accounts: beneficiary.map(|b| vec![b.to_string()]).unwrap_or_default(),
        };

        let (first_valid, last_valid) = tx_params.validity_range();
        let payment = UnsignedTransaction {
            header: TransactionHeader {
                sender: sender.to_string(),
                fee: tx_params.min_fee,
                first_valid,
                last_valid,
                genesis_id: tx_params.genesis_id.clone(),
                genesis_hash: tx_params.genesis_hash.clone(),
                note: None,
                group: None,
            },
            body: TransactionBody::Payment {
                receiver: escrow.clone(),
                amount: call.payment,
            },
        };

        let mut group = match direction {
            ConversionDirection::Deposit => {
                let app_call = contract.deposit(sender, amount, tx_params, call);
                let asset_move = UnsignedTransaction {
                    header: TransactionHeader {
                        sender: sender.to_string(),
                        fee: tx_params.min_fee,
                        first_valid,
                        last_valid,
                        genesis_id: tx_params.genesis_id.clone(),
                        genesis_hash: tx_params.genesis_hash.clone(),
                        note: None,
                        group: None,
                    },
                    body: TransactionBody::AssetTransfer {
                        asset_id: self.config.asset_id(network),
                        receiver: escrow,
                        amount,
                    },
                };
                vec![payment, app_call, asset_move]
            }
            ConversionDirection::Withdraw => {
                let app_call = contract.withdraw(sender, amount, tx_params, call);
                vec![payment, app_call]
            }
        };

        assign_group_id(&mut group);
        debug!(
            "built {:?} conversion group on {}: {} txns, padding {}",
            direction,
            network,
            group.len(),
            padding
        );
        Ok(group)
    }

    /// Build the cross-network leg: one asset transfer to the relay
    /// address carrying the encoded transfer note. The note is the only
    /// instruction the relay consumes.
    pub fn build_bridge_transfer(
        &self,
        source: Network,
        destination: Network,
        sender: &str,
        destination_address: &str,
        amount: u64,
        tx_params: &TxParams,
    ) -> Result<(UnsignedTransaction, TransferNote), BuilderError> {
        if amount == 0 {
            return Err(BuilderError::ZeroAmount);
        }

        let note = TransferNote::for_amount(
            self.config.chain_id(destination),
            destination_address,
            &self.config.asset_id(destination).to_string(),
            amount,
        )?;

        let (first_valid, last_valid) = tx_params.validity_range();
        let txn = UnsignedTransaction {
            header: TransactionHeader {
                sender: sender.to_string(),
                fee: tx_params.min_fee,
                first_valid,
                last_valid,
                genesis_id: tx_params.genesis_id.clone(),
                genesis_hash: tx_params.genesis_hash.clone(),
                note: Some(note.encode().into_bytes()),
                group: None,
            },
            body: TransactionBody::AssetTransfer {
                asset_id: self.config.asset_id(source),
                receiver: self.config.relay_address.clone(),
                amount,
            },
        };

        debug!(
            "built bridge transfer {} -> {}: {} base units to relay",
            source, destination, amount
        );
        Ok((txn, note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::note::TRANSFER_NOTE_PREFIX;
    use crate::services::testing::mock_chain_set;
    use BucketId::*;

    fn builder() -> TransferBuilder {
        let (chains, _, _) = mock_chain_set();
        TransferBuilder::new(AppConfig::for_tests(), chains)
    }

    fn params() -> TxParams {
        TxParams {
            genesis_id: "algorand-test-v1".into(),
            genesis_hash: "bW9jay1nZW5lc2lzLWhhc2g=".into(),
            min_fee: 1000,
            last_round: 100,
        }
    }

    #[test]
    fn classify_covers_every_allowed_pair() {
        assert_eq!(
            classify(AlgorandNative, AlgorandContract).unwrap(),
            TransferKind::Conversion {
                network: Network::Algorand,
                direction: ConversionDirection::Deposit
            }
        );
        assert_eq!(
            classify(VoiContract, VoiNative).unwrap(),
            TransferKind::Conversion {
                network: Network::Voi,
                direction: ConversionDirection::Withdraw
            }
        );
        assert_eq!(
            classify(AlgorandNative, VoiNative).unwrap(),
            TransferKind::Bridge {
                source: Network::Algorand,
                destination: Network::Voi
            }
        );
        assert_eq!(
            classify(VoiContract, AlgorandNative).unwrap(),
            TransferKind::WithdrawThenBridge {
                source: Network::Voi,
                destination: Network::Algorand
            }
        );
    }

    #[test]
    fn classify_rejects_disallowed_pairs() {
        for (from, to) in [
            (AlgorandNative, AlgorandNative),
            (AlgorandNative, VoiContract),
            (AlgorandContract, VoiContract),
        ] {
            assert!(matches!(
                classify(from, to),
                Err(BuilderError::NotAllowed { .. })
            ));
        }
    }

    #[test]
    fn deposit_group_has_three_grouped_transactions() {
        let group = builder()
            .build_conversion(
                Network::Algorand,
                ConversionDirection::Deposit,
                "SENDER",
                1_000_000,
                0,
                None,
                &params(),
            )
            .expect("group");

        assert_eq!(group.len(), 3);
        let group_id = group[0].header.group.clone().expect("grouped");
        assert!(group.iter().all(|t| t.header.group.as_deref() == Some(group_id.as_str())));

        // Fee payment carries the protocol fee, no padding on attempt one.
        match &group[0].body {
            TransactionBody::Payment { amount, .. } => assert_eq!(*amount, 10_000),
            other => panic!("expected payment leg, got {:?}", other),
        }
    }

    #[test]
    fn withdraw_group_has_two_transactions_and_padding() {
        let group = builder()
            .build_conversion(
                Network::Voi,
                ConversionDirection::Withdraw,
                "SENDER",
                1_000_000,
                AUX_PAYMENT_PADDING,
                None,
                &params(),
            )
            .expect("group");

        assert_eq!(group.len(), 2);
        match &group[0].body {
            TransactionBody::Payment { amount, .. } => {
                assert_eq!(*amount, 10_000 + AUX_PAYMENT_PADDING)
            }
            other => panic!("expected payment leg, got {:?}", other),
        }
        assert!(matches!(group[1].body, TransactionBody::AppCall { .. }));
    }

    #[test]
    fn beneficiary_lands_in_app_call_accounts() {
        let group = builder()
            .build_conversion(
                Network::Algorand,
                ConversionDirection::Deposit,
                "SENDER",
                500,
                0,
                Some("RECIPIENT"),
                &params(),
            )
            .expect("group");

        match &group[1].body {
            TransactionBody::AppCall { accounts, .. } => {
                assert_eq!(accounts, &vec!["RECIPIENT".to_string()])
            }
            other => panic!("expected app call, got {:?}", other),
        }
    }

    #[test]
    fn bridge_transfer_targets_relay_with_note() {
        let b = builder();
        let (txn, note) = b
            .build_bridge_transfer(
                Network::Algorand,
                Network::Voi,
                "SENDER",
                "DESTADDR",
                100_000_000,
                &params(),
            )
            .expect("bridge txn");

        match &txn.body {
            TransactionBody::AssetTransfer { receiver, amount, asset_id } => {
                assert_eq!(receiver, &AppConfig::for_tests().relay_address);
                assert_eq!(*amount, 100_000_000);
                assert_eq!(*asset_id, 302189);
            }
            other => panic!("expected asset transfer, got {:?}", other),
        }

        let note_text = String::from_utf8(txn.header.note.clone().expect("note")).unwrap();
        assert!(note_text.starts_with(TRANSFER_NOTE_PREFIX));
        assert_eq!(note.destination_network, 416101);
        assert_eq!(note.fee_amount, 100_000);
        assert_eq!(note.destination_amount, 99_900_000);
    }

    #[test]
    fn zero_amount_is_rejected_without_building() {
        let b = builder();
        assert!(matches!(
            b.build_bridge_transfer(
                Network::Algorand,
                Network::Voi,
                "S",
                "D",
                0,
                &params()
            ),
            Err(BuilderError::ZeroAmount)
        ));
        assert!(matches!(
            b.build_conversion(
                Network::Voi,
                ConversionDirection::Deposit,
                "S",
                0,
                0,
                None,
                &params()
            ),
            Err(BuilderError::ZeroAmount)
        ));
    }
}
