//! # Services Module
//!
//! Core business logic of the backend. Each service handles one domain.
//!
//! ## Services Overview
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `TransferBuilder` | Building unsigned operations per transfer shape |
//! | `TransferExecutor` | Sign → submit → confirm sequencing, bridge handoff |
//! | `BalanceRefresher` | Fan-out balance refresh, recipient opt-in probes |
//!
//! Builders are pure: they classify a bucket pair into a transfer shape
//! and produce unsigned operations. The executor owns all submission
//! side effects. The refresher is the only service that tolerates
//! partial failure by design.

pub mod balance_refresher;
pub mod transfer_builder;
pub mod transfer_executor;

pub use balance_refresher::{BalanceRefresher, OptInStatus};
pub use transfer_builder::{BuilderError, ConversionDirection, TransferBuilder, TransferKind};
pub use transfer_executor::{TransferError, TransferExecutor, TransferOutcome};

use std::sync::Arc;

use crate::buckets::Network;
use crate::contract::ContractClient;
use crate::ledger::LedgerRpc;

/// Shared handles for one network: the ledger RPC and the token
/// contract client on top of it.
#[derive(Clone)]
pub struct ChainHandle {
    /// Ledger RPC for this network.
    pub rpc: Arc<dyn LedgerRpc>,

    /// Token contract client for this network.
    pub contract: ContractClient,
}

impl ChainHandle {
    /// Build a handle from an RPC client and the contract app id.
    pub fn new(rpc: Arc<dyn LedgerRpc>, app_id: u64) -> Self {
        let contract = ContractClient::new(rpc.network(), app_id, rpc.clone());
        Self { rpc, contract }
    }
}

/// Both networks' handles, indexed by `Network`.
#[derive(Clone)]
pub struct ChainSet {
    algorand: ChainHandle,
    voi: ChainHandle,
}

impl ChainSet {
    pub fn new(algorand: ChainHandle, voi: ChainHandle) -> Self {
        Self { algorand, voi }
    }

    /// The handle for one network.
    pub fn handle(&self, network: Network) -> &ChainHandle {
        match network {
            Network::Algorand => &self.algorand,
            Network::Voi => &self.voi,
        }
    }

    /// Shortcut for the RPC of one network.
    pub fn rpc(&self, network: Network) -> &Arc<dyn LedgerRpc> {
        &self.handle(network).rpc
    }

    /// Shortcut for the contract of one network.
    pub fn contract(&self, network: Network) -> &ContractClient {
        &self.handle(network).contract
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::ledger::mock::MockLedger;

    /// A `ChainSet` over two fresh mock ledgers; returns the mocks too
    /// so tests can program and inspect them.
    pub fn mock_chain_set() -> (ChainSet, Arc<MockLedger>, Arc<MockLedger>) {
        let algorand = Arc::new(MockLedger::new(Network::Algorand));
        let voi = Arc::new(MockLedger::new(Network::Voi));
        let set = ChainSet::new(
            ChainHandle::new(algorand.clone(), 2657887),
            ChainHandle::new(voi.clone(), 47),
        );
        (set, algorand, voi)
    }
}
