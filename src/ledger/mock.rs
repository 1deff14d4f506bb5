//! Test double for `LedgerRpc`.
//!
//! Programmable per test: current round, blocks by round, asset
//! holdings, contract balances and failure switches. Call counters let
//! tests assert that no network call was issued or that polling stopped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::buckets::Network;

use super::types::{AccountInfo, AssetHolding, Block, TxParams};
use super::{LedgerError, LedgerRpc};

#[derive(Default)]
struct MockState {
    current_round: u64,
    blocks: HashMap<u64, Block>,
    holdings: HashMap<(String, u64), u64>,
    app_balances: HashMap<String, u64>,
    fail_holdings: bool,
    fail_app_calls: bool,
    fail_submit: bool,
    fail_next_submits: u64,
    succeed_before_failing: Option<u64>,
}

/// In-memory `LedgerRpc` implementation for tests.
pub struct MockLedger {
    network: Network,
    state: Mutex<MockState>,
    status_calls: AtomicU64,
    block_calls: AtomicU64,
    total_calls: AtomicU64,
    submitted: Mutex<Vec<Vec<u8>>>,
    submit_counter: AtomicU64,
    failed_submits: AtomicU64,
}

impl MockLedger {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            state: Mutex::new(MockState::default()),
            status_calls: AtomicU64::new(0),
            block_calls: AtomicU64::new(0),
            total_calls: AtomicU64::new(0),
            submitted: Mutex::new(Vec::new()),
            submit_counter: AtomicU64::new(0),
            failed_submits: AtomicU64::new(0),
        }
    }

    pub fn set_round(&self, round: u64) {
        self.state.lock().unwrap().current_round = round;
    }

    pub fn add_block(&self, block: Block) {
        self.state.lock().unwrap().blocks.insert(block.round, block);
    }

    pub fn set_holding(&self, address: &str, asset_id: u64, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .holdings
            .insert((address.to_string(), asset_id), amount);
    }

    pub fn set_app_balance(&self, address: &str, amount: u64) {
        self.state
            .lock()
            .unwrap()
            .app_balances
            .insert(address.to_string(), amount);
    }

    pub fn fail_holdings(&self, fail: bool) {
        self.state.lock().unwrap().fail_holdings = fail;
    }

    pub fn fail_app_calls(&self, fail: bool) {
        self.state.lock().unwrap().fail_app_calls = fail;
    }

    pub fn fail_submit(&self, fail: bool) {
        self.state.lock().unwrap().fail_submit = fail;
    }

    /// Fail only the next `n` submissions, then succeed again.
    pub fn fail_next_submits(&self, n: u64) {
        self.state.lock().unwrap().fail_next_submits = n;
    }

    /// Let the next `n` submissions succeed, then fail all later ones.
    pub fn succeed_submits_then_fail(&self, n: u64) {
        self.state.lock().unwrap().succeed_before_failing = Some(n);
    }

    pub fn submit_calls(&self) -> u64 {
        self.submit_counter.load(Ordering::SeqCst) + self.failed_submits.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> u64 {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> u64 {
        self.block_calls.load(Ordering::SeqCst)
    }

    /// Every RPC call of any kind, for "no network call issued" asserts.
    pub fn total_calls(&self) -> u64 {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<Vec<u8>> {
        self.submitted.lock().unwrap().clone()
    }

    fn count(&self) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerRpc for MockLedger {
    fn network(&self) -> Network {
        self.network
    }

    async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
        self.count();
        let state = self.state.lock().unwrap();
        let assets = state
            .holdings
            .iter()
            .filter(|((addr, _), _)| addr == address)
            .map(|((_, asset_id), amount)| AssetHolding {
                asset_id: *asset_id,
                amount: *amount,
            })
            .collect();
        Ok(AccountInfo {
            address: address.to_string(),
            amount: 10_000_000,
            assets,
        })
    }

    async fn asset_holding(
        &self,
        address: &str,
        asset_id: u64,
    ) -> Result<AssetHolding, LedgerError> {
        self.count();
        let state = self.state.lock().unwrap();
        if state.fail_holdings {
            return Err(LedgerError::Http("mock holding failure".into()));
        }
        match state.holdings.get(&(address.to_string(), asset_id)) {
            Some(amount) => Ok(AssetHolding {
                asset_id,
                amount: *amount,
            }),
            None => Err(LedgerError::NotOptedIn {
                address: address.to_string(),
                asset_id,
            }),
        }
    }

    async fn get_block(&self, round: u64) -> Result<Block, LedgerError> {
        self.count();
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state.blocks.get(&round).cloned().unwrap_or(Block {
            round,
            transactions: Vec::new(),
        }))
    }

    async fn get_status(&self) -> Result<u64, LedgerError> {
        self.count();
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().current_round)
    }

    async fn get_tx_params(&self) -> Result<TxParams, LedgerError> {
        self.count();
        Ok(TxParams {
            genesis_id: format!("{}-test-v1", self.network),
            genesis_hash: "bW9jay1nZW5lc2lzLWhhc2g=".into(),
            min_fee: 1000,
            last_round: self.state.lock().unwrap().current_round,
        })
    }

    async fn call_app(
        &self,
        _app_id: u64,
        _args: Vec<Vec<u8>>,
        sender: &str,
    ) -> Result<Vec<u8>, LedgerError> {
        self.count();
        let state = self.state.lock().unwrap();
        if state.fail_app_calls {
            return Err(LedgerError::Rpc {
                status: 400,
                message: "mock contract rejection".into(),
            });
        }
        match state.app_balances.get(sender) {
            Some(balance) => Ok(balance.to_be_bytes().to_vec()),
            None => Err(LedgerError::Rpc {
                status: 404,
                message: "account unknown to contract".into(),
            }),
        }
    }

    async fn submit_raw(&self, signed: &[u8]) -> Result<String, LedgerError> {
        self.count();
        {
            let mut state = self.state.lock().unwrap();
            let quota_exhausted = state.succeed_before_failing == Some(0);
            if state.fail_submit || state.fail_next_submits > 0 || quota_exhausted {
                if state.fail_next_submits > 0 {
                    state.fail_next_submits -= 1;
                }
                self.failed_submits.fetch_add(1, Ordering::SeqCst);
                return Err(LedgerError::Http("mock submit failure".into()));
            }
            if let Some(quota) = state.succeed_before_failing.as_mut() {
                *quota -= 1;
            }
        }
        self.submitted.lock().unwrap().push(signed.to_vec());
        let n = self.submit_counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-MOCKTX-{}", self.network.as_str().to_uppercase(), n))
    }

    async fn wait_for_confirmation(
        &self,
        _tx_id: &str,
        _rounds: u64,
    ) -> Result<u64, LedgerError> {
        self.count();
        Ok(self.state.lock().unwrap().current_round)
    }
}
