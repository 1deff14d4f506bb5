//! # Contract Invocation Façade
//!
//! Generic client for the contract-managed token representation. The
//! token contract exposes a fixed operation set; this module hides the
//! selector/argument encoding behind named methods so the stringly-typed
//! call convention cannot leak into transfer logic.
//!
//! ## Operations
//!
//! | Operation | Kind | Produces |
//! |-----------|------|----------|
//! | `balance_of` | read | `ContractCallResult<u64>` |
//! | `allowance` | read | `ContractCallResult<u64>` |
//! | `transfer` | mutate | unsigned app call |
//! | `transfer_from` | mutate | unsigned app call |
//! | `deposit` | mutate | unsigned app call |
//! | `withdraw` | mutate | unsigned app call |
//! | `mint` | mutate | unsigned app call |
//! | `redeem` | mutate | unsigned app call |
//!
//! Mutating operations return **unsigned** transactions; signing and
//! submission are the caller's concern. Reads go through the node's
//! read-only call endpoint and return a success/error envelope.

use std::sync::Arc;

use sha2::{Digest, Sha512_256};
use thiserror::Error;
use tracing::debug;

use crate::buckets::Network;
use crate::ledger::{
    LedgerError, LedgerRpc, TransactionBody, TransactionHeader, TxParams,
    UnsignedTransaction,
};

/// Errors from contract reads.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// Transport or node failure underneath the call.
    #[error("contract call failed: {0}")]
    Ledger(#[from] LedgerError),

    /// Return value bytes did not decode as the expected type.
    #[error("failed to decode {method} return value")]
    BadReturnValue { method: String },
}

/// Success/error envelope for read operations.
#[derive(Debug, Clone)]
pub struct ContractCallResult<T> {
    /// Whether the contract executed the call successfully.
    pub success: bool,

    /// Decoded return value on success.
    pub value: Option<T>,

    /// Error message on failure.
    pub error: Option<String>,
}

impl<T> ContractCallResult<T> {
    fn ok(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }
}

/// Per-call parameters a caller may override.
///
/// Defaults are right for plain calls; builders override the fee and
/// attach auxiliary payments where an operation requires them.
#[derive(Debug, Clone, Default)]
pub struct CallParams {
    /// Flat fee override; suggested min fee when `None`.
    pub fee: Option<u64>,

    /// Auxiliary payment amount carried alongside the call (box/storage
    /// funding). Zero means no payment leg.
    pub payment: u64,

    /// Extra accounts the call references (beacon/receiver accounts).
    pub accounts: Vec<String>,
}

/// Client for one network's token contract.
#[derive(Clone)]
pub struct ContractClient {
    /// Network the contract lives on.
    network: Network,

    /// Application id of the token contract.
    app_id: u64,

    /// Ledger RPC used for read-only calls.
    rpc: Arc<dyn LedgerRpc>,
}

impl ContractClient {
    /// Create a client for one network's contract.
    pub fn new(network: Network, app_id: u64, rpc: Arc<dyn LedgerRpc>) -> Self {
        Self { network, app_id, rpc }
    }

    /// Application id of the wrapped contract.
    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Network the contract lives on.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The contract's escrow address: where native-side legs of a
    /// conversion are paid, derived from the application id.
    pub fn escrow_address(&self) -> String {
        let mut hasher = Sha512_256::new();
        hasher.update(b"appID");
        hasher.update(self.app_id.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        crate::ledger::encode_address(&digest)
    }

    // ==========================================
    // READ OPERATIONS
    // ==========================================

    /// Token balance of `owner` inside the contract.
    ///
    /// A successful call with a zero balance still means the account is
    /// known to the contract — the opt-in prober relies on that.
    pub async fn balance_of(&self, owner: &str) -> Result<ContractCallResult<u64>, ContractError> {
        self.read_u64("balanceOf", vec![encode_address_arg(owner)], owner).await
    }

    /// Remaining allowance from `owner` to `spender`.
    #[allow(dead_code)]
    pub async fn allowance(
        &self,
        owner: &str,
        spender: &str,
    ) -> Result<ContractCallResult<u64>, ContractError> {
        self.read_u64(
            "allowance",
            vec![encode_address_arg(owner), encode_address_arg(spender)],
            owner,
        )
        .await
    }

    async fn read_u64(
        &self,
        method: &str,
        mut args: Vec<Vec<u8>>,
        sender: &str,
    ) -> Result<ContractCallResult<u64>, ContractError> {
        let mut app_args = vec![method_selector(method)];
        app_args.append(&mut args);

        debug!("{}: read call {}({})", self.network, method, sender);
        let raw = match self.rpc.call_app(self.app_id, app_args, sender).await {
            Ok(raw) => raw,
            // Contract-level rejection (account unknown, bad args) comes
            // back as a 4xx; that is a failed call, not a transport error.
            Err(LedgerError::Rpc { status, message }) if status < 500 => {
                return Ok(ContractCallResult {
                    success: false,
                    value: None,
                    error: Some(message),
                });
            }
            Err(e) => return Err(ContractError::Ledger(e)),
        };

        let value: [u8; 8] = raw
            .as_slice()
            .try_into()
            .map_err(|_| ContractError::BadReturnValue {
                method: method.to_string(),
            })?;

        Ok(ContractCallResult::ok(u64::from_be_bytes(value)))
    }

    // ==========================================
    // MUTATING OPERATIONS (unsigned app calls)
    // ==========================================

    /// Move contract-managed balance to another holder.
    #[allow(dead_code)]
    pub fn transfer(
        &self,
        sender: &str,
        receiver: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(
            sender,
            "transfer",
            vec![encode_address_arg(receiver), encode_amount_arg(amount)],
            tx_params,
            call,
        )
    }

    /// Move contract-managed balance using a prior allowance.
    #[allow(dead_code)]
    pub fn transfer_from(
        &self,
        sender: &str,
        owner: &str,
        receiver: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(
            sender,
            "transferFrom",
            vec![
                encode_address_arg(owner),
                encode_address_arg(receiver),
                encode_amount_arg(amount),
            ],
            tx_params,
            call,
        )
    }

    /// Convert native tokens into contract-managed balance.
    pub fn deposit(
        &self,
        sender: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(sender, "deposit", vec![encode_amount_arg(amount)], tx_params, call)
    }

    /// Convert contract-managed balance back into native tokens.
    pub fn withdraw(
        &self,
        sender: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(sender, "withdraw", vec![encode_amount_arg(amount)], tx_params, call)
    }

    /// Mint new contract-managed balance (administrative).
    #[allow(dead_code)]
    pub fn mint(
        &self,
        sender: &str,
        receiver: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(
            sender,
            "mint",
            vec![encode_address_arg(receiver), encode_amount_arg(amount)],
            tx_params,
            call,
        )
    }

    /// Redeem contract-managed balance for the underlying (administrative).
    #[allow(dead_code)]
    pub fn redeem(
        &self,
        sender: &str,
        amount: u64,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        self.app_call(sender, "redeem", vec![encode_amount_arg(amount)], tx_params, call)
    }

    fn app_call(
        &self,
        sender: &str,
        method: &str,
        mut args: Vec<Vec<u8>>,
        tx_params: &TxParams,
        call: CallParams,
    ) -> UnsignedTransaction {
        let mut app_args = vec![method_selector(method)];
        app_args.append(&mut args);

        let (first_valid, last_valid) = tx_params.validity_range();

        UnsignedTransaction {
            header: TransactionHeader {
                sender: sender.to_string(),
                fee: call.fee.unwrap_or(tx_params.min_fee),
                first_valid,
                last_valid,
                genesis_id: tx_params.genesis_id.clone(),
                genesis_hash: tx_params.genesis_hash.clone(),
                note: None,
                group: None,
            },
            body: TransactionBody::AppCall {
                app_id: self.app_id,
                app_args,
                accounts: call.accounts,
            },
        }
    }
}

/// First 4 bytes of the hashed method name, the call selector.
fn method_selector(method: &str) -> Vec<u8> {
    let digest = Sha512_256::digest(method.as_bytes());
    digest[..4].to_vec()
}

fn encode_address_arg(address: &str) -> Vec<u8> {
    address.as_bytes().to_vec()
}

fn encode_amount_arg(amount: u64) -> Vec<u8> {
    amount.to_be_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_distinct_and_stable() {
        let deposit = method_selector("deposit");
        let withdraw = method_selector("withdraw");
        assert_eq!(deposit.len(), 4);
        assert_ne!(deposit, withdraw);
        assert_eq!(deposit, method_selector("deposit"));
    }

    #[test]
    fn amount_arg_is_big_endian_u64() {
        assert_eq!(encode_amount_arg(1), vec![0, 0, 0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn escrow_address_depends_on_app_id() {
        use crate::buckets::Network;
        use crate::ledger::mock::MockLedger;
        use crate::ledger::validate_address;
        use std::sync::Arc;

        let rpc = Arc::new(MockLedger::new(Network::Algorand));
        let a = ContractClient::new(Network::Algorand, 100, rpc.clone());
        let b = ContractClient::new(Network::Algorand, 101, rpc);

        assert_ne!(a.escrow_address(), b.escrow_address());
        assert!(validate_address(&a.escrow_address()).is_ok());
    }
}
