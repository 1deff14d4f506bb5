//! # Internal Transfer Wizard
//!
//! Moves balance between the holder's own buckets.
//!
//! ## Steps
//!
//! ```text
//! select-from → select-to → enter-amount → [bridge-transfer] → submit
//! ```
//!
//! The `bridge-transfer` step is never user-selected: it appears
//! automatically, exactly when the move is cross-network *and* the
//! representation converts contract-managed → native — the one shape
//! that needs a withdraw leg before the relay leg.

use serde::Serialize;

use crate::buckets::{is_transfer_allowed, Bucket, BucketId, Network, Representation};

use super::WizardError;

/// The internal wizard's state. One variant per step; each carries only
/// what that step has validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalWizard {
    /// Choosing the source bucket.
    SelectFrom,

    /// Source chosen; choosing the destination bucket.
    SelectTo { from: BucketId },

    /// Pair validated against the policy; entering the amount.
    EnterAmount { from: BucketId, to: BucketId },

    /// Cross-network contract→native: the extra bridge step is shown
    /// before submission.
    BridgeTransfer {
        from: BucketId,
        to: BucketId,
        amount: u64,
    },

    /// Everything collected; ready to submit.
    ReadyToSubmit {
        from: BucketId,
        to: BucketId,
        amount: u64,
    },
}

impl Default for InternalWizard {
    fn default() -> Self {
        InternalWizard::SelectFrom
    }
}

impl InternalWizard {
    /// Step name as shown to clients.
    pub fn step_name(&self) -> &'static str {
        match self {
            InternalWizard::SelectFrom => "select-from",
            InternalWizard::SelectTo { .. } => "select-to",
            InternalWizard::EnterAmount { .. } => "enter-amount",
            InternalWizard::BridgeTransfer { .. } => "bridge-transfer",
            InternalWizard::ReadyToSubmit { .. } => "submit",
        }
    }

    /// Choose the source bucket.
    ///
    /// Requires a positive balance, and gates on the active network: a
    /// bucket on the other ledger needs an explicit switch first.
    pub fn select_from(
        &mut self,
        bucket: &Bucket,
        active_network: Network,
    ) -> Result<(), WizardError> {
        if !matches!(self, InternalWizard::SelectFrom) {
            return Err(self.wrong_step("select-from"));
        }

        if bucket.balance == 0 {
            return Err(WizardError::EmptyBucket(bucket.id));
        }

        if bucket.network != active_network {
            return Err(WizardError::NetworkSwitchRequired {
                required: bucket.network,
            });
        }

        *self = InternalWizard::SelectTo { from: bucket.id };
        Ok(())
    }

    /// Choose the destination bucket. The compatibility policy gates
    /// this transition; a disallowed pair (same bucket included) never
    /// reaches `enter-amount`.
    pub fn select_to(&mut self, to: BucketId) -> Result<(), WizardError> {
        let InternalWizard::SelectTo { from } = *self else {
            return Err(self.wrong_step("select-to"));
        };

        if !is_transfer_allowed(from, to) {
            return Err(WizardError::NotAllowed { from, to });
        }

        *self = InternalWizard::EnterAmount { from, to };
        Ok(())
    }

    /// Enter the amount. `available` is the source bucket's balance as
    /// of the last refresh.
    pub fn enter_amount(&mut self, amount: u64, available: u64) -> Result<(), WizardError> {
        let InternalWizard::EnterAmount { from, to } = *self else {
            return Err(self.wrong_step("enter-amount"));
        };

        if amount == 0 {
            return Err(WizardError::ZeroAmount);
        }
        if amount > available {
            return Err(WizardError::InsufficientBalance { amount, available });
        }

        let needs_bridge_step = from.network() != to.network()
            && from.representation() == Representation::ContractManaged
            && to.representation() == Representation::Native;

        *self = if needs_bridge_step {
            InternalWizard::BridgeTransfer { from, to, amount }
        } else {
            InternalWizard::ReadyToSubmit { from, to, amount }
        };
        Ok(())
    }

    /// The collected transfer, available once the machine reached a
    /// submittable step.
    pub fn submission(&self) -> Result<(BucketId, BucketId, u64), WizardError> {
        match *self {
            InternalWizard::BridgeTransfer { from, to, amount }
            | InternalWizard::ReadyToSubmit { from, to, amount } => Ok((from, to, amount)),
            _ => Err(self.wrong_step("submit")),
        }
    }

    /// Reset all fields back to the first step.
    pub fn reset(&mut self) {
        *self = InternalWizard::SelectFrom;
    }

    /// Serializable snapshot for the API.
    pub fn view(&self) -> InternalWizardView {
        let (from, to, amount) = match *self {
            InternalWizard::SelectFrom => (None, None, None),
            InternalWizard::SelectTo { from } => (Some(from), None, None),
            InternalWizard::EnterAmount { from, to } => (Some(from), Some(to), None),
            InternalWizard::BridgeTransfer { from, to, amount }
            | InternalWizard::ReadyToSubmit { from, to, amount } => {
                (Some(from), Some(to), Some(amount))
            }
        };

        InternalWizardView {
            step: self.step_name(),
            from,
            to,
            amount,
        }
    }

    fn wrong_step(&self, expected: &'static str) -> WizardError {
        WizardError::WrongStep {
            expected,
            actual: self.step_name(),
        }
    }
}

/// Snapshot of the internal wizard for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalWizardView {
    /// Current step name.
    pub step: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<BucketId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<BucketId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
}
