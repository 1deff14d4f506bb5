//! # Transfer Wizards
//!
//! The two multi-step transfer flows, modeled as explicit tagged-variant
//! state machines: each step variant carries exactly the data that step
//! has legitimately collected, so illegal states (an amount without a
//! validated pair, a confirm without an opted-in destination) are
//! unrepresentable.
//!
//! The machines are pure — no I/O. Gating data that requires the network
//! (balances, opt-in probes) is fetched by the session layer and passed
//! into transitions. A transition either moves the machine forward or
//! returns a `WizardError` and leaves it unchanged.

pub mod external;
pub mod internal;

pub use external::{ExternalWizard, ExternalWizardView};
pub use internal::{InternalWizard, InternalWizardView};

use thiserror::Error;

use crate::buckets::{BucketId, Network};

/// Validation failures raised by wizard transitions.
///
/// Every variant blocks step advancement immediately; none of them is
/// produced after a network call for the rejected input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    /// The bucket pair fails the compatibility policy (same bucket
    /// included).
    #[error("transfer from {from} to {to} is not allowed")]
    NotAllowed { from: BucketId, to: BucketId },

    /// Source bucket holds nothing to transfer.
    #[error("bucket {0} has no balance")]
    EmptyBucket(BucketId),

    /// Zero amount.
    #[error("amount must be positive")]
    ZeroAmount,

    /// More than the source bucket holds.
    #[error("amount {amount} exceeds available balance {available}")]
    InsufficientBalance { amount: u64, available: u64 },

    /// Recipient address failed syntax validation.
    #[error("invalid recipient address: {0}")]
    InvalidAddress(String),

    /// Recipient has not opted into the candidate destination bucket.
    #[error("recipient is not opted into {0}")]
    NotOptedIn(BucketId),

    /// The transition does not apply to the wizard's current step.
    #[error("wizard is at step {actual}, expected {expected}")]
    WrongStep {
        expected: &'static str,
        actual: &'static str,
    },

    /// The source bucket lives on the other network; the caller must
    /// switch the active network explicitly rather than proceed
    /// silently.
    #[error("selected bucket is on {required}; switch the active network first")]
    NetworkSwitchRequired { required: Network },
}
