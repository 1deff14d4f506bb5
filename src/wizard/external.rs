//! # External Transfer Wizard
//!
//! Sends tokens to a third-party recipient.
//!
//! ## Steps
//!
//! ```text
//! select-token → enter-amount → select-recipient → select-destination
//!              → confirm → submit
//! ```
//!
//! Two gates the internal wizard does not have: the recipient address
//! must pass syntax validation before a destination can be chosen, and
//! the destination bucket requires the recipient's opt-in (probed by
//! the session layer, passed into the transition).
//!
//! After a cross-network submission the wizard is *not* reset: it holds
//! in `awaiting-bridge` showing monitor progress, and auto-resets a few
//! seconds after confirmation is observed (or on explicit reset).

use serde::Serialize;

use crate::buckets::{is_transfer_allowed, Bucket, BucketId};
use crate::ledger::validate_address;
use crate::services::OptInStatus;

use super::WizardError;

/// The external wizard's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalWizard {
    /// Choosing which bucket to send from.
    SelectToken,

    /// Token chosen; entering the amount.
    EnterAmount { token: BucketId },

    /// Amount fixed; entering the recipient address.
    SelectRecipient { token: BucketId, amount: u64 },

    /// Recipient syntax-validated; choosing their destination bucket.
    SelectDestination {
        token: BucketId,
        amount: u64,
        recipient: String,
    },

    /// Destination validated (policy + opt-in); awaiting confirmation.
    Confirm {
        token: BucketId,
        amount: u64,
        recipient: String,
        destination: BucketId,
    },

    /// Cross-network leg submitted; holding until the bridge confirms.
    AwaitingBridge {
        token: BucketId,
        amount: u64,
        recipient: String,
        destination: BucketId,
        source_tx_id: String,
    },
}

impl Default for ExternalWizard {
    fn default() -> Self {
        ExternalWizard::SelectToken
    }
}

impl ExternalWizard {
    /// Step name as shown to clients.
    pub fn step_name(&self) -> &'static str {
        match self {
            ExternalWizard::SelectToken => "select-token",
            ExternalWizard::EnterAmount { .. } => "enter-amount",
            ExternalWizard::SelectRecipient { .. } => "select-recipient",
            ExternalWizard::SelectDestination { .. } => "select-destination",
            ExternalWizard::Confirm { .. } => "confirm",
            ExternalWizard::AwaitingBridge { .. } => "awaiting-bridge",
        }
    }

    /// Choose the source bucket; requires a positive balance.
    pub fn select_token(&mut self, bucket: &Bucket) -> Result<(), WizardError> {
        if !matches!(self, ExternalWizard::SelectToken) {
            return Err(self.wrong_step("select-token"));
        }
        if bucket.balance == 0 {
            return Err(WizardError::EmptyBucket(bucket.id));
        }

        *self = ExternalWizard::EnterAmount { token: bucket.id };
        Ok(())
    }

    /// Enter the amount to send.
    pub fn enter_amount(&mut self, amount: u64, available: u64) -> Result<(), WizardError> {
        let ExternalWizard::EnterAmount { token } = *self else {
            return Err(self.wrong_step("enter-amount"));
        };

        if amount == 0 {
            return Err(WizardError::ZeroAmount);
        }
        if amount > available {
            return Err(WizardError::InsufficientBalance { amount, available });
        }

        *self = ExternalWizard::SelectRecipient { token, amount };
        Ok(())
    }

    /// Set (or change) the recipient address. Syntax validation happens
    /// here, before any network probe is worth issuing; changing the
    /// address from a later step drops back to `select-destination`
    /// since the opt-in state must be recomputed.
    pub fn set_recipient(&mut self, address: &str) -> Result<(), WizardError> {
        let (token, amount) = match self {
            ExternalWizard::SelectRecipient { token, amount }
            | ExternalWizard::SelectDestination { token, amount, .. }
            | ExternalWizard::Confirm { token, amount, .. } => (*token, *amount),
            _ => return Err(self.wrong_step("select-recipient")),
        };

        validate_address(address).map_err(|e| WizardError::InvalidAddress(e.to_string()))?;

        *self = ExternalWizard::SelectDestination {
            token,
            amount,
            recipient: address.to_string(),
        };
        Ok(())
    }

    /// Choose the recipient's destination bucket. Gated on the
    /// compatibility policy *and* the probed opt-in state.
    pub fn select_destination(
        &mut self,
        destination: BucketId,
        opt_in: &OptInStatus,
    ) -> Result<(), WizardError> {
        let ExternalWizard::SelectDestination { token, amount, recipient } = self.clone() else {
            return Err(self.wrong_step("select-destination"));
        };

        if !is_transfer_allowed(token, destination) {
            return Err(WizardError::NotAllowed {
                from: token,
                to: destination,
            });
        }
        if !opt_in.opted_in {
            return Err(WizardError::NotOptedIn(destination));
        }

        *self = ExternalWizard::Confirm {
            token,
            amount,
            recipient,
            destination,
        };
        Ok(())
    }

    /// The collected transfer, available only at `confirm`.
    pub fn submission(&self) -> Result<(BucketId, BucketId, String, u64), WizardError> {
        match self {
            ExternalWizard::Confirm {
                token,
                amount,
                recipient,
                destination,
            } => Ok((*token, *destination, recipient.clone(), *amount)),
            _ => Err(self.wrong_step("confirm")),
        }
    }

    /// After a cross-network submission: hold the wizard visible while
    /// the monitor runs.
    pub fn begin_awaiting(&mut self, source_tx_id: &str) -> Result<(), WizardError> {
        let ExternalWizard::Confirm { token, amount, recipient, destination } = self.clone()
        else {
            return Err(self.wrong_step("confirm"));
        };

        *self = ExternalWizard::AwaitingBridge {
            token,
            amount,
            recipient,
            destination,
            source_tx_id: source_tx_id.to_string(),
        };
        Ok(())
    }

    /// Whether the wizard is holding for a bridge confirmation.
    pub fn is_awaiting_bridge(&self) -> bool {
        matches!(self, ExternalWizard::AwaitingBridge { .. })
    }

    /// Reset all fields back to the first step.
    pub fn reset(&mut self) {
        *self = ExternalWizard::SelectToken;
    }

    /// Serializable snapshot for the API.
    pub fn view(&self) -> ExternalWizardView {
        let (token, amount, recipient, destination, source_tx_id) = match self {
            ExternalWizard::SelectToken => (None, None, None, None, None),
            ExternalWizard::EnterAmount { token } => (Some(*token), None, None, None, None),
            ExternalWizard::SelectRecipient { token, amount } => {
                (Some(*token), Some(*amount), None, None, None)
            }
            ExternalWizard::SelectDestination { token, amount, recipient } => {
                (Some(*token), Some(*amount), Some(recipient.clone()), None, None)
            }
            ExternalWizard::Confirm { token, amount, recipient, destination } => (
                Some(*token),
                Some(*amount),
                Some(recipient.clone()),
                Some(*destination),
                None,
            ),
            ExternalWizard::AwaitingBridge {
                token,
                amount,
                recipient,
                destination,
                source_tx_id,
            } => (
                Some(*token),
                Some(*amount),
                Some(recipient.clone()),
                Some(*destination),
                Some(source_tx_id.clone()),
            ),
        };

        ExternalWizardView {
            step: self.step_name(),
            token,
            amount,
            recipient,
            destination,
            source_tx_id,
        }
    }

    fn wrong_step(&self, expected: &'static str) -> WizardError {
        WizardError::WrongStep {
            expected,
            actual: self.step_name(),
        }
    }
}

/// Snapshot of the external wizard for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalWizardView {
    /// Current step name.
    pub step: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<BucketId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<BucketId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_tx_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::encode_address;
    use BucketId::*;

    fn opted_in() -> OptInStatus {
        OptInStatus {
            opted_in: true,
            balance: Some(0),
            error: None,
        }
    }

    fn not_opted_in() -> OptInStatus {
        OptInStatus {
            opted_in: false,
            balance: None,
            error: Some("account unknown".into()),
        }
    }

    fn recipient() -> String {
        encode_address(&[3u8; 32])
    }

    fn wizard_at_select_destination() -> ExternalWizard {
        let mut wizard = ExternalWizard::default();
        wizard
            .select_token(&Bucket::new(AlgorandNative, 1000))
            .unwrap();
        wizard.enter_amount(250, 1000).unwrap();
        wizard.set_recipient(&recipient()).unwrap();
        wizard
    }

    #[test]
    fn happy_path_reaches_confirm() {
        let mut wizard = wizard_at_select_destination();
        wizard
            .select_destination(VoiNative, &opted_in())
            .expect("destination");

        assert_eq!(wizard.step_name(), "confirm");
        let (token, destination, recipient_addr, amount) = wizard.submission().unwrap();
        assert_eq!(token, AlgorandNative);
        assert_eq!(destination, VoiNative);
        assert_eq!(recipient_addr, recipient());
        assert_eq!(amount, 250);
    }

    #[test]
    fn invalid_address_blocks_select_recipient() {
        let mut wizard = ExternalWizard::default();
        wizard
            .select_token(&Bucket::new(AlgorandNative, 1000))
            .unwrap();
        wizard.enter_amount(10, 1000).unwrap();

        // Wrong length.
        assert!(matches!(
            wizard.set_recipient("TOOSHORT"),
            Err(WizardError::InvalidAddress(_))
        ));
        // Wrong charset (base32 has no '1').
        let bad_charset = format!("1{}", "A".repeat(57));
        assert!(matches!(
            wizard.set_recipient(&bad_charset),
            Err(WizardError::InvalidAddress(_))
        ));
        assert_eq!(wizard.step_name(), "select-recipient");
    }

    #[test]
    fn confirm_is_unreachable_without_opt_in() {
        let mut wizard = wizard_at_select_destination();
        assert_eq!(
            wizard.select_destination(VoiNative, &not_opted_in()),
            Err(WizardError::NotOptedIn(VoiNative))
        );
        assert_eq!(wizard.step_name(), "select-destination");
        assert!(wizard.submission().is_err());
    }

    #[test]
    fn disallowed_destination_is_rejected() {
        let mut wizard = wizard_at_select_destination();
        // Cross-network into contract-managed is never allowed, even
        // for an opted-in recipient.
        assert_eq!(
            wizard.select_destination(VoiContract, &opted_in()),
            Err(WizardError::NotAllowed {
                from: AlgorandNative,
                to: VoiContract
            })
        );
    }

    #[test]
    fn changing_recipient_drops_back_from_confirm() {
        let mut wizard = wizard_at_select_destination();
        wizard.select_destination(VoiNative, &opted_in()).unwrap();
        assert_eq!(wizard.step_name(), "confirm");

        let other = encode_address(&[4u8; 32]);
        wizard.set_recipient(&other).expect("recipient change");
        // Opt-in must be re-proven for the new recipient.
        assert_eq!(wizard.step_name(), "select-destination");
    }

    #[test]
    fn awaiting_bridge_holds_until_reset() {
        let mut wizard = wizard_at_select_destination();
        wizard.select_destination(VoiNative, &opted_in()).unwrap();
        wizard.begin_awaiting("SRC-TX").expect("awaiting");

        assert!(wizard.is_awaiting_bridge());
        assert_eq!(wizard.view().source_tx_id.as_deref(), Some("SRC-TX"));

        wizard.reset();
        assert_eq!(wizard.step_name(), "select-token");
    }

    #[test]
    fn submission_is_only_available_at_confirm() {
        let wizard = ExternalWizard::default();
        assert!(matches!(
            wizard.submission(),
            Err(WizardError::WrongStep { .. })
        ));
    }
}
