//! # Bridge Note Codec
//!
//! The relay consumes no API — its entire instruction set is a text
//! convention layered on transaction notes. This module is the only
//! place that convention exists: strict encode/decode with typed
//! results, so the stringly-typed wire format cannot leak into transfer
//! logic.
//!
//! ## Wire Format
//!
//! Transfer note (source ledger, consumed by the relay):
//!
//! ```text
//! aramid-transfer/v1:j{"destinationNetwork":416101,...,"sourceAmount":99900000}
//! ```
//!
//! Confirmation note (destination ledger, emitted by the relay):
//!
//! ```text
//! aramid-confirm/v1:j{"sourceTxId":"..."}
//! ```
//!
//! The prefix is immediately followed by compact JSON, no separator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal prefix of a transfer-intent note.
pub const TRANSFER_NOTE_PREFIX: &str = "aramid-transfer/v1:j";

/// Literal prefix of a relay confirmation note. Also the marker the
/// confirmation monitor scans destination blocks for.
pub const CONFIRM_NOTE_PREFIX: &str = "aramid-confirm/v1:j";

/// Fixed `note` field value inside a transfer note.
const TRANSFER_NOTE_TAG: &str = "aramid";

/// Codec failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NoteError {
    /// The expected literal prefix was missing.
    #[error("missing note prefix {0:?}")]
    MissingPrefix(&'static str),

    /// The JSON fragment after the prefix did not parse.
    #[error("malformed note payload: {0}")]
    MalformedPayload(String),

    /// Amount of zero cannot be bridged.
    #[error("bridge amount must be positive")]
    ZeroAmount,
}

/// The instruction payload the relay reads from a source-ledger note.
///
/// Field order matters only for humans reading explorers; the relay
/// parses JSON. `source_amount` always equals `destination_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferNote {
    /// Numeric chain id of the destination network.
    pub destination_network: u64,

    /// Recipient address on the destination ledger.
    pub destination_address: String,

    /// Token identifier on the destination ledger.
    pub destination_token: String,

    /// Relay fee in base units, taken out of the sent amount.
    pub fee_amount: u64,

    /// Amount delivered on the destination ledger, base units.
    pub destination_amount: u64,

    /// Fixed protocol tag.
    pub note: String,

    /// Amount the relay should match on the source side; equals
    /// `destination_amount`.
    pub source_amount: u64,
}

impl TransferNote {
    /// Build a transfer note for `amount` base units, applying the relay
    /// fee law: `fee = floor(amount / 1000)`, destination gets the rest.
    pub fn for_amount(
        destination_network: u64,
        destination_address: &str,
        destination_token: &str,
        amount: u64,
    ) -> Result<Self, NoteError> {
        if amount == 0 {
            return Err(NoteError::ZeroAmount);
        }

        let (fee_amount, destination_amount) = fee_split(amount);

        Ok(Self {
            destination_network,
            destination_address: destination_address.to_string(),
            destination_token: destination_token.to_string(),
            fee_amount,
            destination_amount,
            note: TRANSFER_NOTE_TAG.to_string(),
            source_amount: destination_amount,
        })
    }

    /// Encode to the wire string: prefix + compact JSON, no separator.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("note serialization is infallible");
        format!("{}{}", TRANSFER_NOTE_PREFIX, json)
    }

    /// Strict decode of a full transfer note string.
    pub fn decode(raw: &str) -> Result<Self, NoteError> {
        let json = raw
            .strip_prefix(TRANSFER_NOTE_PREFIX)
            .ok_or(NoteError::MissingPrefix(TRANSFER_NOTE_PREFIX))?;
        serde_json::from_str(json).map_err(|e| NoteError::MalformedPayload(e.to_string()))
    }
}

/// The confirmation payload the relay writes on the destination ledger.
///
/// Unknown extra fields are tolerated; `sourceTxId` is the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationNote {
    /// Transaction id of the source-ledger leg being confirmed.
    pub source_tx_id: String,
}

impl ConfirmationNote {
    /// Encode to the wire string (used by tests and tooling; the relay
    /// writes these in production).
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(self).expect("note serialization is infallible");
        format!("{}{}", CONFIRM_NOTE_PREFIX, json)
    }

    /// Strict decode of a full confirmation note string.
    pub fn decode(raw: &str) -> Result<Self, NoteError> {
        let json = raw
            .strip_prefix(CONFIRM_NOTE_PREFIX)
            .ok_or(NoteError::MissingPrefix(CONFIRM_NOTE_PREFIX))?;
        serde_json::from_str(json).map_err(|e| NoteError::MalformedPayload(e.to_string()))
    }
}

/// Scan arbitrary note text for an embedded confirmation payload.
///
/// The marker may sit anywhere in the note; the JSON fragment that
/// follows it is parsed up to the end of the first complete value, so
/// trailing text after the payload does not break detection.
pub fn find_confirmation(note_text: &str) -> Option<ConfirmationNote> {
    let index = note_text.find(CONFIRM_NOTE_PREFIX)?;
    let fragment = &note_text[index + CONFIRM_NOTE_PREFIX.len()..];

    serde_json::Deserializer::from_str(fragment)
        .into_iter::<ConfirmationNote>()
        .next()?
        .ok()
}

/// The relay fee law: `fee = floor(amount * 0.001)` in integer base
/// units, destination amount is the remainder. The two always sum back
/// to the input amount.
pub fn fee_split(amount: u64) -> (u64, u64) {
    let fee = amount / 1000;
    (fee, amount - fee)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_law_holds() {
        let (fee, dest) = fee_split(100_000_000);
        assert_eq!(fee, 100_000);
        assert_eq!(dest, 99_900_000);

        for amount in [1u64, 999, 1000, 1001, 123_456_789] {
            let (fee, dest) = fee_split(amount);
            assert_eq!(fee, amount / 1000);
            assert_eq!(fee + dest, amount);
        }
    }

    #[test]
    fn transfer_note_wire_format_is_exact() {
        let note = TransferNote::for_amount(416101, "DEST", "302189", 100_000_000)
            .expect("note");

        assert_eq!(
            note.encode(),
            "aramid-transfer/v1:j{\"destinationNetwork\":416101,\
             \"destinationAddress\":\"DEST\",\"destinationToken\":\"302189\",\
             \"feeAmount\":100000,\"destinationAmount\":99900000,\
             \"note\":\"aramid\",\"sourceAmount\":99900000}"
        );
    }

    #[test]
    fn transfer_note_round_trips() {
        let note = TransferNote::for_amount(416001, "ADDR", "12345", 5000).expect("note");
        assert_eq!(TransferNote::decode(&note.encode()), Ok(note));
    }

    #[test]
    fn zero_amount_is_rejected() {
        assert_eq!(
            TransferNote::for_amount(416001, "ADDR", "12345", 0),
            Err(NoteError::ZeroAmount)
        );
    }

    #[test]
    fn decode_requires_exact_prefix() {
        assert!(matches!(
            TransferNote::decode("aramid-transfer/v2:j{}"),
            Err(NoteError::MissingPrefix(_))
        ));
        assert!(matches!(
            ConfirmationNote::decode("confirm:{\"sourceTxId\":\"X\"}"),
            Err(NoteError::MissingPrefix(_))
        ));
    }

    #[test]
    fn decode_rejects_malformed_payload() {
        assert!(matches!(
            TransferNote::decode("aramid-transfer/v1:jnot-json"),
            Err(NoteError::MalformedPayload(_))
        ));
        assert!(matches!(
            ConfirmationNote::decode("aramid-confirm/v1:j{\"sourceTxId\":7}"),
            Err(NoteError::MalformedPayload(_))
        ));
    }

    #[test]
    fn find_confirmation_locates_embedded_marker() {
        let text = format!(
            "relay batch 7 {} trailing text",
            ConfirmationNote { source_tx_id: "SRC-TX".into() }.encode()
        );
        let found = find_confirmation(&text).expect("embedded payload");
        assert_eq!(found.source_tx_id, "SRC-TX");
    }

    #[test]
    fn find_confirmation_tolerates_extra_fields() {
        let text = "aramid-confirm/v1:j{\"sourceTxId\":\"A\",\"round\":12}";
        assert_eq!(
            find_confirmation(text).map(|c| c.source_tx_id),
            Some("A".to_string())
        );
    }

    #[test]
    fn find_confirmation_ignores_unrelated_notes() {
        assert!(find_confirmation("just a memo").is_none());
        assert!(find_confirmation("aramid-transfer/v1:j{}").is_none());
    }
}
