//! # Bridge Module
//!
//! Everything that touches the external relay: the note protocol it
//! consumes and emits, and the confirmation monitor that scans the
//! destination ledger for its settlement marker.
//!
//! The relay itself is uncontrolled and out of scope — from this
//! backend's perspective it is a convention, not an API.

pub mod monitor;
pub mod note;

pub use monitor::{
    spawn_monitor, BridgeConfirmationStatus, BridgeMonitor, MonitorConfig, MonitorResult,
    SharedBridgeStatus,
};
pub use note::{
    fee_split, find_confirmation, ConfirmationNote, NoteError, TransferNote,
    CONFIRM_NOTE_PREFIX, TRANSFER_NOTE_PREFIX,
};
