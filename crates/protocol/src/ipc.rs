//! Front end / console communication protocol.
//!
//! This module defines the message types exchanged between a front end
//! (GUI, TUI, or the CLI's event printer) and the console that supervises
//! the pipelines.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the front end to the console
//! - `Event`: Status updates sent from the console to the front end
//!
//! Communication is asynchronous and channel-based; every state change of a
//! slot is observed later through an `Event`, never as a return value.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::process_models::{HandleState, SlotSummary};

/// Operations sent from a front end to the console.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "startSlot",
///   "payload": { "slot": "camera-1" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Launch the slot's pipeline.
    StartSlot { slot: String },

    /// Interrupt the slot's process group; a second stop kills it.
    StopSlot { slot: String },

    /// Return a terminated slot to the not-started state.
    ResetSlot { slot: String },

    /// Stop every live slot.
    StopAll,

    /// Request a summary of every slot.
    GetDashboardState,

    /// Stop every live slot and end the console loop.
    Shutdown,
}

/// Events sent from the console to a front end.
///
/// ```json
/// {
///   "type": "slotStatusUpdate",
///   "payload": {
///     "slot": "camera-1",
///     "state": "EXITED_WITH_SIGNAL",
///     "signal": 9,
///     "exit_code": null
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A leader process was forked for the slot.
    SlotStarted { slot: String, leader_pid: i32 },

    /// A slot's state changed.
    SlotStatusUpdate {
        slot: String,
        state: HandleState,
        signal: Option<i32>,
        exit_code: Option<i32>,
    },

    /// A request could not be honoured (misuse or launch failure).
    SlotError { slot: String, error: String },

    /// A child was reaped that no slot owns.
    UnexpectedDeath { pid: i32 },

    /// Reply to `GetDashboardState`.
    DashboardState { slots: Vec<SlotSummary> },

    /// The console loop is ending. `interrupted` is set when the
    /// controlling process received an interrupt.
    ShuttingDown { interrupted: bool },
}
