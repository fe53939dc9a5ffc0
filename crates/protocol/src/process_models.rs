//! Runtime handle state models.
//!
//! This module defines the lifecycle state of a pipeline handle and the
//! summary a front end renders for each configured slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::slot_models::SlotKind;

/// Lifecycle state of a pipeline handle.
///
/// Normal progression:
/// NotStarted -> Running -> ExitedNormally
///
/// Other transitions:
/// - Running -> Interrupted after a first `stop()`
/// - Running/Interrupted -> ExitedWithSignal / ExitedWithError on reap
/// - NotStarted -> ForkFailed when the leader could not be created
///
/// Every `Exited*` state and `ForkFailed` is terminal; `reset()` brings a
/// terminal handle back to NotStarted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandleState {
    /// Never started, or reset after a previous run.
    NotStarted,

    /// Leader forked and registered.
    Running,

    /// Interrupt sent to the process group; waiting for it to die.
    Interrupted,

    /// Leader exited with status 0.
    ExitedNormally,

    /// Leader was terminated by a signal.
    ExitedWithSignal,

    /// Leader exited with a non-zero status.
    ExitedWithError,

    /// The OS refused to create the leader process.
    ForkFailed,
}

impl HandleState {
    /// True for states a handle can only leave through `reset()`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            HandleState::ExitedNormally
                | HandleState::ExitedWithSignal
                | HandleState::ExitedWithError
                | HandleState::ForkFailed
        )
    }

    /// True while a leader process exists for this handle.
    pub fn is_live(self) -> bool {
        matches!(self, HandleState::Running | HandleState::Interrupted)
    }

    /// Human readable label for status displays.
    pub fn label(self) -> &'static str {
        match self {
            HandleState::NotStarted => "Not started",
            HandleState::Running => "Running",
            HandleState::Interrupted => "Awaiting termination",
            HandleState::ExitedNormally => "Exited normally",
            HandleState::ExitedWithSignal => "Terminated",
            HandleState::ExitedWithError => "Exited with error",
            HandleState::ForkFailed => "Fork failed",
        }
    }
}

/// Snapshot of one configured slot, as shown on a dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct SlotSummary {
    /// Slot name from configuration.
    pub name: String,

    /// Which pipeline variant drives this slot.
    pub kind: SlotKind,

    /// Current lifecycle state.
    pub state: HandleState,

    /// Leader pid while the pipeline is live.
    pub leader_pid: Option<i32>,

    /// Terminating signal number, for ExitedWithSignal.
    pub signal: Option<i32>,

    /// Exit code, for ExitedNormally and ExitedWithError.
    pub exit_code: Option<i32>,

    /// Whether the slot has everything it needs to start.
    pub config_complete: bool,

    /// Human readable configuration lines.
    pub config_report: Vec<String>,

    /// When the current (or last) leader was started.
    pub started_at: Option<DateTime<Utc>>,

    /// When the last leader was reaped.
    pub finished_at: Option<DateTime<Utc>>,
}
