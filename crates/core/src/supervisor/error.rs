//! Error types for pipeline supervision.

use crate::launcher::LaunchError;
use nix::errno::Errno;
use sc_protocol::process_models::HandleState;
use thiserror::Error;

/// Caller misuse and OS failures reported by a pipeline handle.
///
/// None of these are fatal to the controlling process; callers log them
/// and carry on.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// `start()` on a slot whose configuration is incomplete.
    #[error("Slot '{slot}' cannot start: configuration incomplete")]
    IncompleteConfig { slot: String },

    /// `start()` while a leader is still alive.
    #[error("Slot '{slot}' is already running (leader {pid})")]
    AlreadyRunning { slot: String, pid: i32 },

    /// `stop()` on a slot with no live leader.
    #[error("Slot '{slot}' is not running ({})", state.label())]
    NotRunning { slot: String, state: HandleState },

    /// `reset()` while a leader is still alive.
    #[error("Slot '{slot}' cannot be reset while {}", state.label())]
    NotTerminal { slot: String, state: HandleState },

    /// The leader could not be created.
    #[error("Slot '{slot}' failed to launch: {source}")]
    Launch {
        slot: String,
        #[source]
        source: LaunchError,
    },

    /// Signalling the process group failed.
    #[error("Failed to signal process group of slot '{slot}': {source}")]
    Signal {
        slot: String,
        #[source]
        source: Errno,
    },

    /// No slot with this name is configured.
    #[error("Unknown slot '{0}'")]
    UnknownSlot(String),
}

/// Type alias for Result with SupervisorError.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
