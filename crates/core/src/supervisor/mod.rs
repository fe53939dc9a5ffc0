//! Pipeline supervision in the controlling process.
//!
//! - [`PipelineHandle`]: per-slot state machine (start, stop, reset)
//! - [`Registry`]: live leaders keyed by pid
//! - [`Reaper`]: non-blocking collection of terminated leaders
//! - [`SignalRouter`]: SIGCHLD / SIGINT handling on the ordinary task

pub mod error;
pub mod handle;
pub mod reaper;
pub mod registry;
pub mod router;

pub use error::{SupervisorError, SupervisorResult};
pub use handle::{HandleRef, PipelineHandle, StopAction};
pub use reaper::{ExitOutcome, ReapReport, Reaper};
pub use registry::Registry;
pub use router::{Notification, SignalRouter};
