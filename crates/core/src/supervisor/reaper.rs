//! Reaping of terminated leaders in the controlling process.

use super::registry::Registry;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use sc_protocol::process_models::HandleState;
use std::sync::Arc;
use tracing::{debug, warn};

/// How a reaped process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with this status code.
    Exited(i32),
    /// Killed by this signal number.
    Signaled(i32),
}

impl ExitOutcome {
    fn from_status(status: WaitStatus) -> Option<(Pid, Self)> {
        match status {
            WaitStatus::Exited(pid, code) => Some((pid, ExitOutcome::Exited(code))),
            WaitStatus::Signaled(pid, signal, _) => {
                Some((pid, ExitOutcome::Signaled(signal as i32)))
            }
            _ => None,
        }
    }
}

/// One child collected by [`Reaper::reap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapReport {
    /// A registered leader; its handle is now in `state`.
    Owned {
        pid: Pid,
        slot: String,
        state: HandleState,
        outcome: ExitOutcome,
    },
    /// A child no handle owns.
    Unexpected { pid: Pid, outcome: ExitOutcome },
}

/// Collects terminated children and dispatches them to their handles.
#[derive(Debug, Clone)]
pub struct Reaper {
    registry: Arc<Registry>,
}

impl Reaper {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Reap every child that has terminated so far, without blocking.
    ///
    /// One child-exit notification may stand for several deaths, so this
    /// keeps calling `waitpid(-1, WNOHANG)` until nothing is left.
    pub fn reap(&self) -> Vec<ReapReport> {
        let mut reports = Vec::new();
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) => break,
                Ok(status) => {
                    if let Some((pid, outcome)) = ExitOutcome::from_status(status) {
                        reports.push(self.dispatch(pid, outcome));
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => break,
                Err(errno) => {
                    warn!(%errno, "waitpid failed");
                    break;
                }
            }
        }
        reports
    }

    fn dispatch(&self, pid: Pid, outcome: ExitOutcome) -> ReapReport {
        match self.registry.take(pid) {
            Some(handle) => {
                let state = handle.on_reaped(outcome);
                debug!(pid = pid.as_raw(), ?outcome, "reaped leader");
                ReapReport::Owned {
                    pid,
                    slot: handle.slot(),
                    state,
                    outcome,
                }
            }
            None => {
                warn!(pid = pid.as_raw(), ?outcome, "unexpected death of unregistered child");
                ReapReport::Unexpected { pid, outcome }
            }
        }
    }
}
