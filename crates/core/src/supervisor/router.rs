//! OS notification routing for the controlling process.
//!
//! Raw signal handlers only record that SIGCHLD or SIGINT arrived (tokio's
//! signal driver does exactly that). Reaping, registry mutation and stop
//! dispatch happen here, on the task that awaits [`SignalRouter::next`].

use super::error::SupervisorResult;
use super::handle::StopAction;
use super::reaper::{ReapReport, Reaper};
use super::registry::Registry;
use std::sync::Arc;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

/// Something the controlling process must react to.
#[derive(Debug)]
pub enum Notification {
    /// One or more children terminated and were reaped.
    ChildExited(Vec<ReapReport>),
    /// The controlling process was interrupted; every registered handle has
    /// been stopped. The caller should exit without waiting for children.
    Interrupted(Vec<(String, SupervisorResult<StopAction>)>),
}

/// Turns SIGCHLD and SIGINT into [`Notification`]s.
pub struct SignalRouter {
    registry: Arc<Registry>,
    reaper: Reaper,
    child: Signal,
    interrupt: Signal,
}

impl SignalRouter {
    /// Install the signal streams. Must be called inside a tokio runtime.
    ///
    /// From here on SIGINT no longer terminates the process; it is reported
    /// through [`next`](Self::next) instead.
    pub fn install(registry: Arc<Registry>) -> std::io::Result<Self> {
        let child = signal(SignalKind::child())?;
        let interrupt = signal(SignalKind::interrupt())?;
        Ok(Self {
            reaper: Reaper::new(Arc::clone(&registry)),
            registry,
            child,
            interrupt,
        })
    }

    /// Wait for the next notification. `None` once the streams are closed.
    pub async fn next(&mut self) -> Option<Notification> {
        tokio::select! {
            received = self.child.recv() => {
                received?;
                Some(Notification::ChildExited(self.reaper.reap()))
            }
            received = self.interrupt.recv() => {
                received?;
                info!(live = self.registry.len(), "interrupt received, stopping every pipeline");
                Some(Notification::Interrupted(self.interrupt_all()))
            }
        }
    }

    /// Call `stop()` on every registered handle. Misuse is logged, not
    /// propagated.
    pub fn interrupt_all(&self) -> Vec<(String, SupervisorResult<StopAction>)> {
        let results = self.registry.stop_all();
        for (slot, result) in &results {
            if let Err(e) = result {
                warn!(slot = %slot, error = %e, "stop during interrupt failed");
            }
        }
        results
    }

    /// Reap synchronously, outside of a SIGCHLD notification.
    pub fn reap_now(&self) -> Vec<ReapReport> {
        self.reaper.reap()
    }
}
