//! Pipeline handle state machine.
//!
//! A [`PipelineHandle`] is the long-lived object behind one slot. It owns
//! the slot's [`PipelineSource`] and a shared [`HandleRef`] holding the
//! lifecycle state; the registry keeps a clone of the `HandleRef` while a
//! leader is alive so the reaper can resolve it.

use super::error::{SupervisorError, SupervisorResult};
use super::reaper::ExitOutcome;
use super::registry::Registry;
use crate::launcher::{spawn_leader, LaunchError};
use crate::sources::{CaptureLink, ConfigureContext, PipelineSource};
use chrono::{DateTime, Utc};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use sc_protocol::process_models::{HandleState, SlotSummary};
use sc_protocol::slot_models::SlotKind;
use std::sync::Arc;
use tracing::{debug, info};

/// What a successful `stop()` did to the process group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    /// SIGINT sent; the handle is now awaiting termination.
    Interrupted,
    /// SIGKILL sent to a group that was already interrupted.
    Killed,
}

#[derive(Debug)]
struct HandleCore {
    slot: String,
    state: HandleState,
    leader: Option<Pid>,
    signal: Option<i32>,
    exit_code: Option<i32>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl HandleCore {
    fn new(slot: String) -> Self {
        Self {
            slot,
            state: HandleState::NotStarted,
            leader: None,
            signal: None,
            exit_code: None,
            started_at: None,
            finished_at: None,
        }
    }

    fn signal_group(&self, leader: Pid, signal: Signal) -> SupervisorResult<()> {
        match kill(Pid::from_raw(-leader.as_raw()), signal) {
            Ok(()) => Ok(()),
            // Group already gone; the reap will resolve the state.
            Err(Errno::ESRCH) => {
                debug!(slot = %self.slot, leader = leader.as_raw(), "process group already gone");
                Ok(())
            }
            Err(source) => Err(SupervisorError::Signal {
                slot: self.slot.clone(),
                source,
            }),
        }
    }
}

/// Shared view of one handle's lifecycle state.
///
/// Cloning is cheap; every clone refers to the same handle.
#[derive(Debug, Clone)]
pub struct HandleRef(Arc<Mutex<HandleCore>>);

impl HandleRef {
    fn new(slot: String) -> Self {
        Self(Arc::new(Mutex::new(HandleCore::new(slot))))
    }

    pub fn slot(&self) -> String {
        self.0.lock().slot.clone()
    }

    pub fn status(&self) -> HandleState {
        self.0.lock().state
    }

    /// Pid of the live leader, if any.
    pub fn leader_pid(&self) -> Option<Pid> {
        self.0.lock().leader
    }

    /// Terminating signal of the last run, for `ExitedWithSignal`.
    pub fn signal(&self) -> Option<i32> {
        self.0.lock().signal
    }

    /// Exit code of the last run, for `ExitedNormally` and `ExitedWithError`.
    pub fn exit_code(&self) -> Option<i32> {
        self.0.lock().exit_code
    }

    /// Interrupt the process group, or kill it if it was already interrupted.
    ///
    /// Never waits: the resulting terminal state arrives later via the
    /// reaper.
    pub fn stop(&self) -> SupervisorResult<StopAction> {
        let mut core = self.0.lock();
        match (core.state, core.leader) {
            (HandleState::Running, Some(leader)) => {
                core.signal_group(leader, Signal::SIGINT)?;
                core.state = HandleState::Interrupted;
                info!(slot = %core.slot, leader = leader.as_raw(), "interrupt sent to pipeline");
                Ok(StopAction::Interrupted)
            }
            (HandleState::Interrupted, Some(leader)) => {
                core.signal_group(leader, Signal::SIGKILL)?;
                info!(slot = %core.slot, leader = leader.as_raw(), "kill sent to pipeline");
                Ok(StopAction::Killed)
            }
            (state, _) => Err(SupervisorError::NotRunning {
                slot: core.slot.clone(),
                state,
            }),
        }
    }

    /// Record how the leader ended. Returns the new state.
    pub(crate) fn on_reaped(&self, outcome: ExitOutcome) -> HandleState {
        let mut core = self.0.lock();
        if !core.state.is_live() {
            debug!(slot = %core.slot, state = ?core.state, "reap for a handle that is not live");
            return core.state;
        }
        let (state, signal, exit_code) = match outcome {
            ExitOutcome::Signaled(signo) => (HandleState::ExitedWithSignal, Some(signo), None),
            ExitOutcome::Exited(0) => (HandleState::ExitedNormally, None, Some(0)),
            ExitOutcome::Exited(code) => (HandleState::ExitedWithError, None, Some(code)),
        };
        core.state = state;
        core.signal = signal;
        core.exit_code = exit_code;
        core.leader = None;
        core.finished_at = Some(Utc::now());
        info!(
            slot = %core.slot,
            state = ?state,
            signal = ?signal,
            exit_code = ?exit_code,
            "pipeline terminated"
        );
        state
    }
}

/// Runtime object for one configured pipeline across repeated runs.
pub struct PipelineHandle {
    core: HandleRef,
    source: Box<dyn PipelineSource>,
    registry: Arc<Registry>,
}

impl PipelineHandle {
    /// Create a handle in `NotStarted` for `source`, registering live
    /// leaders in `registry`.
    pub fn new(
        slot: impl Into<String>,
        source: Box<dyn PipelineSource>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            core: HandleRef::new(slot.into()),
            source,
            registry,
        }
    }

    /// Slot name.
    pub fn name(&self) -> String {
        self.core.slot()
    }

    pub fn kind(&self) -> SlotKind {
        self.source.kind()
    }

    /// Display name of the source variant.
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn status(&self) -> HandleState {
        self.core.status()
    }

    pub fn leader_pid(&self) -> Option<Pid> {
        self.core.leader_pid()
    }

    pub fn signal(&self) -> Option<i32> {
        self.core.signal()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.core.exit_code()
    }

    /// Shared state, as stored in the registry.
    pub fn handle_ref(&self) -> HandleRef {
        self.core.clone()
    }

    pub fn config_complete(&self) -> bool {
        self.source.config_complete()
    }

    pub fn config_report(&self) -> Vec<String> {
        self.source.config_report()
    }

    /// Apply operator settings to the source.
    pub fn configure(&mut self, context: &ConfigureContext) -> bool {
        self.source.configure(context)
    }

    /// Buffer file written by this slot, for captures.
    pub fn capture_link(&self) -> CaptureLink {
        CaptureLink {
            buffer: self.source.buffer().map(|p| p.to_path_buf()),
            complete: self.source.config_complete(),
        }
    }

    pub(crate) fn bind_captures(&mut self, captures: &[CaptureLink]) {
        self.source.bind_captures(captures);
    }

    /// Fork a leader for the source's current pipeline.
    ///
    /// Allowed from `NotStarted` and from any terminal state. On success the
    /// handle is `Running` and registered; a refused fork leaves it in
    /// `ForkFailed`, unregistered.
    ///
    /// # Errors
    ///
    /// - [`SupervisorError::AlreadyRunning`] while a leader is alive
    /// - [`SupervisorError::IncompleteConfig`] if the source is not ready
    /// - [`SupervisorError::Launch`] if the leader could not be created
    pub fn start(&self) -> SupervisorResult<Pid> {
        let mut core = self.core.0.lock();
        if core.state.is_live() {
            return Err(SupervisorError::AlreadyRunning {
                slot: core.slot.clone(),
                pid: core.leader.map(Pid::as_raw).unwrap_or_default(),
            });
        }

        let spec = self.source.pipeline();
        if !self.source.config_complete() || spec.is_empty() {
            return Err(SupervisorError::IncompleteConfig {
                slot: core.slot.clone(),
            });
        }

        match spawn_leader(&spec) {
            Ok(leader) => {
                core.state = HandleState::Running;
                core.leader = Some(leader);
                core.signal = None;
                core.exit_code = None;
                core.started_at = Some(Utc::now());
                core.finished_at = None;
                self.registry.insert(leader, self.core.clone());
                info!(slot = %core.slot, leader = leader.as_raw(), "slot started");
                Ok(leader)
            }
            Err(source) => {
                if matches!(source, LaunchError::Fork(_)) {
                    core.state = HandleState::ForkFailed;
                    core.leader = None;
                    core.signal = None;
                    core.exit_code = None;
                    core.finished_at = Some(Utc::now());
                }
                Err(SupervisorError::Launch {
                    slot: core.slot.clone(),
                    source,
                })
            }
        }
    }

    /// See [`HandleRef::stop`].
    pub fn stop(&self) -> SupervisorResult<StopAction> {
        self.core.stop()
    }

    /// Return a terminal handle to `NotStarted`, forgetting the last run.
    ///
    /// A no-op on a handle that never started.
    pub fn reset(&self) -> SupervisorResult<()> {
        let mut core = self.core.0.lock();
        match core.state {
            HandleState::NotStarted => Ok(()),
            state if state.is_live() => Err(SupervisorError::NotTerminal {
                slot: core.slot.clone(),
                state,
            }),
            _ => {
                core.state = HandleState::NotStarted;
                core.signal = None;
                core.exit_code = None;
                core.started_at = None;
                core.finished_at = None;
                Ok(())
            }
        }
    }

    /// Snapshot for dashboards.
    pub fn summary(&self) -> SlotSummary {
        let core = self.core.0.lock();
        SlotSummary {
            name: core.slot.clone(),
            kind: self.source.kind(),
            state: core.state,
            leader_pid: core.leader.map(Pid::as_raw),
            signal: core.signal,
            exit_code: core.exit_code,
            config_complete: self.source.config_complete(),
            config_report: self.source.config_report(),
            started_at: core.started_at,
            finished_at: core.finished_at,
        }
    }
}
