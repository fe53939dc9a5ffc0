//! Registry of live pipeline leaders.
//!
//! The registry maps leader pids to the handle that started them. `start()`
//! inserts, the reaper removes; nothing else mutates it. It is an explicit
//! object owned by the controlling process and shared by `Arc`.

use super::error::SupervisorResult;
use super::handle::{HandleRef, StopAction};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

/// Live leaders, keyed by pid.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<Pid, HandleRef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, pid: Pid, handle: HandleRef) {
        let previous = self.entries.lock().insert(pid, handle);
        if let Some(previous) = previous {
            warn!(pid = pid.as_raw(), slot = %previous.slot(), "replaced stale registry entry");
        }
    }

    /// Remove and return the handle owning `pid`.
    pub fn take(&self, pid: Pid) -> Option<HandleRef> {
        self.entries.lock().remove(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.lock().contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Handles of every registered leader.
    pub fn live_handles(&self) -> Vec<HandleRef> {
        self.entries.lock().values().cloned().collect()
    }

    /// `stop()` every registered handle.
    ///
    /// The registry lock is released before any signal is sent.
    pub fn stop_all(&self) -> Vec<(String, SupervisorResult<StopAction>)> {
        self.live_handles()
            .into_iter()
            .map(|handle| (handle.slot(), handle.stop()))
            .collect()
    }

    /// Leaders still registered at shutdown. Each one is logged.
    pub fn shutdown_check(&self) -> Vec<Pid> {
        let mut entries: Vec<(Pid, HandleRef)> = self
            .entries
            .lock()
            .iter()
            .map(|(pid, handle)| (*pid, handle.clone()))
            .collect();
        entries.sort_by_key(|(pid, _)| pid.as_raw());
        for (pid, handle) in &entries {
            warn!(pid = pid.as_raw(), slot = %handle.slot(), "leader still registered at shutdown");
        }
        entries.into_iter().map(|(pid, _)| pid).collect()
    }
}
