//! Controlling-process console.
//!
//! The console owns every slot's [`PipelineHandle`] plus the shared
//! [`Registry`], applies [`Op`]s from a front end and reports what happens
//! as [`Event`]s. All handle transitions, including reap-driven ones, run on
//! the task driving [`Console::run`].

use crate::config::models::AppConfig;
use crate::sources::{CaptureLink, ConfigureContext, SourceFactory};
use crate::supervisor::{
    Notification, PipelineHandle, ReapReport, Registry, SignalRouter, StopAction,
    SupervisorError, SupervisorResult,
};
use anyhow::{Context, Result};
use sc_protocol::config_models::GlobalConfig;
use sc_protocol::ipc::{Event, Op};
use sc_protocol::process_models::{HandleState, SlotSummary};
use sc_protocol::slot_models::SlotRole;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Supervises every configured slot.
pub struct Console {
    global: GlobalConfig,
    registry: Arc<Registry>,
    slots: Vec<PipelineHandle>,
    events_tx: UnboundedSender<Event>,
    /// Last state published per slot, so each change is reported once.
    published: HashMap<String, HandleState>,
}

impl Console {
    /// Build a handle per slot, configure it from its slot file and bind
    /// consumers to the captures.
    pub fn new(config: AppConfig, events_tx: UnboundedSender<Event>) -> Self {
        let registry = Arc::new(Registry::new());
        let mut slots = Vec::with_capacity(config.slots.len());
        for slot in &config.slots {
            let source = SourceFactory::create(slot.kind, &config.global.tools);
            let mut handle = PipelineHandle::new(slot.name.clone(), source, Arc::clone(&registry));
            if !handle.configure(&ConfigureContext::from(slot)) {
                info!(slot = %slot.name, "slot configuration incomplete");
            }
            slots.push(handle);
        }

        let published = slots
            .iter()
            .map(|h| (h.name(), h.status()))
            .collect();

        let mut console = Self {
            global: config.global,
            registry,
            slots,
            events_tx,
            published,
        };
        console.wire_consumers();
        console
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    pub fn slot(&self, name: &str) -> Option<&PipelineHandle> {
        self.slots.iter().find(|h| h.name() == name)
    }

    pub fn slots(&self) -> &[PipelineHandle] {
        &self.slots
    }

    pub fn summaries(&self) -> Vec<SlotSummary> {
        self.slots.iter().map(PipelineHandle::summary).collect()
    }

    /// Reconfigure one slot and rebind the consumers.
    pub fn configure_slot(
        &mut self,
        name: &str,
        context: &ConfigureContext,
    ) -> SupervisorResult<bool> {
        let index = self.index_of(name)?;
        let complete = self.slots[index].configure(context);
        self.wire_consumers();
        Ok(complete)
    }

    /// Give every consumer the captures, in configuration order.
    fn wire_consumers(&mut self) {
        let captures: Vec<CaptureLink> = self
            .slots
            .iter()
            .filter(|h| h.kind().role() == SlotRole::Capture)
            .map(PipelineHandle::capture_link)
            .collect();
        for handle in &mut self.slots {
            if handle.kind().role() == SlotRole::Consumer {
                handle.bind_captures(&captures);
            }
        }
    }

    fn index_of(&self, name: &str) -> SupervisorResult<usize> {
        self.slots
            .iter()
            .position(|h| h.name() == name)
            .ok_or_else(|| SupervisorError::UnknownSlot(name.to_string()))
    }

    fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event);
    }

    /// Emit a status update for `index` if its state changed since the
    /// last one.
    fn publish(&mut self, index: usize) {
        let handle = &self.slots[index];
        let name = handle.name();
        let state = handle.status();
        if self.published.get(&name) == Some(&state) {
            return;
        }
        let event = Event::SlotStatusUpdate {
            slot: name.clone(),
            state,
            signal: handle.signal(),
            exit_code: handle.exit_code(),
        };
        self.published.insert(name, state);
        self.emit(event);
    }

    fn publish_all(&mut self) {
        for index in 0..self.slots.len() {
            self.publish(index);
        }
    }

    fn report_error(&self, slot: &str, error: &SupervisorError) {
        warn!(slot = %slot, error = %error, "slot request failed");
        self.emit(Event::SlotError {
            slot: slot.to_string(),
            error: error.to_string(),
        });
    }

    /// Apply one operation. Returns false once the console should stop.
    pub fn handle_op(&mut self, op: Op) -> bool {
        match op {
            Op::StartSlot { slot } => self.start_slot(&slot),
            Op::StopSlot { slot } => {
                let result = self.index_of(&slot).and_then(|i| self.slots[i].stop().map(|_| i));
                match result {
                    Ok(index) => self.publish(index),
                    Err(e) => self.report_error(&slot, &e),
                }
            }
            Op::ResetSlot { slot } => {
                let result = self.index_of(&slot).and_then(|i| self.slots[i].reset().map(|_| i));
                match result {
                    Ok(index) => self.publish(index),
                    Err(e) => self.report_error(&slot, &e),
                }
            }
            Op::StopAll => self.stop_all(),
            Op::GetDashboardState => self.emit(Event::DashboardState {
                slots: self.summaries(),
            }),
            Op::Shutdown => {
                self.stop_all();
                let stragglers = self.registry.shutdown_check();
                info!(stragglers = stragglers.len(), "console shutting down");
                self.emit(Event::ShuttingDown { interrupted: false });
                return false;
            }
        }
        true
    }

    fn start_slot(&mut self, slot: &str) {
        let index = match self.index_of(slot) {
            Ok(index) => index,
            Err(e) => return self.report_error(slot, &e),
        };
        match self.slots[index].start() {
            Ok(leader) => {
                self.emit(Event::SlotStarted {
                    slot: slot.to_string(),
                    leader_pid: leader.as_raw(),
                });
            }
            Err(e) => self.report_error(slot, &e),
        }
        // Covers Running as well as ForkFailed.
        self.publish(index);
    }

    /// Stop every live slot without waiting for them.
    fn stop_all(&mut self) {
        for index in 0..self.slots.len() {
            if !self.slots[index].status().is_live() {
                continue;
            }
            if let Err(e) = self.slots[index].stop() {
                let name = self.slots[index].name();
                self.report_error(&name, &e);
            }
            self.publish(index);
        }
    }

    fn handle_reaped(&mut self, reports: Vec<ReapReport>) {
        for report in reports {
            match report {
                ReapReport::Owned { slot, .. } => {
                    if let Ok(index) = self.index_of(&slot) {
                        self.publish(index);
                    }
                }
                ReapReport::Unexpected { pid, .. } => {
                    self.emit(Event::UnexpectedDeath { pid: pid.as_raw() });
                }
            }
        }
    }

    fn handle_interrupt(&mut self, stops: Vec<(String, SupervisorResult<StopAction>)>) {
        for (slot, result) in stops {
            if let Err(e) = result {
                self.report_error(&slot, &e);
            }
        }
        self.publish_all();
        let stragglers = self.registry.shutdown_check();
        info!(stragglers = stragglers.len(), "console interrupted");
        self.emit(Event::ShuttingDown { interrupted: true });
    }

    /// Drive the console until shutdown.
    ///
    /// Selects over OS notifications, incoming operations and a status poll
    /// tick. Returns when:
    /// - a `Shutdown` op is applied
    /// - SIGINT arrives (every live slot is stopped; children are not
    ///   waited for)
    /// - the op channel is closed and no leader is left alive
    pub async fn run(&mut self, mut ops: UnboundedReceiver<Op>) -> Result<()> {
        let mut router = SignalRouter::install(self.registry())
            .context("failed to install signal handlers")?;
        let period = Duration::from_millis(self.global.poll_interval_ms.max(1));
        let mut poll = tokio::time::interval(period);
        let mut ops_open = true;

        // Leaders may have died before the handlers were installed.
        let early = router.reap_now();
        self.handle_reaped(early);

        loop {
            select! {
                notification = router.next() => match notification {
                    Some(Notification::ChildExited(reports)) => self.handle_reaped(reports),
                    Some(Notification::Interrupted(stops)) => {
                        self.handle_interrupt(stops);
                        return Ok(());
                    }
                    None => anyhow::bail!("signal streams closed"),
                },
                op = ops.recv(), if ops_open => match op {
                    Some(op) => {
                        if !self.handle_op(op) {
                            return Ok(());
                        }
                    }
                    None => ops_open = false,
                },
                _ = poll.tick() => self.publish_all(),
            }

            if !ops_open && self.registry.is_empty() {
                self.publish_all();
                return Ok(());
            }
        }
    }
}
