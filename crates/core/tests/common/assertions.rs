//! Wait helpers and event assertions.

use sc_core::supervisor::{PipelineHandle, Reaper};
use sc_protocol::ipc::Event;
use sc_protocol::process_models::HandleState;
use std::time::{Duration, Instant};

/// Reap until `handle` reaches a terminal state, panicking after `timeout`.
#[allow(dead_code)]
pub fn wait_for_terminal(
    handle: &PipelineHandle,
    reaper: &Reaper,
    timeout: Duration,
) -> HandleState {
    let deadline = Instant::now() + timeout;
    loop {
        reaper.reap();
        let state = handle.status();
        if state.is_terminal() {
            return state;
        }
        if Instant::now() >= deadline {
            panic!("slot '{}' still {:?} after {:?}", handle.name(), state, timeout);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Reap for `period` and check the handle never left `expected`.
#[allow(dead_code)]
pub fn assert_stays(
    handle: &PipelineHandle,
    reaper: &Reaper,
    expected: HandleState,
    period: Duration,
) {
    let deadline = Instant::now() + period;
    while Instant::now() < deadline {
        reaper.reap();
        assert_eq!(handle.status(), expected, "slot '{}' changed state", handle.name());
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// True if `events` contain a status update for `slot` in `state`.
#[allow(dead_code)]
pub fn has_status_update(events: &[Event], slot: &str, state: HandleState) -> bool {
    events.iter().any(|e| {
        matches!(
            e,
            Event::SlotStatusUpdate { slot: s, state: st, .. } if s == slot && *st == state
        )
    })
}

/// True if `events` contain a `SlotStarted` for `slot`.
#[allow(dead_code)]
pub fn has_started(events: &[Event], slot: &str) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::SlotStarted { slot: s, .. } if s == slot))
}
