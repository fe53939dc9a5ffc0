//! Console loop tests: ops in, events out, with real processes.

mod common;

use common::*;
use nix::sys::signal::{kill, Signal};
use nix::unistd::getpid;
use sc_core::config::load_config;
use sc_core::console::Console;
use sc_core::supervisor::Reaper;
use sc_protocol::ipc::{Event, Op};
use sc_protocol::process_models::HandleState;
use serial_test::serial;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

fn drain(rx: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_for_event<F>(rx: &mut UnboundedReceiver<Event>, mut pred: F) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let mut seen = Vec::new();
    let deadline = tokio::time::Instant::now() + REAP_TIMEOUT;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(event)) => {
                let done = pred(&event);
                seen.push(event);
                if done {
                    return seen;
                }
            }
            Ok(None) => panic!("event channel closed; saw {seen:?}"),
            Err(_) => panic!("timed out waiting for event; saw {seen:?}"),
        }
    }
}

const COUNT_SLOT: &str = r#"name: count
kind: command
stages:
  - executable: echo
    args: ["hello"]
  - executable: wc
    args: ["-c"]
"#;

const FAIL_SLOT: &str = r#"name: fail
kind: command
stages:
  - executable: "false"
"#;

const SLEEP_SLOT: &str = r#"name: sleeper
kind: command
stages:
  - executable: sleep
    args: ["100"]
"#;

#[tokio::test]
#[serial]
async fn test_console_runs_until_slots_finish() {
    let project = create_test_project(&[("count.yaml", COUNT_SLOT), ("fail.yaml", FAIL_SLOT)])
        .expect("Failed to create project");
    let config = load_config(project.path()).await.expect("Failed to load config");

    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);

    ops_tx.send(Op::StartSlot { slot: "count".to_string() }).unwrap();
    ops_tx.send(Op::StartSlot { slot: "fail".to_string() }).unwrap();
    drop(ops_tx);

    tokio::time::timeout(REAP_TIMEOUT, console.run(ops_rx))
        .await
        .expect("console did not finish")
        .expect("console failed");

    let events = drain(&mut events_rx);
    assert!(has_started(&events, "count"));
    assert!(has_started(&events, "fail"));
    assert!(has_status_update(&events, "count", HandleState::Running));
    assert!(has_status_update(&events, "count", HandleState::ExitedNormally));
    assert!(has_status_update(&events, "fail", HandleState::ExitedWithError));
    assert!(console.registry().is_empty());
}

#[tokio::test]
#[serial]
async fn test_console_stop_and_dashboard() {
    let project = create_test_project(&[("sleeper.yaml", SLEEP_SLOT)]).unwrap();
    let config = load_config(project.path()).await.unwrap();

    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);
    let runner = tokio::spawn(async move {
        console.run(ops_rx).await.map(|_| console)
    });

    ops_tx.send(Op::StartSlot { slot: "sleeper".to_string() }).unwrap();
    wait_for_event(&mut events_rx, |e| matches!(e, Event::SlotStarted { .. })).await;
    tokio::time::sleep(SETTLE).await;

    ops_tx.send(Op::StopSlot { slot: "sleeper".to_string() }).unwrap();
    let seen = wait_for_event(&mut events_rx, |e| {
        matches!(e, Event::SlotStatusUpdate { state, .. } if state.is_terminal())
    })
    .await;
    assert!(has_status_update(&seen, "sleeper", HandleState::Interrupted));
    assert!(has_status_update(&seen, "sleeper", HandleState::ExitedWithSignal));

    ops_tx.send(Op::GetDashboardState).unwrap();
    let seen = wait_for_event(&mut events_rx, |e| matches!(e, Event::DashboardState { .. })).await;
    match seen.last() {
        Some(Event::DashboardState { slots }) => {
            assert_eq!(slots.len(), 1);
            assert_eq!(slots[0].state, HandleState::ExitedWithSignal);
            assert_eq!(slots[0].signal, Some(libc::SIGINT));
            assert!(slots[0].finished_at.is_some());
        }
        other => panic!("expected dashboard, got {other:?}"),
    }

    ops_tx.send(Op::Shutdown).unwrap();
    let console = runner.await.unwrap().unwrap();
    assert!(console.registry().is_empty());
    let events = drain(&mut events_rx);
    assert!(events.contains(&Event::ShuttingDown { interrupted: false }));
}

#[tokio::test]
#[serial]
async fn test_interrupt_stops_every_slot_and_returns() {
    let project = create_test_project(&[("sleeper.yaml", SLEEP_SLOT)]).unwrap();
    let config = load_config(project.path()).await.unwrap();

    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);
    let registry = console.registry();
    let runner = tokio::spawn(async move { console.run(ops_rx).await });

    ops_tx.send(Op::StartSlot { slot: "sleeper".to_string() }).unwrap();
    wait_for_event(&mut events_rx, |e| matches!(e, Event::SlotStarted { .. })).await;
    tokio::time::sleep(SETTLE).await;

    // The console's router owns SIGINT now.
    kill(getpid(), Signal::SIGINT).unwrap();

    tokio::time::timeout(REAP_TIMEOUT, runner)
        .await
        .expect("console did not return after interrupt")
        .unwrap()
        .unwrap();

    let events = drain(&mut events_rx);
    assert!(has_status_update(&events, "sleeper", HandleState::Interrupted));
    assert_eq!(events.last(), Some(&Event::ShuttingDown { interrupted: true }));

    // The console did not wait; collect the leader here.
    let reaper = Reaper::new(registry.clone());
    let deadline = std::time::Instant::now() + REAP_TIMEOUT;
    while !registry.is_empty() {
        assert!(std::time::Instant::now() < deadline, "leader never exited");
        reaper.reap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
#[serial]
async fn test_incomplete_slot_is_not_started() {
    let project = create_test_project(&[("gui.yaml", "name: gui\nkind: sdl-gui\n")]).unwrap();
    let config = load_config(project.path()).await.unwrap();

    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);

    ops_tx.send(Op::StartSlot { slot: "gui".to_string() }).unwrap();
    drop(ops_tx);
    console.run(ops_rx).await.unwrap();

    let events = drain(&mut events_rx);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::SlotError { slot, error } if slot == "gui" && error.contains("configuration incomplete")
    )));
    assert!(!has_started(&events, "gui"));
    assert_eq!(console.slot("gui").unwrap().status(), HandleState::NotStarted);
}
