//! Terminal rendering of console events and slot summaries.

use colored::{ColoredString, Colorize};
use sc_protocol::ipc::Event;
use sc_protocol::process_models::{HandleState, SlotSummary};
use serde::Serialize;

fn state_label(state: HandleState) -> ColoredString {
    let label = state.label();
    match state {
        HandleState::NotStarted => label.dimmed(),
        HandleState::Running => label.green(),
        HandleState::Interrupted => label.yellow(),
        HandleState::ExitedNormally => label.blue(),
        HandleState::ExitedWithSignal | HandleState::ExitedWithError | HandleState::ForkFailed => {
            label.red()
        }
    }
}

/// Print `value` as one JSON line.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "failed to serialize output"),
    }
}

pub fn print_event(event: &Event, json: bool) {
    if json {
        return print_json(event);
    }
    match event {
        Event::SlotStarted { slot, leader_pid } => {
            println!("{} {slot} (leader {leader_pid})", "[started]".green().bold());
        }
        Event::SlotStatusUpdate {
            slot,
            state,
            signal,
            exit_code,
        } => {
            let detail = match (signal, exit_code) {
                (Some(signal), _) => format!(" (signal {signal})"),
                (None, Some(code)) if *code != 0 => format!(" (code {code})"),
                _ => String::new(),
            };
            println!("{} {slot}: {}{detail}", "[status]".cyan().bold(), state_label(*state));
        }
        Event::SlotError { slot, error } => {
            eprintln!("{} {slot}: {error}", "[error]".red().bold());
        }
        Event::UnexpectedDeath { pid } => {
            println!("{} unowned child {pid} exited", "[reaped]".yellow().bold());
        }
        Event::DashboardState { slots } => {
            for summary in slots {
                print_summary(summary);
            }
        }
        Event::ShuttingDown { interrupted } => {
            let reason = if *interrupted { "interrupted" } else { "requested" };
            println!("{} {reason}", "[shutdown]".magenta().bold());
        }
    }
}

pub fn print_summary(summary: &SlotSummary) {
    let marker = if summary.config_complete {
        "ready".green()
    } else {
        "incomplete".yellow()
    };
    println!(
        "{} [{}] {} ({marker})",
        summary.name.bold(),
        summary.kind.display_name(),
        state_label(summary.state),
    );
    for line in &summary.config_report {
        println!("    {line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_labels_keep_text() {
        colored::control::set_override(false);
        assert_eq!(state_label(HandleState::Interrupted).to_string(), "Awaiting termination");
        assert_eq!(state_label(HandleState::ForkFailed).to_string(), "Fork failed");
    }
}
