mod cli;
mod render;

use clap::Parser;
use cli::{Cli, Commands};
use color_eyre::eyre::{bail, eyre, Result};
use colored::Colorize;
use render::{print_event, print_json, print_summary};
use sc_core::config::loader::CONFIG_DIR;
use sc_core::config::{load_config, AppConfig};
use sc_core::console::Console;
use sc_core::init::{generate_stagechain_structure, InitOptions};
use sc_core::supervisor::PipelineHandle;
use sc_protocol::config_models::GlobalConfig;
use sc_protocol::ipc::{Event, Op};
use sc_protocol::pipeline_models::StageDescriptor;
use sc_protocol::process_models::{HandleState, SlotSummary};
use sc_protocol::slot_models::{SlotConfig, SlotKind};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

/// Slot name used for `exec` pipelines.
const EXEC_SLOT: &str = "exec";

/// Argument separating stages on the `exec` command line.
const STAGE_SEPARATOR: &str = "|";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise the verbose flag picks the level.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("stagechain=debug,sc_core=debug")
        } else {
            EnvFilter::new("stagechain=info,sc_core=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { force, minimal } => init(&cli.root, force, minimal).await,
        Commands::List { json } => list(&cli.root, json).await,
        Commands::Run { slots, json } => run(&cli.root, slots, json).await,
        Commands::Exec { stdout, command } => {
            let code = exec(&command, stdout).await?;
            std::process::exit(code)
        }
    }
}

async fn init(root: &Path, force: bool, minimal: bool) -> Result<()> {
    generate_stagechain_structure(InitOptions {
        target_dir: root.to_path_buf(),
        force,
        minimal,
    })
    .await?;
    println!(
        "{} {}",
        "Created".green().bold(),
        root.join(CONFIG_DIR).display()
    );
    Ok(())
}

async fn list(root: &Path, json: bool) -> Result<()> {
    let config = load_config(root).await?;
    let (events_tx, _events_rx) = unbounded_channel();
    let console = Console::new(config, events_tx);
    let summaries = console.summaries();

    if json {
        print_json(&summaries);
    } else if summaries.is_empty() {
        println!("No slots configured under {}", root.join(CONFIG_DIR).display());
    } else {
        summaries.iter().for_each(print_summary);
    }
    Ok(())
}

async fn run(root: &Path, slots: Vec<String>, json: bool) -> Result<()> {
    let config = load_config(root).await?;
    if config.slots.is_empty() {
        bail!("no slots configured under {}", root.join(CONFIG_DIR).display());
    }

    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);

    let targets: Vec<String> = if slots.is_empty() {
        console
            .slots()
            .iter()
            .filter(|h| h.config_complete())
            .map(PipelineHandle::name)
            .collect()
    } else {
        slots
    };
    if targets.is_empty() {
        bail!("no slot is fully configured");
    }

    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            print_event(&event, json);
        }
    });

    for slot in targets {
        ops_tx.send(Op::StartSlot { slot })?;
    }
    drop(ops_tx);

    console.run(ops_rx).await.map_err(|e| eyre!(e))?;
    let summaries = console.summaries();
    // Closes the event channel so the printer drains and ends.
    drop(console);
    printer.await?;

    if !json {
        summaries.iter().for_each(print_summary);
    }
    Ok(())
}

/// Build a one-slot configuration from `exec` argv words.
///
/// Words are split into stages at each [`STAGE_SEPARATOR`] and otherwise
/// kept verbatim.
fn exec_config(command: &[String], stdout: Option<PathBuf>) -> Result<AppConfig> {
    let mut slot = SlotConfig::new(EXEC_SLOT, SlotKind::Command);
    for (index, words) in command.split(|w| w == STAGE_SEPARATOR).enumerate() {
        let (executable, args) = words
            .split_first()
            .ok_or_else(|| eyre!("stage {} is empty", index + 1))?;
        slot.stages.push(StageDescriptor::new(executable, args.iter().cloned()));
    }
    slot.stdout = stdout;
    Ok(AppConfig {
        global: GlobalConfig::default(),
        slots: vec![slot],
    })
}

async fn exec(command: &[String], stdout: Option<PathBuf>) -> Result<i32> {
    let config = exec_config(command, stdout)?;
    let (events_tx, mut events_rx) = unbounded_channel();
    let (ops_tx, ops_rx) = unbounded_channel();
    let mut console = Console::new(config, events_tx);

    ops_tx.send(Op::StartSlot {
        slot: EXEC_SLOT.to_string(),
    })?;
    drop(ops_tx);
    console.run(ops_rx).await.map_err(|e| eyre!(e))?;

    // Stage output owns stdout here; only errors are echoed.
    while let Ok(event) = events_rx.try_recv() {
        if matches!(event, Event::SlotError { .. }) {
            print_event(&event, false);
        }
    }

    let summary = console
        .slot(EXEC_SLOT)
        .map(PipelineHandle::summary)
        .ok_or_else(|| eyre!("exec slot missing"))?;
    tracing::debug!(state = ?summary.state, "exec finished");
    Ok(exit_status(&summary))
}

/// Shell-style exit status for a finished slot.
fn exit_status(summary: &SlotSummary) -> i32 {
    match summary.state {
        HandleState::ExitedNormally => 0,
        HandleState::ExitedWithError => summary.exit_code.unwrap_or(1),
        HandleState::ExitedWithSignal => 128 + summary.signal.unwrap_or(0),
        // Ctrl-C ended the console before the leader was reaped.
        HandleState::Running | HandleState::Interrupted => 130,
        HandleState::NotStarted | HandleState::ForkFailed => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: HandleState, signal: Option<i32>, exit_code: Option<i32>) -> SlotSummary {
        SlotSummary {
            name: EXEC_SLOT.to_string(),
            kind: SlotKind::Command,
            state,
            leader_pid: None,
            signal,
            exit_code,
            config_complete: true,
            config_report: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&summary(HandleState::ExitedNormally, None, Some(0))), 0);
        assert_eq!(exit_status(&summary(HandleState::ExitedWithError, None, Some(3))), 3);
        assert_eq!(exit_status(&summary(HandleState::ExitedWithSignal, Some(9), None)), 137);
        assert_eq!(exit_status(&summary(HandleState::ForkFailed, None, None)), 1);
        assert_eq!(exit_status(&summary(HandleState::Interrupted, None, None)), 130);
    }

    fn words(line: &[&str]) -> Vec<String> {
        line.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_exec_config_splits_stages() {
        let command = words(&["echo", "hello world", "|", "wc", "-c"]);
        let config = exec_config(&command, Some(PathBuf::from("/tmp/out"))).unwrap();

        let slot = config.slot(EXEC_SLOT).unwrap();
        assert_eq!(slot.stages.len(), 2);
        assert_eq!(slot.stages[0].executable, "echo");
        assert_eq!(slot.stages[0].args, vec!["hello world"]);
        assert_eq!(slot.stages[1].executable, "wc");
        assert_eq!(slot.stages[1].args, vec!["-c"]);
        assert_eq!(slot.stdout, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_exec_config_keeps_words_verbatim() {
        let command = words(&["sh", "-c", "exit 7", "|", "grep", "", "  padded  "]);
        let config = exec_config(&command, None).unwrap();

        let slot = config.slot(EXEC_SLOT).unwrap();
        assert_eq!(slot.stages[0].args, vec!["-c", "exit 7"]);
        assert_eq!(slot.stages[1].args, vec!["", "  padded  "]);
    }

    #[test]
    fn test_exec_config_rejects_empty_stage() {
        assert!(exec_config(&words(&["true", "|", "|", "cat"]), None).is_err());
        assert!(exec_config(&words(&["true", "|"]), None).is_err());
        assert!(exec_config(&words(&["|", "cat"]), None).is_err());
    }
}
