//! Test fixtures for building handles and sample configurations.

use sc_core::sources::{CommandPipeline, ConfigureContext};
use sc_core::supervisor::{PipelineHandle, Reaper, Registry};
use sc_protocol::pipeline_models::StageDescriptor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Time for a freshly started leader to fork and exec its stages.
#[allow(dead_code)]
pub const SETTLE: Duration = Duration::from_millis(300);

/// Upper bound for any pipeline in these tests to be reaped.
#[allow(dead_code)]
pub const REAP_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a stage from string slices.
#[allow(dead_code)]
pub fn stage(executable: &str, args: &[&str]) -> StageDescriptor {
    StageDescriptor::new(executable, args.iter().copied())
}

/// A fresh registry with a reaper bound to it.
#[allow(dead_code)]
pub fn supervisor() -> (Arc<Registry>, Reaper) {
    let registry = Arc::new(Registry::new());
    let reaper = Reaper::new(Arc::clone(&registry));
    (registry, reaper)
}

/// A configured `command` handle running `stages`, optionally writing the
/// last stage's output to `stdout`.
#[allow(dead_code)]
pub fn command_handle(
    registry: &Arc<Registry>,
    name: &str,
    stages: Vec<StageDescriptor>,
    stdout: Option<&Path>,
) -> PipelineHandle {
    let mut context = ConfigureContext::new();
    for s in stages {
        context = context.with_stage(s);
    }
    if let Some(path) = stdout {
        context = context.with_stdout(path);
    }

    let mut handle = PipelineHandle::new(
        name,
        Box::new(CommandPipeline::new()),
        Arc::clone(registry),
    );
    assert!(handle.configure(&context), "command handle should be complete");
    handle
}

/// Create a temporary project with `.stagechain/slots/<file>` for each
/// `(file, yaml)` pair.
///
/// Returns a TempDir that must be kept alive for the test duration.
#[allow(dead_code)]
pub fn create_test_project(slots: &[(&str, &str)]) -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let slots_dir = temp_dir.path().join(".stagechain/slots");
    std::fs::create_dir_all(&slots_dir)?;
    for (file, yaml) in slots {
        std::fs::write(slots_dir.join(file), yaml)?;
    }
    Ok(temp_dir)
}
