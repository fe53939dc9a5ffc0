//! Base PipelineSource trait and supporting types.

use sc_protocol::pipeline_models::{PipelineSpec, StageDescriptor};
use sc_protocol::slot_models::{SlotConfig, SlotKind};
use std::path::{Path, PathBuf};

/// Report returned by every source whose configuration is not complete.
pub const INCOMPLETE_REPORT: &str = "Configuration incomplete";

/// Settings handed to [`PipelineSource::configure`].
///
/// This is what a front end collects from the operator (file pickers, host
/// entry); which fields a source reads depends on its kind.
#[derive(Debug, Clone, Default)]
pub struct ConfigureContext {
    /// Source file to encode.
    pub input: Option<String>,

    /// `user@host` for remote sources.
    pub host: Option<String>,

    /// Buffer file a capture writes.
    pub buffer: Option<PathBuf>,

    /// Optional sink for the last stage's output.
    pub stdout: Option<PathBuf>,

    /// Explicit stage list for command pipelines.
    pub stages: Vec<StageDescriptor>,
}

impl ConfigureContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the input file.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set the remote host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the buffer file.
    pub fn with_buffer(mut self, buffer: impl Into<PathBuf>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    /// Redirect the last stage's output.
    pub fn with_stdout(mut self, stdout: impl Into<PathBuf>) -> Self {
        self.stdout = Some(stdout.into());
        self
    }

    /// Add a stage.
    pub fn with_stage(mut self, stage: StageDescriptor) -> Self {
        self.stages.push(stage);
        self
    }
}

impl From<&SlotConfig> for ConfigureContext {
    fn from(slot: &SlotConfig) -> Self {
        Self {
            input: slot.input.clone(),
            host: slot.host.clone(),
            buffer: slot.buffer.clone(),
            stdout: slot.stdout.clone(),
            stages: slot.stages.clone(),
        }
    }
}

/// What a consumer knows about one capture slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureLink {
    /// Buffer file the capture writes, if configured.
    pub buffer: Option<PathBuf>,
    /// Whether the capture's configuration is complete.
    pub complete: bool,
}

/// Capability interface of every pipeline variant.
///
/// The supervisor only ever talks to this trait; the concrete variants are
/// chosen once, by [`SourceFactory`](crate::sources::SourceFactory).
pub trait PipelineSource: Send {
    /// Variant tag.
    fn kind(&self) -> SlotKind;

    /// Display name of the variant.
    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Apply operator settings. Returns false when a required setting is
    /// missing; the previous configuration is then left untouched.
    fn configure(&mut self, context: &ConfigureContext) -> bool;

    /// Stages to launch. Empty while the configuration is incomplete.
    fn pipeline(&self) -> PipelineSpec;

    /// Whether the source can be started.
    fn config_complete(&self) -> bool;

    /// Human readable description of the configuration.
    fn config_report(&self) -> Vec<String>;

    /// Buffer file written by this source, for captures.
    fn buffer(&self) -> Option<&Path> {
        None
    }

    /// Give a consumer the current set of captures. Ignored by other kinds.
    fn bind_captures(&mut self, _captures: &[CaptureLink]) {}
}

/// Build a spec from stages plus an optional output sink.
pub(crate) fn spec_with_sink(stages: Vec<StageDescriptor>, stdout: Option<&Path>) -> PipelineSpec {
    let spec = PipelineSpec::new(stages);
    match stdout {
        Some(path) => spec.with_stdout(path),
        None => spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_context_builder() {
        let context = ConfigureContext::new()
            .with_input("clip.mov")
            .with_host("armena@127.0.0.1")
            .with_buffer("/tmp/a.buf")
            .with_stage(StageDescriptor::new("cat", Vec::<String>::new()));

        assert_eq!(context.input.as_deref(), Some("clip.mov"));
        assert_eq!(context.host.as_deref(), Some("armena@127.0.0.1"));
        assert_eq!(context.buffer, Some(PathBuf::from("/tmp/a.buf")));
        assert!(context.stdout.is_none());
        assert_eq!(context.stages.len(), 1);
    }

    #[test]
    fn test_context_from_slot_config() {
        let mut slot = SlotConfig::new("cam", SlotKind::LocalFile);
        slot.input = Some("in.mov".to_string());
        slot.buffer = Some(PathBuf::from("cam.buf"));

        let context = ConfigureContext::from(&slot);
        assert_eq!(context.input.as_deref(), Some("in.mov"));
        assert_eq!(context.buffer, Some(PathBuf::from("cam.buf")));
        assert!(context.host.is_none());
    }
}
