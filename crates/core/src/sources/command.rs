//! Free-form pipeline built from an explicit stage list.

use super::base::{spec_with_sink, ConfigureContext, PipelineSource, INCOMPLETE_REPORT};
use sc_protocol::pipeline_models::{PipelineSpec, StageDescriptor};
use sc_protocol::slot_models::SlotKind;
use std::path::PathBuf;
use tracing::info;

/// Runs whatever stages the configuration lists, in order.
#[derive(Debug, Clone, Default)]
pub struct CommandPipeline {
    stages: Vec<StageDescriptor>,
    stdout: Option<PathBuf>,
}

impl CommandPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PipelineSource for CommandPipeline {
    fn kind(&self) -> SlotKind {
        SlotKind::Command
    }

    fn configure(&mut self, context: &ConfigureContext) -> bool {
        if context.stages.is_empty() {
            info!("command pipeline has no stages");
            return false;
        }
        self.stages = context.stages.clone();
        self.stdout = context.stdout.clone();
        true
    }

    fn pipeline(&self) -> PipelineSpec {
        spec_with_sink(self.stages.clone(), self.stdout.as_deref())
    }

    fn config_complete(&self) -> bool {
        !self.stages.is_empty()
    }

    fn config_report(&self) -> Vec<String> {
        if self.stages.is_empty() {
            return vec![INCOMPLETE_REPORT.to_string()];
        }
        let mut report = vec![self.pipeline().to_string()];
        if let Some(path) = &self.stdout {
            report.push(format!("output file: {}", path.display()));
        }
        report
    }
}
