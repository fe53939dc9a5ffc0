//! Consumer sources: programs that read every capture's buffer file.

use super::base::{
    spec_with_sink, CaptureLink, ConfigureContext, PipelineSource, INCOMPLETE_REPORT,
};
use sc_protocol::config_models::ToolPaths;
use sc_protocol::pipeline_models::{PipelineSpec, StageDescriptor};
use sc_protocol::slot_models::SlotKind;
use std::path::PathBuf;

/// mplayer options for the raw UYVY stream bmdplayoutd writes.
const MPLAYER_ARGS: [&str; 7] = [
    "-vo", "xv", "-demuxer", "rawvideo", "-rawvideo", "uyvy:ntsc", "-",
];

/// Captures a consumer is bound to.
#[derive(Debug, Clone, Default)]
struct CaptureBinding {
    captures: Vec<CaptureLink>,
    stdout: Option<PathBuf>,
}

impl CaptureBinding {
    fn complete(&self) -> bool {
        !self.captures.is_empty() && self.captures.iter().all(|c| c.complete)
    }

    fn buffers(&self) -> Vec<String> {
        self.captures
            .iter()
            .filter_map(|c| c.buffer.as_ref())
            .map(|b| b.to_string_lossy().into_owned())
            .collect()
    }

    fn report(&self) -> Vec<String> {
        if !self.complete() {
            return vec![INCOMPLETE_REPORT.to_string()];
        }
        self.buffers()
            .into_iter()
            .map(|b| format!("reading buffer file: {b}"))
            .collect()
    }
}

/// Operator control interface showing every capture buffer.
///
/// `sdl_gui <buffer>...`
#[derive(Debug, Clone)]
pub struct SdlGui {
    tools: ToolPaths,
    binding: CaptureBinding,
}

impl SdlGui {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            binding: CaptureBinding::default(),
        }
    }
}

impl PipelineSource for SdlGui {
    fn kind(&self) -> SlotKind {
        SlotKind::SdlGui
    }

    fn configure(&mut self, context: &ConfigureContext) -> bool {
        self.binding.stdout = context.stdout.clone();
        self.config_complete()
    }

    fn pipeline(&self) -> PipelineSpec {
        if !self.binding.complete() {
            return PipelineSpec::default();
        }
        spec_with_sink(
            vec![StageDescriptor::new(
                self.tools.sdl_gui.to_string_lossy(),
                self.binding.buffers(),
            )],
            self.binding.stdout.as_deref(),
        )
    }

    fn config_complete(&self) -> bool {
        self.binding.complete()
    }

    fn config_report(&self) -> Vec<String> {
        self.binding.report()
    }

    fn bind_captures(&mut self, captures: &[CaptureLink]) {
        self.binding.captures = captures.to_vec();
    }
}

/// Playout daemon writing raw video to mplayer.
///
/// `bmdplayoutd <buffer>... | mplayer -vo xv -demuxer rawvideo ... -`
#[derive(Debug, Clone)]
pub struct MplayerPlayout {
    tools: ToolPaths,
    binding: CaptureBinding,
}

impl MplayerPlayout {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            binding: CaptureBinding::default(),
        }
    }
}

impl PipelineSource for MplayerPlayout {
    fn kind(&self) -> SlotKind {
        SlotKind::MplayerPlayout
    }

    fn configure(&mut self, context: &ConfigureContext) -> bool {
        self.binding.stdout = context.stdout.clone();
        self.config_complete()
    }

    fn pipeline(&self) -> PipelineSpec {
        if !self.binding.complete() {
            return PipelineSpec::default();
        }
        spec_with_sink(
            vec![
                StageDescriptor::new(
                    self.tools.bmdplayoutd.to_string_lossy(),
                    self.binding.buffers(),
                ),
                StageDescriptor::new(self.tools.mplayer.to_string_lossy(), MPLAYER_ARGS),
            ],
            self.binding.stdout.as_deref(),
        )
    }

    fn config_complete(&self) -> bool {
        self.binding.complete()
    }

    fn config_report(&self) -> Vec<String> {
        self.binding.report()
    }

    fn bind_captures(&mut self, captures: &[CaptureLink]) {
        self.binding.captures = captures.to_vec();
    }
}
