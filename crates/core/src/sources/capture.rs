//! Capture sources: encode a video file to MJPEG and ingest it into a
//! buffer file that consumers read.

use super::base::{spec_with_sink, ConfigureContext, PipelineSource, INCOMPLETE_REPORT};
use sc_protocol::config_models::ToolPaths;
use sc_protocol::pipeline_models::{PipelineSpec, StageDescriptor};
use sc_protocol::slot_models::SlotKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// ffmpeg output options shared by every capture.
const MJPEG_ENCODE_ARGS: [&str; 7] = ["-f", "mjpeg", "-qscale", "5", "-s", "720x480", "-"];

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn encode_args(input: &str) -> Vec<String> {
    let mut args = vec!["-i".to_string(), input.to_string()];
    args.extend(MJPEG_ENCODE_ARGS.iter().map(|s| s.to_string()));
    args
}

fn ingest_stage(tools: &ToolPaths, buffer: &Path) -> StageDescriptor {
    StageDescriptor::new(lossy(&tools.mjpeg_ingest), [lossy(buffer)])
}

/// Capture from a file on the local machine.
///
/// `ffmpeg -i <input> -f mjpeg ... - | mjpeg_ingest <buffer>`
#[derive(Debug, Clone)]
pub struct LocalFileCapture {
    tools: ToolPaths,
    input: Option<String>,
    buffer: Option<PathBuf>,
    stdout: Option<PathBuf>,
}

impl LocalFileCapture {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            input: None,
            buffer: None,
            stdout: None,
        }
    }
}

impl PipelineSource for LocalFileCapture {
    fn kind(&self) -> SlotKind {
        SlotKind::LocalFile
    }

    fn configure(&mut self, context: &ConfigureContext) -> bool {
        let Some(input) = &context.input else {
            info!("input file selection cancelled");
            return false;
        };
        self.input = Some(input.clone());
        if context.buffer.is_none() {
            info!("buffer selection cancelled");
        }
        self.buffer = context.buffer.clone();
        self.stdout = context.stdout.clone();
        self.config_complete()
    }

    fn pipeline(&self) -> PipelineSpec {
        match (&self.input, &self.buffer) {
            (Some(input), Some(buffer)) => spec_with_sink(
                vec![
                    StageDescriptor::new(lossy(&self.tools.ffmpeg), encode_args(input)),
                    ingest_stage(&self.tools, buffer),
                ],
                self.stdout.as_deref(),
            ),
            _ => PipelineSpec::default(),
        }
    }

    fn config_complete(&self) -> bool {
        self.input.is_some() && self.buffer.is_some()
    }

    fn config_report(&self) -> Vec<String> {
        match (&self.input, &self.buffer) {
            (Some(input), Some(buffer)) => vec![
                format!("Local file capture from {input}"),
                format!("buffer file: {}", buffer.display()),
            ],
            _ => vec![INCOMPLETE_REPORT.to_string()],
        }
    }

    fn buffer(&self) -> Option<&Path> {
        self.buffer.as_deref()
    }
}

/// Capture from a file on a remote machine, encoded there over SSH.
///
/// `ssh -i <identity> <host> ffmpeg -i <input> ... - | mjpeg_ingest <buffer>`
#[derive(Debug, Clone)]
pub struct SshFileCapture {
    tools: ToolPaths,
    host: Option<String>,
    input: Option<String>,
    buffer: Option<PathBuf>,
    stdout: Option<PathBuf>,
}

impl SshFileCapture {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            host: None,
            input: None,
            buffer: None,
            stdout: None,
        }
    }
}

impl PipelineSource for SshFileCapture {
    fn kind(&self) -> SlotKind {
        SlotKind::SshFile
    }

    fn configure(&mut self, context: &ConfigureContext) -> bool {
        let Some(host) = &context.host else {
            info!("account/hostname configuration cancelled");
            return false;
        };
        let Some(input) = &context.input else {
            info!("filename configuration cancelled");
            return false;
        };
        self.host = Some(host.clone());
        self.input = Some(input.clone());
        if context.buffer.is_none() {
            info!("buffer selection cancelled");
        }
        self.buffer = context.buffer.clone();
        self.stdout = context.stdout.clone();
        self.config_complete()
    }

    fn pipeline(&self) -> PipelineSpec {
        match (&self.host, &self.input, &self.buffer) {
            (Some(host), Some(input), Some(buffer)) => {
                // The remote side runs whatever `ffmpeg` is on its PATH.
                let mut args = vec![
                    "-i".to_string(),
                    lossy(&self.tools.ssh_identity),
                    host.clone(),
                    "ffmpeg".to_string(),
                ];
                args.extend(encode_args(input));
                spec_with_sink(
                    vec![
                        StageDescriptor::new(lossy(&self.tools.ssh), args),
                        ingest_stage(&self.tools, buffer),
                    ],
                    self.stdout.as_deref(),
                )
            }
            _ => PipelineSpec::default(),
        }
    }

    fn config_complete(&self) -> bool {
        self.host.is_some() && self.input.is_some() && self.buffer.is_some()
    }

    fn config_report(&self) -> Vec<String> {
        match (&self.host, &self.input, &self.buffer) {
            (Some(host), Some(input), Some(buffer)) => vec![
                format!("Remote file capture from {host}:{input}"),
                format!("buffer file: {}", buffer.display()),
            ],
            _ => vec![INCOMPLETE_REPORT.to_string()],
        }
    }

    fn buffer(&self) -> Option<&Path> {
        self.buffer.as_deref()
    }
}
