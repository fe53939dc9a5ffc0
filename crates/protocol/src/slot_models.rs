//! Slot configuration models for `.stagechain/slots/*.yaml`.
//!
//! A slot is one independently controlled pipeline: a capture feeding a
//! buffer file, a consumer reading the buffers, or a plain command chain.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

use crate::pipeline_models::StageDescriptor;

/// The closed set of pipeline variants a slot can run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    /// Encode a local video file into a buffer file.
    LocalFile,

    /// Encode a remote video file over SSH into a buffer file.
    SshFile,

    /// Control interface reading every capture buffer.
    SdlGui,

    /// Playout daemon piped into mplayer.
    MplayerPlayout,

    /// Explicit stage list taken straight from configuration.
    Command,
}

/// How a slot relates to the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    /// Writes a buffer file.
    Capture,
    /// Reads the buffer files of every capture slot.
    Consumer,
    /// Neither produces nor consumes buffers.
    Standalone,
}

impl SlotKind {
    pub fn role(self) -> SlotRole {
        match self {
            SlotKind::LocalFile | SlotKind::SshFile => SlotRole::Capture,
            SlotKind::SdlGui | SlotKind::MplayerPlayout => SlotRole::Consumer,
            SlotKind::Command => SlotRole::Standalone,
        }
    }

    /// Name shown to the operator when choosing a variant.
    pub fn display_name(self) -> &'static str {
        match self {
            SlotKind::LocalFile => "Capture from local file",
            SlotKind::SshFile => "Capture from remote file via SSH",
            SlotKind::SdlGui => "SDL GUI",
            SlotKind::MplayerPlayout => "Stdout Playout Daemon to MPlayer",
            SlotKind::Command => "Command pipeline",
        }
    }
}

/// One slot definition.
///
/// Which optional fields matter depends on `kind`.
///
/// # Example
///
/// ```yaml
/// name: camera-1
/// kind: local-file
/// input: /media/clips/game.mov
/// buffer: /var/tmp/camera-1.buf
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct SlotConfig {
    /// Unique slot name.
    pub name: String,

    /// Pipeline variant.
    pub kind: SlotKind,

    /// Source file for capture slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// `user@host` for SSH captures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Buffer file written by capture slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<PathBuf>,

    /// Optional sink for the last stage's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<PathBuf>,

    /// Stage list for `command` slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageDescriptor>,
}

impl SlotConfig {
    /// A slot with only a name and a kind; everything else unset.
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            name: name.into(),
            kind,
            input: None,
            host: None,
            buffer: None,
            stdout: None,
            stages: Vec::new(),
        }
    }
}
