//! Global configuration models for `.stagechain/config.toml`.
//!
//! This module defines the structure of the global configuration file that
//! controls console-wide settings and the locations of external tools.

use serde::Deserialize;
use serde::Serialize;
use std::path::PathBuf;
use ts_rs::TS;

/// Represents global settings from `.stagechain/config.toml`.
///
/// # Example
///
/// ```toml
/// # .stagechain/config.toml
/// max-captures = 4
/// poll-interval-ms = 500
///
/// [tools]
/// ffmpeg = "/usr/bin/ffmpeg"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct GlobalConfig {
    /// Upper bound on the number of capture slots.
    #[serde(default = "default_max_captures")]
    pub max_captures: usize,

    /// How often the console refreshes slot status, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Locations of the external executables used by the built-in slots.
    #[serde(default)]
    pub tools: ToolPaths,
}

fn default_max_captures() -> usize {
    8
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_captures: default_max_captures(),
            poll_interval_ms: default_poll_interval_ms(),
            tools: ToolPaths::default(),
        }
    }
}

/// Paths of the external programs the built-in slot kinds invoke.
///
/// Any key left out of `[tools]` keeps its default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case", default)]
pub struct ToolPaths {
    pub ffmpeg: PathBuf,
    pub mjpeg_ingest: PathBuf,
    pub sdl_gui: PathBuf,
    pub bmdplayoutd: PathBuf,
    pub mplayer: PathBuf,
    pub ssh: PathBuf,
    /// Identity file handed to `ssh -i`.
    pub ssh_identity: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("/usr/local/bin/ffmpeg"),
            mjpeg_ingest: PathBuf::from("core/mjpeg_ingest"),
            sdl_gui: PathBuf::from("core/sdl_gui"),
            bmdplayoutd: PathBuf::from("core/bmdplayoutd"),
            mplayer: PathBuf::from("/usr/local/bin/mplayer"),
            ssh: PathBuf::from("/usr/bin/ssh"),
            ssh_identity: PathBuf::from("id_rsa.openreplay"),
        }
    }
}
