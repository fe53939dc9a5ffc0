//! Error types for pipeline launching.

use nix::errno::Errno;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised in the controlling process while creating a leader.
///
/// Anything that goes wrong *inside* the leader (pipe, fork or exec failure
/// of a stage) is reported through the leader's exit status instead.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The pipeline has no stages to run.
    #[error("Pipeline has no stages")]
    EmptyPipeline,

    /// An executable or argument cannot be passed to exec.
    #[error("Stage {stage} has an argument containing a NUL byte: {arg:?}")]
    InvalidArgument { stage: usize, arg: String },

    /// A descriptor the leader needs could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// SIGINT could not be blocked around the fork.
    #[error("Failed to adjust signal mask: {0}")]
    SignalMask(Errno),

    /// The OS refused to create the leader process.
    #[error("Failed to fork pipeline leader: {0}")]
    Fork(Errno),
}

/// Type alias for Result with LaunchError.
pub type LaunchResult<T> = Result<T, LaunchError>;
