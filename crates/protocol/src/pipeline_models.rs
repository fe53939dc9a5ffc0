//! Pipeline description models.
//!
//! A pipeline is an ordered list of stages. Each stage is an executable plus
//! its argument list; the output of stage `i` is piped into the input of
//! stage `i + 1`, like a shell pipeline without the shell.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use ts_rs::TS;

/// A single executable invocation within a pipeline.
///
/// The executable is either an absolute/relative path or a bare program
/// name to be resolved against `PATH`. Arguments are passed verbatim: no
/// quoting, globbing or variable expansion is ever applied.
///
/// # Example
///
/// ```yaml
/// executable: /usr/local/bin/ffmpeg
/// args: ["-i", "clip.mov", "-f", "mjpeg", "-"]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StageDescriptor {
    /// Program to run.
    pub executable: String,

    /// Argument list, excluding argv[0].
    #[serde(default)]
    pub args: Vec<String>,
}

impl StageDescriptor {
    /// Create a stage from an executable and any iterable of arguments.
    pub fn new<I, S>(executable: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            executable: executable.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Ordered list of stages making up one pipeline.
///
/// An empty spec means "not configured". The optional `stdout` sink
/// redirects the last stage's output to a file; when absent the last stage
/// inherits the supervisor's standard output.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
pub struct PipelineSpec {
    /// Stages in pipe order.
    #[serde(default)]
    pub stages: Vec<StageDescriptor>,

    /// Optional file receiving the last stage's output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<PathBuf>,
}

impl PipelineSpec {
    /// Build a spec from a list of stages.
    pub fn new(stages: Vec<StageDescriptor>) -> Self {
        Self {
            stages,
            stdout: None,
        }
    }

    /// Redirect the last stage's output into `path`.
    pub fn with_stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Append a stage at the end of the pipeline.
    pub fn push(&mut self, stage: StageDescriptor) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for PipelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{stage}")?;
        }
        if let Some(path) = &self.stdout {
            write!(f, " > {}", path.display())?;
        }
        Ok(())
    }
}
