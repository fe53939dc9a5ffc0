//! Pre-fork preparation of a pipeline.
//!
//! Everything that allocates or touches the filesystem by path happens here,
//! in the controlling process. After `fork` the leader and its stages only
//! issue system calls on the data prepared by this module.

use super::error::{LaunchError, LaunchResult};
use nix::unistd::Pid;
use sc_protocol::pipeline_models::{PipelineSpec, StageDescriptor};
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::fd::OwnedFd;
use std::os::unix::ffi::OsStringExt;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEV_NULL: &str = "/dev/null";

/// One stage ready for `execv`.
pub(crate) struct PreparedStage {
    /// Resolved path handed to `execv`.
    program: CString,
    /// Owns the strings `argv` points into.
    _args: Vec<CString>,
    /// NUL-terminated pointer array, argv[0] first.
    argv: Vec<*const libc::c_char>,
}

impl PreparedStage {
    fn new(index: usize, stage: &StageDescriptor) -> LaunchResult<Self> {
        let resolved = resolve_program(&stage.executable);
        let program = CString::new(resolved.into_os_string().into_vec()).map_err(|_| {
            LaunchError::InvalidArgument {
                stage: index,
                arg: stage.executable.clone(),
            }
        })?;

        let mut args = Vec::with_capacity(stage.args.len() + 1);
        for arg in std::iter::once(&stage.executable).chain(stage.args.iter()) {
            let c_arg = CString::new(arg.as_bytes()).map_err(|_| LaunchError::InvalidArgument {
                stage: index,
                arg: arg.clone(),
            })?;
            args.push(c_arg);
        }

        let mut argv: Vec<*const libc::c_char> = args.iter().map(|a| a.as_ptr()).collect();
        argv.push(std::ptr::null());

        Ok(Self {
            program,
            _args: args,
            argv,
        })
    }

    pub(crate) fn program(&self) -> &CString {
        &self.program
    }

    pub(crate) fn argv(&self) -> *const *const libc::c_char {
        self.argv.as_ptr()
    }
}

/// A pipeline with every stage, descriptor and bookkeeping slot the leader
/// will need already allocated.
pub(crate) struct PreparedPipeline {
    pub(crate) stages: Vec<PreparedStage>,
    /// Input of the leader and of stage 0.
    pub(crate) devnull: OwnedFd,
    /// Output of the last stage when a sink was requested.
    pub(crate) sink: Option<OwnedFd>,
    /// Stage pids, capacity reserved for every stage.
    pub(crate) pids: Vec<Pid>,
}

impl PreparedPipeline {
    pub(crate) fn prepare(spec: &PipelineSpec) -> LaunchResult<Self> {
        if spec.is_empty() {
            return Err(LaunchError::EmptyPipeline);
        }

        let stages = spec
            .stages
            .iter()
            .enumerate()
            .map(|(i, stage)| PreparedStage::new(i, stage))
            .collect::<LaunchResult<Vec<_>>>()?;

        let devnull = File::open(DEV_NULL).map_err(|source| LaunchError::Open {
            path: PathBuf::from(DEV_NULL),
            source,
        })?;

        let sink = match &spec.stdout {
            Some(path) => Some(open_sink(path)?),
            None => None,
        };

        debug!(stages = stages.len(), sink = ?spec.stdout, "prepared pipeline");

        Ok(Self {
            pids: Vec::with_capacity(stages.len()),
            stages,
            devnull: devnull.into(),
            sink,
        })
    }
}

fn open_sink(path: &Path) -> LaunchResult<OwnedFd> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| LaunchError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(file.into())
}

/// Resolve a bare program name against `PATH`.
///
/// Names containing a `/` are used as given. A name that cannot be resolved
/// is kept verbatim so the stage fails at exec time like any other missing
/// executable.
pub fn resolve_program(executable: &str) -> PathBuf {
    if executable.contains('/') {
        return PathBuf::from(executable);
    }
    match which::which(executable) {
        Ok(path) => path,
        Err(e) => {
            debug!(executable, error = %e, "executable not found on PATH");
            PathBuf::from(executable)
        }
    }
}
