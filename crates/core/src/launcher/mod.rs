//! Pipeline launcher.
//!
//! Turns a [`PipelineSpec`] into a leader process heading its own process
//! group, with one child per stage chained by pipes:
//!
//! ```text
//! controlling process
//!   └─ leader (pgid = leader pid, stdin = /dev/null)
//!        ├─ stage 0  stdin=/dev/null  stdout=pipe 0
//!        ├─ stage 1  stdin=pipe 0     stdout=pipe 1
//!        └─ stage N-1 stdin=pipe N-2  stdout=inherited or sink
//! ```
//!
//! The leader waits for every stage and exits with their aggregate status:
//! the first terminating signal is re-raised on the leader, otherwise the
//! first non-zero exit code is used, otherwise 0. If a pipe, fork or exec
//! fails part way through, the leader SIGTERMs its group, SIGKILLs any stage
//! still alive after a short grace period, reaps what it started and exits
//! with [`EXIT_SETUP_FAILED`] or [`EXIT_EXEC_FAILED`].

pub mod error;
mod leader;
mod prepare;

pub use error::{LaunchError, LaunchResult};
pub use leader::{EXIT_EXEC_FAILED, EXIT_SETUP_FAILED, EXIT_WAIT_FAILED};
pub use prepare::resolve_program;

use nix::sys::signal::{SigSet, SigmaskHow, Signal};
use nix::unistd::{fork, setpgid, ForkResult, Pid};
use prepare::PreparedPipeline;
use sc_protocol::pipeline_models::PipelineSpec;
use tracing::{debug, info};

/// Fork a leader for `spec` and return its pid, which is also the id of the
/// new process group.
///
/// Returns once the leader exists; the stages are built asynchronously by
/// the leader. The caller is responsible for reaping the leader.
///
/// # Errors
///
/// - [`LaunchError::EmptyPipeline`] if the spec has no stages
/// - [`LaunchError::InvalidArgument`] if an argument contains a NUL byte
/// - [`LaunchError::Open`] if `/dev/null` or the stdout sink cannot be opened
/// - [`LaunchError::SignalMask`] if SIGINT cannot be blocked around the fork
/// - [`LaunchError::Fork`] if the OS refuses to create the leader
pub fn spawn_leader(spec: &PipelineSpec) -> LaunchResult<Pid> {
    let prepared = PreparedPipeline::prepare(spec)?;

    // An interrupt sent to the new group before the leader has built its
    // stages stays pending in the leader until they all exist.
    let mut interrupt = SigSet::empty();
    interrupt.add(Signal::SIGINT);
    let previous = interrupt
        .thread_swap_mask(SigmaskHow::SIG_BLOCK)
        .map_err(LaunchError::SignalMask)?;

    let forked = match unsafe { fork() } {
        Ok(ForkResult::Child) => leader::run(prepared, previous),
        Ok(ForkResult::Parent { child }) => Ok(child),
        Err(errno) => Err(LaunchError::Fork(errno)),
    };
    if let Err(errno) = previous.thread_set_mask() {
        debug!(%errno, "failed to restore signal mask after fork");
    }
    let child = forked?;

    // Both sides set the group so signals aimed at it work as soon as this
    // function returns.
    if let Err(errno) = setpgid(child, child) {
        debug!(pid = child.as_raw(), %errno, "setpgid from parent failed");
    }
    info!(leader = child.as_raw(), pipeline = %spec, "pipeline leader started");
    Ok(child)
}
