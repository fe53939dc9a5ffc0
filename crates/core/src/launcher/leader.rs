//! Code that runs inside a forked pipeline leader and its stages.
//!
//! Nothing in this module allocates, logs or returns to the caller: the
//! process was forked from a possibly multi-threaded parent, so only system
//! calls on pre-built data are allowed, and every path ends in `_exit` or
//! `execv`.
//!
//! SIGINT arrives blocked from the controlling process and stays blocked
//! while the stages are forked. The leader catches it into a flag rather
//! than ignoring it, so an interrupt sent before the last stage exists is
//! kept and forwarded to the group once construction is done.

use super::prepare::{PreparedPipeline, PreparedStage};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::sys::signal::{kill, raise, signal, SigHandler, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{dup2, fork, getpid, pipe2, setpgid, ForkResult, Pid};
use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Exit status of a stage whose exec failed, and of a leader that tore its
/// group down because of it.
pub const EXIT_EXEC_FAILED: i32 = 127;

/// Exit status of a leader that could not create a pipe or fork a stage.
pub const EXIT_SETUP_FAILED: i32 = 126;

/// Exit status of a leader whose wait loop hit an unexpected OS error.
pub const EXIT_WAIT_FAILED: i32 = 1;

/// Signals whose disposition a stage resets before exec.
const STAGE_DEFAULT_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGTERM,
    Signal::SIGQUIT,
    Signal::SIGPIPE,
    Signal::SIGCHLD,
];

/// How long a torn-down group gets to honour SIGTERM before its stages
/// are killed outright.
const TEARDOWN_POLLS: u32 = 50;
const TEARDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Set by the leader's SIGINT handler.
static INTERRUPT_PENDING: AtomicBool = AtomicBool::new(false);

extern "C" fn note_interrupt(_: libc::c_int) {
    INTERRUPT_PENDING.store(true, Ordering::SeqCst);
}

fn exit_now(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

enum Failure {
    Setup,
    Exec,
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Setup => EXIT_SETUP_FAILED,
            Failure::Exec => EXIT_EXEC_FAILED,
        }
    }
}

/// Outcome of the stages, folded as they are reaped.
///
/// The first stage killed by a signal wins; otherwise the first non-zero
/// exit code; otherwise success.
#[derive(Default)]
struct Verdict {
    signal: Option<Signal>,
    code: Option<i32>,
}

impl Verdict {
    fn record(&mut self, status: WaitStatus) {
        match status {
            WaitStatus::Signaled(_, sig, _) if self.signal.is_none() => self.signal = Some(sig),
            WaitStatus::Exited(_, code) if code != 0 && self.code.is_none() => {
                self.code = Some(code)
            }
            _ => {}
        }
    }
}

/// Body of the leader process. Never returns.
///
/// `mask` is the signal mask to restore once every stage exists; until then
/// SIGINT stays blocked as it was across the fork.
pub(crate) fn run(mut pipeline: PreparedPipeline, mask: SigSet) -> ! {
    // Keep terminal job control away from the group.
    let _ = dup2(pipeline.devnull.as_raw_fd(), libc::STDIN_FILENO);
    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));

    // The leader outlives an interrupt so it can collect its stages.
    unsafe {
        let _ = signal(Signal::SIGINT, SigHandler::Handler(note_interrupt));
        let _ = signal(Signal::SIGCHLD, SigHandler::SigDfl);
    }

    if let Err(failure) = construct(&mut pipeline) {
        tear_down(&mut pipeline, failure);
    }

    // A pending interrupt runs the handler here. Stages forked after it was
    // sent never saw it, so the group gets it again.
    let _ = mask.thread_set_mask();
    if INTERRUPT_PENDING.swap(false, Ordering::SeqCst) {
        let _ = kill(group(), Signal::SIGINT);
    }

    let mut verdict = Verdict::default();
    if wait_stages(&mut pipeline.pids, &mut verdict).is_err() {
        terminate_group();
        exit_now(EXIT_WAIT_FAILED);
    }
    finish(verdict)
}

/// Fork every stage, chaining them with pipes.
///
/// Pipe ends move out of the leader as soon as the stage that uses them has
/// been forked: the write end right after its writer, the read end right
/// after its reader. Any early return drops whatever is still held.
fn construct(pipeline: &mut PreparedPipeline) -> Result<(), Failure> {
    let count = pipeline.stages.len();
    // Read end feeding the next stage; `None` means /dev/null.
    let mut upstream: Option<OwnedFd> = None;

    for index in 0..count {
        let is_last = index + 1 == count;
        let (downstream, mut output) = if is_last {
            (None, None)
        } else {
            let (read, write) = pipe2(OFlag::O_CLOEXEC).map_err(|_| Failure::Setup)?;
            (Some(read), Some(write))
        };
        let (exec_status_rx, exec_status_tx) =
            pipe2(OFlag::O_CLOEXEC).map_err(|_| Failure::Setup)?;

        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                drop(exec_status_rx);
                drop(downstream);
                let input = upstream.take();
                let output = output.take().or_else(|| pipeline.sink.take());
                exec_stage(&pipeline.stages[index], input, output, exec_status_tx);
            }
            Ok(ForkResult::Parent { child }) => {
                pipeline.pids.push(child);
                drop(exec_status_tx);
                drop(output.take());
                drop(upstream.take());
                upstream = downstream;
                if is_last {
                    pipeline.sink = None;
                }

                if exec_failed(exec_status_rx) {
                    return Err(Failure::Exec);
                }
            }
            Err(_) => return Err(Failure::Setup),
        }
    }

    Ok(())
}

/// Block until the stage either execs (EOF on the status pipe) or reports
/// the errno of a failed exec.
fn exec_failed(exec_status_rx: OwnedFd) -> bool {
    let mut reader = File::from(exec_status_rx);
    let mut errno = [0u8; 4];
    reader.read_exact(&mut errno).is_ok()
}

/// Body of a stage process. Never returns.
fn exec_stage(
    stage: &PreparedStage,
    input: Option<OwnedFd>,
    output: Option<OwnedFd>,
    exec_status_tx: OwnedFd,
) -> ! {
    for sig in STAGE_DEFAULT_SIGNALS {
        unsafe {
            let _ = signal(sig, SigHandler::SigDfl);
        }
    }
    let _ = nix::sys::signal::sigprocmask(SigmaskHow::SIG_SETMASK, Some(&SigSet::empty()), None);

    // Stage 0 keeps the leader's stdin, which is already /dev/null.
    if let Some(fd) = input {
        if let Err(errno) = install(fd, libc::STDIN_FILENO) {
            report_exec_failure(exec_status_tx, errno);
        }
    }
    if let Some(fd) = output {
        if let Err(errno) = install(fd, libc::STDOUT_FILENO) {
            report_exec_failure(exec_status_tx, errno);
        }
    }

    // Every other descriptor the leader holds is close-on-exec.
    unsafe {
        libc::execv(stage.program().as_ptr(), stage.argv());
    }
    report_exec_failure(exec_status_tx, Errno::last())
}

/// Move `fd` onto `target`, closing the original.
fn install(fd: OwnedFd, target: RawFd) -> nix::Result<()> {
    if fd.as_raw_fd() == target {
        fcntl(target, FcntlArg::F_SETFD(FdFlag::empty()))?;
        let _ = fd.into_raw_fd();
        return Ok(());
    }
    dup2(fd.as_raw_fd(), target)?;
    Ok(())
}

fn report_exec_failure(exec_status_tx: OwnedFd, errno: Errno) -> ! {
    let mut writer = File::from(exec_status_tx);
    let _ = writer.write_all(&(errno as i32).to_ne_bytes());
    exit_now(EXIT_EXEC_FAILED)
}

/// Reap every stage in `pids`, folding each status into `verdict`.
///
/// Interrupted waits are retried; `ECHILD` means nothing is left to reap.
fn wait_stages(pids: &mut Vec<Pid>, verdict: &mut Verdict) -> Result<(), Errno> {
    while !pids.is_empty() {
        match waitpid(Pid::from_raw(-1), None) {
            Ok(status) => {
                if let Some(pid) = status.pid() {
                    if let Some(pos) = pids.iter().position(|p| *p == pid) {
                        pids.swap_remove(pos);
                        verdict.record(status);
                    }
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => break,
            Err(errno) => return Err(errno),
        }
    }
    Ok(())
}

/// Reap whatever in `pids` has already exited, without blocking.
fn reap_exited(pids: &mut Vec<Pid>) {
    while !pids.is_empty() {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => return,
            Ok(status) => {
                if let Some(pid) = status.pid() {
                    pids.retain(|p| *p != pid);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(_) => {
                pids.clear();
                return;
            }
        }
    }
}

/// Negative pid addressing the leader's own group.
fn group() -> Pid {
    Pid::from_raw(-getpid().as_raw())
}

/// SIGTERM the whole group from inside the leader, sparing the leader.
fn terminate_group() {
    unsafe {
        let _ = signal(Signal::SIGTERM, SigHandler::SigIgn);
    }
    let _ = kill(group(), Signal::SIGTERM);
}

/// Kill the partially built pipeline, reap it and exit non-zero.
///
/// Stages still alive once the SIGTERM grace period is over get SIGKILL.
fn tear_down(pipeline: &mut PreparedPipeline, failure: Failure) -> ! {
    terminate_group();
    pipeline.sink = None;

    for _ in 0..TEARDOWN_POLLS {
        reap_exited(&mut pipeline.pids);
        if pipeline.pids.is_empty() {
            exit_now(failure.exit_code());
        }
        std::thread::sleep(TEARDOWN_POLL_INTERVAL);
    }
    for pid in &pipeline.pids {
        let _ = kill(*pid, Signal::SIGKILL);
    }

    let mut ignored = Verdict::default();
    let _ = wait_stages(&mut pipeline.pids, &mut ignored);
    exit_now(failure.exit_code())
}

/// Exit with the aggregate status of the stages.
fn finish(verdict: Verdict) -> ! {
    if let Some(sig) = verdict.signal {
        unsafe {
            let _ = signal(sig, SigHandler::SigDfl);
        }
        let mut pending = SigSet::empty();
        pending.add(sig);
        let _ = pending.thread_unblock();
        let _ = raise(sig);
        // Default action of `sig` does not terminate.
        exit_now(128 + sig as i32);
    }
    exit_now(verdict.code.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_prefers_first_signal() {
        let pid = Pid::from_raw(1);
        let mut verdict = Verdict::default();
        verdict.record(WaitStatus::Exited(pid, 3));
        verdict.record(WaitStatus::Signaled(pid, Signal::SIGPIPE, false));
        verdict.record(WaitStatus::Signaled(pid, Signal::SIGKILL, false));
        verdict.record(WaitStatus::Exited(pid, 4));

        assert_eq!(verdict.signal, Some(Signal::SIGPIPE));
        assert_eq!(verdict.code, Some(3));
    }

    #[test]
    fn test_verdict_ignores_success() {
        let pid = Pid::from_raw(1);
        let mut verdict = Verdict::default();
        verdict.record(WaitStatus::Exited(pid, 0));
        verdict.record(WaitStatus::Exited(pid, 0));

        assert!(verdict.signal.is_none());
        assert!(verdict.code.is_none());
    }
}
