//! Process supervision: launching tsserver, watching it, and stopping it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::dispatch::{DispatchCommand, Session};
use crate::error::ClientError;
use crate::types::{DISABLE_TYPE_ACQUISITION_FLAG, Notification, ServerStopReason};

/// How long a stopped server gets to exit after the interrupt before it is killed.
const SHUTDOWN_GRACE_SECS: u64 = 2;

/// Everything needed to launch the server.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LaunchSpec<'a> {
    pub executable: &'a Path,
    pub args: &'a [String],
    pub working_dir: Option<&'a Path>,
    pub env: &'a HashMap<String, String>,
}

/// Resolve bare command names through `PATH`; anything else is used as given.
fn resolve_executable(executable: &Path) -> PathBuf {
    if executable.components().count() > 1 {
        return executable.to_path_buf();
    }
    which::which(executable).unwrap_or_else(|_| executable.to_path_buf())
}

/// Build the platform-specific launch command.
///
/// Unix runs the executable directly in a new session so it has no
/// controlling terminal and its process group can be signalled as a unit.
/// Windows wraps it in `cmd /c` (tsserver is usually a `.cmd` shim) without a
/// console window and without detaching.
pub(crate) fn build_command(spec: LaunchSpec<'_>) -> Command {
    let executable = resolve_executable(spec.executable);
    let mut args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
    args.push(DISABLE_TYPE_ACQUISITION_FLAG);

    #[cfg(windows)]
    let mut cmd = {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        let mut cmd = Command::new("cmd");
        cmd.arg("/c").arg(&executable).args(&args);
        cmd.creation_flags(CREATE_NO_WINDOW);
        cmd
    };

    #[cfg(not(windows))]
    let mut cmd = {
        let mut cmd = Command::new(&executable);
        cmd.args(&args);
        cmd
    };

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = spec.working_dir {
        cmd.current_dir(dir);
    }
    cmd.envs(spec.env);

    #[cfg(unix)]
    set_new_session(&mut cmd);

    cmd
}

#[cfg(unix)]
fn set_new_session(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    unsafe {
        cmd.as_std_mut().pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            // Linux-only: the server dies with us instead of lingering as an orphan.
            #[cfg(target_os = "linux")]
            if libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM) == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

/// Send the interrupt. On Unix the whole process group (pid == pgid after
/// `setsid`) gets SIGINT so helpers like the typings installer go too.
fn interrupt(child: &mut Child) {
    #[cfg(unix)]
    {
        let Some(pid) = child.id() else { return };
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            let _ = child.start_kill();
            return;
        };
        unsafe {
            if libc::killpg(pid, libc::SIGINT) == -1 && libc::kill(pid, libc::SIGINT) == -1 {
                tracing::debug!(
                    "Failed to interrupt tsserver: {}",
                    std::io::Error::last_os_error()
                );
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }
}

fn stop_reason(status: std::io::Result<ExitStatus>) -> ServerStopReason {
    match status {
        Ok(status) => ServerStopReason::Exited {
            code: status.code(),
        },
        Err(e) => ServerStopReason::Failed(e.to_string()),
    }
}

async fn watch_exit(
    run: u64,
    mut child: Child,
    stop: oneshot::Receiver<()>,
    notify: broadcast::Sender<Notification>,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        // Fires on an explicit stop and when the handle is dropped.
        _ = stop => {
            interrupt(&mut child);
            match tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    tracing::debug!("tsserver didn't exit in time, killing");
                    let _ = child.kill().await;
                    child.wait().await
                }
            }
        }
    };

    let reason = stop_reason(status);
    match &reason {
        ServerStopReason::Exited { code } => tracing::info!(run, code = ?code, "tsserver exited"),
        ServerStopReason::Failed(msg) => tracing::warn!(run, error = %msg, "tsserver wait failed"),
    }
    let _ = notify.send(Notification::ServerExited { run, reason });
}

async fn drain_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "tss_client::stderr", "{line}");
    }
}

struct ProcessWatch {
    pid: Option<u32>,
    stop: Option<oneshot::Sender<()>>,
    exit: JoinHandle<()>,
}

/// Exclusive ownership of one running server.
///
/// Dropping it interrupts the server the same way [`RunningServer::stop`] does.
pub(crate) struct RunningServer {
    run: u64,
    session: Session,
    process: Option<ProcessWatch>,
}

impl RunningServer {
    /// Launch the server. Returns as soon as the process exists; the protocol
    /// has no readiness handshake. Must be called within a Tokio runtime.
    pub fn start(
        run: u64,
        spec: LaunchSpec<'_>,
        notify: broadcast::Sender<Notification>,
    ) -> Result<Self, ClientError> {
        tracing::info!(
            executable = %spec.executable.display(),
            args = ?spec.args,
            "Starting tsserver"
        );
        let mut child = build_command(spec)
            .spawn()
            .map_err(|source| ClientError::Spawn {
                path: spec.executable.to_path_buf(),
                source,
            })?;

        let (Some(stdout), Some(stdin), Some(stderr)) =
            (child.stdout.take(), child.stdin.take(), child.stderr.take())
        else {
            return Err(ClientError::Spawn {
                path: spec.executable.to_path_buf(),
                source: std::io::Error::other("tsserver stdio was not piped"),
            });
        };

        tokio::spawn(drain_stderr(stderr));
        let pid = child.id();
        let session = Session::spawn(stdout, stdin, notify.clone());
        let (stop_tx, stop_rx) = oneshot::channel();
        let exit = tokio::spawn(watch_exit(run, child, stop_rx, notify));

        tracing::info!(run, pid = ?pid, "tsserver started");
        Ok(Self {
            run,
            session,
            process: Some(ProcessWatch {
                pid,
                stop: Some(stop_tx),
                exit,
            }),
        })
    }

    /// Serve an already-connected pair of streams with no process behind them.
    #[cfg(test)]
    pub fn attach<R, W>(
        run: u64,
        stdout: R,
        stdin: W,
        notify: broadcast::Sender<Notification>,
    ) -> Self
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            run,
            session: Session::spawn(stdout, stdin, notify),
            process: None,
        }
    }

    /// Queue a command for the dispatch task.
    pub fn dispatch(&self, command: DispatchCommand) -> Result<(), ClientError> {
        self.session
            .commands()
            .send(command)
            .map_err(|_| ClientError::ProcessNotRunning)
    }

    pub fn commands(&self) -> &tokio::sync::mpsc::UnboundedSender<DispatchCommand> {
        self.session.commands()
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.pid)
    }

    pub fn is_alive(&self) -> bool {
        let process_alive = self
            .process
            .as_ref()
            .is_none_or(|p| !p.exit.is_finished());
        process_alive && self.session.is_open()
    }

    /// Interrupt the server. Consumes the handle.
    pub fn stop(mut self) {
        if let Some(stop) = self.process.as_mut().and_then(|p| p.stop.take()) {
            tracing::info!(pid = ?self.pid(), "Stopping tsserver");
            // The watcher may already have seen the process exit on its own.
            let _ = stop.send(());
        }
    }
}
