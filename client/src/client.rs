//! `ProtocolClient`, the type hosts interact with.
//!
//! Owns the configuration, the sequence counter, the running server (if any)
//! and the notification channel. There is no shared global instance: hosts
//! construct a client and pass it to whatever needs it.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, oneshot};

use crate::correlator::PendingResponse;
use crate::dispatch::DispatchCommand;
use crate::error::ClientError;
use crate::protocol::Request;
use crate::supervisor::{LaunchSpec, RunningServer};
use crate::types::{ClientConfig, CompletionCommand, Notification};

/// Capacity of the notification channel; slow subscribers see `Lagged`.
const NOTIFICATION_CAPACITY: usize = 256;

pub struct ProtocolClient {
    config: ClientConfig,
    completion_command: CompletionCommand,
    next_seq: AtomicU64,
    /// Id given to the next server start.
    next_run: u64,
    server: Option<RunningServer>,
    notify: broadcast::Sender<Notification>,
}

impl ProtocolClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let (notify, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            config,
            completion_command: CompletionCommand::default(),
            next_seq: AtomicU64::new(0),
            next_run: 0,
            server: None,
            notify,
        }
    }

    #[must_use]
    pub fn with_completion_command(mut self, command: CompletionCommand) -> Self {
        self.completion_command = command;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Command name to use for completion requests.
    #[must_use]
    pub fn completion_command(&self) -> CompletionCommand {
        self.completion_command
    }

    pub fn set_completion_command(&mut self, command: CompletionCommand) {
        self.completion_command = command;
    }

    /// Receive notifications published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify.subscribe()
    }

    /// Launch the server. Must be called within a Tokio runtime.
    ///
    /// A previous server that already exited on its own is replaced.
    pub fn start(&mut self) -> Result<(), ClientError> {
        if self.is_running() {
            return Err(ClientError::AlreadyRunning);
        }
        let spec = LaunchSpec {
            executable: &self.config.server_path,
            args: &self.config.args,
            working_dir: self.config.working_dir.as_deref(),
            env: &self.config.env,
        };
        let run = self.next_run;
        self.server = Some(RunningServer::start(run, spec, self.notify.clone())?);
        self.next_run += 1;
        Ok(())
    }

    /// Interrupt the server and clear the handle.
    ///
    /// Fails with [`ClientError::ProcessNotRunning`] when there is nothing to
    /// stop, including a second call in a row.
    pub fn stop(&mut self) -> Result<(), ClientError> {
        let server = self.server.take().ok_or(ClientError::ProcessNotRunning)?;
        server.stop();
        Ok(())
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.server.as_ref().is_some_and(RunningServer::is_alive)
    }

    /// OS process id of the running server.
    #[must_use]
    pub fn server_pid(&self) -> Option<u32> {
        self.server.as_ref().and_then(RunningServer::pid)
    }

    /// Id of the current server start, matched by
    /// [`Notification::ServerExited`]. Each successful `start` gets a new one.
    #[must_use]
    pub fn server_run(&self) -> Option<u64> {
        self.server.as_ref().map(RunningServer::run)
    }

    /// Send a request whose response is awaited.
    ///
    /// Fails immediately with [`ClientError::ProcessNotRunning`] when no
    /// server is running; otherwise the returned [`PendingResponse`] resolves
    /// when the server answers this request's sequence number.
    pub fn send_correlated(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<PendingResponse, ClientError> {
        let server = self.running()?;
        let seq = self.next_seq();
        let line = encode(seq, command, arguments.as_ref())?;
        let (tx, rx) = oneshot::channel();

        server.dispatch(DispatchCommand::Send {
            seq,
            command: command.to_string(),
            line,
            completion: Some(tx),
        })?;

        Ok(PendingResponse::new(
            seq,
            command.to_string(),
            rx,
            self.config.request_timeout(),
            server.commands().clone(),
        ))
    }

    /// Send a request without tracking a response. Any response that does
    /// arrive for it is dropped. Returns the sequence number used.
    pub fn send_fire_and_forget(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<u64, ClientError> {
        let server = self.running()?;
        let seq = self.next_seq();
        let line = encode(seq, command, arguments.as_ref())?;

        server.dispatch(DispatchCommand::Send {
            seq,
            command: command.to_string(),
            line,
            completion: None,
        })?;
        Ok(seq)
    }

    fn running(&self) -> Result<&RunningServer, ClientError> {
        self.server.as_ref().ok_or(ClientError::ProcessNotRunning)
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    #[cfg(test)]
    pub(crate) fn attach<R, W>(&mut self, stdout: R, stdin: W)
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let run = self.next_run;
        self.next_run += 1;
        self.server = Some(RunningServer::attach(run, stdout, stdin, self.notify.clone()));
    }
}

fn encode(
    seq: u64,
    command: &str,
    arguments: Option<&serde_json::Value>,
) -> Result<String, ClientError> {
    Request::new(seq, command, arguments)
        .to_line()
        .map_err(|source| ClientError::Serialize {
            command: command.to_string(),
            source,
        })
}
