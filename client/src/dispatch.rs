//! The dispatch task: the single owner of correlation and event state.
//!
//! Inbound lines and outbound registrations are both processed here, one at
//! a time, so the pending map and the diagnostics batch need no locking and
//! a request is always registered before its line reaches the writer.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::codec::{FrameReader, FrameWriter};
use crate::correlator::{Completion, Correlator, Resolution};
use crate::events::EventRouter;
use crate::protocol::{self, Incoming};
use crate::types::Notification;

pub(crate) enum DispatchCommand {
    /// Write a serialized request, registering `completion` first when present.
    Send {
        seq: u64,
        command: String,
        line: String,
        completion: Option<Completion>,
    },
    /// Stop tracking a request whose caller gave up.
    Forget { seq: u64 },
}

/// Outcome of dispatching one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dispatched {
    Response(Resolution),
    Event,
    Ignored,
    Malformed,
}

pub(crate) struct Dispatcher {
    correlator: Correlator,
    events: EventRouter,
}

impl Dispatcher {
    pub fn new(notify: broadcast::Sender<Notification>) -> Self {
        Self {
            correlator: Correlator::default(),
            events: EventRouter::new(notify),
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Dispatched {
        match protocol::decode(line) {
            Ok(Incoming::Response(response)) => {
                Dispatched::Response(self.correlator.resolve(response))
            }
            Ok(Incoming::Event(event)) => {
                self.events.route(event);
                Dispatched::Event
            }
            Ok(Incoming::Other) => {
                tracing::trace!("Ignoring message that is neither response nor event");
                Dispatched::Ignored
            }
            Err(e) => {
                tracing::warn!("{e}");
                Dispatched::Malformed
            }
        }
    }

    /// Apply a command, returning the line to write if there is one.
    pub fn handle_command(&mut self, command: DispatchCommand) -> Option<String> {
        match command {
            DispatchCommand::Send {
                seq,
                command,
                line,
                completion,
            } => {
                match completion {
                    Some(completion) => {
                        tracing::debug!(seq, %command, "Sending request");
                        self.correlator.register(seq, command, completion);
                    }
                    None => tracing::debug!(seq, %command, "Sending request (no response expected)"),
                }
                Some(line)
            }
            DispatchCommand::Forget { seq } => {
                if self.correlator.forget(seq) {
                    tracing::debug!(seq, "Forgot abandoned request");
                }
                None
            }
        }
    }

    /// Fail everything still pending; called once the server's output is gone.
    pub fn close(&mut self) -> usize {
        self.correlator.fail_all()
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.correlator.len()
    }

    #[cfg(test)]
    pub fn batch_len(&self) -> usize {
        self.events.batch_len()
    }
}

/// Handles to the tasks serving one server connection.
pub(crate) struct Session {
    commands: mpsc::UnboundedSender<DispatchCommand>,
    dispatch: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Session {
    /// Spawn the dispatch and writer tasks over the server's stdout and stdin.
    pub fn spawn<R, W>(stdout: R, stdin: W, notify: broadcast::Sender<Notification>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (writer_tx, writer_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(write_loop(stdin, writer_rx));
        let dispatch = tokio::spawn(dispatch_loop(
            Dispatcher::new(notify),
            FrameReader::new(stdout),
            commands_rx,
            writer_tx,
        ));

        Self {
            commands: commands_tx,
            dispatch,
            writer,
        }
    }

    pub fn commands(&self) -> &mpsc::UnboundedSender<DispatchCommand> {
        &self.commands
    }

    /// Whether the dispatch task is still reading server output.
    pub fn is_open(&self) -> bool {
        !self.dispatch.is_finished()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.writer.abort();
    }
}

async fn write_loop<W>(stdin: W, mut lines: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    let mut writer = FrameWriter::new(stdin);
    while let Some(line) = lines.recv().await {
        if let Err(e) = writer.write_line(&line).await {
            tracing::warn!("tsserver write error: {e:#}");
            break;
        }
    }
}

async fn dispatch_loop<R>(
    mut dispatcher: Dispatcher,
    mut reader: FrameReader<R>,
    mut commands: mpsc::UnboundedReceiver<DispatchCommand>,
    writer: mpsc::UnboundedSender<String>,
) where
    R: AsyncRead + Unpin,
{
    let mut commands_open = true;
    loop {
        tokio::select! {
            biased;

            command = commands.recv(), if commands_open => match command {
                Some(command) => {
                    if let Some(line) = dispatcher.handle_command(command)
                        && writer.send(line).is_err()
                    {
                        tracing::debug!("tsserver writer is gone; request not written");
                    }
                }
                None => commands_open = false,
            },
            frame = reader.read_frame() => match frame {
                Ok(Some(line)) => {
                    dispatcher.handle_line(&line);
                }
                Ok(None) => {
                    tracing::info!("tsserver closed stdout");
                    break;
                }
                Err(e) => {
                    tracing::warn!("tsserver read error: {e:#}");
                    break;
                }
            },
        }
    }

    let failed = dispatcher.close();
    if failed > 0 {
        tracing::warn!(failed, "Failed outstanding requests after tsserver output closed");
    }
}
