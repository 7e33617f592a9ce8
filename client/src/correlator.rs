//! Request/response correlation by sequence number.

use std::collections::HashMap;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::dispatch::DispatchCommand;
use crate::error::ClientError;
use crate::protocol::Response;

pub(crate) type Completion = oneshot::Sender<Result<serde_json::Value, ClientError>>;

struct PendingCompletion {
    command: String,
    completion: Completion,
}

/// What happened to a response handed to [`Correlator::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Resolved { seq: u64 },
    Rejected { seq: u64 },
    /// No request was waiting on this sequence number.
    Orphaned { seq: u64 },
}

/// Pending completions keyed by sequence number.
///
/// Owned by the dispatch task; never shared.
#[derive(Default)]
pub(crate) struct Correlator {
    pending: HashMap<u64, PendingCompletion>,
}

impl Correlator {
    pub fn register(&mut self, seq: u64, command: String, completion: Completion) {
        let previous = self.pending.insert(
            seq,
            PendingCompletion {
                command,
                completion,
            },
        );
        if let Some(previous) = previous {
            tracing::warn!(
                seq,
                command = %previous.command,
                "Sequence number registered twice; dropping the older completion"
            );
        }
    }

    /// Complete the request matching `response.request_seq`, if any.
    pub fn resolve(&mut self, response: Response) -> Resolution {
        let seq = response.request_seq;
        let Some(pending) = self.pending.remove(&seq) else {
            tracing::debug!(seq, "Dropping response with no pending request");
            return Resolution::Orphaned { seq };
        };

        if response.success {
            tracing::debug!(seq, command = %pending.command, "Request resolved");
            let body = response.body.unwrap_or(serde_json::Value::Null);
            let _ = pending.completion.send(Ok(body));
            Resolution::Resolved { seq }
        } else {
            let message = response.message.unwrap_or_default();
            tracing::debug!(seq, command = %pending.command, %message, "Request failed");
            let _ = pending.completion.send(Err(ClientError::RequestFailure {
                command: pending.command,
                message,
            }));
            Resolution::Rejected { seq }
        }
    }

    /// Drop the entry for a request whose caller stopped waiting.
    pub fn forget(&mut self, seq: u64) -> bool {
        self.pending.remove(&seq).is_some()
    }

    /// Fail every outstanding request with [`ClientError::ProcessCrashed`].
    pub fn fail_all(&mut self) -> usize {
        let count = self.pending.len();
        for (seq, pending) in self.pending.drain() {
            let _ = pending.completion.send(Err(ClientError::ProcessCrashed {
                seq,
                command: pending.command,
            }));
        }
        count
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_pending(&self, seq: u64) -> bool {
        self.pending.contains_key(&seq)
    }
}

/// The eventual answer to a correlated request.
///
/// Await it directly (`client.send_correlated(..)?.await`) or through
/// [`PendingResponse::wait`]. Dropping it abandons the request; a late
/// response is then resolved into a closed channel and ignored.
#[must_use = "a correlated request does nothing useful unless its response is awaited"]
pub struct PendingResponse {
    seq: u64,
    command: String,
    receiver: oneshot::Receiver<Result<serde_json::Value, ClientError>>,
    timeout: Option<Duration>,
    commands: mpsc::UnboundedSender<DispatchCommand>,
}

impl PendingResponse {
    pub(crate) fn new(
        seq: u64,
        command: String,
        receiver: oneshot::Receiver<Result<serde_json::Value, ClientError>>,
        timeout: Option<Duration>,
        commands: mpsc::UnboundedSender<DispatchCommand>,
    ) -> Self {
        Self {
            seq,
            command,
            receiver,
            timeout,
            commands,
        }
    }

    /// Sequence number the request was sent with.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait for the response body.
    pub async fn wait(self) -> Result<serde_json::Value, ClientError> {
        let Self {
            seq,
            command,
            receiver,
            timeout,
            commands,
        } = self;

        let received = match timeout {
            None => receiver.await,
            Some(after) => match tokio::time::timeout(after, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    let _ = commands.send(DispatchCommand::Forget { seq });
                    return Err(ClientError::Timeout {
                        seq,
                        command,
                        after,
                    });
                }
            },
        };

        // A dropped sender means the dispatch task ended with this request
        // still queued or pending.
        received.unwrap_or(Err(ClientError::ProcessCrashed { seq, command }))
    }
}

impl IntoFuture for PendingResponse {
    type Output = Result<serde_json::Value, ClientError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
