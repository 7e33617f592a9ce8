//! Errors surfaced to callers of the client.

use std::path::PathBuf;
use std::time::Duration;

/// Failure of a client operation or of an individual request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An operation needing the server process ran while none was running.
    #[error("tsserver is not running")]
    ProcessNotRunning,

    #[error("tsserver is already running")]
    AlreadyRunning,

    #[error("failed to spawn tsserver at {}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize '{command}' request")]
    Serialize {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered with `success: false`.
    #[error("'{command}' failed: {message}")]
    RequestFailure { command: String, message: String },

    /// The server's output closed before the request was answered.
    #[error("tsserver exited before answering '{command}' (seq {seq})")]
    ProcessCrashed { seq: u64, command: String },

    /// The configured request timeout elapsed.
    #[error("'{command}' (seq {seq}) timed out after {}ms", after.as_millis())]
    Timeout {
        seq: u64,
        command: String,
        after: Duration,
    },
}

impl ClientError {
    /// Whether the server itself is gone (as opposed to a request-level failure).
    #[must_use]
    pub fn is_process_failure(&self) -> bool {
        matches!(
            self,
            Self::ProcessNotRunning | Self::ProcessCrashed { .. } | Self::Spawn { .. }
        )
    }
}
