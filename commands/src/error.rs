use tss_client::ClientError;

/// Failure of a typed command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to encode '{command}' arguments")]
    Encode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The server answered, but the body did not have the expected shape.
    #[error("unexpected '{command}' response body")]
    Decode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Notifications were dropped while waiting, so the awaited one may never
    /// be seen.
    #[error("'{command}' missed {skipped} notifications while waiting")]
    MissedNotifications { command: &'static str, skipped: u64 },
}

impl CommandError {
    /// Whether the failure came from the server process going away.
    #[must_use]
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_process_failure())
    }
}
