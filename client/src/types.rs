//! Public types shared between the client and its hosts.
//!
//! Hosts construct a [`ClientConfig`], pick a [`CompletionCommand`], and
//! receive [`Notification`]s from [`crate::ProtocolClient::subscribe`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Executable used when no server path is configured.
pub const DEFAULT_SERVER_PATH: &str = "tsserver";

/// Flag always appended to the server's launch arguments.
pub const DISABLE_TYPE_ACQUISITION_FLAG: &str = "--disableAutomaticTypingAcquisition";

/// How to launch and talk to tsserver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server executable. Bare names are looked up in `PATH`.
    #[serde(rename = "path")]
    pub server_path: PathBuf,
    /// Extra launch arguments, placed before the fixed flags.
    pub args: Vec<String>,
    /// Working directory for the server. Inherited when unset.
    pub working_dir: Option<PathBuf>,
    /// Environment overrides on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// Fail correlated requests that take longer than this. Unset means wait forever.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_path: PathBuf::from(DEFAULT_SERVER_PATH),
            args: Vec::new(),
            working_dir: None,
            env: HashMap::new(),
            request_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Command name used for completion requests.
///
/// Older servers only understand `completions`; newer ones answer
/// `completionInfo` with a richer body. The choice is made by the host
/// (typically from the detected server version) and injected into the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CompletionCommand {
    #[default]
    #[serde(rename = "completionInfo")]
    CompletionInfo,
    #[serde(rename = "completions")]
    Completions,
}

impl CompletionCommand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompletionInfo => "completionInfo",
            Self::Completions => "completions",
        }
    }
}

/// Which analysis pass produced a diagnostics event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    Semantic,
    Syntactic,
    Suggestion,
}

impl DiagnosticCategory {
    /// Map a server event name to its category.
    #[must_use]
    pub fn from_event(name: &str) -> Option<Self> {
        match name {
            "semanticDiag" => Some(Self::Semantic),
            "syntaxDiag" => Some(Self::Syntactic),
            "suggestionDiag" => Some(Self::Suggestion),
            _ => None,
        }
    }

    #[must_use]
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::Semantic => "semanticDiag",
            Self::Syntactic => "syntaxDiag",
            Self::Suggestion => "suggestionDiag",
        }
    }
}

/// One diagnostics event body, tagged with the pass that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticEntry {
    category: DiagnosticCategory,
    body: serde_json::Value,
}

impl DiagnosticEntry {
    #[must_use]
    pub fn new(category: DiagnosticCategory, body: serde_json::Value) -> Self {
        Self { category, body }
    }

    #[must_use]
    pub fn category(&self) -> DiagnosticCategory {
        self.category
    }

    /// Event body as sent by the server (`null` when absent).
    #[must_use]
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    #[must_use]
    pub fn into_body(self) -> serde_json::Value {
        self.body
    }
}

/// The diagnostics accumulated up to a `requestCompleted` event, in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticsReport {
    request_seq: Option<u64>,
    entries: Vec<DiagnosticEntry>,
}

impl DiagnosticsReport {
    #[must_use]
    pub fn new(request_seq: Option<u64>, entries: Vec<DiagnosticEntry>) -> Self {
        Self {
            request_seq,
            entries,
        }
    }

    /// Sequence number of the request whose completion flushed the batch, if
    /// the server reported one.
    #[must_use]
    pub fn request_seq(&self) -> Option<u64> {
        self.request_seq
    }

    #[must_use]
    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    /// Event bodies in arrival order, without their category.
    pub fn bodies(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.entries.iter().map(DiagnosticEntry::body)
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<DiagnosticEntry> {
        self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why the server process went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStopReason {
    /// The process exited. `code` is `None` when it was ended by a signal.
    Exited { code: Option<i32> },
    /// Waiting on the process failed.
    Failed(String),
}

/// Unsolicited notifications published by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// `projectLoadingFinish`.
    ProjectLoadingFinished,
    /// `telemetry`, with the event body.
    Telemetry(serde_json::Value),
    /// `projectsUpdatedInBackground`, with the event body.
    ProjectsUpdatedInBackground(serde_json::Value),
    /// A `requestCompleted` event flushed the diagnostics batch.
    DiagnosticsCompleted(DiagnosticsReport),
    /// A server process exited. `run` is the value
    /// [`crate::ProtocolClient::server_run`] reported while it was running, so
    /// the late exit of a stopped server can be told apart from the current one.
    ServerExited { run: u64, reason: ServerStopReason },
}
