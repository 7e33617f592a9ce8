//! Wire types for the tsserver protocol.

use serde::{Deserialize, Serialize};

use crate::types::DiagnosticCategory;

/// Outbound request: `{"seq":N,"type":"request","command":"...","arguments":...}`.
#[derive(Debug, Serialize)]
pub(crate) struct Request<'a> {
    pub seq: u64,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub command: &'a str,
    pub arguments: Option<&'a serde_json::Value>,
}

impl<'a> Request<'a> {
    pub fn new(seq: u64, command: &'a str, arguments: Option<&'a serde_json::Value>) -> Self {
        Self {
            seq,
            kind: "request",
            command,
            arguments,
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A protocol line that is not valid JSON of the expected shape.
#[derive(Debug, thiserror::Error)]
#[error("malformed message from tsserver: {source}")]
pub struct MalformedMessage {
    #[from]
    source: serde_json::Error,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    request_seq: Option<u64>,
    #[serde(default)]
    success: bool,
    body: Option<serde_json::Value>,
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    event: Option<String>,
}

/// A response correlated to an earlier request by `request_seq`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Response {
    pub request_seq: u64,
    pub success: bool,
    pub body: Option<serde_json::Value>,
    pub message: Option<String>,
}

/// An unsolicited event, classified by name.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ServerEvent {
    Telemetry(Option<serde_json::Value>),
    ProjectsUpdatedInBackground(Option<serde_json::Value>),
    ProjectLoadingFinish,
    Diagnostic {
        category: DiagnosticCategory,
        body: Option<serde_json::Value>,
    },
    RequestCompleted {
        request_seq: Option<u64>,
    },
    Unknown(String),
}

impl ServerEvent {
    fn classify(name: String, body: Option<serde_json::Value>) -> Self {
        if let Some(category) = DiagnosticCategory::from_event(&name) {
            return Self::Diagnostic { category, body };
        }
        match name.as_str() {
            "telemetry" => Self::Telemetry(body),
            "projectsUpdatedInBackground" => Self::ProjectsUpdatedInBackground(body),
            "projectLoadingFinish" => Self::ProjectLoadingFinish,
            "requestCompleted" => Self::RequestCompleted {
                request_seq: body
                    .as_ref()
                    .and_then(|b| b.get("request_seq"))
                    .and_then(serde_json::Value::as_u64),
            },
            _ => Self::Unknown(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Incoming {
    Response(Response),
    Event(ServerEvent),
    /// Valid JSON that is neither a response nor an event.
    Other,
}

/// Classify one protocol line.
///
/// A numeric `request_seq` makes a message a response regardless of its
/// `type`; otherwise `"type":"event"` makes it an event.
pub(crate) fn decode(line: &str) -> Result<Incoming, MalformedMessage> {
    let raw: RawMessage = serde_json::from_str(line)?;

    if let Some(request_seq) = raw.request_seq {
        return Ok(Incoming::Response(Response {
            request_seq,
            success: raw.success,
            body: raw.body,
            message: raw.message,
        }));
    }

    match (raw.kind.as_deref(), raw.event) {
        (Some("event"), Some(name)) => Ok(Incoming::Event(ServerEvent::classify(name, raw.body))),
        _ => Ok(Incoming::Other),
    }
}
