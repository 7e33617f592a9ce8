//! Client for the TypeScript language server (`tsserver`) stdio protocol.
//!
//! [`ProtocolClient`] launches the server, writes newline-delimited JSON
//! requests, correlates responses by sequence number, and publishes
//! unsolicited events as [`Notification`]s. Diagnostics events are buffered
//! and delivered as one [`DiagnosticsReport`] when the server signals that a
//! diagnostics request completed.

pub mod codec;
pub mod types;

pub(crate) mod correlator;
pub(crate) mod dispatch;
pub(crate) mod events;
pub(crate) mod protocol;
pub(crate) mod supervisor;

mod client;
mod error;

pub use client::ProtocolClient;
pub use correlator::PendingResponse;
pub use error::ClientError;
pub use protocol::MalformedMessage;
pub use types::{
    ClientConfig, CompletionCommand, DEFAULT_SERVER_PATH, DISABLE_TYPE_ACQUISITION_FLAG,
    DiagnosticCategory, DiagnosticEntry, DiagnosticsReport, Notification, ServerStopReason,
};
