//! Typed tsserver command catalogue on top of [`tss_client::ProtocolClient`].
//!
//! Each command maps to one server command name. Commands with no useful
//! response are sent fire-and-forget and return the sequence number used.

pub mod args;
pub mod responses;

mod catalogue;
mod error;

pub use catalogue::Commands;
pub use error::CommandError;
pub use responses::{
    Diagnostic, DiagnosticEventBody, DiagnosticSeverity, Documentation, FileDiagnostics,
    FileSpan, Location, QuickInfo, decode_report,
};
