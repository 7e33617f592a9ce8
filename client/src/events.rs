//! Routing of unsolicited server events.
//!
//! Diagnostics arrive as a run of `semanticDiag` / `syntaxDiag` /
//! `suggestionDiag` events and are published as one
//! [`Notification::DiagnosticsCompleted`] when `requestCompleted` arrives.

use tokio::sync::broadcast;

use crate::protocol::ServerEvent;
use crate::types::{DiagnosticEntry, DiagnosticsReport, Notification};

/// Owns the diagnostics batch and publishes notifications.
pub(crate) struct EventRouter {
    batch: Vec<DiagnosticEntry>,
    notify: broadcast::Sender<Notification>,
}

impl EventRouter {
    pub fn new(notify: broadcast::Sender<Notification>) -> Self {
        Self {
            batch: Vec::new(),
            notify,
        }
    }

    pub fn route(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Diagnostic { category, body } => {
                self.batch.push(DiagnosticEntry::new(
                    category,
                    body.unwrap_or(serde_json::Value::Null),
                ));
            }
            ServerEvent::RequestCompleted { request_seq } => {
                let entries = std::mem::take(&mut self.batch);
                tracing::debug!(
                    request_seq = ?request_seq,
                    count = entries.len(),
                    "Diagnostics batch completed"
                );
                self.publish(Notification::DiagnosticsCompleted(DiagnosticsReport::new(
                    request_seq,
                    entries,
                )));
            }
            ServerEvent::ProjectLoadingFinish => {
                self.publish(Notification::ProjectLoadingFinished);
            }
            ServerEvent::Telemetry(body) => {
                self.publish(Notification::Telemetry(
                    body.unwrap_or(serde_json::Value::Null),
                ));
            }
            ServerEvent::ProjectsUpdatedInBackground(body) => {
                self.publish(Notification::ProjectsUpdatedInBackground(
                    body.unwrap_or(serde_json::Value::Null),
                ));
            }
            ServerEvent::Unknown(name) => {
                tracing::trace!("Ignoring tsserver event: {name}");
            }
        }
    }

    // No subscribers is not an error: notifications are opt-in.
    fn publish(&self, notification: Notification) {
        let _ = self.notify.send(notification);
    }

    #[cfg(test)]
    pub fn batch_len(&self) -> usize {
        self.batch.len()
    }
}
