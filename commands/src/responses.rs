//! Typed response bodies for the commands whose results hosts inspect.

use std::path::Path;

use serde::Deserialize;
use tss_client::{DiagnosticCategory, DiagnosticsReport};

use crate::error::CommandError;

/// 1-based position in a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct Location {
    pub line: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSpan {
    pub file: String,
    pub start: Location,
    pub end: Location,
}

/// Documentation text, sent as a plain string or as display parts
/// depending on the server version.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Documentation {
    Text(String),
    Parts(Vec<DisplayPart>),
}

impl Default for Documentation {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Documentation {
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts.iter().map(|p| p.text.as_str()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayPart {
    pub text: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickInfo {
    pub kind: String,
    #[serde(default)]
    pub kind_modifiers: String,
    pub start: Location,
    pub end: Location,
    pub display_string: String,
    #[serde(default)]
    pub documentation: Documentation,
    #[serde(default)]
    pub tags: Vec<serde_json::Value>,
}

/// Severity of a diagnostic, from its `category` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Suggestion,
    Message,
}

impl DiagnosticSeverity {
    /// Returns `None` for categories the server does not define.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match category {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "suggestion" => Some(Self::Suggestion),
            "message" => Some(Self::Message),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Message => "message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub start: Location,
    pub end: Location,
    pub text: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub reports_unnecessary: bool,
}

impl Diagnostic {
    /// Unknown categories are reported as plain messages.
    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        DiagnosticSeverity::from_category(&self.category).unwrap_or(DiagnosticSeverity::Message)
    }

    /// Format as `path:line:offset: severity: [TScode] text`.
    #[must_use]
    pub fn display_with_path(&self, path: &Path) -> String {
        let origin = match (&self.source, self.code) {
            (Some(source), _) => source.clone(),
            (None, Some(code)) => format!("TS{code}"),
            (None, None) => "ts".to_string(),
        };
        format!(
            "{}:{}:{}: {}: [{}] {}",
            path.display(),
            self.start.line,
            self.start.offset,
            self.severity().label(),
            origin,
            self.text,
        )
    }
}

/// Body of a `semanticDiag`, `syntaxDiag` or `suggestionDiag` event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosticEventBody {
    pub file: String,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// One decoded entry of a [`DiagnosticsReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiagnostics {
    pub category: DiagnosticCategory,
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decode every entry of a diagnostics batch, keeping batch order.
pub fn decode_report(report: &DiagnosticsReport) -> Result<Vec<FileDiagnostics>, CommandError> {
    report
        .entries()
        .iter()
        .map(|entry| {
            let body = DiagnosticEventBody::deserialize(entry.body()).map_err(|source| {
                CommandError::Decode {
                    command: entry.category().event_name(),
                    source,
                }
            })?;
            Ok(FileDiagnostics {
                category: entry.category(),
                file: body.file,
                diagnostics: body.diagnostics,
            })
        })
        .collect()
}
