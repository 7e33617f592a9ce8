//! Request arguments, serialized with the server's camelCase field names.
//!
//! Positions are 1-based (`line` and `offset`), as the server expects.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequestArgs {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file_name: Option<String>,
}

impl FileRequestArgs {
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            project_file_name: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLocationRequestArgs {
    pub file: String,
    pub line: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file_name: Option<String>,
}

impl FileLocationRequestArgs {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, offset: u32) -> Self {
        Self {
            file: file.into(),
            line,
            offset,
            project_file_name: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenRequestArgs {
    pub file: String,
    /// Buffer contents; when absent the server reads the file from disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_kind_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root_path: Option<String>,
}

impl OpenRequestArgs {
    #[must_use]
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }
}

/// Reload `file` from the contents of `tmpfile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadRequestArgs {
    pub file: String,
    pub tmpfile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionsRequestArgs {
    pub file: String,
    pub line: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_external_module_exports: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_insert_text_completions: Option<bool>,
}

/// A completion entry, by plain name or by name plus originating module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CompletionEntryIdentifier {
    Name(String),
    Sourced { name: String, source: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDetailsRequestArgs {
    pub file: String,
    pub line: u32,
    pub offset: u32,
    pub entry_names: Vec<CompletionEntryIdentifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfoRequestArgs {
    pub file: String,
    pub need_file_name_list: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequestArgs {
    pub file: String,
    pub line: u32,
    pub offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find_in_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub find_in_strings: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavtoRequestArgs {
    pub search_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_result_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file_name: Option<String>,
}

/// Asynchronous diagnostics for a set of files. Results arrive as
/// diagnostics events, terminated by `requestCompleted`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeterrRequestArgs {
    pub files: Vec<String>,
    /// Milliseconds the server waits before starting.
    pub delay: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeterrForProjectRequestArgs {
    pub file: String,
    pub delay: u32,
}

/// Shared by the semantic, syntactic and suggestion `*DiagnosticsSync` commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSyncRequestArgs {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_line_position: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRangeRequestArgs {
    pub file: String,
    pub start_line: u32,
    pub start_offset: u32,
    pub end_line: u32,
    pub end_offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFixRequestArgs {
    #[serde(flatten)]
    pub range: FileRangeRequestArgs,
    pub error_codes: Vec<i64>,
}

/// Scope of a whole-file operation such as organizing imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileScope {
    #[serde(rename = "type")]
    kind: &'static str,
    pub args: FileRequestArgs,
}

impl FileScope {
    #[must_use]
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            kind: "file",
            args: FileRequestArgs::new(file),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCombinedCodeFixRequestArgs {
    pub scope: FileScope,
    /// Opaque id taken from a previous `getCodeFixes` result.
    pub fix_id: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeImportsRequestArgs {
    pub scope: FileScope,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEditsForFileRenameRequestArgs {
    pub old_file_path: String,
    pub new_file_path: String,
}
