//! Plain-text rendering of command results.

use std::fmt::Write as _;
use std::path::Path;

use serde::Deserialize;
use tss_commands::{FileDiagnostics, FileSpan, QuickInfo};

pub(crate) fn quickinfo(info: &QuickInfo) -> String {
    let mut out = info.display_string.clone();
    let docs = info.documentation.to_text();
    if !docs.trim().is_empty() {
        out.push_str("\n\n");
        out.push_str(docs.trim());
    }
    out
}

pub(crate) fn spans(spans: &[FileSpan]) -> String {
    spans
        .iter()
        .map(|span| format!("{}:{}:{}", span.file, span.start.line, span.start.offset))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferencesBody {
    #[serde(default)]
    refs: Vec<ReferenceEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReferenceEntry {
    file: String,
    start: tss_commands::Location,
    #[serde(default)]
    line_text: String,
}

pub(crate) fn references(body: &serde_json::Value) -> anyhow::Result<String> {
    let body = ReferencesBody::deserialize(body)?;
    Ok(body
        .refs
        .iter()
        .map(|r| {
            format!(
                "{}:{}:{}: {}",
                r.file,
                r.start.line,
                r.start.offset,
                r.line_text.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

#[derive(Deserialize)]
struct CompletionEntry {
    name: String,
    #[serde(default)]
    kind: String,
}

/// Handles both the `completionInfo` object and the older bare entry list.
pub(crate) fn completions(body: &serde_json::Value, prefix: Option<&str>) -> anyhow::Result<String> {
    let entries = match body.get("entries") {
        Some(entries) => entries,
        None => body,
    };
    let entries = Vec::<CompletionEntry>::deserialize(entries)?;
    Ok(entries
        .iter()
        .filter(|e| prefix.is_none_or(|p| e.name.starts_with(p)))
        .map(|e| format!("{}\t{}", e.name, e.kind))
        .collect::<Vec<_>>()
        .join("\n"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavTreeItem {
    text: String,
    kind: String,
    #[serde(default)]
    child_items: Vec<NavTreeItem>,
}

pub(crate) fn navtree(body: &serde_json::Value) -> anyhow::Result<String> {
    fn walk(item: &NavTreeItem, depth: usize, out: &mut String) {
        let _ = writeln!(out, "{:indent$}{} {}", "", item.kind, item.text, indent = depth * 2);
        for child in &item.child_items {
            walk(child, depth + 1, out);
        }
    }

    let root = NavTreeItem::deserialize(body)?;
    let mut out = String::new();
    walk(&root, 0, &mut out);
    Ok(out.trim_end().to_string())
}

/// One line per diagnostic, files in batch order. Returns the text and the
/// number of errors.
pub(crate) fn diagnostics(files: &[FileDiagnostics]) -> (String, usize) {
    let mut lines = Vec::new();
    let mut errors = 0;
    for file in files {
        for diagnostic in &file.diagnostics {
            if diagnostic.severity().is_error() {
                errors += 1;
            }
            lines.push(diagnostic.display_with_path(Path::new(&file.file)));
        }
    }
    (lines.join("\n"), errors)
}
