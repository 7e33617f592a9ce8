//! Compiler version probing, used to pick the completion command.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tss_client::CompletionCommand;

use crate::CompletionSetting;

/// Servers from this version on understand `completionInfo`.
const COMPLETION_INFO_SINCE: TsVersion = TsVersion::new(3, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl TsVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for TsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("failed to run {}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} --version exited with {code:?}", path.display())]
    Status { path: PathBuf, code: Option<i32> },
    #[error("unrecognized version output: {output:?}")]
    Parse { output: String },
}

/// Parse `tsc --version` output such as `Version 5.4.2` or
/// `Version 5.5.0-dev.20240501`. Missing minor or patch parts count as zero.
pub fn parse_version(output: &str) -> Result<TsVersion, VersionError> {
    let parse_error = || VersionError::Parse {
        output: output.trim().to_string(),
    };

    let token = output.split_whitespace().last().ok_or_else(parse_error)?;
    let release = token.split('-').next().unwrap_or(token);
    let mut parts = release.split('.').map(str::parse::<u32>);

    let major = parts.next().and_then(Result::ok).ok_or_else(parse_error)?;
    let mut next = || match parts.next() {
        None => Ok(0),
        Some(part) => part.map_err(|_| parse_error()),
    };
    let minor = next()?;
    let patch = next()?;
    Ok(TsVersion::new(major, minor, patch))
}

/// The compiler next to a server: `tsserver` in the file name becomes `tsc`.
#[must_use]
pub fn tsc_path_for(server_path: &Path) -> PathBuf {
    let Some(name) = server_path.file_name().and_then(|n| n.to_str()) else {
        return PathBuf::from("tsc");
    };
    if name.contains("tsserver") {
        server_path.with_file_name(name.replacen("tsserver", "tsc", 1))
    } else {
        PathBuf::from("tsc")
    }
}

/// Run `<tsc> --version` and parse the result.
pub async fn detect_version(tsc: &Path) -> Result<TsVersion, VersionError> {
    let mut cmd = if cfg!(windows) {
        let mut cmd = tokio::process::Command::new("cmd");
        cmd.arg("/c").arg(tsc);
        cmd
    } else {
        tokio::process::Command::new(tsc)
    };
    let output = cmd
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| VersionError::Spawn {
            path: tsc.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(VersionError::Status {
            path: tsc.to_path_buf(),
            code: output.status.code(),
        });
    }
    parse_version(&String::from_utf8_lossy(&output.stdout))
}

#[must_use]
pub fn completion_command_for(version: TsVersion) -> CompletionCommand {
    if version >= COMPLETION_INFO_SINCE {
        CompletionCommand::CompletionInfo
    } else {
        CompletionCommand::Completions
    }
}

/// Turn the configured setting into a command, probing the compiler for
/// [`CompletionSetting::Auto`]. A failed detection falls back to
/// `completionInfo`.
pub async fn resolve_completion_command(
    setting: CompletionSetting,
    server_path: &Path,
) -> CompletionCommand {
    match setting {
        CompletionSetting::CompletionInfo => CompletionCommand::CompletionInfo,
        CompletionSetting::Completions => CompletionCommand::Completions,
        CompletionSetting::Auto => {
            let tsc = tsc_path_for(server_path);
            match detect_version(&tsc).await {
                Ok(version) => {
                    let command = completion_command_for(version);
                    tracing::debug!(%version, command = command.as_str(), "Detected TypeScript version");
                    command
                }
                Err(e) => {
                    tracing::warn!("Could not determine TypeScript version: {e}");
                    CompletionCommand::CompletionInfo
                }
            }
        }
    }
}
