//! Configuration for the `tss` host.
//!
//! The file lives at `~/.tss/config.toml` unless a path is given explicitly.
//! Every field is optional; a missing file means defaults.

mod version;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use tss_client::{ClientConfig, DEFAULT_SERVER_PATH};

pub use version::{
    TsVersion, VersionError, completion_command_for, parse_version, detect_version,
    resolve_completion_command, tsc_path_for,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TssConfig {
    pub server: ServerSection,
}

/// The `[server]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(flatten)]
    pub client: ClientConfig,
    pub completion_command: CompletionSetting,
}

/// Which completion command to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionSetting {
    /// Run `tsc --version` next to the server.
    #[default]
    Auto,
    CompletionInfo,
    Completions,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

impl TssConfig {
    /// Load from `path`, or from [`config_path`] when `None`.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.clone(),
                source,
            }
        })?;
        Self::parse(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse { path, source }
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Client settings with `${VAR}` references expanded and the server path
    /// validated.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let raw = &self.server.client;
        let expand = |value: &str| expand_env_vars(value, |name| std::env::var(name).ok());

        let working_dir = raw
            .working_dir
            .as_ref()
            .map(|dir| PathBuf::from(expand(&dir.to_string_lossy())));
        let server_path = PathBuf::from(expand(&raw.server_path.to_string_lossy()));

        ClientConfig {
            server_path: validate_server_path(&server_path, working_dir.as_deref()),
            args: raw.args.iter().map(|arg| expand(arg)).collect(),
            env: raw
                .env
                .iter()
                .map(|(key, value)| (key.clone(), expand(value)))
                .collect::<HashMap<_, _>>(),
            working_dir,
            request_timeout_ms: raw.request_timeout_ms,
        }
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tss").join("config.toml"))
}

/// Replace `${NAME}` with `lookup(NAME)`, or nothing when unset. An
/// unterminated `${` is kept verbatim.
pub fn expand_env_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if !name.is_empty()
            && let Some(replacement) = lookup(name)
        {
            out.push_str(&replacement);
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Bare names are kept for `PATH` lookup at launch. Anything with a directory
/// part is normalized against `base` (or the current directory) and kept only
/// if it exists; otherwise the default server is used.
#[must_use]
pub fn validate_server_path(path: &Path, base: Option<&Path>) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::from(DEFAULT_SERVER_PATH);
    }
    if path.components().count() == 1 && path.is_relative() {
        return path.to_path_buf();
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let base = base
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_default();
        base.join(path)
    };
    let normalized = normalize(&joined);

    if normalized.exists() {
        normalized
    } else {
        tracing::warn!(
            path = %normalized.display(),
            "Configured tsserver path does not exist, using {DEFAULT_SERVER_PATH}"
        );
        PathBuf::from(DEFAULT_SERVER_PATH)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
