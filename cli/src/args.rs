//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tss", version, about = "Query a TypeScript server from the command line")]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.tss/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config: Option<PathBuf>,
    /// tsserver executable, overriding the config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) server: Option<PathBuf>,
    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) log_file: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// A 1-based position in a file.
#[derive(Args, Debug, Clone)]
pub(crate) struct Position {
    pub(crate) file: PathBuf,
    pub(crate) line: u32,
    pub(crate) offset: u32,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Show type information for the symbol at a position.
    Quickinfo(Position),
    /// Jump to the definition of the symbol at a position.
    Definition(Position),
    /// List references to the symbol at a position.
    References(Position),
    /// List completions at a position.
    Completions {
        #[command(flatten)]
        position: Position,
        /// Only entries starting with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Report diagnostics for one or more files.
    Diagnostics {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the navigation tree of a file.
    Navtree { file: PathBuf },
    /// Print the TypeScript version and the completion command it implies.
    Version,
}
