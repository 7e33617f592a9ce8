//! `tss` - query a TypeScript server from the command line.
//!
//! Each invocation starts a server, opens the files involved, runs one
//! command, prints the result and stops the server.

mod args;
mod render;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use args::{Cli, Command, Position};
use tss_client::ProtocolClient;
use tss_commands::args::{
    CompletionsRequestArgs, FileLocationRequestArgs, FileRequestArgs, GeterrRequestArgs,
    OpenRequestArgs,
};
use tss_commands::{Commands, decode_report};
use tss_config::{TssConfig, detect_version, resolve_completion_command, tsc_path_for};

/// Filter variable for our own logs. `TSS_LOG` belongs to tsserver.
const LOG_ENV: &str = "TSS_CLIENT_LOG";

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if let Some(path) = log_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating log dir {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();
        tracing::info!(path = %path.display(), "Logging initialized");
        return Ok(());
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let mut config = TssConfig::load(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        config.server.client.server_path = server;
    }
    let client_config = config.client_config();

    if matches!(cli.command, Command::Version) {
        let tsc = tsc_path_for(&client_config.server_path);
        let version = detect_version(&tsc)
            .await
            .with_context(|| format!("probing {}", tsc.display()))?;
        let command = tss_config::completion_command_for(version);
        println!("TypeScript {version} (completions via '{}')", command.as_str());
        return Ok(ExitCode::SUCCESS);
    }

    let completion =
        resolve_completion_command(config.server.completion_command, &client_config.server_path)
            .await;
    let mut client = ProtocolClient::new(client_config).with_completion_command(completion);
    client.start().context("starting tsserver")?;

    let outcome = tokio::select! {
        outcome = run(&client, cli.command) => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            Ok(ExitCode::from(130))
        }
    };

    if let Err(e) = client.stop() {
        tracing::debug!("tsserver was already gone: {e}");
    }
    outcome
}

async fn run(client: &ProtocolClient, command: Command) -> Result<ExitCode> {
    let commands = Commands::new(client);

    match command {
        Command::Quickinfo(position) => {
            let args = open_at(&commands, &position)?;
            let info = commands.quickinfo(&args).await?;
            println!("{}", render::quickinfo(&info));
        }
        Command::Definition(position) => {
            let args = open_at(&commands, &position)?;
            let spans = commands.definition(&args).await?;
            print_nonempty(&render::spans(&spans));
        }
        Command::References(position) => {
            let args = open_at(&commands, &position)?;
            let body = commands.references(&args).await?;
            print_nonempty(&render::references(&body)?);
        }
        Command::Completions { position, prefix } => {
            let at = open_at(&commands, &position)?;
            let args = CompletionsRequestArgs {
                file: at.file,
                line: at.line,
                offset: at.offset,
                prefix: prefix.clone(),
                ..CompletionsRequestArgs::default()
            };
            let body = commands.completions(&args).await?;
            print_nonempty(&render::completions(&body, prefix.as_deref())?);
        }
        Command::Navtree { file } => {
            let file = open(&commands, &file)?;
            let body = commands.navtree(&FileRequestArgs::new(file)).await?;
            print_nonempty(&render::navtree(&body)?);
        }
        Command::Diagnostics { files } => {
            let files = files
                .iter()
                .map(|file| open(&commands, file))
                .collect::<Result<Vec<_>>>()?;
            let report = commands
                .geterr_and_wait(&GeterrRequestArgs { files, delay: 0 })
                .await?;
            let (text, errors) = render::diagnostics(&decode_report(&report)?);
            print_nonempty(&text);
            if errors > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        // Answered before the server starts.
        Command::Version => {}
    }
    Ok(ExitCode::SUCCESS)
}

/// Open `file` on the server and return the absolute path it was opened as.
fn open(commands: &Commands<'_>, file: &Path) -> Result<String> {
    let absolute: PathBuf = std::path::absolute(file)
        .with_context(|| format!("resolving {}", file.display()))?;
    let file = absolute.to_string_lossy().into_owned();
    commands.open(&OpenRequestArgs::new(file.clone()))?;
    Ok(file)
}

fn open_at(commands: &Commands<'_>, position: &Position) -> Result<FileLocationRequestArgs> {
    let file = open(commands, &position.file)?;
    Ok(FileLocationRequestArgs::new(file, position.line, position.offset))
}

fn print_nonempty(text: &str) {
    if !text.is_empty() {
        println!("{text}");
    }
}
