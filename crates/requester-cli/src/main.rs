//! Binary entrypoint for the Requester CLI.
use anyhow::Context;
use clap::{Parser, Subcommand};
use requester_cli::{extract_sources, load_settings, resolve_env, source_json, TerminalView};
use std::path::PathBuf;
use std::sync::Arc;

/// Inspect the environment of a request file
#[derive(Parser, Debug)]
#[command(name = "requester", version, about, long_about = None)]
struct Cli {
    /// Settings file (.json or .yaml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the env block and env file found in a request file
    Extract { file: PathBuf },
    /// Evaluate the environment of a request file and print it as JSON
    Env { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings(cli.settings.as_deref())?;

    let output = match cli.command {
        Command::Extract { file } => {
            let view = open_view(&file)?;
            source_json(&extract_sources(&view))
        }
        Command::Env { file } => {
            let view = Arc::new(open_view(&file)?);
            tracing::debug!(file = %file.display(), timeout_env = ?settings.timeout_env, "resolving environment");
            resolve_env(view, settings).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn open_view(file: &std::path::Path) -> anyhow::Result<TerminalView> {
    TerminalView::open(file).with_context(|| format!("failed to open {}", file.display()))
}
