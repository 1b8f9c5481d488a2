use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nipap::cli::{self, QueryArgs};
use nipap::Config;

#[derive(Parser)]
#[command(name = "nipap", about = "NIPAP client — build and inspect prefix search queries")]
struct Cli {
    /// Write debug logs to /tmp/nipap-debug.log (tail -f to inspect).
    #[arg(long)]
    debug: bool,
    /// Read configuration from this file instead of ~/.config/nipap/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a structured search and print the `search_prefix` params.
    Query(QueryArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/nipap-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .init();
        tracing::info!("nipap debug log started — tail -f /tmp/nipap-debug.log");
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Query(args) => {
            let rendered = cli::render(&args, config.search.options())?;
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
    }

    Ok(())
}
