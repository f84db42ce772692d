mod cli;
mod commands;
mod config;
mod error;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let guard = init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        // Flush pending log lines before the process exits.
        drop(guard);
        error::handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::CliConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Chat(args) => commands::chat::run(&config, args).await,
        Commands::Offline { message } => commands::offline::run(&message),
        Commands::Config { command } => {
            commands::config::run(&config, cli.config.as_deref(), command)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "aura", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Log to a daily file in the data directory so streamed output stays clean.
fn init_logging(verbose: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let log_dir = dirs::data_dir().map(|dir| dir.join("aura").join("logs"));
    match log_dir {
        Some(dir) if std::fs::create_dir_all(&dir).is_ok() => {
            let file_appender = tracing_appender::rolling::daily(dir, "aura.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_level(true)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
            None
        }
    }
}
