use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aura")]
#[command(version, about = "Aura - a calm companion for stressful moments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.config/aura/config.toml)
    #[arg(long, global = true, env = "AURA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with the wellness companion
    Chat(ChatArgs),

    /// Get a canned reply without contacting the chat endpoint
    Offline {
        /// What's on your mind
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct ChatArgs {
    /// Message to send; starts an interactive session when omitted
    pub message: Vec<String>,

    /// Chat completions endpoint base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the endpoint
    #[arg(long, env = "AURA_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Send earlier turns of the session with each message
    #[arg(long)]
    pub history: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration with the API key masked
    Show,
}
