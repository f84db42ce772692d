use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::CliConfig;

pub fn run(config: &CliConfig, path: Option<&Path>, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            let path = path
                .map(Path::to_path_buf)
                .or_else(CliConfig::default_path)
                .context("No configuration directory on this platform")?;
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(&config.masked())
                .context("Failed to render configuration")?;
            print!("{rendered}");
        }
    }
    Ok(())
}
