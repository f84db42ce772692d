//! CLI configuration file support
//!
//! Loads configuration from ~/.config/aura/config.toml

use aura_ai::ChatConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::ChatArgs;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Chat endpoint settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Chat session preferences
    #[serde(default)]
    pub chat: ChatPrefs,
}

/// Chat endpoint settings; unset values fall back to the client defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatPrefs {
    /// Send earlier turns with each message
    #[serde(default)]
    pub history: bool,
}

impl CliConfig {
    /// Load configuration from the given path, or the default one
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::default_path()
                .map(|path| Self::load_from_path(&path))
                .unwrap_or_default(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file");
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aura").join("config.toml"))
    }

    /// Resolve client settings: command-line flags, then the file, then defaults
    pub fn chat_config(&self, args: &ChatArgs) -> ChatConfig {
        let mut config = ChatConfig::default();

        if let Some(url) = args.base_url.as_ref().or(self.api.base_url.as_ref()) {
            config.base_url = url.clone();
        }
        if let Some(model) = args.model.as_ref().or(self.api.model.as_ref()) {
            config.model = model.clone();
        }
        config.api_key = args.api_key.clone().or_else(|| self.api.api_key.clone());
        if let Some(temperature) = self.api.temperature {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = self.api.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(prompt) = &self.api.system_prompt {
            config.system_prompt = prompt.clone();
        }

        config
    }

    /// Copy of this configuration that is safe to print
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        masked.api.api_key = self.api.api_key.as_deref().map(mask_key);
        masked
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}
