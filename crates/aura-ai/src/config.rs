//! Connection and sampling settings for the chat endpoint

use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.moonshot.cn/v1";
pub const DEFAULT_MODEL: &str = "moonshot-v1-8k";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Credential shipped in sample configs; never valid.
pub const PLACEHOLDER_API_KEY: &str = "your-real-api-key";

/// Counselor persona sent as the system instruction of every exchange.
pub const COUNSELOR_PROMPT: &str = "\
You are a professional mental wellness assistant who helps people work through emotions, stress and everyday mental health challenges.
Your traits: warm, deeply empathetic and non-judgmental; grounded in psychology (CBT, mindfulness); you encourage people to put their feelings into words; you offer practical coping strategies and relaxation techniques; when it fits, you suggest a breathing exercise or a mindfulness practice; you reply in the user's language with a natural conversational tone.
Ground rules: never give a medical diagnosis or medication advice; encourage seeking professional help when it is needed; stay positive but realistic; respect the user's feelings and experiences.
Style: talk like a friend who understands, offering support and practical suggestions.";

/// Read-only settings for one chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: COUNSELOR_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ChatConfig {
    /// Create a config with the default endpoint and the given key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    /// Chat completions URL for this endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Check the settings and return the usable credential.
    pub fn validate(&self) -> Result<&str> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AiError::Configuration("API key is not set".to_string()))?;

        if api_key.contains(PLACEHOLDER_API_KEY) {
            return Err(AiError::Configuration(
                "API key is still the placeholder value; set a valid API key".to_string(),
            ));
        }

        if self.base_url.trim().is_empty() {
            return Err(AiError::Configuration("base URL is empty".to_string()));
        }

        Ok(api_key)
    }
}
