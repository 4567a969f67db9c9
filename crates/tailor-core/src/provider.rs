use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Supported language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Human-facing name, used in prompts for a key.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Google => "Google",
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
        }
    }

    /// Environment variable holding the fallback API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Google => "GEMINI_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.0-flash",
            Provider::OpenAi => "gpt-4o",
            Provider::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            other => Err(AppError::ConfigError(format!(
                "Unsupported provider: {other}"
            ))),
        }
    }
}
