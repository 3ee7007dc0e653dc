//! Provider configuration from TOML (`[providers]` section)

use musing_domain::ConfigIssue;
use serde::{Deserialize, Serialize};

use super::chat::invalid_enum;

/// Which transport carries completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Bedrock,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Bedrock => "bedrock",
            ProviderKind::Anthropic => "anthropic",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBedrockConfig {
    /// AWS region for Bedrock models (default: "us-east-2")
    pub region: String,
    /// AWS profile name for credentials
    pub profile: Option<String>,
    /// Address known models through their cross-region inference profile
    /// (`us.`, `eu.`, `ap.` prefixed ids) instead of the on-demand id
    pub inference_profile: bool,
}

impl Default for FileBedrockConfig {
    fn default() -> Self {
        Self {
            region: "us-east-2".to_string(),
            profile: None,
            inference_profile: true,
        }
    }
}

/// Anthropic API provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAnthropicConfig {
    /// Environment variable name for the API key (default: "ANTHROPIC_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; use the env var instead).
    pub api_key: Option<String>,
    /// Base URL for the Anthropic API.
    pub base_url: String,
    /// Anthropic API version header.
    pub api_version: String,
}

impl Default for FileAnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
        }
    }
}

impl FileAnthropicConfig {
    /// The configured key, falling back to the environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Default provider: "bedrock" or "anthropic".
    pub default: String,
    /// AWS Bedrock settings.
    pub bedrock: FileBedrockConfig,
    /// Anthropic API settings.
    pub anthropic: FileAnthropicConfig,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        Self {
            default: "bedrock".to_string(),
            bedrock: FileBedrockConfig::default(),
            anthropic: FileAnthropicConfig::default(),
        }
    }
}

impl FileProvidersConfig {
    pub fn parse_default(&self) -> (ProviderKind, Vec<ConfigIssue>) {
        match self.default.trim().to_lowercase().as_str() {
            "bedrock" | "aws" => (ProviderKind::Bedrock, vec![]),
            "anthropic" => (ProviderKind::Anthropic, vec![]),
            _ => (
                ProviderKind::Bedrock,
                vec![invalid_enum(
                    "providers.default",
                    &self.default,
                    &["bedrock", "anthropic"],
                )],
            ),
        }
    }
}
