//! Model value object representing a hosted Claude model

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Claude models that can answer a conversation (Value Object)
///
/// Known aliases map to provider-specific identifiers in the infrastructure
/// layer. Anything else is kept verbatim as [`Model::Custom`], which lets a
/// caller pass a raw model id or an inference-profile ARN straight through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Model {
    Claude35SonnetV2,
    Claude37Sonnet,
    ClaudeSonnet4,
    ClaudeSonnet45,
    ClaudeHaiku45,
    ClaudeOpus45,
    Custom(String),
}

impl Model {
    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        match self {
            Model::Claude35SonnetV2 => "claude-3.5-sonnet-v2",
            Model::Claude37Sonnet => "claude-3.7-sonnet",
            Model::ClaudeSonnet4 => "claude-sonnet-4",
            Model::ClaudeSonnet45 => "claude-sonnet-4.5",
            Model::ClaudeHaiku45 => "claude-haiku-4.5",
            Model::ClaudeOpus45 => "claude-opus-4.5",
            Model::Custom(s) => s,
        }
    }

    /// All named (non-custom) models
    pub fn known() -> Vec<Model> {
        vec![
            Model::Claude35SonnetV2,
            Model::Claude37Sonnet,
            Model::ClaudeSonnet4,
            Model::ClaudeSonnet45,
            Model::ClaudeHaiku45,
            Model::ClaudeOpus45,
        ]
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Model::Custom(_))
    }
}

impl Default for Model {
    /// Returns the default model (Claude 3.5 Sonnet v2)
    fn default() -> Self {
        Model::Claude35SonnetV2
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Model {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "claude-3.5-sonnet-v2" => Model::Claude35SonnetV2,
            "claude-3.7-sonnet" => Model::Claude37Sonnet,
            "claude-sonnet-4" => Model::ClaudeSonnet4,
            "claude-sonnet-4.5" => Model::ClaudeSonnet45,
            "claude-haiku-4.5" => Model::ClaudeHaiku45,
            "claude-opus-4.5" => Model::ClaudeOpus45,
            other => Model::Custom(other.to_string()),
        })
    }
}

impl Serialize for Model {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(model) = s.parse::<Model>();
        Ok(model)
    }
}
