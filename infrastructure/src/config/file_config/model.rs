//! Model configuration from TOML (`[model]` section)

use musing_domain::{ConfigIssue, ConfigIssueCode, Model};
use serde::{Deserialize, Serialize};

/// Model selection
///
/// # Example
///
/// ```toml
/// [model]
/// name = "claude-sonnet-4.5"   # alias, raw model id, or inference-profile ARN
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub name: String,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            name: Model::default().to_string(),
        }
    }
}

impl FileModelConfig {
    /// Parse the model name. Unknown names pass through as custom ids.
    pub fn parse_model(&self) -> (Model, Vec<ConfigIssue>) {
        let name = self.name.trim();
        if name.is_empty() {
            let issue = ConfigIssue::error(
                ConfigIssueCode::EmptyValue {
                    field: "model.name".to_string(),
                },
                "model.name: model name cannot be empty",
            );
            return (Model::default(), vec![issue]);
        }
        let Ok(model) = name.parse::<Model>();
        (model, vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_alias() {
        let config = FileModelConfig {
            name: "claude-sonnet-4.5".to_string(),
        };
        let (model, issues) = config.parse_model();
        assert_eq!(model, Model::ClaudeSonnet45);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_raw_id_passes_through() {
        let config = FileModelConfig {
            name: "anthropic.claude-v2:1".to_string(),
        };
        assert_eq!(
            config.parse_model().0,
            Model::Custom("anthropic.claude-v2:1".to_string())
        );
    }

    #[test]
    fn test_empty_name_is_error() {
        let config = FileModelConfig {
            name: "  ".to_string(),
        };
        let (_, issues) = config.parse_model();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
