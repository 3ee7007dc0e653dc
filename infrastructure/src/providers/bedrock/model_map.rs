//! Bedrock model ID mapping
//!
//! Maps domain `Model` variants to Bedrock model identifiers, with the
//! cross-region inference profile prefix when requested.

use musing_domain::Model;

/// On-demand Bedrock id for a named model. `None` for custom ids.
fn base_model_id(model: &Model) -> Option<&'static str> {
    let id = match model {
        Model::Claude35SonnetV2 => "anthropic.claude-3-5-sonnet-20241022-v2:0",
        Model::Claude37Sonnet => "anthropic.claude-3-7-sonnet-20250219-v1:0",
        Model::ClaudeSonnet4 => "anthropic.claude-sonnet-4-20250514-v1:0",
        Model::ClaudeSonnet45 => "anthropic.claude-sonnet-4-5-20250929-v1:0",
        Model::ClaudeHaiku45 => "anthropic.claude-haiku-4-5-20251001-v1:0",
        Model::ClaudeOpus45 => "anthropic.claude-opus-4-5-20251101-v1:0",
        Model::Custom(_) => return None,
    };
    Some(id)
}

/// Convert a domain Model to a Bedrock model ID string.
///
/// - Custom models (raw ids, inference-profile ARNs) pass through unchanged.
/// - With `inference_profile`, named models get the region-group prefix
///   (`us.`, `eu.`, ...) derived from `region`.
pub fn to_bedrock_model_id(model: &Model, inference_profile: bool, region: &str) -> String {
    let Some(base_id) = base_model_id(model) else {
        return model.as_str().to_string();
    };

    if inference_profile {
        let prefix = inference_profile_prefix(region);
        format!("{prefix}.{base_id}")
    } else {
        base_id.to_string()
    }
}

/// Derive the inference profile region group from an AWS region string.
///
/// `us-east-1` → `us`, `eu-west-1` → `eu`, `ap-northeast-1` → `apac`.
fn inference_profile_prefix(region: &str) -> &str {
    match region.split('-').next() {
        Some("ap") => "apac",
        Some(prefix @ ("us" | "eu" | "ca" | "sa" | "me" | "af")) => prefix,
        _ => "us",
    }
}
