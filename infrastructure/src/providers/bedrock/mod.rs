//! AWS Bedrock Converse API provider
//!
//! Provides access to Claude models via AWS IAM authentication
//! through the Bedrock Converse API.

mod adapter;
mod model_map;
mod types;

pub use adapter::BedrockGateway;
pub use model_map::to_bedrock_model_id;
