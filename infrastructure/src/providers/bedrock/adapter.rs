//! Bedrock completion transport
//!
//! Implements [`LlmGateway`] over the stateless Converse API. Every call
//! carries the full payload; nothing is kept between calls.

use super::{model_map, types};
use crate::config::FileBedrockConfig;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use aws_sdk_bedrockruntime::types as bedrock;
use musing_application::ports::llm_gateway::{
    CompletionRequest, CompletionResponse, GatewayError, LlmGateway,
};
use tracing::{debug, info};

pub struct BedrockGateway {
    client: BedrockClient,
    region: String,
    inference_profile: bool,
}

impl BedrockGateway {
    /// Create a new Bedrock gateway.
    ///
    /// Resolves AWS credentials lazily; credential problems surface on the
    /// first request as a configuration error.
    pub async fn new(config: &FileBedrockConfig) -> Self {
        let mut aws_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(ref profile) = config.profile {
            aws_config_loader = aws_config_loader.profile_name(profile);
        }

        let aws_config = aws_config_loader.load().await;
        info!(region = %config.region, "Bedrock gateway initialized");

        Self {
            client: BedrockClient::new(&aws_config),
            region: config.region.clone(),
            inference_profile: config.inference_profile,
        }
    }

    fn model_id(&self, request: &CompletionRequest) -> String {
        model_map::to_bedrock_model_id(&request.model, self.inference_profile, &self.region)
    }
}

#[async_trait]
impl LlmGateway for BedrockGateway {
    fn provider(&self) -> &str {
        "bedrock"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        let model_id = self.model_id(request);
        let messages = types::to_converse_messages(&request.blocks)?;
        let max_tokens = i32::try_from(request.sampling.max_output_tokens).map_err(|_| {
            GatewayError::InvalidRequest(format!(
                "max_tokens {} is too large",
                request.sampling.max_output_tokens
            ))
        })?;

        debug!(
            model = %model_id,
            messages = messages.len(),
            "Calling Bedrock Converse API"
        );

        let response = self
            .client
            .converse()
            .model_id(&model_id)
            .set_messages(Some(messages))
            .inference_config(
                bedrock::InferenceConfiguration::builder()
                    .max_tokens(max_tokens)
                    .temperature(request.sampling.temperature as f32)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| types::convert_converse_error(&e))?;

        types::convert_converse_output(response.output(), response.usage())
    }
}
