//! Anthropic Messages API transport
//!
//! Calls `POST {base_url}/v1/messages` directly over reqwest. Like the
//! Bedrock transport it is stateless: the whole payload goes out on every call.

use crate::config::FileAnthropicConfig;
use async_trait::async_trait;
use musing_application::ports::llm_gateway::{
    CompletionRequest, CompletionResponse, GatewayError, LlmGateway,
};
use musing_domain::{Model, PayloadBlock, PayloadRole, Usage};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anthropic API id for a named model; custom ids pass through.
pub fn to_anthropic_model_id(model: &Model) -> &str {
    match model {
        Model::Claude35SonnetV2 => "claude-3-5-sonnet-20241022",
        Model::Claude37Sonnet => "claude-3-7-sonnet-20250219",
        Model::ClaudeSonnet4 => "claude-sonnet-4-20250514",
        Model::ClaudeSonnet45 => "claude-sonnet-4-5-20250929",
        Model::ClaudeHaiku45 => "claude-haiku-4-5-20251001",
        Model::ClaudeOpus45 => "claude-opus-4-5-20251101",
        Model::Custom(id) => id,
    }
}

pub struct AnthropicGateway {
    client: Client,
    api_key: String,
    endpoint: String,
    api_version: String,
}

impl AnthropicGateway {
    /// Build the transport from config.
    ///
    /// Fails with a configuration error when no API key can be resolved.
    pub fn new(config: &FileAnthropicConfig) -> Result<Self, GatewayError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            GatewayError::Configuration(format!(
                "No Anthropic API key: set {} or providers.anthropic.api_key",
                config.api_key_env
            ))
        })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            api_version: config.api_version.clone(),
        })
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    fn provider(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, GatewayError> {
        let body = CreateMessageRequest {
            model: to_anthropic_model_id(&request.model),
            max_tokens: request.sampling.max_output_tokens,
            temperature: request.sampling.temperature,
            messages: to_messages(&request.blocks),
        };

        debug!(
            model = body.model,
            messages = body.messages.len(),
            "Calling Anthropic Messages API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Anthropic error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|e| {
            GatewayError::MalformedResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        Ok(parsed.into())
    }
}

#[derive(Serialize)]
struct CreateMessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct TextBlock<'a> {
    r#type: &'static str,
    text: &'a str,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
    usage: Option<UsageResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize)]
struct UsageResponse {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl From<CreateMessageResponse> for CompletionResponse {
    fn from(response: CreateMessageResponse) -> Self {
        let segments = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlockResponse::Text { text } => Some(text),
                ContentBlockResponse::Unsupported => None,
            })
            .collect();

        CompletionResponse {
            segments,
            usage: response.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

fn role_name(role: PayloadRole) -> &'static str {
    match role {
        PayloadRole::User => "user",
        PayloadRole::Assistant => "assistant",
    }
}

/// Group payload blocks into alternating messages.
///
/// Blank blocks are dropped: the API rejects whitespace-only text, and an
/// answer that was all reasoning leaves an empty assistant turn behind.
fn to_messages(blocks: &[PayloadBlock]) -> Vec<Message<'_>> {
    let mut messages: Vec<Message<'_>> = Vec::new();
    for block in blocks.iter().filter(|b| !b.text.trim().is_empty()) {
        let text = TextBlock {
            r#type: "text",
            text: &block.text,
        };
        let role = role_name(block.role);
        match messages.last_mut() {
            Some(last) if last.role == role => last.content.push(text),
            _ => messages.push(Message {
                role,
                content: vec![text],
            }),
        }
    }
    messages
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() || err.is_request() {
        GatewayError::Connection(format!("Anthropic request failed: {err}"))
    } else if err.is_builder() {
        GatewayError::Configuration(format!("Invalid Anthropic request: {err}"))
    } else {
        GatewayError::Other(format!("Anthropic request failed: {err}"))
    }
}

fn map_http_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());
    let message = format!("{status}: {message}");

    match status.as_u16() {
        429 => GatewayError::Throttled(message),
        401 | 403 => GatewayError::Unauthorized(message),
        404 => GatewayError::ModelNotAvailable(message),
        400 | 413 | 422 => GatewayError::InvalidRequest(message),
        408 | 504 => GatewayError::Timeout,
        500..=599 => GatewayError::ServiceUnavailable(message),
        _ => GatewayError::Other(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_models_map_to_api_ids() {
        assert_eq!(
            to_anthropic_model_id(&Model::Claude35SonnetV2),
            "claude-3-5-sonnet-20241022"
        );
        assert_eq!(
            to_anthropic_model_id(&Model::Custom("claude-next".into())),
            "claude-next"
        );
        for model in Model::known() {
            assert!(to_anthropic_model_id(&model).starts_with("claude-"));
        }
    }

    #[test]
    fn test_messages_merge_same_role() {
        let blocks = vec![
            PayloadBlock::user("Please include chain-of-thought"),
            PayloadBlock::user("hi"),
            PayloadBlock::assistant("hello"),
            PayloadBlock::user("2+2?"),
        ];

        let messages = to_messages(&blocks);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content.len(), 2);
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].content[0].text, "2+2?");

        let json = serde_json::to_value(&messages[0]).unwrap();
        assert_eq!(json["content"][1]["type"], "text");
        assert_eq!(json["content"][1]["text"], "hi");
    }

    #[test]
    fn test_blank_assistant_turn_is_skipped() {
        let blocks = vec![
            PayloadBlock::user("think hard"),
            PayloadBlock::assistant(""),
            PayloadBlock::user("and answer?"),
        ];

        let messages = to_messages(&blocks);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[0].content.len(), 2);
        assert_eq!(messages[0].content[1].text, "and answer?");
    }

    #[test]
    fn test_response_text_and_usage() {
        let body = r#"{
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "text", "text": "<thinking>add</thinking>"},
                {"type": "tool_use", "id": "t", "name": "x", "input": {}},
                {"type": "text", "text": "4"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let parsed: CreateMessageResponse = serde_json::from_str(body).unwrap();
        let response: CompletionResponse = parsed.into();

        assert_eq!(response.text(), "<thinking>add</thinking>\n4");
        assert_eq!(
            response.usage,
            Some(Usage {
                input_tokens: 12,
                output_tokens: 3
            })
        );
    }

    #[test]
    fn test_http_status_classification() {
        let overloaded = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        let err = map_http_error(StatusCode::from_u16(529).unwrap(), overloaded);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("Overloaded"));

        assert!(map_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(matches!(
            map_http_error(StatusCode::UNAUTHORIZED, "bad key"),
            GatewayError::Unauthorized(_)
        ));
        assert!(matches!(
            map_http_error(StatusCode::NOT_FOUND, "no model"),
            GatewayError::ModelNotAvailable(_)
        ));
        assert!(!map_http_error(StatusCode::BAD_REQUEST, "bad").is_retryable());
        assert_eq!(
            map_http_error(StatusCode::GATEWAY_TIMEOUT, ""),
            GatewayError::Timeout
        );
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let config = FileAnthropicConfig {
            api_key_env: "MUSING_TEST_ANTHROPIC_KEY_UNSET".to_string(),
            api_key: None,
            ..FileAnthropicConfig::default()
        };
        let err = AnthropicGateway::new(&config).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = FileAnthropicConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://localhost:8080/".into(),
            ..FileAnthropicConfig::default()
        };
        let gateway = AnthropicGateway::new(&config).unwrap();
        assert_eq!(gateway.endpoint, "http://localhost:8080/v1/messages");
    }
}
