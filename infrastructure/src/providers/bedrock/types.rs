//! Type conversions between the AWS Bedrock SDK and port types
//!
//! Payload blocks become Converse messages; Converse output becomes a
//! [`CompletionResponse`]; SDK errors become classified [`GatewayError`]s.

use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::converse::ConverseError;
use aws_sdk_bedrockruntime::types as bedrock;
use musing_application::ports::llm_gateway::{CompletionResponse, GatewayError};
use musing_domain::{PayloadBlock, PayloadRole, Usage};

// ─── Domain → Bedrock ────────────────────────────────────────────

fn conversation_role(role: PayloadRole) -> bedrock::ConversationRole {
    match role {
        PayloadRole::User => bedrock::ConversationRole::User,
        PayloadRole::Assistant => bedrock::ConversationRole::Assistant,
    }
}

/// Convert payload blocks to Converse messages.
///
/// Converse requires roles to alternate, so consecutive blocks with the
/// same role become one message with several text blocks, in order. Blank
/// blocks are dropped since Converse rejects empty text.
pub fn to_converse_messages(blocks: &[PayloadBlock]) -> Result<Vec<bedrock::Message>, GatewayError> {
    let mut groups: Vec<(PayloadRole, Vec<bedrock::ContentBlock>)> = Vec::new();
    for block in blocks.iter().filter(|b| !b.text.trim().is_empty()) {
        let content = bedrock::ContentBlock::Text(block.text.clone());
        match groups.last_mut() {
            Some((role, contents)) if *role == block.role => contents.push(content),
            _ => groups.push((block.role, vec![content])),
        }
    }

    groups
        .into_iter()
        .map(|(role, content)| {
            bedrock::Message::builder()
                .role(conversation_role(role))
                .set_content(Some(content))
                .build()
                .map_err(|e| GatewayError::InvalidRequest(format!("Failed to build message: {e}")))
        })
        .collect()
}

// ─── Bedrock → Domain ────────────────────────────────────────────

/// Collect the text segments of a Converse reply.
pub fn convert_converse_output(
    output: Option<&bedrock::ConverseOutput>,
    usage: Option<&bedrock::TokenUsage>,
) -> Result<CompletionResponse, GatewayError> {
    let Some(bedrock::ConverseOutput::Message(message)) = output else {
        return Err(GatewayError::MalformedResponse(
            "No message in Bedrock response".to_string(),
        ));
    };

    let segments = message
        .content()
        .iter()
        .filter_map(|block| match block {
            bedrock::ContentBlock::Text(text) => Some(text.clone()),
            _ => None,
        })
        .collect();

    Ok(CompletionResponse {
        segments,
        usage: usage.map(convert_usage),
    })
}

fn convert_usage(usage: &bedrock::TokenUsage) -> Usage {
    Usage {
        input_tokens: u32::try_from(usage.input_tokens()).unwrap_or(0),
        output_tokens: u32::try_from(usage.output_tokens()).unwrap_or(0),
    }
}

// ─── Errors ──────────────────────────────────────────────────────

/// Classify a Converse service error.
pub fn convert_service_error(err: &ConverseError) -> GatewayError {
    match err {
        ConverseError::ThrottlingException(e) => {
            GatewayError::Throttled(format!("Bedrock throttled: {e}"))
        }
        ConverseError::ServiceUnavailableException(e) => {
            GatewayError::ServiceUnavailable(format!("Bedrock unavailable: {e}"))
        }
        ConverseError::InternalServerException(e) => {
            GatewayError::ServiceUnavailable(format!("Bedrock internal error: {e}"))
        }
        ConverseError::ModelNotReadyException(e) => {
            GatewayError::ServiceUnavailable(format!("Bedrock model not ready: {e}"))
        }
        ConverseError::ModelTimeoutException(_) => GatewayError::Timeout,
        ConverseError::AccessDeniedException(e) => {
            GatewayError::Unauthorized(format!("Bedrock access denied: {e}"))
        }
        ConverseError::ResourceNotFoundException(e) => {
            GatewayError::ModelNotAvailable(format!("Bedrock model not found: {e}"))
        }
        ConverseError::ValidationException(e) => {
            GatewayError::InvalidRequest(format!("Bedrock validation error: {e}"))
        }
        other => GatewayError::Other(format!("Bedrock error: {other}")),
    }
}

/// Convert a Bedrock SDK error to a GatewayError.
pub fn convert_converse_error(err: &SdkError<ConverseError>) -> GatewayError {
    match err {
        SdkError::ServiceError(service_err) => convert_service_error(service_err.err()),
        SdkError::TimeoutError(_) => GatewayError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => GatewayError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_user() => {
            GatewayError::Configuration(format!("Bedrock client setup: {err:?}"))
        }
        SdkError::DispatchFailure(_) => {
            GatewayError::Connection(format!("Bedrock connection failed: {err}"))
        }
        SdkError::ConstructionFailure(_) => GatewayError::Configuration(format!(
            "Could not build Bedrock request (check credentials and region): {err:?}"
        )),
        SdkError::ResponseError(_) => {
            GatewayError::MalformedResponse(format!("Unreadable Bedrock response: {err}"))
        }
        other => GatewayError::Other(format!("Bedrock SDK error: {other}")),
    }
}
