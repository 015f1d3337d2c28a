//! Request and response bodies of `POST /chat/completions`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Message, ModelRequest, ModelResponse, OutputItem, ProviderError, ProviderId, Role, StopReason,
    TokenUsage, ToolArguments, ToolCall, ToolDefinition,
};

const FUNCTION: &str = "function";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Validates `request` and lays it out for the wire.
    ///
    /// A blank model name is replaced by `fallback_model`.
    pub fn from_model_request(
        request: ModelRequest,
        fallback_model: &str,
        stream: bool,
    ) -> Result<Self, ProviderError> {
        let mut request = request;
        if request.model.trim().is_empty() {
            request.model = fallback_model.to_string();
        }
        request.validate()?;

        // A cleared system prompt stays in the session but is not worth sending.
        let messages = request
            .messages
            .into_iter()
            .filter(|message| {
                !(message.role == Role::System && message.content.trim().is_empty())
            })
            .map(WireMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let tools = request
            .tools
            .into_iter()
            .map(WireTool::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            model: request.model,
            messages,
            tools,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
}

impl TryFrom<Message> for WireMessage {
    type Error = ProviderError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        // Tool-only assistant turns and empty tool output are legal.
        if message.content.trim().is_empty()
            && !matches!(message.role, Role::Assistant | Role::Tool)
        {
            return Err(ProviderError::invalid_request(format!(
                "{} message content must not be empty",
                message.role.as_str()
            )));
        }

        let tool_calls = message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| WireToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{index}")),
                kind: FUNCTION,
                function: WireFunctionCall {
                    arguments: call.arguments.to_encoded(),
                    name: call.name,
                },
            })
            .collect();

        Ok(Self {
            role: message.role.as_str(),
            content: message.content,
            name: message.tool_name,
            tool_call_id: message.tool_call_id,
            tool_calls,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl TryFrom<ToolDefinition> for WireTool {
    type Error = ProviderError;

    fn try_from(tool: ToolDefinition) -> Result<Self, Self::Error> {
        let parameters = serde_json::from_str::<Value>(&tool.input_schema).map_err(|err| {
            ProviderError::invalid_request(format!(
                "tool '{}' has an invalid input schema: {err}",
                tool.name
            ))
        })?;

        Ok(Self {
            kind: FUNCTION,
            function: WireFunction {
                name: tool.name,
                description: tool.description,
                parameters,
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<WireUsage> for TokenUsage {
    fn from(usage: WireUsage) -> Self {
        Self {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

pub fn stop_reason(finish_reason: Option<&str>) -> StopReason {
    match finish_reason {
        Some("stop") => StopReason::EndTurn,
        Some("length") => StopReason::MaxTokens,
        Some("tool_calls" | "function_call") => StopReason::ToolUse,
        Some("cancelled") => StopReason::Cancelled,
        _ => StopReason::Other,
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ReplyChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyChoice {
    pub message: ReplyMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ReplyToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyToolCall {
    pub id: Option<String>,
    pub function: ReplyFunction,
}

/// `arguments` is usually an encoded string, but some servers send an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplyFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl From<ReplyToolCall> for ToolCall {
    fn from(call: ReplyToolCall) -> Self {
        Self {
            id: call.id.filter(|id| !id.is_empty()),
            name: call.function.name,
            arguments: ToolArguments::from_wire(call.function.arguments),
        }
    }
}

impl CompletionResponse {
    /// Maps the first choice onto a provider-agnostic response.
    pub fn into_model_response(
        self,
        provider: ProviderId,
        requested_model: &str,
    ) -> Result<ModelResponse, ProviderError> {
        let Some(choice) = self.choices.into_iter().next() else {
            return Err(ProviderError::transport(
                "completion response did not include any choices",
            ));
        };

        let mut output = Vec::new();
        if let Some(content) = choice.message.content.filter(|content| !content.is_empty()) {
            output.push(OutputItem::Message(Message::assistant(content)));
        }
        output.extend(
            choice
                .message
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(|call| OutputItem::ToolCall(call.into())),
        );

        Ok(ModelResponse {
            provider,
            model: if self.model.is_empty() {
                requested_model.to_string()
            } else {
                self.model
            },
            output,
            stop_reason: stop_reason(choice.finish_reason.as_deref()),
            usage: self.usage.unwrap_or_default().into(),
        })
    }
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChunkDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub function: Option<ChunkFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChunkFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}
