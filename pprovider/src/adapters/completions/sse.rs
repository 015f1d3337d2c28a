//! Server-sent event framing and delta assembly for streamed completions.

use std::collections::BTreeMap;

use crate::{
    Message, ModelResponse, OutputItem, ProviderError, ProviderId, StopReason, StreamEvent,
    TokenUsage, ToolArguments, ToolCall,
};

use super::wire::{CompletionChunk, stop_reason};

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Splits a byte stream into `data:` payloads.
///
/// Bytes are buffered until a full line is available, so a multi-byte character
/// split across network reads decodes correctly.
#[derive(Debug, Default)]
pub struct SseFramer {
    buffer: Vec<u8>,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line = self.buffer.drain(..=newline).collect::<Vec<_>>();
            let line = std::str::from_utf8(&line)
                .map_err(|err| ProviderError::transport(format!("invalid utf-8 in stream: {err}")))?;

            let Some(payload) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();
            if payload == DONE_MARKER {
                events.push(SseEvent::Done);
            } else if !payload.is_empty() {
                events.push(SseEvent::Data(payload.to_string()));
            }
        }

        Ok(events)
    }
}

#[derive(Debug, Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl PartialCall {
    fn snapshot(&self) -> ToolCall {
        ToolCall {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments: ToolArguments::Encoded(self.arguments.clone()),
        }
    }
}

/// Folds streamed chunks into deltas and the final response.
#[derive(Debug)]
pub struct StreamAssembler {
    provider: ProviderId,
    model: String,
    content: String,
    calls: BTreeMap<u32, PartialCall>,
    stop_reason: StopReason,
    usage: TokenUsage,
}

impl StreamAssembler {
    pub fn new(provider: ProviderId, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            content: String::new(),
            calls: BTreeMap::new(),
            stop_reason: StopReason::Other,
            usage: TokenUsage::default(),
        }
    }

    pub fn apply(&mut self, chunk: CompletionChunk) -> Vec<StreamEvent> {
        if !chunk.model.is_empty() {
            self.model = chunk.model;
        }
        if let Some(usage) = chunk.usage {
            self.usage = usage.into();
        }

        let mut events = Vec::new();
        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        if let Some(text) = choice.delta.content.filter(|text| !text.is_empty()) {
            self.content.push_str(&text);
            events.push(StreamEvent::TextDelta(text));
        }

        for fragment in choice.delta.tool_calls.unwrap_or_default() {
            let index = fragment.index.unwrap_or(0);
            let entry = self.calls.entry(index).or_default();
            if let Some(id) = fragment.id.filter(|id| !id.is_empty()) {
                entry.id = Some(id);
            }
            if let Some(function) = fragment.function {
                if let Some(name) = function.name {
                    entry.name = name;
                }
                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
            events.push(StreamEvent::ToolCallDelta {
                index,
                call: entry.snapshot(),
            });
        }

        if choice.finish_reason.is_some() {
            self.stop_reason = stop_reason(choice.finish_reason.as_deref());
        }

        events
    }

    pub fn finish(self) -> Vec<StreamEvent> {
        let calls = self
            .calls
            .values()
            .map(PartialCall::snapshot)
            .collect::<Vec<_>>();
        let message = Message::assistant(self.content).with_tool_calls(calls.clone());

        let mut output = Vec::new();
        if !message.content.is_empty() {
            output.push(OutputItem::Message(Message::assistant(
                message.content.clone(),
            )));
        }
        output.extend(calls.into_iter().map(OutputItem::ToolCall));

        vec![
            StreamEvent::MessageComplete(message),
            StreamEvent::ResponseComplete(ModelResponse {
                provider: self.provider,
                model: self.model,
                output,
                stop_reason: self.stop_reason,
                usage: self.usage,
            }),
        ]
    }
}
