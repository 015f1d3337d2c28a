//! Chat completions protocol shared by every vendor that speaks it.
//!
//! OpenAI and Ollama's `/v1` surface accept the same request body and stream the same
//! server-sent events. They differ in base URL and authentication only, so each vendor
//! wraps a [`CompletionsClient`] and supplies its own [`Auth`].

mod client;
mod sse;
mod transport;
mod wire;


pub use client::CompletionsClient;
pub use sse::{SseEvent, SseFramer, StreamAssembler};
pub use transport::{
    Auth, CompletionChunkStream, CompletionsHttpTransport, CompletionsTransport, error_for_status,
};
pub use wire::{
    ChunkChoice, ChunkDelta, ChunkFunction, ChunkToolCall, CompletionChunk, CompletionRequest,
    CompletionResponse, ReplyChoice, ReplyFunction, ReplyMessage, ReplyToolCall, WireFunction,
    WireFunctionCall, WireMessage, WireTool, WireToolCall, WireUsage, stop_reason,
};

pub(crate) use transport::map_send_error;
