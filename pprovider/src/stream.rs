//! Incremental model output.
//!
//! A streamed reply arrives as text fragments and tool-call snapshots, then optionally
//! the assembled message and response. Text deltas are additive: concatenating them in
//! order yields the reply text. Tool-call deltas are cumulative: each one carries the
//! whole call at `index` as known so far, so a consumer keeps the latest snapshot per
//! index and never appends them.
//!
//! ```rust
//! use pprovider::{StreamEvent, StreamedToolCalls, ToolCall};
//!
//! let mut calls = StreamedToolCalls::default();
//! calls.observe(0, ToolCall::new("add_two_numbers", "{\"a\":2").with_id("c1"));
//! calls.observe(0, ToolCall::new("add_two_numbers", "{\"a\":2,\"b\":3}").with_id("c1"));
//!
//! let calls = calls.into_calls();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].arguments.to_encoded(), "{\"a\":2,\"b\":3}");
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{Message, ModelResponse, ProviderError, ToolCall};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The next piece of reply text.
    TextDelta(String),
    /// Everything known so far about the tool call at `index`.
    ToolCallDelta { index: u32, call: ToolCall },
    /// The assembled assistant message, tool requests included.
    MessageComplete(Message),
    /// The assembled response. Nothing follows it.
    ResponseComplete(ModelResponse),
}

/// A provider's event stream.
///
/// Events come in source order. `MessageComplete` and `ResponseComplete` arrive after
/// every delta they summarise, and a stream may end without either one.
pub trait ModelEventStream: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

impl<T> ModelEventStream for T where T: Stream<Item = Result<StreamEvent, ProviderError>> + Send {}

pub type BoxedEventStream<'a> = Pin<Box<dyn ModelEventStream + 'a>>;

/// Latest snapshot of each streamed tool call, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamedToolCalls {
    calls: Vec<(u32, ToolCall)>,
}

impl StreamedToolCalls {
    /// Replaces the snapshot held for `index`.
    pub fn observe(&mut self, index: u32, call: ToolCall) {
        match self.calls.iter_mut().find(|(seen, _)| *seen == index) {
            Some((_, latest)) => *latest = call,
            None => self.calls.push((index, call)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn into_calls(self) -> Vec<ToolCall> {
        self.calls.into_iter().map(|(_, call)| call).collect()
    }
}

/// Replays scripted events. Used by fakes in place of a vendor stream.
#[derive(Debug)]
pub struct VecEventStream {
    events: VecDeque<Result<StreamEvent, ProviderError>>,
}

impl VecEventStream {
    pub fn new(events: Vec<Result<StreamEvent, ProviderError>>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Splits `text` into text deltas of at most `chunk_chars` characters.
    pub fn from_text_chunks(text: &str, chunk_chars: usize) -> Self {
        let chars = text.chars().collect::<Vec<_>>();
        let events = chars
            .chunks(chunk_chars.max(1))
            .map(|chunk| Ok(StreamEvent::TextDelta(chunk.iter().collect())))
            .collect();
        Self::new(events)
    }

    pub fn push(mut self, event: StreamEvent) -> Self {
        self.events.push_back(Ok(event));
        self
    }

    pub fn push_tool_call(self, index: u32, call: ToolCall) -> Self {
        self.push(StreamEvent::ToolCallDelta { index, call })
    }
}

impl Stream for VecEventStream {
    type Item = Result<StreamEvent, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_snapshots_replace_earlier_ones_without_reordering() {
        let mut calls = StreamedToolCalls::default();
        calls.observe(1, ToolCall::new("list_devices", "{}"));
        calls.observe(0, ToolCall::new("set_rgb_color", "{\"r\":"));
        calls.observe(0, ToolCall::new("set_rgb_color", "{\"r\":255}").with_id("c0"));

        let calls = calls.into_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "list_devices");
        assert_eq!(calls[1].id.as_deref(), Some("c0"));
        assert_eq!(calls[1].arguments.to_encoded(), "{\"r\":255}");
    }
}
