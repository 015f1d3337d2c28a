//! Turns model output into user-facing text.
//!
//! Every function here is total: any string or JSON value renders without panicking.
//!
//! ```rust
//! use pchat::render::strip_thinking;
//!
//! assert_eq!(strip_thinking("<think>plan</think>Hello"), "Thinking...\nHello");
//! assert_eq!(strip_thinking("  Hello "), "Hello");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::{AgentReply, TurnResponse};

pub const THINKING_MARKER: &str = "Thinking...\n";

const THINK_OPEN: &str = "<think>";

static THINK_SPAN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").ok());

pub fn render_turn(response: &TurnResponse) -> String {
    response.content.trim().to_string()
}

/// Removes `<think>…</think>` spans and flags that they were there.
pub fn strip_thinking(text: &str) -> String {
    if !text.to_ascii_lowercase().contains(THINK_OPEN) {
        return text.trim().to_string();
    }

    let visible = match THINK_SPAN.as_ref() {
        Some(span) => span.replace_all(text, ""),
        None => text.into(),
    };
    format!("{THINKING_MARKER}{visible}").trim().to_string()
}

/// Final answer text followed by the turn's tool outputs, if any were produced.
pub fn render_agent_reply(reply: &AgentReply) -> String {
    let mut rendered = strip_thinking(&reply.response.content);
    if !reply.tool_results.is_empty() {
        let results = serde_json::to_string(&reply.tool_results).unwrap_or_default();
        rendered.push_str("\n\n");
        rendered.push_str(&results);
    }
    rendered
}

/// Renders a raw provider payload.
///
/// Strings render as themselves and chat-shaped objects as their message content.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Object(map) => match map
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
        {
            Some(content) => content.trim().to_string(),
            None => value.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
