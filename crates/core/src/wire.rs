//! The chat-API wire shape produced by rendering.
//!
//! Each entry serialises to one of:
//! - `{role, content: string}`
//! - `{role, content: [{type:"text", text} | {type:"image_url", image_url:{url}}]}`
//! - `{role, tool_calls:[...], content:null}`
//! - `{role:"tool", tool_call_id, content:string}`

use serde::{Deserialize, Serialize};

use crate::message::{Role, ToolCallRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub role: Role,

    /// `None` only for tool-call requests, where it serialises as `null`.
    pub content: Option<RenderedContent>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallRequest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderedContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl RenderedMessage {
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(RenderedContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn parts(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: Some(RenderedContent::Parts(parts)),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn tool_calls(role: Role, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role,
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(RenderedContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// The string content, when this is a plain-text entry.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Some(RenderedContent::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Plain-string content and neither tool field set.
    fn is_mergeable(&self) -> bool {
        self.tool_calls.is_none() && self.tool_call_id.is_none() && self.text_content().is_some()
    }
}

/// Join consecutive same-role plain-text entries. Runs after messages have
/// been rendered, so it also catches neighbours that were kept structurally
/// apart by a message that rendered to nothing.
pub fn merge_adjacent(rendered: Vec<RenderedMessage>) -> Vec<RenderedMessage> {
    let mut out: Vec<RenderedMessage> = Vec::with_capacity(rendered.len());
    for entry in rendered {
        if let Some(last) = out.last_mut() {
            if last.role == entry.role && last.is_mergeable() && entry.is_mergeable() {
                if let (Some(RenderedContent::Text(acc)), Some(next)) =
                    (&mut last.content, entry.text_content())
                {
                    acc.push_str(next);
                    continue;
                }
            }
        }
        out.push(entry);
    }
    out
}
