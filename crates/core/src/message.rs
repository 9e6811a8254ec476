//! Message: an ordered group of providers sharing one role.
//!
//! A message renders either to a plain string or, as soon as it holds an
//! image provider, to a list of typed parts. Two special kinds bypass block
//! assembly: tool-call requests and tool results.
//!
//! A detached message is mutated directly. Once it belongs to a
//! [`Conversation`](crate::conversation::Conversation), mutation goes
//! through [`MessageMut`](crate::conversation::MessageMut), which keeps the
//! conversation's name index in step.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::group::ProviderMatch;
use crate::item::MessageItem;
use crate::provider::Provider;
use crate::store::ContentStore;
use crate::wire::{ContentPart, ImageUrl, RenderedMessage};

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A tool call requested by the assistant, in chat-API shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,

    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// Arguments as a JSON string
    pub arguments: String,
}

fn default_call_type() -> String {
    "function".into()
}

impl ToolCallRequest {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// What a message renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Provider blocks, plain or multimodal.
    Standard,
    /// `{role, tool_calls, content: null}`.
    ToolCalls(Vec<ToolCallRequest>),
    /// `{role: "tool", tool_call_id, content}`; images are dropped.
    ToolResult { tool_call_id: String },
}

#[derive(Debug)]
pub struct Message {
    id: MessageId,
    role: Role,
    kind: MessageKind,
    items: Vec<Provider>,
}

impl Message {
    /// An empty standard message.
    pub fn new(role: Role) -> Self {
        Self::with_parts(role, MessageKind::Standard, Vec::new())
    }

    pub(crate) fn with_parts(role: Role, kind: MessageKind, items: Vec<Provider>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            kind,
            items,
        }
    }

    pub fn from_providers(role: Role, providers: impl IntoIterator<Item = Provider>) -> Self {
        Self::with_parts(role, MessageKind::Standard, providers.into_iter().collect())
    }

    pub fn system(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self::from_providers(Role::System, providers)
    }

    pub fn user(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self::from_providers(Role::User, providers)
    }

    pub fn assistant(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self::from_providers(Role::Assistant, providers)
    }

    /// Build from a free mix of fragments: providers, literal strings,
    /// other messages (flattened) and JSON content parts. Unsupported
    /// shapes are rejected here, not at render time.
    pub fn build<I, T>(role: Role, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<MessageItem>,
    {
        let mut providers = Vec::new();
        for item in items {
            item.into().collect_into(&mut providers)?;
        }
        Ok(Self::from_providers(role, providers))
    }

    /// An assistant tool-call request.
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::with_parts(Role::Assistant, MessageKind::ToolCalls(calls), Vec::new())
    }

    /// A tool result. `content` may be a string, a provider or a whole
    /// message; only its non-image text is kept.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        content: impl Into<MessageItem>,
    ) -> Result<Self> {
        let mut providers = Vec::new();
        content.into().collect_into(&mut providers)?;
        providers.retain(|p| !p.is_image());
        Ok(Self::with_parts(
            Role::Tool,
            MessageKind::ToolResult {
                tool_call_id: tool_call_id.into(),
            },
            providers,
        ))
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    pub fn providers(&self) -> &[Provider] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// No live providers (and, for tool-call requests, no calls).
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            MessageKind::ToolCalls(calls) => calls.is_empty() && self.items.is_empty(),
            _ => self.items.is_empty(),
        }
    }

    /// Renders as typed parts rather than a string.
    pub fn is_multimodal(&self) -> bool {
        matches!(self.kind, MessageKind::Standard) && self.items.iter().any(Provider::is_image)
    }

    /// Single provider, group, or `None`.
    pub fn provider(&self, name: &str) -> Option<ProviderMatch> {
        ProviderMatch::from_matches(
            self.items
                .iter()
                .filter(|p| p.name() == name)
                .cloned()
                .collect(),
        )
    }

    // ── Structural mutation ───────────────────────────────────────────────

    pub fn append(&mut self, provider: Provider) {
        self.items.push(provider);
    }

    /// Insert at `index`, clamped to the end.
    pub fn insert(&mut self, index: usize, provider: Provider) {
        let index = index.min(self.items.len());
        self.items.insert(index, provider);
    }

    /// Remove the first provider named `name`.
    pub fn pop(&mut self, name: &str) -> Option<Provider> {
        let pos = self.items.iter().position(|p| p.name() == name)?;
        Some(self.items.remove(pos))
    }

    /// Can `other` be folded into this message on append?
    pub(crate) fn can_absorb(&self, other: &Message) -> bool {
        self.role == other.role
            && self.kind == MessageKind::Standard
            && other.kind == MessageKind::Standard
    }

    /// Move `other`'s providers onto the end of this message. Returns the
    /// moved providers so the caller can re-own them in its index.
    pub(crate) fn absorb(&mut self, other: Message) -> Vec<Provider> {
        let moved = other.items;
        self.items.extend(moved.iter().cloned());
        moved
    }

    pub(crate) fn into_providers(self) -> Vec<Provider> {
        self.items
    }

    // ── Refresh & render ──────────────────────────────────────────────────

    /// Refresh every provider concurrently.
    pub async fn refresh(&self, store: &dyn ContentStore) {
        join_all(self.items.iter().map(|p| p.refresh(store))).await;
    }

    /// Render from cached content. `None` when there is nothing to send.
    pub fn render(&self) -> Option<RenderedMessage> {
        match &self.kind {
            MessageKind::ToolCalls(calls) => {
                Some(RenderedMessage::tool_calls(self.role, calls.clone()))
            }
            MessageKind::ToolResult { tool_call_id } => Some(RenderedMessage::tool_result(
                tool_call_id.clone(),
                self.render_text().unwrap_or_default(),
            )),
            MessageKind::Standard if self.is_multimodal() => {
                let parts = self.render_parts();
                (!parts.is_empty()).then(|| RenderedMessage::parts(self.role, parts))
            }
            MessageKind::Standard => self
                .render_text()
                .map(|text| RenderedMessage::text(self.role, text)),
        }
    }

    fn render_text(&self) -> Option<String> {
        let mut out = String::new();
        for provider in &self.items {
            let Some(block) = provider.content_block() else {
                continue;
            };
            if !out.is_empty() && provider.is_paragraph() {
                out.push_str("\n\n");
            }
            out.push_str(&block.content);
        }
        (!out.is_empty()).then_some(out)
    }

    fn render_parts(&self) -> Vec<ContentPart> {
        self.items
            .iter()
            .filter_map(|provider| {
                let block = provider.content_block()?;
                Some(if provider.is_image() {
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: block.content },
                    }
                } else {
                    ContentPart::Text {
                        text: block.content,
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::wire::RenderedContent;

    #[tokio::test]
    async fn plain_text_concatenates_without_separator() {
        let store = MemoryStore::new();
        let msg = Message::user([Provider::text("Hello,"), Provider::text(" world")]);
        msg.refresh(&store).await;
        let rendered = msg.render().unwrap();
        assert_eq!(rendered.text_content(), Some("Hello, world"));
    }

    #[tokio::test]
    async fn paragraph_flag_inserts_blank_line_except_first() {
        let store = MemoryStore::new();
        let msg = Message::user([
            Provider::named_text("a", "first").paragraph(),
            Provider::named_text("b", "second").paragraph(),
        ]);
        msg.refresh(&store).await;
        assert_eq!(msg.render().unwrap().text_content(), Some("first\n\nsecond"));
    }

    #[tokio::test]
    async fn empty_content_renders_to_none() {
        let store = MemoryStore::new();
        let msg = Message::assistant([Provider::text("")]);
        msg.refresh(&store).await;
        assert!(msg.render().is_none());

        let hidden = Message::user([Provider::text("secret")]);
        hidden.refresh(&store).await;
        hidden.providers()[0].set_visible(false);
        assert!(hidden.render().is_none());
    }

    #[tokio::test]
    async fn image_switches_to_multimodal_and_back() {
        let store = MemoryStore::new();
        store.insert("pic.png", "png-bytes");
        let mut msg = Message::user([
            Provider::named_text("prefix", "Look at this:"),
            Provider::named_image("image", "pic.png"),
            Provider::named_text("suffix", "Any thoughts?"),
        ]);
        msg.refresh(&store).await;

        let rendered = msg.render().unwrap();
        match rendered.content {
            Some(RenderedContent::Parts(parts)) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
            }
            other => panic!("expected parts, got {other:?}"),
        }

        assert!(msg.pop("image").is_some());
        assert_eq!(
            msg.render().unwrap().text_content(),
            Some("Look at this:Any thoughts?")
        );
    }

    #[tokio::test]
    async fn missing_image_is_skipped_in_parts() {
        let store = MemoryStore::new();
        let msg = Message::user([Provider::text("caption"), Provider::image("missing.png")]);
        msg.refresh(&store).await;
        match msg.render().unwrap().content {
            Some(RenderedContent::Parts(parts)) => assert_eq!(parts.len(), 1),
            other => panic!("expected parts, got {other:?}"),
        }
    }

    #[test]
    fn pop_removes_first_match_only() {
        let mut msg = Message::user([
            Provider::named_text("dup", "1"),
            Provider::named_text("dup", "2"),
        ]);
        assert!(msg.provider("dup").unwrap().as_group().is_some());

        let first = msg.pop("dup").unwrap();
        assert_eq!(msg.len(), 1);
        assert!(msg.provider("dup").unwrap().as_single().is_some());
        assert!(!Provider::same(&first, &msg.providers()[0]));

        assert!(msg.pop("absent").is_none());
        assert_eq!(msg.len(), 1);
    }

    #[test]
    fn emptiness_tracks_pops() {
        let mut msg = Message::user([Provider::named_text("only", "x")]);
        assert!(!msg.is_empty());
        msg.pop("only");
        assert!(msg.is_empty());
    }

    #[test]
    fn insert_clamps_to_end() {
        let mut msg = Message::user([Provider::named_text("a", "1")]);
        msg.insert(10, Provider::named_text("b", "2"));
        msg.insert(0, Provider::named_text("c", "3"));
        let names: Vec<_> = msg.providers().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn tool_result_flattens_nested_message_text() {
        let store = MemoryStore::new();
        store.insert("chart.png", "bytes");
        let nested = Message::user([Provider::text("15"), Provider::image("chart.png")]);
        let msg = Message::tool_result("call_1", nested).unwrap();
        assert_eq!(msg.len(), 1);

        msg.refresh(&store).await;
        let rendered = msg.render().unwrap();
        assert_eq!(rendered.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(rendered.text_content(), Some("15"));
        assert_eq!(store.reads("chart.png"), 0);
    }

    #[test]
    fn tool_calls_render_without_refresh() {
        let msg = Message::tool_calls(vec![ToolCallRequest::function("c1", "add", "{}")]);
        let rendered = msg.render().unwrap();
        assert!(rendered.content.is_none());
        assert_eq!(rendered.tool_calls.unwrap().len(), 1);
        assert!(!msg.is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::Tool.to_string(), "tool");
    }
}
