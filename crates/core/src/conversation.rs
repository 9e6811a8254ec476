//! Conversation: the top-level ordered sequence of messages.
//!
//! Owns every message, keeps a global name index over their providers and
//! applies two merge policies:
//!
//! 1. **Append-time**: appending a standard message whose role matches the
//!    last stored standard message folds its providers into that message.
//! 2. **Render-time**: after rendering, adjacent same-role plain-text
//!    entries are concatenated (see [`merge_adjacent`]).
//!
//! `render()` is cheap and synchronous and reads cached content only.
//! `render_latest()` refreshes first and is the only call guaranteed to
//! reflect the most recent updates.

use futures::future::join_all;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::group::{ProviderMatch, resolve_index};
use crate::index::ProviderIndex;
use crate::message::Message;
use crate::provider::Provider;
use crate::store::{ContentStore, LocalStore};
use crate::wire::{RenderedMessage, merge_adjacent};

/// What to pop from a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopKey {
    /// The last message.
    Last,
    /// The message at this position; negative counts from the end.
    Index(isize),
    /// The first provider with this name, from its owning message.
    Name(String),
}

impl From<&str> for PopKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<isize> for PopKey {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

#[derive(Debug)]
pub enum Popped {
    Message(Message),
    Provider(Provider),
}

impl Popped {
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(m) => Some(m),
            Self::Provider(_) => None,
        }
    }

    pub fn into_provider(self) -> Option<Provider> {
        match self {
            Self::Provider(p) => Some(p),
            Self::Message(_) => None,
        }
    }
}

pub struct Conversation {
    messages: Vec<Message>,
    index: ProviderIndex,
    store: Arc<dyn ContentStore>,
}

impl Conversation {
    /// An empty conversation reading files through a [`LocalStore`].
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            index: ProviderIndex::default(),
            store: Arc::new(LocalStore::new()),
        }
    }

    /// Append each message in turn, merging as [`append`](Self::append) does.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut conversation = Self::new();
        for message in messages {
            conversation.append(message);
        }
        conversation
    }

    /// Use `store` for every file and image read.
    pub fn with_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Message at `index`; negative counts from the end.
    pub fn get(&self, index: isize) -> Option<&Message> {
        resolve_index(index, self.messages.len()).map(|i| &self.messages[i])
    }

    /// Mutable access that keeps the index consistent.
    pub fn message_mut(&mut self, index: isize) -> Option<MessageMut<'_>> {
        let i = resolve_index(index, self.messages.len())?;
        Some(MessageMut {
            message: &mut self.messages[i],
            index: &mut self.index,
        })
    }

    /// Single provider, group, or `None`, across all messages.
    pub fn provider(&self, name: &str) -> Option<ProviderMatch> {
        self.index.lookup(name)
    }

    /// Names currently present in the index.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.names().map(str::to_string).collect();
        names.sort();
        names
    }

    // ── Structural mutation ───────────────────────────────────────────────

    /// Append `message`, folding it into the last message when both are
    /// standard messages with the same role.
    pub fn append(&mut self, message: Message) {
        if let Some(last) = self.messages.last_mut() {
            if last.can_absorb(&message) {
                debug!(role = %message.role(), moved = message.len(), "Merging into last message");
                let moved = last.absorb(message);
                for p in &moved {
                    self.index.register(p, last.id());
                }
                return;
            }
        }
        self.index.register_message(&message);
        self.messages.push(message);
    }

    /// Insert `message` at `index` (clamped) without merging.
    pub fn insert(&mut self, index: usize, message: Message) {
        let index = index.min(self.messages.len());
        self.index.register_message(&message);
        self.messages.insert(index, message);
    }

    /// Replace the message at `index`, returning the old one.
    pub fn replace(&mut self, index: isize, message: Message) -> Result<Message> {
        let i = resolve_index(index, self.messages.len()).ok_or(Error::IndexOutOfRange {
            index,
            len: self.messages.len(),
        })?;
        self.index.register_message(&message);
        let old = std::mem::replace(&mut self.messages[i], message);
        self.index.deregister_message(&old);
        Ok(old)
    }

    pub fn pop(&mut self, key: PopKey) -> Option<Popped> {
        match key {
            PopKey::Last => self.pop_last().map(Popped::Message),
            PopKey::Index(i) => self.pop_at(i).map(Popped::Message),
            PopKey::Name(name) => self.pop_provider(&name).map(Popped::Provider),
        }
    }

    pub fn pop_last(&mut self) -> Option<Message> {
        let message = self.messages.pop()?;
        self.index.deregister_message(&message);
        Some(message)
    }

    /// Remove the whole message at `index`. Out of range mutates nothing.
    pub fn pop_at(&mut self, index: isize) -> Option<Message> {
        let i = resolve_index(index, self.messages.len())?;
        let message = self.messages.remove(i);
        self.index.deregister_message(&message);
        Some(message)
    }

    /// Remove the first provider named `name` from the earliest message
    /// that owns one.
    pub fn pop_provider(&mut self, name: &str) -> Option<Provider> {
        let owners = self.index.owners(name);
        let message = self.messages.iter_mut().find(|m| owners.contains(m.id()))?;
        let provider = message.pop(name)?;
        self.index.deregister(&provider, message.id());
        Some(provider)
    }

    // ── Refresh & render ──────────────────────────────────────────────────

    /// Refresh every indexed provider concurrently.
    pub async fn refresh(&self) {
        let providers = self.index.providers();
        debug!(providers = providers.len(), store = self.store.name(), "Refreshing conversation");
        let store = self.store.as_ref();
        join_all(providers.iter().map(|p| p.refresh(store))).await;
    }

    /// Render from cached content, then merge adjacent plain-text entries.
    pub fn render(&self) -> Vec<RenderedMessage> {
        merge_adjacent(self.messages.iter().filter_map(Message::render).collect())
    }

    /// Refresh, then render.
    pub async fn render_latest(&self) -> Vec<RenderedMessage> {
        self.refresh().await;
        self.render()
    }

    pub(crate) fn messages(&self) -> &[Message] {
        &self.messages
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.messages)
            .field("indexed", &self.index.len())
            .field("store", &self.store.name())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// A message borrowed together with its conversation's index. Every
/// structural change made through it is mirrored into the index.
pub struct MessageMut<'a> {
    message: &'a mut Message,
    index: &'a mut ProviderIndex,
}

impl MessageMut<'_> {
    pub fn append(&mut self, provider: Provider) {
        self.index.register(&provider, self.message.id());
        self.message.append(provider);
    }

    pub fn insert(&mut self, index: usize, provider: Provider) {
        self.index.register(&provider, self.message.id());
        self.message.insert(index, provider);
    }

    pub fn pop(&mut self, name: &str) -> Option<Provider> {
        let provider = self.message.pop(name)?;
        self.index.deregister(&provider, self.message.id());
        Some(provider)
    }
}

impl Deref for MessageMut<'_> {
    type Target = Message;

    fn deref(&self) -> &Message {
        self.message
    }
}
