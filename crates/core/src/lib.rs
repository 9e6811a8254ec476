//! # promptweave core
//!
//! Assembles chat-API conversation payloads from independently updatable
//! content sources. Each source sits behind a caching [`Provider`];
//! providers are grouped by role into [`Message`]s, and messages into a
//! [`Conversation`] that keeps a global name index and applies the merge
//! policy.
//!
//! ## Refresh and render
//!
//! Rendering is synchronous and reads cached content only. All I/O happens
//! in [`Conversation::refresh`], which fans out one fetch per stale
//! provider through a [`ContentStore`]. [`Conversation::render_latest`]
//! does both.

pub mod conversation;
pub mod error;
pub mod group;
mod index;
pub mod item;
pub mod message;
pub mod provider;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod wire;

// Re-export key types at crate root for ergonomics
pub use conversation::{Conversation, MessageMut, PopKey, Popped};
pub use error::{Error, Result, SnapshotError, StoreError};
pub use group::{ProviderGroup, ProviderMatch};
pub use item::MessageItem;
pub use message::{FunctionCall, Message, MessageId, MessageKind, Role, ToolCallRequest};
pub use provider::{ContentBlock, Provider};
pub use snapshot::{ConversationSnapshot, SNAPSHOT_VERSION};
pub use source::{FileEntry, FileOrigin, FileSnapshot, Source};
pub use store::{ContentStore, LocalStore, MemoryStore};
pub use wire::{ContentPart, ImageUrl, RenderedContent, RenderedMessage, merge_adjacent};
