//! Snapshot persistence for a conversation.
//!
//! [`Conversation::snapshot`] is the explicit freeze step: it walks every
//! message and provider and copies out a plain serde tree in which computed
//! text has become static. Only that tree is ever written to disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::conversation::Conversation;
use crate::error::{Result, SnapshotError};
use crate::message::{Message, MessageKind, Role, ToolCallRequest};
use crate::provider::Provider;
use crate::source::{
    FileEntry, FileSnapshot, ImageSource, Source, TextContent, TextSource, ToolsSource,
};

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub messages: Vec<MessageSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSnapshot {
    pub role: Role,
    #[serde(default)]
    pub kind: KindSnapshot,
    #[serde(default)]
    pub items: Vec<ProviderSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KindSnapshot {
    #[default]
    Standard,
    ToolCalls { calls: Vec<ToolCallRequest> },
    ToolResult { tool_call_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub source: SourceSnapshot,
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSnapshot {
    Text {
        text: String,
        #[serde(default)]
        paragraph: bool,
    },
    Tools {
        tools: Vec<Value>,
    },
    Files {
        entries: Vec<FileEntry>,
    },
    Image {
        url: String,
    },
}

// ── Freeze ────────────────────────────────────────────────────────────────

impl ProviderSnapshot {
    fn capture(provider: &Provider) -> Self {
        let (captured, visible) = provider.inspect(|source, visible, cached| {
            let captured = match source {
                Source::Text(t) => match (&t.content, cached) {
                    (TextContent::Static(s), _) => Ok(SourceSnapshot::Text {
                        text: s.clone(),
                        paragraph: t.paragraph,
                    }),
                    (TextContent::Computed(_), Some(text)) => Ok(SourceSnapshot::Text {
                        text: text.to_string(),
                        paragraph: t.paragraph,
                    }),
                    // Never refreshed; evaluated below once the lock is released.
                    (TextContent::Computed(f), None) => Err((Arc::clone(f), t.paragraph)),
                },
                Source::Tools(t) => Ok(SourceSnapshot::Tools {
                    tools: t.tools.clone(),
                }),
                Source::Files(f) => Ok(SourceSnapshot::Files {
                    entries: f.entries().to_vec(),
                }),
                Source::Image(i) => Ok(SourceSnapshot::Image { url: i.url.clone() }),
            };
            (captured, visible)
        });
        let source = captured.unwrap_or_else(|(f, paragraph)| SourceSnapshot::Text {
            text: f(),
            paragraph,
        });
        Self {
            name: provider.name().to_string(),
            visible,
            source,
        }
    }

    fn restore(self) -> Provider {
        let source = match self.source {
            SourceSnapshot::Text { text, paragraph } => {
                let mut t = TextSource::fixed(text);
                t.paragraph = paragraph;
                Source::Text(t)
            }
            SourceSnapshot::Tools { tools } => Source::Tools(ToolsSource::new(tools)),
            SourceSnapshot::Files { entries } => Source::Files(FileSnapshot::from_entries(entries)),
            SourceSnapshot::Image { url } => Source::Image(ImageSource::new(url)),
        };
        Provider::restore(self.name, source, self.visible)
    }
}

impl MessageSnapshot {
    fn capture(message: &Message) -> Self {
        let kind = match message.kind() {
            MessageKind::Standard => KindSnapshot::Standard,
            MessageKind::ToolCalls(calls) => KindSnapshot::ToolCalls {
                calls: calls.clone(),
            },
            MessageKind::ToolResult { tool_call_id } => KindSnapshot::ToolResult {
                tool_call_id: tool_call_id.clone(),
            },
        };
        Self {
            role: message.role(),
            kind,
            items: message.providers().iter().map(ProviderSnapshot::capture).collect(),
        }
    }

    fn restore(self) -> Message {
        let kind = match self.kind {
            KindSnapshot::Standard => MessageKind::Standard,
            KindSnapshot::ToolCalls { calls } => MessageKind::ToolCalls(calls),
            KindSnapshot::ToolResult { tool_call_id } => MessageKind::ToolResult { tool_call_id },
        };
        let items = self.items.into_iter().map(ProviderSnapshot::restore).collect();
        Message::with_parts(self.role, kind, items)
    }
}

impl ConversationSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self).map_err(SnapshotError::Corrupt)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = serde_json::from_slice(bytes).map_err(SnapshotError::Corrupt)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }
        Ok(snapshot)
    }

    /// Rebuild a conversation with the same message boundaries. Providers
    /// start stale; the caller's store is attached afterwards.
    pub fn into_conversation(self) -> Conversation {
        let mut conversation = Conversation::new();
        for message in self.messages {
            // `insert` at the end keeps stored boundaries; `append` would re-merge.
            conversation.insert(conversation.len(), message.restore());
        }
        conversation
    }
}

// ── Conversation persistence ──────────────────────────────────────────────

impl Conversation {
    /// Freeze the conversation into a serialisable tree.
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            messages: self.messages().iter().map(MessageSnapshot::capture).collect(),
        }
    }

    /// Freeze and write to `path`, creating parent directories.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.snapshot().to_bytes()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SnapshotError::Write {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
        }
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| SnapshotError::Write {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!(path = %path.display(), messages = self.len(), bytes = bytes.len(), "Saved snapshot");
        Ok(())
    }

    /// Read a snapshot, surfacing any failure.
    pub async fn try_load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SnapshotError::Read {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let conversation = ConversationSnapshot::from_bytes(&bytes)?.into_conversation();
        debug!(path = %path.display(), messages = conversation.len(), "Loaded snapshot");
        Ok(conversation)
    }

    /// Read a snapshot. A missing or corrupt file yields an empty
    /// conversation.
    pub async fn load(path: &Path) -> Self {
        match Self::try_load(path).await {
            Ok(conversation) => conversation,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Snapshot unusable, starting empty");
                Self::new()
            }
        }
    }
}
