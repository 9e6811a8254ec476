//! Literal and computed text.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Where a text provider's string comes from.
#[derive(Clone)]
pub enum TextContent {
    /// A fixed string.
    Static(String),
    /// A producer evaluated on every refresh.
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

impl std::fmt::Debug for TextContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(s) => f.debug_tuple("Static").field(s).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSource {
    pub content: TextContent,
    /// Emit a blank line before this block when it is not the first one
    /// in a plain-text message.
    pub paragraph: bool,
}

impl TextSource {
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            content: TextContent::Static(text.into()),
            paragraph: false,
        }
    }

    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            content: TextContent::Computed(Arc::new(f)),
            paragraph: false,
        }
    }
}

/// Deterministic name for static text: equal text gives equal names.
pub fn static_name(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
    format!("text-{hex}")
}

/// Random name for computed text.
pub fn computed_name() -> String {
    format!("text-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_names_are_deterministic() {
        assert_eq!(static_name("hello"), static_name("hello"));
        assert_ne!(static_name("hello"), static_name("hello!"));
        assert_eq!(static_name("hello").len(), "text-".len() + 16);
    }

    #[test]
    fn computed_names_are_unique() {
        assert_ne!(computed_name(), computed_name());
    }

    #[test]
    fn computed_debug_hides_closure() {
        let src = TextSource::computed(|| "x".into());
        assert!(format!("{src:?}").contains("Computed(..)"));
    }
}
