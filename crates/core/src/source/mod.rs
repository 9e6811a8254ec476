//! Source variants behind a [`Provider`](crate::provider::Provider).
//!
//! A source owns the caller-facing inputs (a string, a tool list, tracked
//! paths, an image reference). Fetching happens in two steps so that no
//! lock is held while awaiting I/O: [`Source::plan`] copies out what the
//! fetch needs, and [`FetchPlan::run`] performs it.

pub mod files;
pub mod image;
pub mod text;
pub mod tools;

pub use files::{FileEntry, FileOrigin, FileSnapshot};
pub use image::ImageSource;
pub use text::{TextContent, TextSource};
pub use tools::ToolsSource;

use std::sync::Arc;

use crate::store::ContentStore;

/// The concrete caching strategy of a provider.
#[derive(Debug, Clone)]
pub enum Source {
    Text(TextSource),
    Tools(ToolsSource),
    Files(FileSnapshot),
    Image(ImageSource),
}

impl Source {
    /// Variant name, used in errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Tools(_) => "tools",
            Self::Files(_) => "files",
            Self::Image(_) => "image",
        }
    }

    /// Computed text must be re-evaluated on every refresh.
    pub(crate) fn is_volatile(&self) -> bool {
        matches!(
            self,
            Self::Text(TextSource {
                content: TextContent::Computed(_),
                ..
            })
        )
    }

    pub(crate) fn plan(&self) -> FetchPlan {
        match self {
            Self::Text(text) => match &text.content {
                TextContent::Static(s) => FetchPlan::Ready(Some(s.clone())),
                TextContent::Computed(f) => FetchPlan::Compute(Arc::clone(f)),
            },
            Self::Tools(tools) => FetchPlan::Ready(tools.render()),
            Self::Files(files) => FetchPlan::Files(files.entries().to_vec()),
            Self::Image(image) => FetchPlan::Image(image.url.clone()),
        }
    }
}

/// Everything a fetch needs, detached from the provider's lock.
pub(crate) enum FetchPlan {
    Ready(Option<String>),
    Compute(Arc<dyn Fn() -> String + Send + Sync>),
    Files(Vec<FileEntry>),
    Image(String),
}

/// The outcome of a fetch. File fetches also return the re-read entries so
/// the provider can write back origin flips.
pub(crate) enum Fetched {
    Content(Option<String>),
    Files {
        content: Option<String>,
        entries: Vec<FileEntry>,
    },
}

impl FetchPlan {
    pub(crate) async fn run(self, store: &dyn ContentStore) -> Fetched {
        match self {
            Self::Ready(content) => Fetched::Content(content),
            Self::Compute(f) => Fetched::Content(Some(f())),
            Self::Files(entries) => {
                let entries = files::reload(entries, store).await;
                Fetched::Files {
                    content: files::render(&entries),
                    entries,
                }
            }
            Self::Image(url) => Fetched::Content(image::resolve(&url, store).await),
        }
    }
}
