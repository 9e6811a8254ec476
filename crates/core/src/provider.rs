//! Provider: a named, cacheable unit of message content.
//!
//! A `Provider` is a cheap-to-clone handle; clones share state, and identity
//! is pointer identity ([`Provider::same`]). Content freshness is tracked
//! with a generation counter: every source mutation bumps `generation`, and
//! a refresh records which generation the cache reflects. Visibility changes
//! set a separate re-evaluation trigger instead of invalidating the cache.
//!
//! The state lock is never held across an `.await`, so `content_block()`
//! stays synchronous and sibling refreshes cannot block each other.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::error::{Error, Result};
use crate::source::text::{computed_name, static_name};
use crate::source::{
    Fetched, FileSnapshot, ImageSource, Source, TextContent, TextSource, ToolsSource,
};
use crate::store::ContentStore;

/// The rendered unit a provider contributes to its message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub name: String,
    pub content: String,
}

#[derive(Clone)]
pub struct Provider {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    state: Mutex<State>,
}

struct State {
    source: Source,
    visible: bool,
    /// Bumped on every source mutation.
    generation: u64,
    /// Generation the cache was fetched at. `None` = never fetched.
    fetched: Option<u64>,
    /// Set by visibility changes; cleared by the next refresh.
    reevaluate: bool,
    cached: Option<String>,
    fetches: u64,
}

impl State {
    fn content_stale(&self) -> bool {
        self.source.is_volatile() || self.fetched != Some(self.generation)
    }

    fn touch(&mut self) {
        self.generation += 1;
    }
}

impl Provider {
    /// Wrap `source` under `name`. New providers start stale.
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                state: Mutex::new(State {
                    source,
                    visible: true,
                    generation: 0,
                    fetched: None,
                    reevaluate: false,
                    cached: None,
                    fetches: 0,
                }),
            }),
        }
    }

    /// Static text named after a hash of its content.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(static_name(&text), Source::Text(TextSource::fixed(text)))
    }

    pub fn named_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Source::Text(TextSource::fixed(text)))
    }

    /// Text produced by `f` on every refresh, under a random name.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::new(computed_name(), Source::Text(TextSource::computed(f)))
    }

    pub fn named_computed<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::new(name, Source::Text(TextSource::computed(f)))
    }

    pub fn tools(tools: Vec<Value>) -> Self {
        Self::named_tools("tools", tools)
    }

    pub fn named_tools(name: impl Into<String>, tools: Vec<Value>) -> Self {
        Self::new(name, Source::Tools(ToolsSource::new(tools)))
    }

    pub fn files() -> Self {
        Self::named_files("files")
    }

    pub fn named_files(name: impl Into<String>) -> Self {
        Self::new(name, Source::Files(FileSnapshot::new()))
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::named_image("image", url)
    }

    pub fn named_image(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, Source::Image(ImageSource::new(url)))
    }

    /// Mark a text provider as paragraph-separated. No effect on other kinds.
    pub fn paragraph(self) -> Self {
        {
            let mut state = self.state();
            if let Source::Text(text) = &mut state.source {
                text.paragraph = true;
            }
        }
        self
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn kind(&self) -> &'static str {
        self.state().source.kind()
    }

    pub fn is_image(&self) -> bool {
        matches!(self.state().source, Source::Image(_))
    }

    pub fn is_paragraph(&self) -> bool {
        matches!(&self.state().source, Source::Text(t) if t.paragraph)
    }

    /// Do two handles point at the same provider?
    pub fn same(a: &Provider, b: &Provider) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Identity key; equal exactly when [`Provider::same`] holds.
    pub(crate) fn identity(&self) -> *const () {
        Arc::as_ptr(&self.inner).cast()
    }

    pub fn visible(&self) -> bool {
        self.state().visible
    }

    /// Show or hide this provider. Schedules re-evaluation on the next
    /// refresh without invalidating cached content.
    pub fn set_visible(&self, visible: bool) {
        let mut state = self.state();
        state.visible = visible;
        state.reevaluate = true;
    }

    /// Does the next refresh have work to do?
    pub fn is_stale(&self) -> bool {
        let state = self.state();
        state.content_stale() || state.reevaluate
    }

    /// How many times the underlying fetch has run.
    pub fn fetch_count(&self) -> u64 {
        self.state().fetches
    }

    /// Last fetched content, regardless of visibility.
    pub fn cached_content(&self) -> Option<String> {
        self.state().cached.clone()
    }

    /// The block this provider contributes, if visible and non-empty.
    pub fn content_block(&self) -> Option<ContentBlock> {
        let state = self.state();
        if !state.visible {
            return None;
        }
        state.cached.as_ref().map(|content| ContentBlock {
            name: self.inner.name.clone(),
            content: content.clone(),
        })
    }

    // ── Refresh ───────────────────────────────────────────────────────────

    /// Re-fetch content if stale. Never fails: store errors resolve to
    /// sentinels or `None` inside the source.
    pub async fn refresh(&self, store: &dyn ContentStore) {
        let (plan, generation) = {
            let mut state = self.state();
            if !state.content_stale() {
                state.reevaluate = false;
                return;
            }
            (state.source.plan(), state.generation)
        };

        debug!(provider = %self.inner.name, generation, "Refreshing provider");
        let fetched = plan.run(store).await;

        let mut state = self.state();
        state.fetches += 1;
        let current = state.generation == generation;
        let content = match fetched {
            Fetched::Content(content) => content,
            Fetched::Files { content, entries } => {
                if current {
                    if let Source::Files(files) = &mut state.source {
                        files.replace_entries(entries);
                    }
                }
                content
            }
        };
        state.cached = content;
        state.fetched = Some(generation);
        state.reevaluate = false;
        if !current {
            debug!(provider = %self.inner.name, "Source changed during fetch, still stale");
        }
    }

    // ── Source updates ────────────────────────────────────────────────────

    /// Replace the text of a text provider with a static string.
    pub fn set_text(&self, text: impl Into<String>) -> Result<()> {
        self.with_text(|t| t.content = TextContent::Static(text.into()))
    }

    /// Replace the text of a text provider with a producer.
    pub fn set_computed<F>(&self, f: F) -> Result<()>
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.with_text(|t| t.content = TextContent::Computed(Arc::new(f)))
    }

    pub fn set_tools(&self, tools: Vec<Value>) -> Result<()> {
        self.update_source("tools", |source| match source {
            Source::Tools(t) => {
                t.tools = tools;
                true
            }
            _ => false,
        })
    }

    pub fn set_image(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        self.update_source("image", |source| match source {
            Source::Image(i) => {
                i.url = url;
                true
            }
            _ => false,
        })
    }

    /// Track `path` on a files provider. See [`FileSnapshot::update`].
    pub fn update_file(
        &self,
        path: &str,
        content: Option<String>,
        head: Option<usize>,
    ) -> Result<()> {
        self.update_source("files", |source| match source {
            Source::Files(f) => {
                f.update(path, content, head);
                true
            }
            _ => false,
        })
    }

    /// Stop tracking `path`. Returns whether it was tracked.
    pub fn remove_file(&self, path: &str) -> Result<bool> {
        let mut removed = false;
        self.update_source("files", |source| match source {
            Source::Files(f) => {
                removed = f.remove(path);
                true
            }
            _ => false,
        })?;
        Ok(removed)
    }

    fn with_text(&self, apply: impl FnOnce(&mut TextSource)) -> Result<()> {
        self.update_source("text", |source| match source {
            Source::Text(t) => {
                apply(t);
                true
            }
            _ => false,
        })
    }

    /// Run `apply` against the source; it returns false on a kind mismatch.
    fn update_source(
        &self,
        expected: &'static str,
        apply: impl FnOnce(&mut Source) -> bool,
    ) -> Result<()> {
        let mut state = self.state();
        if !apply(&mut state.source) {
            return Err(Error::WrongSourceKind {
                name: self.inner.name.clone(),
                expected,
                actual: state.source.kind(),
            });
        }
        state.touch();
        Ok(())
    }

    // ── Crate internals ───────────────────────────────────────────────────

    /// Read the source and visibility together under one lock.
    pub(crate) fn inspect<R>(&self, f: impl FnOnce(&Source, bool, Option<&str>) -> R) -> R {
        let state = self.state();
        f(&state.source, state.visible, state.cached.as_deref())
    }

    /// Restore a provider from persisted parts; it starts stale.
    pub(crate) fn restore(name: String, source: Source, visible: bool) -> Self {
        let provider = Self::new(name, source);
        provider.state().visible = visible;
        provider
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Provider")
            .field("name", &self.inner.name)
            .field("kind", &state.source.kind())
            .field("visible", &state.visible)
            .field("generation", &state.generation)
            .field("fetched", &state.fetched)
            .finish()
    }
}
