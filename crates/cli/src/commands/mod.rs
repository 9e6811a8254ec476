pub mod add;
pub mod config_cmd;
pub mod inspect;
pub mod render;

use promptweave_config::AppConfig;
use promptweave_core::Conversation;
use std::path::PathBuf;
use std::sync::Arc;

/// Load the snapshot at `path` (or the configured default), wired to the
/// configured local store.
pub async fn open(config: &AppConfig, path: Option<PathBuf>) -> (Conversation, PathBuf) {
    let path = path.unwrap_or_else(|| config.snapshot.path.clone());
    let conversation = Conversation::load(&path)
        .await
        .with_store(Arc::new(config.local_store()));
    (conversation, path)
}
