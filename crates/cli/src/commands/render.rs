//! `promptweave render`: Print the rendered payload of a snapshot.

use promptweave_config::AppConfig;
use promptweave_core::Conversation;
use std::path::PathBuf;

/// Refresh and render as pretty JSON.
pub async fn render_json(conversation: &Conversation) -> Result<String, serde_json::Error> {
    let rendered = conversation.render_latest().await;
    serde_json::to_string_pretty(&rendered)
}

pub async fn run(
    config: &AppConfig,
    snapshot: Option<PathBuf>,
    save: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (conversation, path) = super::open(config, snapshot).await;
    println!("{}", render_json(&conversation).await?);

    if save {
        conversation.save(&path).await?;
        tracing::info!(path = %path.display(), "Refreshed snapshot saved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_config::StoreConfig;
    use promptweave_core::{Message, Provider};

    #[tokio::test]
    async fn renders_files_relative_to_store_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "remember the milk").unwrap();
        let config = AppConfig {
            store: StoreConfig {
                root: dir.path().to_path_buf(),
                ..StoreConfig::default()
            },
            ..AppConfig::default()
        };

        let files = Provider::files();
        files.update_file("notes.txt", None, None).unwrap();
        let path = dir.path().join("conv.json");
        Conversation::from_messages([Message::user([Provider::text("Context: "), files])])
            .save(&path)
            .await
            .unwrap();

        let (conversation, _) = crate::commands::open(&config, Some(path)).await;
        let json = render_json(&conversation).await.unwrap();
        assert!(json.contains("remember the milk"));
        assert!(json.contains("\"role\": \"user\""));
    }

    #[tokio::test]
    async fn missing_snapshot_renders_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let (conversation, _) =
            crate::commands::open(&AppConfig::default(), Some(dir.path().join("none.json"))).await;
        assert_eq!(render_json(&conversation).await.unwrap(), "[]");
    }
}
