//! `promptweave inspect`: List the messages and providers of a snapshot.

use promptweave_config::AppConfig;
use promptweave_core::{Conversation, MessageKind};
use std::fmt::Write;
use std::path::PathBuf;

/// One line per message, one indented line per provider.
pub fn describe(conversation: &Conversation) -> String {
    let mut out = String::new();
    for (i, message) in conversation.iter().enumerate() {
        let kind = match message.kind() {
            MessageKind::Standard if message.is_multimodal() => "multimodal".to_string(),
            MessageKind::Standard => "text".to_string(),
            MessageKind::ToolCalls(calls) => format!("tool calls ({})", calls.len()),
            MessageKind::ToolResult { tool_call_id } => format!("tool result for {tool_call_id}"),
        };
        let _ = writeln!(out, "#{i} {} [{kind}]", message.role());
        for provider in message.providers() {
            let hidden = if provider.visible() { "" } else { " (hidden)" };
            let _ = writeln!(out, "    {} <{}>{hidden}", provider.name(), provider.kind());
        }
    }
    out
}

pub async fn run(config: &AppConfig, snapshot: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let (conversation, path) = super::open(config, snapshot).await;

    println!("📜 {}", path.display());
    if conversation.is_empty() {
        println!("  (empty)");
        return Ok(());
    }
    print!("{}", describe(&conversation));
    println!("{} message(s), {} provider name(s)", conversation.len(), conversation.provider_names().len());
    Ok(())
}
