//! `promptweave add`: Append a message to a snapshot.

use clap::ValueEnum;
use promptweave_config::AppConfig;
use promptweave_core::{Conversation, Message, Provider, Role};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    System,
    User,
    Assistant,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::System => Role::System,
            RoleArg::User => Role::User,
            RoleArg::Assistant => Role::Assistant,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AddArgs {
    pub role: RoleArg,
    pub text: Vec<String>,
    pub files: Vec<String>,
    pub head: Option<usize>,
    pub images: Vec<String>,
}

/// Text blocks first, then one `files` provider, then images.
pub fn build_message(args: &AddArgs) -> Result<Message, Box<dyn std::error::Error>> {
    let mut providers: Vec<Provider> = args.text.iter().map(Provider::text).collect();

    if !args.files.is_empty() {
        let files = Provider::files();
        for path in &args.files {
            files.update_file(path, None, args.head)?;
        }
        providers.push(files);
    }

    providers.extend(args.images.iter().map(Provider::image));

    if providers.is_empty() {
        return Err("nothing to add: pass --text, --file or --image".into());
    }
    Ok(Message::from_providers(args.role.into(), providers))
}

/// Append to `conversation`. Returns whether it merged into the last message.
pub fn append(conversation: &mut Conversation, message: Message) -> bool {
    let before = conversation.len();
    conversation.append(message);
    conversation.len() == before
}

pub async fn run(
    config: &AppConfig,
    snapshot: Option<PathBuf>,
    args: AddArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let message = build_message(&args)?;
    let blocks = message.len();
    let (mut conversation, path) = super::open(config, snapshot).await;

    let merged = append(&mut conversation, message);
    conversation.save(&path).await?;

    let role = Role::from(args.role);
    if merged {
        println!("Merged {blocks} block(s) into the last {role} message");
    } else {
        println!("Added {role} message #{} with {blocks} block(s)", conversation.len());
    }
    println!("Saved {}", path.display());
    Ok(())
}
