//! promptweave CLI: the main entry point.
//!
//! Commands:
//! - `add`      Append a message to a snapshot
//! - `render`   Print the chat-API payload of a snapshot
//! - `inspect`  List messages and providers in a snapshot
//! - `config`   Show effective or default configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use promptweave_config::AppConfig;

mod commands;

use commands::add::{AddArgs, RoleArg};

#[derive(Parser)]
#[command(
    name = "promptweave",
    about = "promptweave: assemble chat payloads from cached content providers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a message built from text, files and images
    Add {
        /// Role of the new message
        #[arg(short, long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,

        /// Literal text blocks, in order
        #[arg(short, long)]
        text: Vec<String>,

        /// Files to track in a `files` provider
        #[arg(short, long)]
        file: Vec<String>,

        /// Only render the first N lines of each tracked file
        #[arg(long)]
        head: Option<usize>,

        /// Images to attach
        #[arg(short, long)]
        image: Vec<String>,

        /// Snapshot to update (defaults to the configured path)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Refresh a snapshot and print its rendered payload as JSON
    Render {
        /// Snapshot to read (defaults to the configured path)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Write the refreshed snapshot back
        #[arg(long)]
        save: bool,
    },

    /// List the messages and providers of a snapshot
    Inspect {
        /// Snapshot to read (defaults to the configured path)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { config.log.level.as_str() };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Add {
            role,
            text,
            file,
            head,
            image,
            snapshot,
        } => {
            let args = AddArgs {
                role,
                text,
                files: file,
                head,
                images: image,
            };
            commands::add::run(&config, snapshot, args).await?
        }
        Commands::Render { snapshot, save } => commands::render::run(&config, snapshot, save).await?,
        Commands::Inspect { snapshot } => commands::inspect::run(&config, snapshot).await?,
        Commands::Config { default } => commands::config_cmd::show(&config, default)?,
    }

    Ok(())
}
