use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use notetree::config::{AppConfig, LoggingConfig, StorageConfig};
use notetree::error::Result;
use notetree::event::NoticeHandler;
use notetree::model::path::{self, NodePath};
use notetree::model::Node;
use notetree::provider::JsonFileProvider;
use notetree::state::Session;
use notetree::{logging, ui};

/// Manage a tree of notes stored in a JSON file.
#[derive(Parser, Debug)]
#[command(name = "notes", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Extra config file, merged over the discovered ones
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON store file (overrides config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the tree below PATH
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// Print a note's content
    Cat { path: String },
    /// Create a directory
    Mkdir {
        parent: String,
        name: String,
        /// Pick "NAME 2", "NAME 3", ... when NAME is taken
        #[arg(long)]
        unique: bool,
    },
    /// Create a note
    Touch {
        parent: String,
        name: String,
        #[arg(long, default_value = "")]
        content: String,
        /// Pick "NAME 2", "NAME 3", ... when NAME is taken
        #[arg(long)]
        unique: bool,
    },
    /// Rename a note or directory
    Rename { path: String, new_name: String },
    /// Delete a note or directory
    Rm { path: String },
    /// Move a note or directory into another directory
    Mv { path: String, new_parent: String },
    /// Replace a note's content and save it
    Write { path: String, content: String },
}

impl Cli {
    /// Config layer built from CLI flags.
    fn overrides(&self) -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                path: self.store.clone(),
            },
            logging: LoggingConfig {
                level: self.log_level.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref(), Some(&cli.overrides()));

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    let mut notices = NoticeHandler::new();
    let provider = Arc::new(JsonFileProvider::new(config.store_path()));
    let session = Session::new(provider)
        .with_notices(notices.sender())
        .with_flash_duration(config.flash_duration());

    let outcome = run(&session, &cli.command, &config).await;

    for notice in notices.drain() {
        if notice.is_failure() {
            eprintln!("{}", notice.message());
        }
    }

    match outcome {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run(session: &Session, command: &Command, config: &AppConfig) -> Result<String> {
    session.fetch().await?;

    match command {
        Command::Ls { path: raw } => {
            let start = path::parse(raw);
            let lines = session.view(|ws| ui::render_tree(ws, &start, config.dirs_first()))?;
            Ok(lines.join("\n"))
        }
        Command::Cat { path: raw } => {
            let target = path::parse(raw);
            session.view(|ws| ws.root().file_content(&target).map(str::to_string))
        }
        Command::Mkdir {
            parent,
            name,
            unique,
        } => {
            let created = create(session, parent, Node::directory(name.as_str()), *unique).await?;
            Ok(format!("Created {}", path::display(&created)))
        }
        Command::Touch {
            parent,
            name,
            content,
            unique,
        } => {
            let node = Node::file(name.as_str(), content.as_str());
            let created = create(session, parent, node, *unique).await?;
            Ok(format!("Created {}", path::display(&created)))
        }
        Command::Rename { path: raw, new_name } => {
            let renamed = session.rename(&path::parse(raw), new_name).await?;
            Ok(format!("Renamed to {}", path::display(&renamed)))
        }
        Command::Rm { path: raw } => {
            let target = path::parse(raw);
            session.delete(&target).await?;
            Ok(format!("Deleted {}", path::display(&target)))
        }
        Command::Mv {
            path: raw,
            new_parent,
        } => {
            let moved = session
                .move_node(&path::parse(raw), &path::parse(new_parent))
                .await?;
            Ok(format!("Moved to {}", path::display(&moved)))
        }
        Command::Write { path: raw, content } => {
            let target = path::parse(raw);
            session.edit(&target, content.clone())?;
            session.save(&target).await?;
            Ok(format!("Saved {}", path::display(&target)))
        }
    }
}

async fn create(session: &Session, parent: &str, node: Node, unique: bool) -> Result<NodePath> {
    let parent = path::parse(parent);
    if unique {
        session.insert_unique(&parent, node).await
    } else {
        session.insert(&parent, node).await
    }
}
