//! Message Identity CLI
//!
//! Parses schema ids, message refs and schema versions and prints their parts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use familiar_messages::{MessageRef, MessagesConfig, SchemaId, SchemaVersion};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "message-ids")]
#[command(about = "Inspect schema ids, message refs and schema versions")]
struct Cli {
    /// Config file (defaults to messages.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Print compact JSON regardless of config
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema id (vendor:package:category:message:version)
    Id {
        schema_id: String,
    },

    /// Parse a message ref (vendor:package:category:message:id#tag)
    Ref {
        message_ref: String,
    },

    /// Parse a schema version (major-minor-patch.revision)
    Version {
        version: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = MessagesConfig::load_from(cli.config.as_deref()).context("failed to load config")?;
    let compact = cli.compact || config.is_compact();

    let output = match cli.command {
        Commands::Id { schema_id } => {
            let id = SchemaId::parse(&schema_id)?;
            json!({
                "id": id.as_str(),
                "curie": id.curie().to_string(),
                "curie_major": id.curie_major(),
                "vendor": id.vendor(),
                "package": id.package(),
                "category": id.category(),
                "message": id.message(),
                "version": id.version().to_string(),
                "is_mixin": id.curie().is_mixin(),
            })
        }

        Commands::Ref { message_ref } => {
            let parsed = MessageRef::parse(&message_ref)?;
            json!({
                "ref": parsed.to_string(),
                "curie": parsed.curie().to_string(),
                "id": parsed.id(),
                "tag": parsed.tag(),
            })
        }

        Commands::Version { version } => {
            let v = SchemaVersion::parse(&version)?;
            json!({
                "version": v.to_string(),
                "major": v.major(),
                "minor": v.minor(),
                "patch": v.patch(),
                "revision": v.revision,
            })
        }
    };

    let rendered = if compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);
    Ok(())
}
