// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persona - a retrieval-augmented persona chat bot.
//!
//! This is the binary entry point: configuration loading, tracing setup,
//! and subcommand dispatch.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod knowledge;
mod pipeline;
mod providers;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;

use persona_core::PersonaError;

/// Persona - a retrieval-augmented persona chat bot.
#[derive(Parser, Debug)]
#[command(name = "persona", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the persona in the terminal.
    Shell,
    /// Import a chat export into the knowledge store.
    Import {
        /// Exported chat text file.
        file: PathBuf,
        /// Keep only this sender's messages.
        #[arg(short, long)]
        user: Option<String>,
        /// Replace existing knowledge instead of appending.
        #[arg(long)]
        clear: bool,
    },
    /// Inspect and edit stored knowledge.
    Knowledge {
        #[command(subcommand)]
        action: KnowledgeCommand,
    },
    /// Show what the retriever finds for a query.
    Retrieve {
        query: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Generate a single reply without conversation history.
    Respond {
        message: String,
        /// Skip knowledge retrieval.
        #[arg(long)]
        no_context: bool,
    },
    /// Check provider connectivity and store health.
    Check {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum KnowledgeCommand {
    /// Add a knowledge entry.
    Add {
        content: String,
        /// Provenance note stored with the entry.
        #[arg(long)]
        context: Option<String>,
        #[arg(long, default_value = knowledge::MANUAL_CATEGORY)]
        category: String,
    },
    /// List stored entries, newest first.
    List {
        #[arg(short, long)]
        limit: Option<usize>,
        /// Print entries as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by id.
    Delete { id: i64 },
    /// Print the number of stored entries.
    Count,
    /// Delete every entry.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match persona_config::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            persona_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Shell) => shell::run_shell(config).await,
        Some(Commands::Import { file, user, clear }) => {
            knowledge::run_import(&config, &file, user, clear).await
        }
        Some(Commands::Knowledge { action }) => match action {
            KnowledgeCommand::Add {
                content,
                context,
                category,
            } => knowledge::run_add(&config, content, context, category).await,
            KnowledgeCommand::List { limit, json } => {
                knowledge::run_list(&config, limit, json).await
            }
            KnowledgeCommand::Delete { id } => knowledge::run_delete(&config, id).await,
            KnowledgeCommand::Count => knowledge::run_count(&config).await,
            KnowledgeCommand::Clear { yes } => knowledge::run_clear(&config, yes).await,
        },
        Some(Commands::Retrieve { query, limit }) => {
            knowledge::run_retrieve(&config, &query, limit).await
        }
        Some(Commands::Respond {
            message,
            no_context,
        }) => pipeline::run_respond(&config, &message, !no_context).await,
        Some(Commands::Check { plain }) => check::run_check(&config, plain).await,
        None => {
            println!("persona: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(1);
    }
}

fn report_error(error: &PersonaError) {
    eprintln!("{}: {error}", "error".red());
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("persona={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_import_flags() {
        let cli = Cli::parse_from(["persona", "import", "chat.txt", "--user", "Adit", "--clear"]);
        match cli.command {
            Some(Commands::Import { file, user, clear }) => {
                assert_eq!(file, PathBuf::from("chat.txt"));
                assert_eq!(user.as_deref(), Some("Adit"));
                assert!(clear);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn knowledge_add_defaults_to_manual_category() {
        let cli = Cli::parse_from(["persona", "knowledge", "add", "suka kopi"]);
        match cli.command {
            Some(Commands::Knowledge {
                action: KnowledgeCommand::Add { category, context, .. },
            }) => {
                assert_eq!(category, "manual");
                assert!(context.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["persona", "respond", "halo", "--no-context", "-c", "p.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("p.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Respond { no_context: true, .. })
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = persona_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.name, "persona");
    }
}
