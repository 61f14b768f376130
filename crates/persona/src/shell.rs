// SPDX-FileCopyrightText: 2026 Persona Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `persona shell` command implementation.
//!
//! An interactive console conversation that goes through the same pipeline
//! as channel traffic: reply delay, retrieval, memory, and fallback reply.

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use persona_config::PersonaConfig;
use persona_config::model::ChannelConfig;
use persona_core::{InboundMessage, PersonaError};

use crate::pipeline::build_handler;

const CONVERSATION_ID: &str = "shell";
const SENDER_ID: &str = "local";

/// Shell-only commands recognised at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand<'a> {
    Quit,
    Reset,
    Stats,
    Help,
    Message(&'a str),
    Empty,
}

fn parse_line(line: &str) -> ShellCommand<'_> {
    match line.trim() {
        "" => ShellCommand::Empty,
        "/quit" | "/exit" => ShellCommand::Quit,
        "/reset" => ShellCommand::Reset,
        "/stats" => ShellCommand::Stats,
        "/help" => ShellCommand::Help,
        text => ShellCommand::Message(text),
    }
}

/// Runs the `persona shell` REPL.
pub async fn run_shell(mut config: PersonaConfig) -> Result<(), PersonaError> {
    // Console input always comes from the operator.
    config.channel = ChannelConfig::default();
    let handler = build_handler(&config).await?;

    let mut rl = DefaultEditor::new()
        .map_err(|e| PersonaError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", format!("{} shell", config.agent.name).bold().green());
    println!("Type {} for commands, {} to exit.\n", "/help".yellow(), "/quit".yellow());

    let prompt = format!("{}> ", "you".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => match parse_line(&line) {
                ShellCommand::Empty => continue,
                ShellCommand::Quit => break,
                ShellCommand::Help => {
                    println!("  /reset   forget this conversation");
                    println!("  /stats   knowledge and conversation counts");
                    println!("  /quit    leave the shell");
                }
                ShellCommand::Reset => {
                    handler.reset(CONVERSATION_ID);
                    println!("{}", "conversation reset".dimmed());
                }
                ShellCommand::Stats => match handler.stats().await {
                    Ok(stats) => println!(
                        "{}",
                        format!(
                            "{} knowledge entries, {} turns remembered",
                            stats.knowledge_count,
                            handler.memory().history(CONVERSATION_ID).len()
                        )
                        .dimmed()
                    ),
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                },
                ShellCommand::Message(text) => {
                    let _ = rl.add_history_entry(text);
                    let message = InboundMessage {
                        conversation_id: CONVERSATION_ID.to_string(),
                        sender_id: SENDER_ID.to_string(),
                        text: text.to_string(),
                        is_group: false,
                    };
                    match handler.handle(&message).await {
                        Some(reply) if reply.is_fallback => {
                            println!("{}> {}", config.agent.name.cyan(), reply.text.yellow());
                        }
                        Some(reply) => println!("{}> {}", config.agent.name.cyan(), reply.text),
                        None => debug!("message ignored"),
                    }
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    Ok(())
}
