//! The interactive chat loop
//!
//! A line-oriented event loop: stdin lines and credential-verdict events are
//! multiplexed with `select!`. Application state is only ever touched from
//! this task; a turn in flight simply holds the loop, which is what keeps
//! each chat's turns serialized.

use std::error::Error;
use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::auth::{CredentialMonitor, CredentialStatus};
use crate::commands::{process_input, CommandContext, CommandResult};
use crate::core::app::App;
use crate::core::conversation::TurnOutcome;
use crate::core::session::NEW_CHAT_TITLE;

pub async fn run_chat(mut app: App) -> Result<(), Box<dyn Error>> {
    let (mut monitor, mut verdicts) = CredentialMonitor::new();

    println!("scrivano — chat with {} (/help for commands)", app.model());

    // A stored key starts unvalidated; probe it right away so chat unblocks
    // without the user re-entering it. Environment keys are trusted.
    let stored_key = app
        .credential()
        .filter(|c| c.is_user_supplied())
        .map(|c| c.key().to_string());
    match stored_key {
        Some(key) => {
            app.apply_credential_verdict(CredentialStatus::Checking);
            monitor.schedule(app.probe_client(&key));
        }
        None => {
            if app.credential().is_none() {
                println!("No API key configured. Use /key <value> or set GEMINI_API_KEY.");
            }
        }
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    prompt()?;
                    continue;
                }

                let result = {
                    let mut ctx = CommandContext {
                        app: &mut app,
                        monitor: &mut monitor,
                    };
                    process_input(&mut ctx, trimmed)
                };
                match result {
                    CommandResult::Quit => break,
                    CommandResult::Continue => {}
                    CommandResult::ProcessAsMessage(message) => {
                        // Apply any verdict that arrived while typing, so a
                        // freshly validated key unblocks this very send.
                        while let Ok(status) = verdicts.try_recv() {
                            app.apply_credential_verdict(status);
                            announce_verdict(status);
                        }
                        run_turn(&mut app, &message).await;
                    }
                }
                prompt()?;
            }
            Some(status) = verdicts.recv() => {
                app.apply_credential_verdict(status);
                announce_verdict(status);
                prompt()?;
            }
        }
    }

    Ok(())
}

async fn run_turn(app: &mut App, message: &str) {
    let title_before = app
        .sessions
        .active()
        .map(|s| s.title.clone())
        .unwrap_or_else(|| NEW_CHAT_TITLE.to_string());

    match app.conversation().send_message(message).await {
        TurnOutcome::Completed { reply, new_files } => {
            if !reply.is_empty() {
                println!("{reply}");
            }
            if !new_files.is_empty() {
                println!("📁 New files: {}", new_files.join(", "));
            }
            if let Some(session) = app.sessions.active() {
                if session.title != title_before && session.title != NEW_CHAT_TITLE {
                    println!("💬 Chat titled: {}", session.title);
                }
            }
        }
        TurnOutcome::Failed { reply } => println!("{reply}"),
        TurnOutcome::Refused { reason } => println!("❌ {reason}"),
        TurnOutcome::Busy => println!("⏳ A response is still in flight for this chat."),
    }
}

fn announce_verdict(status: CredentialStatus) {
    match status {
        CredentialStatus::Valid => println!("✅ API key validated."),
        CredentialStatus::Invalid => {
            println!("❌ API key is invalid or out of quota. Check it with /key.")
        }
        CredentialStatus::Unknown | CredentialStatus::Checking => {}
    }
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}
