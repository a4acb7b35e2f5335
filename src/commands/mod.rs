//! Slash-command parsing and handlers for the interactive loop.

mod registry;

pub use registry::{all_commands, CommandInvocation};

use std::fs;

use crate::auth::CredentialMonitor;
use crate::core::app::App;
use crate::core::preview::build_preview;
use crate::utils::editor::edit_text;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

pub struct CommandContext<'a> {
    pub app: &'a mut App,
    pub monitor: &'a mut CredentialMonitor,
}

/// Route one line of input: plain text becomes a chat message, `/`-prefixed
/// input dispatches through the registry. Unknown commands are reported, not
/// sent to the model.
pub fn process_input(ctx: &mut CommandContext<'_>, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(ctx, CommandInvocation { args })
    } else {
        println!("Unknown command: /{command_name}. Try /help.");
        CommandResult::Continue
    }
}

/// A file argument is an id or a filename; no argument means the active
/// file. Prints the complaint itself when nothing resolves.
fn resolve_file_id(app: &App, args: &str) -> Option<String> {
    if args.is_empty() {
        match app.workspace.active() {
            Some(file) => Some(file.id.clone()),
            None => {
                println!("No active file. Use /files to list the workspace.");
                None
            }
        }
    } else {
        match app.workspace.resolve(args) {
            Some(file) => Some(file.id.clone()),
            None => {
                println!("No such file: {args}");
                None
            }
        }
    }
}

pub(super) fn handle_help(
    _ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    println!("Commands:");
    for command in all_commands() {
        println!("  {:<18} {}", command.usage, command.help);
    }
    println!("Anything else is sent to the model.");
    CommandResult::Continue
}

pub(super) fn handle_new(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    ctx.app.new_chat();
    println!("Started a new chat.");
    CommandResult::Continue
}

pub(super) fn handle_chats(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    if ctx.app.sessions.is_empty() {
        println!("No chats yet.");
        return CommandResult::Continue;
    }
    let active_id = ctx.app.sessions.active_id().map(str::to_string);
    for (index, session) in ctx.app.sessions.sessions().iter().enumerate() {
        let marker = if Some(session.id.as_str()) == active_id.as_deref() {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:>2}. {} ({} messages)",
            index + 1,
            session.title,
            session.messages.len()
        );
    }
    CommandResult::Continue
}

pub(super) fn handle_switch(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        println!("Usage: /switch <number>");
        return CommandResult::Continue;
    }
    let target = match invocation.args.parse::<usize>() {
        Ok(number) if number >= 1 => ctx
            .app
            .sessions
            .sessions()
            .get(number - 1)
            .map(|s| s.id.clone()),
        _ => ctx
            .app
            .sessions
            .sessions()
            .iter()
            .find(|s| s.id == invocation.args)
            .map(|s| s.id.clone()),
    };
    match target {
        Some(id) => {
            ctx.app.switch_chat(&id);
            let title = ctx
                .app
                .sessions
                .active()
                .map(|s| s.title.clone())
                .unwrap_or_default();
            println!("Switched to: {title} (workspace cleared)");
        }
        None => println!("No such chat: {}", invocation.args),
    }
    CommandResult::Continue
}

pub(super) fn handle_files(
    ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    if ctx.app.workspace.is_empty() {
        println!("The workspace is empty.");
        return CommandResult::Continue;
    }
    for file in ctx.app.workspace.files() {
        let marker = if ctx.app.workspace.active_id() == Some(file.id.as_str()) {
            "*"
        } else {
            " "
        };
        let mut notes = Vec::new();
        if file.can_undo() {
            notes.push(format!("{} undo", file.undo_stack.len()));
        }
        if file.can_redo() {
            notes.push(format!("{} redo", file.redo_stack.len()));
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", notes.join(", "))
        };
        println!(
            "{marker} {} ({}, {} lines){notes}",
            file.filename,
            file.language,
            file.content.lines().count()
        );
    }
    CommandResult::Continue
}

pub(super) fn handle_open(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        println!("Usage: /open <file>");
        return CommandResult::Continue;
    }
    if let Some(id) = resolve_file_id(ctx.app, invocation.args) {
        ctx.app.workspace.set_active(&id);
        if let Some(file) = ctx.app.workspace.get(&id) {
            println!("Now viewing {}", file.filename);
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_show(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if let Some(id) = resolve_file_id(ctx.app, invocation.args) {
        if let Some(file) = ctx.app.workspace.get(&id) {
            println!("--- {} ({}) ---", file.filename, file.language);
            println!("{}", file.content);
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_edit(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some(id) = resolve_file_id(ctx.app, invocation.args) else {
        return CommandResult::Continue;
    };
    let Some(file) = ctx.app.workspace.get(&id) else {
        return CommandResult::Continue;
    };
    let filename = file.filename.clone();
    match edit_text(&file.content) {
        Ok(Some(new_content)) => {
            ctx.app.workspace.edit(&id, new_content);
            ctx.app.persist();
            println!("✅ Updated {filename}");
        }
        Ok(None) => println!("No changes to {filename}."),
        Err(err) => println!("❌ {err}"),
    }
    CommandResult::Continue
}

pub(super) fn handle_undo(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if let Some(id) = resolve_file_id(ctx.app, invocation.args) {
        let Some(file) = ctx.app.workspace.get(&id) else {
            return CommandResult::Continue;
        };
        if !file.can_undo() {
            println!("Nothing to undo for {}.", file.filename);
            return CommandResult::Continue;
        }
        let filename = file.filename.clone();
        ctx.app.workspace.undo(&id);
        ctx.app.persist();
        println!("↶ Undid the last edit of {filename}");
    }
    CommandResult::Continue
}

pub(super) fn handle_redo(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if let Some(id) = resolve_file_id(ctx.app, invocation.args) {
        let Some(file) = ctx.app.workspace.get(&id) else {
            return CommandResult::Continue;
        };
        if !file.can_redo() {
            println!("Nothing to redo for {}.", file.filename);
            return CommandResult::Continue;
        }
        let filename = file.filename.clone();
        ctx.app.workspace.redo(&id);
        ctx.app.persist();
        println!("↷ Redid an edit of {filename}");
    }
    CommandResult::Continue
}

pub(super) fn handle_close(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if let Some(id) = resolve_file_id(ctx.app, invocation.args) {
        let filename = ctx
            .app
            .workspace
            .get(&id)
            .map(|f| f.filename.clone())
            .unwrap_or_default();
        ctx.app.workspace.close(&id);
        ctx.app.persist();
        println!("Closed {filename}");
        if let Some(active) = ctx.app.workspace.active() {
            println!("Now viewing {}", active.filename);
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_preview(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    match build_preview(ctx.app.workspace.files()) {
        None => println!("No HTML file to preview."),
        Some(document) => {
            if invocation.args.is_empty() {
                println!("{document}");
            } else {
                match fs::write(invocation.args, &document) {
                    Ok(()) => println!("✅ Preview written to {}", invocation.args),
                    Err(err) => println!("❌ Could not write preview: {err}"),
                }
            }
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_key(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        match ctx.app.credential() {
            None => println!("No API key configured. Use /key <value> or set GEMINI_API_KEY."),
            Some(credential) if credential.is_user_supplied() => println!(
                "API key: configured (status: {})",
                ctx.app.credential_status.as_str()
            ),
            Some(_) => println!("API key: from the environment"),
        }
        return CommandResult::Continue;
    }

    if invocation.args == "clear" {
        ctx.monitor.cancel_pending();
        match ctx.app.clear_api_key() {
            Ok(()) => println!("Stored API key removed."),
            Err(err) => println!("❌ Could not remove the API key: {err}"),
        }
        return CommandResult::Continue;
    }

    let api_key = invocation.args.to_string();
    match ctx.app.set_api_key(api_key.clone()) {
        Ok(()) => {
            ctx.monitor.schedule(ctx.app.probe_client(&api_key));
            println!("Validating API key…");
        }
        Err(err) => println!("❌ Could not store the API key: {err}"),
    }
    CommandResult::Continue
}

pub(super) fn handle_settings(
    ctx: &mut CommandContext<'_>,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let settings = &ctx.app.settings;
        println!("theme:   {}", settings.theme.as_str());
        println!("persona: {}", settings.persona);
        println!("context: {}", settings.context);
        return CommandResult::Continue;
    }

    let mut parts = invocation.args.splitn(2, ' ');
    let field = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("").trim().to_string();
    match field {
        "theme" => match value.as_str() {
            "light" => ctx.app.settings.theme = crate::core::config::Theme::Light,
            "dark" => ctx.app.settings.theme = crate::core::config::Theme::Dark,
            _ => {
                println!("theme must be 'light' or 'dark'");
                return CommandResult::Continue;
            }
        },
        "persona" => ctx.app.settings.persona = value,
        "context" => ctx.app.settings.context = value,
        _ => {
            println!("Usage: /settings [theme|persona|context <value>]");
            return CommandResult::Continue;
        }
    }
    match ctx.app.save_settings() {
        Ok(()) => println!("✅ Set {field}"),
        Err(err) => println!("❌ Could not save settings: {err}"),
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(
    _ctx: &mut CommandContext<'_>,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Quit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_context() -> (App, CredentialMonitor) {
        let app = App::new(
            Box::new(MemoryStore::new()),
            "test-model",
            "http://localhost",
        );
        let (monitor, _rx) = CredentialMonitor::new();
        (app, monitor)
    }

    #[test]
    fn plain_text_is_a_chat_message() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        match process_input(&mut ctx, "hello there") {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected a message"),
        }
    }

    #[test]
    fn a_lone_slash_is_a_chat_message() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        assert!(matches!(
            process_input(&mut ctx, "/"),
            CommandResult::ProcessAsMessage(_)
        ));
    }

    #[test]
    fn quit_ends_the_loop() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        assert!(matches!(process_input(&mut ctx, "/quit"), CommandResult::Quit));
    }

    #[test]
    fn unknown_commands_are_not_sent_to_the_model() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        assert!(matches!(
            process_input(&mut ctx, "/definitely-not-a-command"),
            CommandResult::Continue
        ));
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        assert!(matches!(
            process_input(&mut ctx, "/NEW"),
            CommandResult::Continue
        ));
        assert_eq!(ctx.app.sessions.len(), 1);
    }

    #[test]
    fn settings_can_be_updated_in_chat() {
        let (mut app, mut monitor) = test_context();
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        process_input(&mut ctx, "/settings persona You are terse.");
        assert_eq!(ctx.app.settings.persona, "You are terse.");
        process_input(&mut ctx, "/settings theme light");
        assert_eq!(ctx.app.settings.theme, crate::core::config::Theme::Light);
    }

    #[test]
    fn key_clear_forgets_the_stored_credential() {
        let (mut app, mut monitor) = test_context();
        app.set_api_key("sk-123".to_string()).unwrap();
        assert!(app.credential().is_some());
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        process_input(&mut ctx, "/key clear");
        // Only the environment can still supply a key afterwards
        assert!(ctx
            .app
            .credential()
            .map(|c| !c.is_user_supplied())
            .unwrap_or(true));
    }

    #[test]
    fn new_resets_the_workspace() {
        let (mut app, mut monitor) = test_context();
        app.workspace.append(vec![crate::core::workspace::CodeArtifact::new(
            "a.py",
            "python",
            "x",
        )]);
        let mut ctx = CommandContext {
            app: &mut app,
            monitor: &mut monitor,
        };
        process_input(&mut ctx, "/new");
        assert!(ctx.app.workspace.is_empty());
        assert_eq!(ctx.app.sessions.len(), 1);
    }
}
