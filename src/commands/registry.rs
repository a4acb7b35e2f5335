use super::{CommandContext, CommandResult};

pub type CommandHandler = fn(&mut CommandContext<'_>, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new chat (clears the workspace).",
        handler: super::handle_new,
    },
    Command {
        name: "chats",
        usage: "/chats",
        help: "List chats.",
        handler: super::handle_chats,
    },
    Command {
        name: "switch",
        usage: "/switch <number>",
        help: "Switch to another chat (clears the workspace).",
        handler: super::handle_switch,
    },
    Command {
        name: "files",
        usage: "/files",
        help: "List workspace files.",
        handler: super::handle_files,
    },
    Command {
        name: "open",
        usage: "/open <file>",
        help: "Make a workspace file active.",
        handler: super::handle_open,
    },
    Command {
        name: "show",
        usage: "/show [file]",
        help: "Print a file's content (defaults to the active file).",
        handler: super::handle_show,
    },
    Command {
        name: "edit",
        usage: "/edit [file]",
        help: "Edit a file in $EDITOR (defaults to the active file).",
        handler: super::handle_edit,
    },
    Command {
        name: "undo",
        usage: "/undo [file]",
        help: "Undo the last edit of a file.",
        handler: super::handle_undo,
    },
    Command {
        name: "redo",
        usage: "/redo [file]",
        help: "Redo an undone edit of a file.",
        handler: super::handle_redo,
    },
    Command {
        name: "close",
        usage: "/close [file]",
        help: "Close a workspace file.",
        handler: super::handle_close,
    },
    Command {
        name: "preview",
        usage: "/preview [path]",
        help: "Assemble the HTML preview; print it or write it to a file.",
        handler: super::handle_preview,
    },
    Command {
        name: "key",
        usage: "/key [value|clear]",
        help: "Set the API key, clear it, or show its status.",
        handler: super::handle_key,
    },
    Command {
        name: "settings",
        usage: "/settings [k v]",
        help: "Show settings, or set theme/persona/context.",
        handler: super::handle_settings,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Exit.",
        handler: super::handle_quit,
    },
];
