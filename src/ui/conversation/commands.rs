use std::str::FromStr;

use crate::presentation::PresentationMode;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start the conversation over
    Reset,
    /// Ask the embedding page to close the widget
    Close,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Reset => "clear the conversation and start over",
            SlashCommand::Close => "close the embedded widget",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// `/close` only exists where there is a host to close us.
    pub fn available_in(self, presentation: PresentationMode) -> bool {
        match self {
            SlashCommand::Close => presentation.shows_close_control(),
            SlashCommand::Reset | SlashCommand::Help | SlashCommand::Quit => true,
        }
    }
}

pub fn command_entries(presentation: PresentationMode) -> Vec<CommandEntry> {
    SlashCommand::iter()
        .filter(|command| command.available_in(presentation))
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

/// Parse a slash command from user input.
///
/// Only a lone command word counts; anything followed by more text is an
/// ordinary message for the bot.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let word = input.trim().strip_prefix('/')?;
    if word.is_empty() || word.contains(char::is_whitespace) {
        return None;
    }
    SlashCommand::from_str(word).ok()
}

/// Get help text for the commands available in this presentation mode
pub fn get_help_text(presentation: PresentationMode) -> String {
    let mut help = String::from("Available commands:\n\n");
    for entry in command_entries(presentation) {
        help.push_str(&format!("- `/{}` {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nEnter sends, Shift+Enter adds a new line, Ctrl+R starts over.");
    if presentation.shows_close_control() {
        help.push_str(" Esc closes the widget.");
    }

    help
}
