//! Conversation UI components for the chat widget

pub mod commands;
pub mod composer;
pub mod header;
pub mod history;
pub mod manager;

pub use commands::{SlashCommand, get_help_text};
pub use composer::ConversationComposer;
pub use header::ConversationHeader;
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationManager};
