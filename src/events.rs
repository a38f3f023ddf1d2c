use serde::{Deserialize, Serialize};

use crate::session::SendTicket;
use crate::transport::{ChatResponse, TransportError};

/// A single entry in the on-screen transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub is_bot: bool,
    pub message: String,
}

impl DisplayMessage {
    pub fn bot(message: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            message: message.into(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self {
            is_bot: false,
            message: message.into(),
        }
    }
}

/// One turn of server-held conversation context.
///
/// The widget never looks inside these; it stores whatever the server
/// returned and replays it on the next send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl HistoryEntry {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Internal application events for coordinating between components
#[derive(Debug)]
pub enum AppEvent {
    /// A spawned exchange finished, successfully or not
    SendFinished {
        ticket: SendTicket,
        outcome: Result<ChatResponse, TransportError>,
    },

    /// Clear the conversation back to the greeting
    Reset,

    /// User activated the close control
    CloseRequested,

    /// Request to exit the application
    ExitRequest,

    /// Show info message in the transcript area
    ShowInfo { message: String },
}
