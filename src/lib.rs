//! Terminal chat widget for Dialoqbase bots.
//!
//! The widget keeps a local transcript, round-trips the server's opaque
//! conversation history, and, when embedded, tells its host when the user
//! asks to close it.

pub mod config;
pub mod events;
pub mod logging;
pub mod presentation;
pub mod provider;
pub mod query;
pub mod render;
pub mod session;
pub mod transport;
pub mod ui;

pub use config::Config;
pub use events::{DisplayMessage, HistoryEntry};
pub use presentation::{ParentFrame, PresentationMode};
pub use query::WidgetParams;
pub use session::{Completion, SendTicket, SessionController, SessionError};
pub use transport::{ChatRequest, ChatResponse, ConversationTransport, HttpTransport, TransportError};
