//! Conversation session controller.
//!
//! Owns the transcript, the server-held history token and the in-flight flag.
//! A send is split in two halves so the UI loop never blocks on the network:
//! [`SessionController::submit`] performs the optimistic echo and hands back a
//! [`SendTicket`], and [`SessionController::complete`] applies whatever the
//! transport produced for that ticket.

use thiserror::Error;

use crate::config::{DEFAULT_FALLBACK_MESSAGE, DEFAULT_GREETING};
use crate::events::{DisplayMessage, HistoryEntry};
use crate::transport::{ChatRequest, ChatResponse, ConversationTransport, TransportError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a message is already being sent")]
    Busy,

    #[error("cannot send an empty message")]
    EmptyMessage,
}

/// Proof that a send was accepted, carrying the request to hand to the
/// transport and the session generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    generation: u64,
    request: ChatRequest,
}

impl SendTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request(&self) -> &ChatRequest {
        &self.request
    }
}

/// What `complete` did with a transport outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Bot reply appended and history replaced
    Replied,
    /// Fallback text appended, history untouched
    Failed,
    /// The session was reset while the send was in flight
    Discarded,
}

pub struct SessionController {
    greeting: String,
    fallback_message: String,
    messages: Vec<DisplayMessage>,
    history: Vec<HistoryEntry>,
    pending: bool,
    generation: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING, DEFAULT_FALLBACK_MESSAGE)
    }
}

impl SessionController {
    pub fn new(greeting: impl Into<String>, fallback_message: impl Into<String>) -> Self {
        let greeting = greeting.into();
        Self {
            messages: vec![DisplayMessage::bot(greeting.clone())],
            greeting,
            fallback_message: fallback_message.into(),
            history: Vec::new(),
            pending: false,
            generation: 0,
        }
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Echo the user's message and mark a send as in flight.
    pub fn submit(&mut self, text: impl Into<String>) -> Result<SendTicket, SessionError> {
        if self.pending {
            return Err(SessionError::Busy);
        }
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.messages.push(DisplayMessage::user(text.clone()));
        self.pending = true;

        Ok(SendTicket {
            generation: self.generation,
            request: ChatRequest {
                message: text,
                history: self.history.clone(),
            },
        })
    }

    /// Apply the outcome of a send started by `submit`.
    ///
    /// `pending` is always cleared. A ticket from before the last reset
    /// changes nothing else.
    pub fn complete(
        &mut self,
        ticket: SendTicket,
        outcome: Result<ChatResponse, TransportError>,
    ) -> Completion {
        self.pending = false;

        if ticket.generation != self.generation {
            tracing::debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "dropping reply for a conversation that was reset"
            );
            return Completion::Discarded;
        }

        match outcome {
            Ok(response) => {
                self.messages.push(DisplayMessage::bot(response.bot.text));
                self.history = response.history;
                Completion::Replied
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to send message");
                self.messages
                    .push(DisplayMessage::bot(self.fallback_message.clone()));
                Completion::Failed
            }
        }
    }

    /// Submit, wait for the transport and apply the result in one step.
    pub async fn send<T>(&mut self, transport: &T, text: impl Into<String>) -> Result<Completion, SessionError>
    where
        T: ConversationTransport + ?Sized,
    {
        let ticket = self.submit(text)?;
        let outcome = transport.exchange(ticket.request()).await;
        Ok(self.complete(ticket, outcome))
    }

    /// Back to the greeting with no history.
    ///
    /// An in-flight send keeps `pending` set until it resolves, so a new send
    /// still cannot overlap it; its result is dropped by `complete`.
    pub fn reset(&mut self) {
        self.messages = vec![DisplayMessage::bot(self.greeting.clone())];
        self.history = Vec::new();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BotReply;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct ScriptedTransport {
        replies: Mutex<Vec<Result<ChatResponse, TransportError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<ChatResponse, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConversationTransport for ScriptedTransport {
        async fn exchange(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies.lock().unwrap().remove(0)
        }
    }

    fn reply(text: &str, history: Vec<HistoryEntry>) -> ChatResponse {
        ChatResponse {
            bot: BotReply {
                text: text.to_string(),
            },
            history,
        }
    }

    fn failure() -> TransportError {
        TransportError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    fn greeting() -> DisplayMessage {
        DisplayMessage::bot(DEFAULT_GREETING)
    }

    #[test]
    fn starts_with_greeting_and_empty_history() {
        let session = SessionController::default();
        assert_eq!(session.messages(), &[greeting()]);
        assert!(session.history().is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn submit_echoes_user_message_and_sets_pending() {
        let mut session = SessionController::default();
        let ticket = session.submit("Hello").unwrap();

        assert_eq!(
            session.messages(),
            &[greeting(), DisplayMessage::user("Hello")]
        );
        assert!(session.is_pending());
        assert_eq!(ticket.request().message, "Hello");
        assert!(ticket.request().history.is_empty());
    }

    #[test]
    fn second_submit_while_pending_is_rejected() {
        let mut session = SessionController::default();
        let _ticket = session.submit("one").unwrap();

        assert_eq!(session.submit("two"), Err(SessionError::Busy));
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn blank_submit_is_rejected_without_echo() {
        let mut session = SessionController::default();
        assert_eq!(session.submit("   \n"), Err(SessionError::EmptyMessage));
        assert_eq!(session.messages(), &[greeting()]);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn successful_send_appends_reply_and_replaces_history() {
        let server_history = vec![
            HistoryEntry::new("human", "Hello"),
            HistoryEntry::new("bot", "Hi!"),
        ];
        let transport = ScriptedTransport::new(vec![Ok(reply("Hi!", server_history.clone()))]);
        let mut session = SessionController::default();

        let completion = session.send(&transport, "Hello").await.unwrap();

        assert_eq!(completion, Completion::Replied);
        assert_eq!(
            session.messages(),
            &[
                greeting(),
                DisplayMessage::user("Hello"),
                DisplayMessage::bot("Hi!"),
            ]
        );
        assert_eq!(session.history(), server_history.as_slice());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn failed_send_appends_fallback_and_keeps_history() {
        let first_history = vec![
            HistoryEntry::new("human", "Hello"),
            HistoryEntry::new("bot", "Hi!"),
        ];
        let transport = ScriptedTransport::new(vec![
            Ok(reply("Hi!", first_history.clone())),
            Err(failure()),
        ]);
        let mut session = SessionController::default();
        session.send(&transport, "Hello").await.unwrap();

        let completion = session.send(&transport, "X").await.unwrap();

        assert_eq!(completion, Completion::Failed);
        assert_eq!(session.messages().len(), 5);
        assert_eq!(
            &session.messages()[3..],
            &[
                DisplayMessage::user("X"),
                DisplayMessage::bot(DEFAULT_FALLBACK_MESSAGE),
            ]
        );
        assert_eq!(session.history(), first_history.as_slice());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn each_send_carries_latest_history() {
        let after_first = vec![
            HistoryEntry::new("human", "a"),
            HistoryEntry::new("bot", "b"),
        ];
        let transport = ScriptedTransport::new(vec![
            Ok(reply("b", after_first.clone())),
            Ok(reply("d", Vec::new())),
        ]);
        let mut session = SessionController::default();

        session.send(&transport, "a").await.unwrap();
        session.send(&transport, "c").await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].history.is_empty());
        assert_eq!(seen[1].history, after_first);
    }

    #[tokio::test]
    async fn busy_send_never_reaches_transport() {
        let transport = ScriptedTransport::new(Vec::new());
        let mut session = SessionController::default();
        let _in_flight = session.submit("first").unwrap();

        let result = session.send(&transport, "second").await;

        assert_eq!(result, Err(SessionError::Busy));
        assert!(transport.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn reset_restores_greeting_after_failure() {
        let mut session = SessionController::default();
        let ticket = session.submit("X").unwrap();
        session.complete(ticket, Err(failure()));

        session.reset();

        assert_eq!(session.messages(), &[greeting()]);
        assert!(session.history().is_empty());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut session = SessionController::default();
        session.reset();
        session.reset();
        assert_eq!(session.messages(), &[greeting()]);
        assert!(session.history().is_empty());
        assert_eq!(session.generation(), 2);
    }

    #[test]
    fn reply_arriving_after_reset_is_dropped() {
        let mut session = SessionController::default();
        let ticket = session.submit("Hello").unwrap();
        session.reset();
        assert!(session.is_pending());

        let completion = session.complete(
            ticket,
            Ok(reply("late", vec![HistoryEntry::new("bot", "late")])),
        );

        assert_eq!(completion, Completion::Discarded);
        assert_eq!(session.messages(), &[greeting()]);
        assert!(session.history().is_empty());
        assert!(!session.is_pending());
    }

    #[test]
    fn failure_arriving_after_reset_is_dropped() {
        let mut session = SessionController::default();
        let ticket = session.submit("Hello").unwrap();
        session.reset();

        assert_eq!(session.complete(ticket, Err(failure())), Completion::Discarded);
        assert_eq!(session.messages(), &[greeting()]);
    }

    #[test]
    fn custom_greeting_and_fallback_are_used() {
        let mut session = SessionController::new("Welcome", "Try again later");
        let ticket = session.submit("hi").unwrap();
        session.complete(ticket, Err(failure()));

        assert_eq!(
            session.messages(),
            &[
                DisplayMessage::bot("Welcome"),
                DisplayMessage::user("hi"),
                DisplayMessage::bot("Try again later"),
            ]
        );
    }
}
