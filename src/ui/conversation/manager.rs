use std::sync::Arc;

use crate::config::Config;
use crate::events::AppEvent;
use crate::presentation::{ParentFrame, PresentationMode};
use crate::session::{Completion, SendTicket, SessionController, SessionError};
use crate::transport::ConversationTransport;
use crate::ui::conversation::{
    ConversationComposer, ConversationHeader, ConversationHistory, SlashCommand, get_help_text,
};
use crate::ui::conversation::composer::ConversationResult;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};
use tokio::sync::mpsc;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Wires the session controller to the terminal: turns keys into session
/// operations, runs sends off the UI loop and feeds their results back.
pub struct ConversationManager {
    session: SessionController,
    composer: ConversationComposer,
    presentation: PresentationMode,
    bot_title: String,
    notice: Option<String>,
    transport: Arc<dyn ConversationTransport>,
    parent: Arc<dyn ParentFrame>,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl ConversationManager {
    pub fn new(
        config: &Config,
        presentation: PresentationMode,
        transport: Arc<dyn ConversationTransport>,
        parent: Arc<dyn ParentFrame>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            session: SessionController::new(config.greeting.clone(), config.fallback_message.clone()),
            composer: ConversationComposer::new(presentation),
            presentation,
            bot_title: config.bot_title.clone(),
            notice: None,
            transport,
            parent,
            events,
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('d') => self.handle_event(AppEvent::ExitRequest),
                KeyCode::Char('r') => self.handle_event(AppEvent::Reset),
                _ => ConversationAction::None,
            };
        }

        if key.code == KeyCode::Esc && !self.composer.is_palette_open() {
            return self.handle_event(AppEvent::CloseRequested);
        }

        match self.composer.handle_key(key) {
            ConversationResult::Submitted(input) => {
                self.handle_input(input);
                ConversationAction::None
            }
            ConversationResult::Command(command) => self.handle_slash_command(command),
            ConversationResult::None => ConversationAction::None,
        }
    }

    /// Apply an application event to the conversation
    pub fn handle_event(&mut self, event: AppEvent) -> ConversationAction {
        match event {
            AppEvent::SendFinished { ticket, outcome } => {
                match self.session.complete(ticket, outcome) {
                    Completion::Replied => tracing::debug!("reply received"),
                    Completion::Failed => {}
                    Completion::Discarded => tracing::info!("ignored reply from before reset"),
                }
                self.sync_composer();
            }
            AppEvent::Reset => self.reset(),
            AppEvent::CloseRequested => {
                self.presentation.request_close(self.parent.as_ref());
            }
            AppEvent::ExitRequest => return ConversationAction::Exit,
            AppEvent::ShowInfo { message } => self.notice = Some(message),
        }
        ConversationAction::None
    }

    /// Echo the message and start the exchange in the background
    pub fn handle_input(&mut self, input: String) {
        match self.session.submit(input) {
            Ok(ticket) => {
                self.notice = None;
                self.spawn_send(ticket);
            }
            Err(SessionError::Busy) => {
                tracing::debug!("send ignored while a reply is pending");
            }
            Err(SessionError::EmptyMessage) => {}
        }
        self.sync_composer();
    }

    fn spawn_send(&self, ticket: SendTicket) {
        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = transport.exchange(ticket.request()).await;
            if events.send(AppEvent::SendFinished { ticket, outcome }).is_err() {
                tracing::debug!("ui loop gone before reply arrived");
            }
        });
    }

    fn reset(&mut self) {
        self.session.reset();
        self.composer.clear();
        self.notice = None;
        self.sync_composer();
    }

    fn sync_composer(&mut self) {
        self.composer.set_enabled(!self.session.is_pending());
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        match command {
            SlashCommand::Reset => self.handle_event(AppEvent::Reset),
            SlashCommand::Close => self.handle_event(AppEvent::CloseRequested),
            SlashCommand::Help => self.handle_event(AppEvent::ShowInfo {
                message: get_help_text(self.presentation),
            }),
            SlashCommand::Quit => self.handle_event(AppEvent::ExitRequest),
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(3),
                Constraint::Length(self.composer.desired_height()),
            ])
            .split(area);

        ConversationHeader::new(&self.bot_title, self.presentation).render(chunks[0], buf);

        ConversationHistory::new(self.session.messages(), &self.bot_title)
            .pending(self.session.is_pending())
            .notice(self.notice.as_deref())
            .render(chunks[1], buf);

        (&self.composer).render(chunks[2], buf);
    }
}
