use std::io::{self, Stdout};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::events::AppEvent;
use crate::presentation::{ParentFrame, PresentationMode};
use crate::query::WidgetParams;
use crate::transport::ConversationTransport;
use crate::ui::conversation::{ConversationAction, ConversationManager};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Everything the widget needs at mount time.
pub struct WidgetOptions {
    pub config: Config,
    pub params: WidgetParams,
    pub transport: Arc<dyn ConversationTransport>,
    pub parent: Arc<dyn ParentFrame>,
}

/// Mount the widget and run until the user quits.
pub async fn run(options: WidgetOptions) -> Result<()> {
    let presentation = PresentationMode::from_mode(options.params.mode());
    tracing::info!(?presentation, "mounting chat widget");

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, options, presentation).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Tui,
    options: WidgetOptions,
    presentation: PresentationMode,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut manager = ConversationManager::new(
        &options.config,
        presentation,
        options.transport,
        options.parent,
        tx,
    );
    let mut terminal_events = EventStream::new();

    loop {
        terminal
            .draw(|frame| manager.render(frame.size(), frame.buffer_mut()))
            .context("Failed to draw widget")?;

        let action = tokio::select! {
            maybe_event = terminal_events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) => manager.handle_key(key),
                Some(Ok(_)) => ConversationAction::None,
                Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                None => ConversationAction::Exit,
            },
            Some(event) = rx.recv() => manager.handle_event(event),
        };

        if action == ConversationAction::Exit {
            tracing::info!("widget closed by user");
            return Ok(());
        }
    }
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
